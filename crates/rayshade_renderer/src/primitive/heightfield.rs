//! Height field over the unit square.
//!
//! An `N x N` grid of samples spans `[0, 1] x [0, 1]` in x and y, with the
//! sample value as z. Each grid cell is split into two triangles along its
//! diagonal. Traversal walks a min/max pyramid: a cell at level `k+1`
//! covers up to 2x2 cells of level `k`, and its height range bounds all of
//! them. Odd sizes round up, so the last cell of a level may cover fewer
//! children.

use rayshade_math::{Aabb, DVec3};

use super::moller_trumbore;
use crate::{GeomError, GeomResult, Ray};

/// Slack on the z-range rejection of a pyramid cell.
const HEIGHT_SLACK: f64 = 1.0e-9;

#[derive(Debug, Clone, PartialEq)]
struct Level {
    /// Cells per side
    cells: usize,
    /// Level-0 cells per side of one cell at this level
    span: usize,
    min: Vec<f64>,
    max: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    /// Samples per side
    size: usize,
    heights: Vec<f64>,
    /// Width of one level-0 cell
    cell_width: f64,
    levels: Vec<Level>,
    bounds: Aabb,
}

impl HeightField {
    /// Build from `size * size` samples in row-major order (x varies fastest).
    pub fn new(size: usize, heights: Vec<f64>) -> GeomResult<Self> {
        if size < 2 {
            return Err(GeomError::HeightField(format!("need at least 2x2 samples, got {size}x{size}")));
        }
        if heights.len() != size * size {
            return Err(GeomError::HeightField(format!(
                "expected {} samples for a {size}x{size} field, got {}",
                size * size,
                heights.len()
            )));
        }
        if let Some(i) = heights.iter().position(|h| !h.is_finite()) {
            return Err(GeomError::HeightField(format!("sample {i} is not finite")));
        }

        let cells = size - 1;
        let mut level0 = Level {
            cells,
            span: 1,
            min: vec![0.0; cells * cells],
            max: vec![0.0; cells * cells],
        };
        for j in 0..cells {
            for i in 0..cells {
                let corners = [
                    heights[j * size + i],
                    heights[j * size + i + 1],
                    heights[(j + 1) * size + i],
                    heights[(j + 1) * size + i + 1],
                ];
                level0.min[j * cells + i] = corners.iter().copied().fold(f64::INFINITY, f64::min);
                level0.max[j * cells + i] = corners.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            }
        }

        let mut levels = vec![level0];
        while let Some(coarser) = levels.last().filter(|l| l.cells > 1).map(Self::coarsen) {
            levels.push(coarser);
        }

        let lo = heights.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = heights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let bounds = Aabb::from_points(DVec3::new(0.0, 0.0, lo), DVec3::new(1.0, 1.0, hi));

        log::debug!("height field {size}x{size}: {} pyramid levels", levels.len());

        Ok(Self {
            size,
            heights,
            cell_width: 1.0 / cells as f64,
            levels,
            bounds,
        })
    }

    fn coarsen(fine: &Level) -> Level {
        let cells = fine.cells.div_ceil(2);
        let mut min = vec![f64::INFINITY; cells * cells];
        let mut max = vec![f64::NEG_INFINITY; cells * cells];
        for j in 0..fine.cells {
            for i in 0..fine.cells {
                let parent = (j / 2) * cells + i / 2;
                min[parent] = min[parent].min(fine.min[j * fine.cells + i]);
                max[parent] = max[parent].max(fine.max[j * fine.cells + i]);
            }
        }
        Level {
            cells,
            span: fine.span * 2,
            min,
            max,
        }
    }

    fn vertex(&self, i: usize, j: usize) -> DVec3 {
        DVec3::new(
            i as f64 * self.cell_width,
            j as f64 * self.cell_width,
            self.heights[j * self.size + i],
        )
    }

    /// The two triangles of level-0 cell `(i, j)`: (00, 10, 11) and (00, 11, 01).
    fn cell_triangles(&self, i: usize, j: usize) -> [[DVec3; 3]; 2] {
        let v00 = self.vertex(i, j);
        let v10 = self.vertex(i + 1, j);
        let v11 = self.vertex(i + 1, j + 1);
        let v01 = self.vertex(i, j + 1);
        [[v00, v10, v11], [v00, v11, v01]]
    }

    pub fn intersect(&self, ray: &Ray, mindist: f64, maxdist: &mut f64) -> bool {
        let top = self.levels.len() - 1;
        let mut best = *maxdist;
        if self.visit(ray, top, 0, 0, mindist, &mut best) {
            *maxdist = best;
            true
        } else {
            false
        }
    }

    fn visit(&self, ray: &Ray, level: usize, cx: usize, cy: usize, mindist: f64, best: &mut f64) -> bool {
        let lvl = &self.levels[level];
        let base_cells = self.levels[0].cells;
        let x0 = (cx * lvl.span) as f64 * self.cell_width;
        let x1 = (((cx + 1) * lvl.span).min(base_cells)) as f64 * self.cell_width;
        let y0 = (cy * lvl.span) as f64 * self.cell_width;
        let y1 = (((cy + 1) * lvl.span).min(base_cells)) as f64 * self.cell_width;

        let Some((ta, tb)) = clip_to_rect(ray, x0, x1, y0, y1, mindist, *best) else {
            return false;
        };

        let za = ray.origin.z + ta * ray.direction.z;
        let zb = ray.origin.z + tb * ray.direction.z;
        let idx = cy * lvl.cells + cx;
        if za.max(zb) < lvl.min[idx] - HEIGHT_SLACK || za.min(zb) > lvl.max[idx] + HEIGHT_SLACK {
            return false;
        }

        if level == 0 {
            let mut hit = false;
            for [v0, v1, v2] in self.cell_triangles(cx, cy) {
                if let Some((t, _, _)) = moller_trumbore(ray.origin, ray.direction, v0, v1 - v0, v2 - v0) {
                    if t > mindist && t < *best {
                        *best = t;
                        hit = true;
                    }
                }
            }
            return hit;
        }

        let finer = &self.levels[level - 1];
        let mut hit = false;
        for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            let (fx, fy) = (cx * 2 + dx, cy * 2 + dy);
            if fx < finer.cells && fy < finer.cells {
                hit |= self.visit(ray, level - 1, fx, fy, mindist, best);
            }
        }
        hit
    }

    /// Upward-facing normal of the triangle under `p`.
    pub fn normal(&self, p: DVec3) -> DVec3 {
        let cells = self.levels[0].cells;
        let gx = (p.x / self.cell_width).max(0.0);
        let gy = (p.y / self.cell_width).max(0.0);
        let i = (gx as usize).min(cells - 1);
        let j = (gy as usize).min(cells - 1);
        let fx = gx - i as f64;
        let fy = gy - j as f64;

        let [lower, upper] = self.cell_triangles(i, j);
        let [v0, v1, v2] = if fx >= fy { lower } else { upper };
        (v1 - v0).cross(v2 - v0).try_normalize().unwrap_or(DVec3::Z)
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn pyramid_levels(&self) -> usize {
        self.levels.len()
    }
}

/// Parameter range over which the ray is above the rectangle
/// `[x0, x1] x [y0, y1]`, clipped to `[tmin, tmax]`.
fn clip_to_rect(ray: &Ray, x0: f64, x1: f64, y0: f64, y1: f64, tmin: f64, tmax: f64) -> Option<(f64, f64)> {
    let mut lo = tmin;
    let mut hi = tmax;
    for (origin, dir, a, b) in [(ray.origin.x, ray.direction.x, x0, x1), (ray.origin.y, ray.direction.y, y0, y1)] {
        if dir == 0.0 {
            if origin < a || origin > b {
                return None;
            }
            continue;
        }
        let inv = 1.0 / dir;
        let mut t0 = (a - origin) * inv;
        let mut t1 = (b - origin) * inv;
        if inv < 0.0 {
            std::mem::swap(&mut t0, &mut t1);
        }
        lo = lo.max(t0);
        hi = hi.min(t1);
        if lo > hi {
            return None;
        }
    }
    Some((lo, hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn down(x: f64, y: f64) -> Ray {
        Ray::new(DVec3::new(x, y, 10.0), -DVec3::Z)
    }

    #[test]
    fn test_flat_field() {
        let hf = HeightField::new(3, vec![0.5; 9]).unwrap();
        let mut t = f64::INFINITY;
        assert!(hf.intersect(&down(0.3, 0.7), 1e-5, &mut t));
        assert!((t - 9.5).abs() < 1e-12);
        assert_eq!(hf.normal(DVec3::new(0.3, 0.7, 0.5)), DVec3::Z);

        let mut t = f64::INFINITY;
        assert!(!hf.intersect(&down(1.5, 0.5), 1e-5, &mut t));
    }

    #[test]
    fn test_sloped_field_height() {
        // z = x on a 2x2 field.
        let hf = HeightField::new(2, vec![0.0, 1.0, 0.0, 1.0]).unwrap();
        let mut t = f64::INFINITY;
        assert!(hf.intersect(&down(0.25, 0.75), 1e-5, &mut t));
        assert!((t - 9.75).abs() < 1e-12);
        let n = hf.normal(DVec3::new(0.25, 0.75, 0.25));
        assert!((n - DVec3::new(-1.0, 0.0, 1.0).normalize()).length() < 1e-12);
    }

    #[test]
    fn test_odd_size_pyramid() {
        // 6x6 samples: 5 cells -> 3 -> 2 -> 1
        let hf = HeightField::new(6, vec![0.0; 36]).unwrap();
        assert_eq!(hf.pyramid_levels(), 4);
    }

    #[test]
    fn test_pyramid_matches_brute_force() {
        let size = 7;
        let mut rng = StdRng::seed_from_u64(7);
        let heights: Vec<f64> = (0..size * size).map(|_| rng.gen_range(-0.5..0.5)).collect();
        let hf = HeightField::new(size, heights).unwrap();

        for _ in 0..200 {
            let origin = DVec3::new(rng.gen_range(-1.0..2.0), rng.gen_range(-1.0..2.0), rng.gen_range(1.0..3.0));
            let target = DVec3::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0), rng.gen_range(-0.5..0.5));
            let ray = Ray::new(origin, target - origin);

            let mut fast = f64::INFINITY;
            let fast_hit = hf.intersect(&ray, 1e-5, &mut fast);

            let mut slow = f64::INFINITY;
            for j in 0..size - 1 {
                for i in 0..size - 1 {
                    for [v0, v1, v2] in hf.cell_triangles(i, j) {
                        if let Some((t, _, _)) = moller_trumbore(ray.origin, ray.direction, v0, v1 - v0, v2 - v0) {
                            if t > 1e-5 && t < slow {
                                slow = t;
                            }
                        }
                    }
                }
            }

            assert_eq!(fast_hit, slow.is_finite());
            if fast_hit {
                assert!((fast - slow).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_malformed_fields() {
        assert!(matches!(HeightField::new(1, vec![0.0]), Err(GeomError::HeightField(_))));
        assert!(matches!(HeightField::new(3, vec![0.0; 8]), Err(GeomError::HeightField(_))));
        let mut bad = vec![0.0; 4];
        bad[2] = f64::NAN;
        assert!(HeightField::new(2, bad).is_err());
    }
}
