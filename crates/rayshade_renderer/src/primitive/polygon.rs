//! Planar polygon with any number of vertices.

use rayshade_math::{Aabb, DVec2, DVec3, EPSILON};

use crate::{GeomError, GeomResult, Ray};

const PARALLEL_EPSILON: f64 = 1.0e-12;

/// A planar polygon. Inside-ness is decided by winding number, so
/// non-convex and self-overlapping outlines work.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    points: Vec<DVec3>,
    normal: DVec3,
    d: f64,
    /// The two axes kept when projecting onto the dominant plane
    axes: (usize, usize),
    projected: Vec<DVec2>,
}

impl Polygon {
    pub fn new(points: impl IntoIterator<Item = DVec3>) -> GeomResult<Self> {
        let mut points: Vec<DVec3> = points.into_iter().collect();
        points.dedup_by(|a, b| (*a - *b).length() < EPSILON);
        while points.len() > 1 && (points[0] - points[points.len() - 1]).length() < EPSILON {
            points.pop();
        }
        if points.len() < 3 {
            return Err(GeomError::degenerate("polygon", "fewer than three distinct vertices"));
        }

        // Newell's method
        let mut normal = DVec3::ZERO;
        for (i, p) in points.iter().enumerate() {
            let q = points[(i + 1) % points.len()];
            normal.x += (p.y - q.y) * (p.z + q.z);
            normal.y += (p.z - q.z) * (p.x + q.x);
            normal.z += (p.x - q.x) * (p.y + q.y);
        }
        let normal = normal
            .try_normalize()
            .ok_or(GeomError::degenerate("polygon", "collinear vertices"))?;
        let d = normal.dot(points[0]);

        let extent = Aabb::from_point_cloud(points.iter().copied()).size().max_element();
        if points.iter().any(|p| (normal.dot(*p) - d).abs() > EPSILON * extent.max(1.0)) {
            return Err(GeomError::degenerate("polygon", "vertices are not coplanar"));
        }

        let a = normal.abs();
        let dominant = if a.x >= a.y && a.x >= a.z {
            0
        } else if a.y >= a.z {
            1
        } else {
            2
        };
        let axes = ((dominant + 1) % 3, (dominant + 2) % 3);
        let projected = points.iter().map(|p| DVec2::new(p[axes.0], p[axes.1])).collect();

        Ok(Self {
            points,
            normal,
            d,
            axes,
            projected,
        })
    }

    pub fn intersect(&self, ray: &Ray, mindist: f64, maxdist: &mut f64) -> bool {
        let denom = self.normal.dot(ray.direction);
        if denom.abs() < PARALLEL_EPSILON {
            return false;
        }
        let t = (self.d - self.normal.dot(ray.origin)) / denom;
        if t <= mindist || t >= *maxdist {
            return false;
        }
        let hit = ray.at(t);
        if !self.winds_around(DVec2::new(hit[self.axes.0], hit[self.axes.1])) {
            return false;
        }
        *maxdist = t;
        true
    }

    /// Quadrant winding test: each edge moves the point's view of the outline
    /// by a signed number of quarter turns.
    fn winds_around(&self, p: DVec2) -> bool {
        let quadrant = |v: DVec2| -> i32 {
            match (v.x >= p.x, v.y >= p.y) {
                (true, true) => 0,
                (false, true) => 1,
                (false, false) => 2,
                (true, false) => 3,
            }
        };

        let n = self.projected.len();
        let mut winding = 0;
        let mut prev = self.projected[n - 1];
        let mut prev_q = quadrant(prev);
        for &cur in &self.projected {
            let q = quadrant(cur);
            winding += match (q - prev_q).rem_euclid(4) {
                0 => 0,
                1 => 1,
                3 => -1,
                _ => {
                    // Diagonal jump: which way round depends on where the
                    // edge crosses the horizontal through p.
                    let x_cross = prev.x + (p.y - prev.y) * (cur.x - prev.x) / (cur.y - prev.y);
                    let passes_right = x_cross > p.x;
                    // Moving upward on the right is counter-clockwise.
                    let upward = cur.y > prev.y;
                    if passes_right == upward {
                        2
                    } else {
                        -2
                    }
                }
            };
            prev = cur;
            prev_q = q;
        }
        winding != 0
    }

    pub fn normal(&self) -> DVec3 {
        self.normal
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_point_cloud(self.points.iter().copied())
    }

    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }
}
