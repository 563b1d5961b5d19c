//! Uniform voxel grids.
//!
//! Children are binned into the voxels their bounds overlap. A ray walks the
//! voxels it pierces front to back (3D DDA) and stops at the first voxel
//! boundary beyond the nearest hit found so far. Objects straddling several
//! voxels are tested once per traversal thanks to the tracer's mailbox.

use std::sync::{Arc, PoisonError, RwLock};

use rayshade_math::{Aabb, DVec3, EPSILON};

use crate::geom::Frame;
use crate::hit::HitPath;
use crate::{Geom, GeomError, GeomResult, Ray, Tracer};

/// Voxel occupancy for one frame.
#[derive(Debug)]
struct Lattice {
    frame: u64,
    bounds: Aabb,
    voxel_size: DVec3,
    /// Children with infinite extent, tested on every ray
    unbounded: Vec<usize>,
    /// Child indices per voxel, x fastest
    voxels: Vec<Vec<usize>>,
}

#[derive(Debug)]
pub struct Grid {
    children: Vec<Arc<Geom>>,
    resolution: [usize; 3],
    lattice: RwLock<Option<Arc<Lattice>>>,
}

impl Grid {
    pub fn new(children: Vec<Arc<Geom>>, resolution: [usize; 3]) -> GeomResult<Self> {
        if resolution.contains(&0) {
            return Err(GeomError::InvalidGridResolution(resolution));
        }
        Ok(Self {
            children,
            resolution,
            lattice: RwLock::new(None),
        })
    }

    pub fn children(&self) -> &[Arc<Geom>] {
        &self.children
    }

    pub fn resolution(&self) -> [usize; 3] {
        self.resolution
    }

    fn lattice(&self) -> Option<Arc<Lattice>> {
        self.lattice.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Bin the children for `frame` and return the grid's bounds.
    pub fn compute_bounds(&self, frame: &Frame) -> Aabb {
        if let Some(lattice) = self.lattice() {
            if lattice.frame == frame.number {
                return if lattice.unbounded.is_empty() {
                    lattice.bounds
                } else {
                    Aabb::UNBOUNDED
                };
            }
        }

        let child_bounds: Vec<Aabb> = self.children.iter().map(|c| c.compute_bounds(frame)).collect();
        let mut unbounded = Vec::new();
        let mut bounds = Aabb::EMPTY;
        for (index, b) in child_bounds.iter().enumerate() {
            if b.is_unbounded() {
                unbounded.push(index);
            } else {
                bounds = Aabb::surrounding(&bounds, b);
            }
        }

        if bounds.is_unbounded() {
            // Nothing to bin; every child is tested directly.
            *self.lattice.write().unwrap_or_else(PoisonError::into_inner) = None;
            return Aabb::UNBOUNDED;
        }

        let bounds = bounds.enlarge(EPSILON);
        let [nx, ny, nz] = self.resolution;
        let voxel_size = bounds.size() / DVec3::new(nx as f64, ny as f64, nz as f64);
        let mut voxels = vec![Vec::new(); nx * ny * nz];
        let mut entries = 0;

        for (index, b) in child_bounds.iter().enumerate() {
            if b.is_unbounded() {
                continue;
            }
            let lo = voxel_coords(&bounds, voxel_size, self.resolution, b.min());
            let hi = voxel_coords(&bounds, voxel_size, self.resolution, b.max());
            for z in lo[2]..=hi[2] {
                for y in lo[1]..=hi[1] {
                    for x in lo[0]..=hi[0] {
                        voxels[(z * ny + y) * nx + x].push(index);
                        entries += 1;
                    }
                }
            }
        }

        log::debug!(
            "grid {}x{}x{}: {} objects, {} voxel entries, {} unbounded",
            nx,
            ny,
            nz,
            self.children.len(),
            entries,
            unbounded.len()
        );

        let result = if unbounded.is_empty() { bounds } else { Aabb::UNBOUNDED };
        *self.lattice.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(Lattice {
            frame: frame.number,
            bounds,
            voxel_size,
            unbounded,
            voxels,
        }));
        result
    }

    pub(crate) fn intersect<'a>(
        &'a self,
        tracer: &mut Tracer,
        ray: &Ray,
        path: &mut HitPath<'a>,
        mindist: f64,
        maxdist: &mut f64,
    ) -> bool {
        let Some(lattice) = self.lattice() else {
            return self.intersect_all(tracer, ray, path, mindist, maxdist);
        };

        let children: &'a [Arc<Geom>] = &self.children;
        let start = path.len();
        let mut hit = false;
        let test = move |tracer: &mut Tracer, path: &mut HitPath<'a>, index: usize, maxdist: &mut f64| {
            let mark = path.len();
            if tracer.intersect(&children[index], ray, path, mindist, maxdist) {
                path.discard(start..mark);
                true
            } else {
                false
            }
        };

        for &index in &lattice.unbounded {
            hit |= test(tracer, path, index, maxdist);
        }

        let geometric = ray.to_math();
        let Some(t_enter) = lattice.bounds.hit_distance(&geometric, mindist, *maxdist) else {
            return hit;
        };

        let traversal = tracer.next_traversal();
        let res = self.resolution;
        let entry = ray.at(t_enter);
        let mut voxel = voxel_coords(&lattice.bounds, lattice.voxel_size, res, entry);
        let origin = lattice.bounds.min();

        let mut step = [0isize; 3];
        let mut t_max = [f64::INFINITY; 3];
        let mut t_delta = [f64::INFINITY; 3];
        for axis in 0..3 {
            let dir = ray.direction[axis];
            if dir > 0.0 {
                step[axis] = 1;
                let boundary = origin[axis] + (voxel[axis] + 1) as f64 * lattice.voxel_size[axis];
                t_max[axis] = (boundary - ray.origin[axis]) / dir;
                t_delta[axis] = lattice.voxel_size[axis] / dir;
            } else if dir < 0.0 {
                step[axis] = -1;
                let boundary = origin[axis] + voxel[axis] as f64 * lattice.voxel_size[axis];
                t_max[axis] = (boundary - ray.origin[axis]) / dir;
                t_delta[axis] = -lattice.voxel_size[axis] / dir;
            }
        }

        loop {
            let cell = (voxel[2] * res[1] + voxel[1]) * res[0] + voxel[0];
            for &index in &lattice.voxels[cell] {
                if tracer.already_tested(children[index].id(), traversal) {
                    continue;
                }
                hit |= test(tracer, path, index, maxdist);
            }

            let axis = if t_max[0] < t_max[1] {
                if t_max[0] < t_max[2] {
                    0
                } else {
                    2
                }
            } else if t_max[1] < t_max[2] {
                1
            } else {
                2
            };

            // A hit nearer than the next boundary cannot be beaten further on.
            if *maxdist < t_max[axis] {
                break;
            }
            let next = voxel[axis] as isize + step[axis];
            if next < 0 || next >= res[axis] as isize {
                break;
            }
            voxel[axis] = next as usize;
            t_max[axis] += t_delta[axis];
            tracer.stats.voxel_steps += 1;
        }

        hit
    }

    /// Brute force fallback for a grid whose lattice was never built.
    fn intersect_all<'a>(
        &'a self,
        tracer: &mut Tracer,
        ray: &Ray,
        path: &mut HitPath<'a>,
        mindist: f64,
        maxdist: &mut f64,
    ) -> bool {
        let start = path.len();
        let mut hit = false;
        for child in &self.children {
            let mark = path.len();
            if tracer.intersect(child, ray, path, mindist, maxdist) {
                path.discard(start..mark);
                hit = true;
            }
        }
        hit
    }
}

/// Voxel containing `p`, clamped into the lattice.
fn voxel_coords(bounds: &Aabb, voxel_size: DVec3, res: [usize; 3], p: DVec3) -> [usize; 3] {
    let rel = (p - bounds.min()) / voxel_size;
    let mut coords = [0; 3];
    for axis in 0..3 {
        let v = rel[axis].floor();
        coords[axis] = if v <= 0.0 { 0 } else { (v as usize).min(res[axis] - 1) };
    }
    coords
}
