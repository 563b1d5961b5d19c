//! Infinite plane.

use rayshade_math::DVec3;

use super::{orthonormal_basis, Uv};
use crate::{GeomError, GeomResult, Ray};

/// Directions closer to parallel than this never hit.
const PARALLEL_EPSILON: f64 = 1.0e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    point: DVec3,
    normal: DVec3,
    d: f64,
    u_axis: DVec3,
    v_axis: DVec3,
}

impl Plane {
    /// The plane through `point` facing `normal`.
    pub fn new(point: DVec3, normal: DVec3) -> GeomResult<Self> {
        let normal = normal
            .try_normalize()
            .ok_or(GeomError::degenerate("plane", "zero-length normal"))?;
        let (u_axis, v_axis) = orthonormal_basis(normal);
        Ok(Self {
            point,
            normal,
            d: normal.dot(point),
            u_axis,
            v_axis,
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
        *maxdist = t;
        true
    }

    pub fn normal(&self) -> DVec3 {
        self.normal
    }

    /// Planar coordinates relative to the defining point.
    pub fn uv(&self, p: DVec3) -> Uv {
        let rel = p - self.point;
        Uv {
            u: rel.dot(self.u_axis),
            v: rel.dot(self.v_axis),
            dpdu: self.u_axis,
            dpdv: self.v_axis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_hit_from_both_sides() {
        let plane = Plane::new(DVec3::new(0.0, 0.0, -2.0), DVec3::Z).unwrap();

        let mut t = f64::INFINITY;
        assert!(plane.intersect(&Ray::new(DVec3::ZERO, -DVec3::Z), 1e-5, &mut t));
        assert!((t - 2.0).abs() < 1e-12);

        let mut t = f64::INFINITY;
        assert!(plane.intersect(&Ray::new(DVec3::new(0.0, 0.0, -5.0), DVec3::Z), 1e-5, &mut t));
        assert!((t - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_plane_parallel_ray() {
        let plane = Plane::new(DVec3::ZERO, DVec3::Z).unwrap();
        let mut t = f64::INFINITY;
        assert!(!plane.intersect(&Ray::new(DVec3::Z, DVec3::X), 1e-5, &mut t));
    }

    #[test]
    fn test_degenerate_normal() {
        assert!(Plane::new(DVec3::ZERO, DVec3::ZERO).is_err());
    }
}
