//! Open cylinder between two end points.

use rayshade_math::{Aabb, DVec3, EPSILON};
use std::f64::consts::TAU;

use super::{azimuth_fraction, rim_extent, roots::solve_quadratic, AxisFrame, Uv};
use crate::{GeomError, GeomResult, Ray};

/// An uncapped cylinder. Caps are modeled with discs when needed.
#[derive(Debug, Clone, PartialEq)]
pub struct Cylinder {
    frame: AxisFrame,
    length: f64,
    radius: f64,
}

impl Cylinder {
    pub fn new(base: DVec3, apex: DVec3, radius: f64) -> GeomResult<Self> {
        if !(radius > EPSILON) {
            return Err(GeomError::degenerate("cylinder", "radius too small"));
        }
        let axis = apex - base;
        let length = axis.length();
        if !(length > EPSILON) {
            return Err(GeomError::degenerate("cylinder", "zero-length axis"));
        }
        Ok(Self {
            frame: AxisFrame::new(base, axis / length),
            length,
            radius,
        })
    }

    pub fn intersect(&self, ray: &Ray, mindist: f64, maxdist: &mut f64) -> bool {
        let o = self.frame.point_to_local(ray.origin);
        let d = self.frame.vector_to_local(ray.direction);

        let a = d.x * d.x + d.y * d.y;
        if a < 1.0e-12 {
            // Parallel to the axis: an open tube is never hit.
            return false;
        }
        let b = 2.0 * (o.x * d.x + o.y * d.y);
        let c = o.x * o.x + o.y * o.y - self.radius * self.radius;

        for t in solve_quadratic(a, b, c).sorted().iter() {
            if t <= mindist || t >= *maxdist {
                continue;
            }
            let z = o.z + t * d.z;
            if (0.0..=self.length).contains(&z) {
                *maxdist = t;
                return true;
            }
        }
        false
    }

    pub fn normal(&self, p: DVec3) -> DVec3 {
        let local = self.frame.point_to_local(p);
        let radial = DVec3::new(local.x, local.y, 0.0).try_normalize().unwrap_or(DVec3::X);
        self.frame.vector_to_world(radial)
    }

    pub fn uv(&self, p: DVec3) -> Uv {
        let local = self.frame.point_to_local(p);
        let tangent = DVec3::new(-local.y, local.x, 0.0).try_normalize().unwrap_or(DVec3::Y);
        Uv {
            u: azimuth_fraction(local.x, local.y),
            v: local.z / self.length,
            dpdu: self.frame.vector_to_world(tangent) * TAU * self.radius,
            dpdv: self.frame.w * self.length,
        }
    }

    pub fn bounds(&self) -> Aabb {
        let extent = rim_extent(self.frame.w, self.radius);
        let base = self.frame.origin;
        let apex = base + self.frame.w * self.length;
        Aabb::from_points(base.min(apex) - extent, base.max(apex) + extent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cylinder() -> Cylinder {
        Cylinder::new(DVec3::ZERO, DVec3::new(0.0, 0.0, 2.0), 1.0).unwrap()
    }

    #[test]
    fn test_side_hits() {
        let cyl = unit_cylinder();
        let ray = Ray::new(DVec3::new(5.0, 0.0, 1.0), -DVec3::X);

        let mut t = f64::INFINITY;
        assert!(cyl.intersect(&ray, 1e-5, &mut t));
        assert!((t - 4.0).abs() < 1e-9);
        assert!((cyl.normal(ray.at(t)) - DVec3::X).length() < 1e-9);

        let mut t2 = f64::INFINITY;
        assert!(cyl.intersect(&ray, t + 1e-5, &mut t2));
        assert!((t2 - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_open_ends() {
        let cyl = unit_cylinder();
        // Straight down the axis: no caps to hit.
        let mut t = f64::INFINITY;
        assert!(!cyl.intersect(&Ray::new(DVec3::new(0.0, 0.0, 5.0), -DVec3::Z), 1e-5, &mut t));

        // Above the top end.
        let mut t = f64::INFINITY;
        assert!(!cyl.intersect(&Ray::new(DVec3::new(5.0, 0.0, 3.0), -DVec3::X), 1e-5, &mut t));

        // Enters through the open top, hits the inside wall.
        let ray = Ray::new(DVec3::new(0.0, 0.0, 2.5), DVec3::new(1.0, 0.0, -1.0));
        let mut t = f64::INFINITY;
        assert!(cyl.intersect(&ray, 1e-5, &mut t));
        assert!((ray.at(t).x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounds() {
        let b = unit_cylinder().bounds();
        assert!((b.min() - DVec3::new(-1.0, -1.0, 0.0)).length() < 1e-12);
        assert!((b.max() - DVec3::new(1.0, 1.0, 2.0)).length() < 1e-12);
    }

    #[test]
    fn test_degenerate_cylinder() {
        assert!(Cylinder::new(DVec3::ZERO, DVec3::ZERO, 1.0).is_err());
        assert!(Cylinder::new(DVec3::ZERO, DVec3::Z, 0.0).is_err());
    }
}
