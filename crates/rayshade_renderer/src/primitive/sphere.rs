//! Sphere primitive.

use rayshade_math::{Aabb, DVec3, EPSILON};
use std::f64::consts::{PI, TAU};

use super::{azimuth_fraction, Uv};
use crate::{GeomError, GeomResult, Ray};

/// A sphere given by center and radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    center: DVec3,
    radius: f64,
    radius_sq: f64,
}

impl Sphere {
    /// Create a new sphere. A radius at or below `EPSILON` is degenerate.
    pub fn new(center: DVec3, radius: f64) -> GeomResult<Self> {
        if !(radius > EPSILON) || !center.is_finite() {
            return Err(GeomError::degenerate("sphere", "radius too small"));
        }
        Ok(Self {
            center,
            radius,
            radius_sq: radius * radius,
        })
    }

    pub fn center(&self) -> DVec3 {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn intersect(&self, ray: &Ray, mindist: f64, maxdist: &mut f64) -> bool {
        let oc = self.center - ray.origin;
        let h = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius_sq;

        let discriminant = h * h - c;
        if discriminant < 0.0 {
            return false;
        }
        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = h - sqrtd;
        if root <= mindist {
            root = h + sqrtd;
        }
        if root <= mindist || root >= *maxdist {
            return false;
        }

        *maxdist = root;
        true
    }

    pub fn normal(&self, p: DVec3) -> DVec3 {
        (p - self.center) / self.radius
    }

    pub fn bounds(&self) -> Aabb {
        let r = DVec3::splat(self.radius);
        Aabb::from_points(self.center - r, self.center + r)
    }

    /// Strictly inside the sphere.
    pub fn contains(&self, p: DVec3) -> bool {
        (p - self.center).length_squared() < self.radius_sq
    }

    /// Longitude around +Z in u, colatitude from +Z in v.
    pub fn uv(&self, p: DVec3) -> Uv {
        let n = self.normal(p);
        let theta = n.z.clamp(-1.0, 1.0).acos();
        let u = azimuth_fraction(n.x, n.y);

        let dpdu = DVec3::new(-n.y, n.x, 0.0) * TAU * self.radius;
        let dpdu = if dpdu.length_squared() > 0.0 { dpdu } else { DVec3::X };
        let phi = u * TAU;
        let dpdv = DVec3::new(theta.cos() * phi.cos(), theta.cos() * phi.sin(), -theta.sin()) * PI * self.radius;

        Uv {
            u,
            v: theta / PI,
            dpdu,
            dpdv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_entry_and_exit() {
        let sphere = Sphere::new(DVec3::ZERO, 1.0).unwrap();
        let ray = Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::new(0.0, 0.0, -1.0));

        let mut t = f64::INFINITY;
        assert!(sphere.intersect(&ray, EPSILON, &mut t));
        assert!((t - 4.0).abs() < 1e-9);
        assert!((sphere.normal(ray.at(t)) - DVec3::Z).length() < 1e-9);

        let mut t2 = f64::INFINITY;
        assert!(sphere.intersect(&ray, t + EPSILON, &mut t2));
        assert!((t2 - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_sphere_respects_maxdist() {
        let sphere = Sphere::new(DVec3::ZERO, 1.0).unwrap();
        let ray = Ray::new(DVec3::new(0.0, 0.0, 5.0), -DVec3::Z);

        let mut t = 3.0;
        assert!(!sphere.intersect(&ray, EPSILON, &mut t));
        assert_eq!(t, 3.0);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = Sphere::new(DVec3::ZERO, 1.0).unwrap();
        let ray = Ray::new(DVec3::new(2.0, 0.0, 5.0), -DVec3::Z);
        let mut t = f64::INFINITY;
        assert!(!sphere.intersect(&ray, EPSILON, &mut t));
    }

    #[test]
    fn test_degenerate_radius() {
        assert!(Sphere::new(DVec3::ZERO, 0.0).is_err());
        assert!(Sphere::new(DVec3::ZERO, f64::NAN).is_err());
    }

    #[test]
    fn test_uv_range() {
        let sphere = Sphere::new(DVec3::ZERO, 2.0).unwrap();
        let uv = sphere.uv(DVec3::new(0.0, 2.0, 0.0));
        assert!((uv.u - 0.25).abs() < 1e-12);
        assert!((uv.v - 0.5).abs() < 1e-12);
    }
}
