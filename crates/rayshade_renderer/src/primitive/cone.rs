//! Open truncated cone.

use rayshade_math::{Aabb, DVec3, EPSILON};
use std::f64::consts::TAU;

use super::{azimuth_fraction, rim_extent, roots::solve_quadratic, AxisFrame, Uv};
use crate::{GeomError, GeomResult, Ray};

/// An uncapped cone whose radius varies linearly from `base_radius` at the
/// base to `apex_radius` at the apex.
#[derive(Debug, Clone, PartialEq)]
pub struct Cone {
    frame: AxisFrame,
    length: f64,
    base_radius: f64,
    /// Radius change per unit of axis
    slope: f64,
}

impl Cone {
    pub fn new(base: DVec3, base_radius: f64, apex: DVec3, apex_radius: f64) -> GeomResult<Self> {
        if base_radius < 0.0 || apex_radius < 0.0 {
            return Err(GeomError::degenerate("cone", "negative radius"));
        }
        if base_radius <= EPSILON && apex_radius <= EPSILON {
            return Err(GeomError::degenerate("cone", "both radii are zero"));
        }
        let axis = apex - base;
        let length = axis.length();
        if !(length > EPSILON) {
            return Err(GeomError::degenerate("cone", "zero-length axis"));
        }
        Ok(Self {
            frame: AxisFrame::new(base, axis / length),
            length,
            base_radius,
            slope: (apex_radius - base_radius) / length,
        })
    }

    fn radius_at(&self, z: f64) -> f64 {
        self.base_radius + self.slope * z
    }

    pub fn intersect(&self, ray: &Ray, mindist: f64, maxdist: &mut f64) -> bool {
        let o = self.frame.point_to_local(ray.origin);
        let d = self.frame.vector_to_local(ray.direction);
        let k = self.slope;
        let r0 = self.radius_at(o.z);

        // x^2 + y^2 = (r0 + k t dz)^2 along the ray
        let a = d.x * d.x + d.y * d.y - k * k * d.z * d.z;
        let b = 2.0 * (o.x * d.x + o.y * d.y - k * d.z * r0);
        let c = o.x * o.x + o.y * o.y - r0 * r0;

        for t in solve_quadratic(a, b, c).sorted().iter() {
            if t <= mindist || t >= *maxdist {
                continue;
            }
            let z = o.z + t * d.z;
            // The double cone's mirror sheet has negative radius.
            if (0.0..=self.length).contains(&z) && self.radius_at(z) >= 0.0 {
                *maxdist = t;
                return true;
            }
        }
        false
    }

    pub fn normal(&self, p: DVec3) -> DVec3 {
        let local = self.frame.point_to_local(p);
        let Some(radial) = DVec3::new(local.x, local.y, 0.0).try_normalize() else {
            return if self.slope > 0.0 { -self.frame.w } else { self.frame.w };
        };
        let n = DVec3::new(radial.x, radial.y, -self.slope).normalize();
        self.frame.vector_to_world(n)
    }

    pub fn uv(&self, p: DVec3) -> Uv {
        let local = self.frame.point_to_local(p);
        let tangent = DVec3::new(-local.y, local.x, 0.0).try_normalize().unwrap_or(DVec3::Y);
        let radial = DVec3::new(local.x, local.y, 0.0).try_normalize().unwrap_or(DVec3::X);
        Uv {
            u: azimuth_fraction(local.x, local.y),
            v: local.z / self.length,
            dpdu: self.frame.vector_to_world(tangent) * TAU * self.radius_at(local.z).max(EPSILON),
            dpdv: self.frame.vector_to_world(DVec3::new(radial.x * self.slope, radial.y * self.slope, 1.0))
                * self.length,
        }
    }

    pub fn bounds(&self) -> Aabb {
        let base = self.frame.origin;
        let apex = base + self.frame.w * self.length;
        let base_extent = rim_extent(self.frame.w, self.base_radius);
        let apex_extent = rim_extent(self.frame.w, self.radius_at(self.length));
        Aabb::from_points(
            (base - base_extent).min(apex - apex_extent),
            (base + base_extent).max(apex + apex_extent),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cone_side_hit_and_normal() {
        // Radius 1 at z = 0 narrowing to a point at z = 1.
        let cone = Cone::new(DVec3::ZERO, 1.0, DVec3::Z, 0.0).unwrap();
        let ray = Ray::new(DVec3::new(5.0, 0.0, 0.5), -DVec3::X);

        let mut t = f64::INFINITY;
        assert!(cone.intersect(&ray, 1e-5, &mut t));
        assert!((t - 4.5).abs() < 1e-9);

        let n = cone.normal(ray.at(t));
        let expected = DVec3::new(1.0, 0.0, 1.0).normalize();
        assert!((n - expected).length() < 1e-9);
    }

    #[test]
    fn test_mirror_sheet_is_ignored() {
        let cone = Cone::new(DVec3::ZERO, 1.0, DVec3::Z, 0.0).unwrap();
        // Passes through the mirror cone above the apex only.
        let ray = Ray::new(DVec3::new(5.0, 0.0, 1.5), -DVec3::X);
        let mut t = f64::INFINITY;
        assert!(!cone.intersect(&ray, 1e-5, &mut t));
    }

    #[test]
    fn test_truncated_cone_bounds() {
        let cone = Cone::new(DVec3::ZERO, 2.0, DVec3::new(0.0, 0.0, 3.0), 1.0).unwrap();
        let b = cone.bounds();
        assert!((b.min() - DVec3::new(-2.0, -2.0, 0.0)).length() < 1e-12);
        assert!((b.max() - DVec3::new(2.0, 2.0, 3.0)).length() < 1e-12);
    }

    #[test]
    fn test_degenerate_cone() {
        assert!(Cone::new(DVec3::ZERO, 0.0, DVec3::Z, 0.0).is_err());
        assert!(Cone::new(DVec3::ZERO, 1.0, DVec3::ZERO, 0.5).is_err());
        assert!(Cone::new(DVec3::ZERO, -1.0, DVec3::Z, 0.5).is_err());
    }
}
