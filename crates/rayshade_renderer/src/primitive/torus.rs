//! Torus primitive.
//!
//! Solved as a quartic in the torus' own frame. The ray origin is first
//! moved up to the bounding sphere so that the polynomial coefficients stay
//! of comparable magnitude for distant rays.

use rayshade_math::{Aabb, DVec3, EPSILON};
use std::f64::consts::TAU;

use super::{azimuth_fraction, roots::solve_quartic, AxisFrame, Uv};
use crate::{GeomError, GeomResult, Ray};

/// A ring torus around `axis` through `center`.
#[derive(Debug, Clone, PartialEq)]
pub struct Torus {
    frame: AxisFrame,
    /// Distance from the center to the middle of the tube
    major: f64,
    /// Tube radius
    minor: f64,
}

impl Torus {
    pub fn new(center: DVec3, axis: DVec3, major: f64, minor: f64) -> GeomResult<Self> {
        if !(minor > EPSILON) {
            return Err(GeomError::degenerate("torus", "tube radius too small"));
        }
        if !(major > EPSILON) {
            return Err(GeomError::degenerate("torus", "swept radius too small"));
        }
        let axis = axis
            .try_normalize()
            .ok_or(GeomError::degenerate("torus", "zero-length axis"))?;
        Ok(Self {
            frame: AxisFrame::new(center, axis),
            major,
            minor,
        })
    }

    pub fn intersect(&self, ray: &Ray, mindist: f64, maxdist: &mut f64) -> bool {
        let mut o = self.frame.point_to_local(ray.origin);
        let d = self.frame.vector_to_local(ray.direction);

        let reach = self.major + self.minor;
        let shift = (-o.dot(d) - reach).max(0.0);
        o += d * shift;

        let r2 = self.major * self.major;
        let g = o.length_squared() + r2 - self.minor * self.minor;
        let h = o.dot(d);
        let planar_dd = d.x * d.x + d.y * d.y;
        let planar_od = o.x * d.x + o.y * d.y;
        let planar_oo = o.x * o.x + o.y * o.y;

        let roots = solve_quartic(
            1.0,
            4.0 * h,
            4.0 * h * h + 2.0 * g - 4.0 * r2 * planar_dd,
            4.0 * h * g - 8.0 * r2 * planar_od,
            g * g - 4.0 * r2 * planar_oo,
        );

        match roots.first_between(mindist - shift, *maxdist - shift) {
            Some(t) => {
                *maxdist = t + shift;
                true
            }
            None => false,
        }
    }

    pub fn normal(&self, p: DVec3) -> DVec3 {
        let local = self.frame.point_to_local(p);
        let ring = DVec3::new(local.x, local.y, 0.0).try_normalize().unwrap_or(DVec3::X) * self.major;
        let n = (local - ring).try_normalize().unwrap_or(DVec3::Z);
        self.frame.vector_to_world(n)
    }

    /// Angle around the axis in u, angle around the tube in v.
    pub fn uv(&self, p: DVec3) -> Uv {
        let local = self.frame.point_to_local(p);
        let rho = (local.x * local.x + local.y * local.y).sqrt();
        let around = DVec3::new(-local.y, local.x, 0.0).try_normalize().unwrap_or(DVec3::Y);
        let n = self.normal(p);
        let tube_tangent = self.frame.vector_to_world(around).cross(n);
        Uv {
            u: azimuth_fraction(local.x, local.y),
            v: azimuth_fraction(rho - self.major, local.z),
            dpdu: self.frame.vector_to_world(around) * TAU * rho.max(EPSILON),
            dpdv: tube_tangent * TAU * self.minor,
        }
    }

    /// Exact bounds: the swept circle plus the tube on every side.
    pub fn bounds(&self) -> Aabb {
        let w = self.frame.w;
        let outer = self.major + self.minor;
        let extent = DVec3::new(
            outer * (1.0 - w.x * w.x).max(0.0).sqrt() + self.minor * w.x.abs(),
            outer * (1.0 - w.y * w.y).max(0.0).sqrt() + self.minor * w.y.abs(),
            outer * (1.0 - w.z * w.z).max(0.0).sqrt() + self.minor * w.z.abs(),
        );
        let c = self.frame.origin;
        Aabb::from_points(c - extent, c + extent)
    }
}
