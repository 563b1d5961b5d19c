//! Flat disc.

use rayshade_math::{Aabb, DVec3, EPSILON};
use std::f64::consts::TAU;

use super::{azimuth_fraction, orthonormal_basis, rim_extent, Uv};
use crate::{GeomError, GeomResult, Ray};

#[derive(Debug, Clone, PartialEq)]
pub struct Disc {
    center: DVec3,
    normal: DVec3,
    radius: f64,
    d: f64,
    u_axis: DVec3,
    v_axis: DVec3,
}

impl Disc {
    pub fn new(center: DVec3, normal: DVec3, radius: f64) -> GeomResult<Self> {
        if !(radius > EPSILON) {
            return Err(GeomError::degenerate("disc", "radius too small"));
        }
        let normal = normal
            .try_normalize()
            .ok_or(GeomError::degenerate("disc", "zero-length normal"))?;
        let (u_axis, v_axis) = orthonormal_basis(normal);
        Ok(Self {
            center,
            normal,
            radius,
            d: normal.dot(center),
            u_axis,
            v_axis,
        })
    }

    pub fn intersect(&self, ray: &Ray, mindist: f64, maxdist: &mut f64) -> bool {
        let denom = self.normal.dot(ray.direction);
        if denom.abs() < 1.0e-12 {
            return false;
        }
        let t = (self.d - self.normal.dot(ray.origin)) / denom;
        if t <= mindist || t >= *maxdist {
            return false;
        }
        if (ray.at(t) - self.center).length_squared() > self.radius * self.radius {
            return false;
        }
        *maxdist = t;
        true
    }

    pub fn normal(&self) -> DVec3 {
        self.normal
    }

    /// Angle around the center in u, radial fraction in v.
    pub fn uv(&self, p: DVec3) -> Uv {
        let rel = p - self.center;
        let x = rel.dot(self.u_axis);
        let y = rel.dot(self.v_axis);
        let r = (x * x + y * y).sqrt();
        let radial = if r > 0.0 { (self.u_axis * x + self.v_axis * y) / r } else { self.u_axis };
        let tangent = self.normal.cross(radial);
        Uv {
            u: azimuth_fraction(x, y),
            v: r / self.radius,
            dpdu: tangent * TAU * r.max(EPSILON),
            dpdv: radial * self.radius,
        }
    }

    /// Exact bounds of the rim: on each axis the disc extends
    /// `radius * sqrt(1 - n_axis^2)` from its center.
    pub fn bounds(&self) -> Aabb {
        let extent = rim_extent(self.normal, self.radius);
        Aabb::from_points(self.center - extent, self.center + extent)
    }
}
