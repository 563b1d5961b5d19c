//! Axis-aligned box primitive.

use rayshade_math::{Aabb, DVec3};

use crate::{GeomError, GeomResult, Ray};

/// A solid box between two corners.
#[derive(Debug, Clone, PartialEq)]
pub struct AaBox {
    min: DVec3,
    max: DVec3,
}

impl AaBox {
    /// Any two opposite corners. Boxes with no extent on some axis are degenerate.
    pub fn new(a: DVec3, b: DVec3) -> GeomResult<Self> {
        let min = a.min(b);
        let max = a.max(b);
        if !min.is_finite() || !max.is_finite() {
            return Err(GeomError::degenerate("box", "non-finite corner"));
        }
        if (max - min).min_element() <= 0.0 {
            return Err(GeomError::degenerate("box", "zero extent"));
        }
        Ok(Self { min, max })
    }

    pub fn intersect(&self, ray: &Ray, mindist: f64, maxdist: &mut f64) -> bool {
        let mut t_near = f64::NEG_INFINITY;
        let mut t_far = f64::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let dir = ray.direction[axis];
            if dir == 0.0 {
                if origin < self.min[axis] || origin > self.max[axis] {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / dir;
            let mut t0 = (self.min[axis] - origin) * inv;
            let mut t1 = (self.max[axis] - origin) * inv;
            if inv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_near > t_far {
                return false;
            }
        }

        let t = if t_near > mindist { t_near } else { t_far };
        if t <= mindist || t >= *maxdist {
            return false;
        }
        *maxdist = t;
        true
    }

    /// Normal of the face nearest to `p`.
    pub fn normal(&self, p: DVec3) -> DVec3 {
        let mut best = f64::INFINITY;
        let mut normal = DVec3::Z;
        for axis in 0..3 {
            let mut unit = DVec3::ZERO;
            unit[axis] = 1.0;
            let to_min = (p[axis] - self.min[axis]).abs();
            if to_min < best {
                best = to_min;
                normal = -unit;
            }
            let to_max = (p[axis] - self.max[axis]).abs();
            if to_max < best {
                best = to_max;
                normal = unit;
            }
        }
        normal
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.min, self.max)
    }

    /// Strictly inside the box.
    pub fn contains(&self, p: DVec3) -> bool {
        p.cmpgt(self.min).all() && p.cmplt(self.max).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> AaBox {
        AaBox::new(DVec3::splat(-1.0), DVec3::splat(1.0)).unwrap()
    }

    #[test]
    fn test_box_entry_and_exit() {
        let b = unit_box();
        let ray = Ray::new(DVec3::new(0.0, 0.0, 5.0), -DVec3::Z);

        let mut t = f64::INFINITY;
        assert!(b.intersect(&ray, 1e-5, &mut t));
        assert!((t - 4.0).abs() < 1e-12);
        assert_eq!(b.normal(ray.at(t)), DVec3::Z);

        let mut t2 = f64::INFINITY;
        assert!(b.intersect(&ray, t + 1e-5, &mut t2));
        assert!((t2 - 6.0).abs() < 1e-12);
        assert_eq!(b.normal(ray.at(t2)), -DVec3::Z);
    }

    #[test]
    fn test_box_axis_parallel_miss() {
        let b = unit_box();
        let mut t = f64::INFINITY;
        assert!(!b.intersect(&Ray::new(DVec3::new(2.0, 0.0, 5.0), -DVec3::Z), 1e-5, &mut t));
    }

    #[test]
    fn test_flat_box_is_degenerate() {
        assert!(AaBox::new(DVec3::ZERO, DVec3::new(1.0, 1.0, 0.0)).is_err());
    }
}
