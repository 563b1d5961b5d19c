//! Metaball blobs.
//!
//! Each ball contributes `strength * (1 - d^2 / r^2)^2` inside its radius
//! and nothing outside. The surface is where the summed field equals the
//! threshold. Along a ray, each ball's field is a quartic in `t`, so between
//! consecutive ball entry/exit events the summed field is one quartic.

use rayshade_math::{Aabb, DVec3, EPSILON};

use super::roots::solve_quartic;
use crate::{GeomError, GeomResult, Ray};

/// One field source of a blob.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetaBall {
    pub center: DVec3,
    pub radius: f64,
    pub strength: f64,
}

impl MetaBall {
    pub fn new(center: DVec3, radius: f64, strength: f64) -> Self {
        Self {
            center,
            radius,
            strength,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    threshold: f64,
    balls: Vec<MetaBall>,
}

#[derive(Debug, Clone, Copy)]
struct Event {
    t: f64,
    ball: usize,
    entering: bool,
}

impl Blob {
    pub fn new(threshold: f64, balls: Vec<MetaBall>) -> GeomResult<Self> {
        if !(threshold > 0.0) {
            return Err(GeomError::degenerate("blob", "threshold must be positive"));
        }
        if balls.is_empty() {
            return Err(GeomError::degenerate("blob", "no metaballs"));
        }
        if balls.iter().any(|b| !(b.radius > EPSILON) || !b.strength.is_finite()) {
            return Err(GeomError::degenerate("blob", "metaball radius too small"));
        }
        Ok(Self { threshold, balls })
    }

    /// Quartic coefficients (t^4 first) of one ball's field along the ray.
    fn ball_coefficients(ball: &MetaBall, ray: &Ray) -> [f64; 5] {
        let inv_r2 = 1.0 / (ball.radius * ball.radius);
        let oc = ray.origin - ball.center;
        // g(t) = 1 - |oc + t d|^2 / r^2 = a + b t + c t^2
        let a = 1.0 - oc.length_squared() * inv_r2;
        let b = -2.0 * oc.dot(ray.direction) * inv_r2;
        let c = -inv_r2;
        let s = ball.strength;
        [
            s * c * c,
            s * 2.0 * b * c,
            s * (b * b + 2.0 * a * c),
            s * 2.0 * a * b,
            s * a * a,
        ]
    }

    pub fn intersect(&self, ray: &Ray, mindist: f64, maxdist: &mut f64) -> bool {
        let mut events = Vec::with_capacity(self.balls.len() * 2);
        for (i, ball) in self.balls.iter().enumerate() {
            let oc = ray.origin - ball.center;
            let b = oc.dot(ray.direction);
            let disc = b * b - (oc.length_squared() - ball.radius * ball.radius);
            if disc <= 0.0 {
                continue;
            }
            let sq = disc.sqrt();
            let (t0, t1) = (-b - sq, -b + sq);
            if t1 <= mindist || t0 >= *maxdist {
                continue;
            }
            events.push(Event { t: t0, ball: i, entering: true });
            events.push(Event { t: t1, ball: i, entering: false });
        }
        events.sort_by(|a, b| a.t.total_cmp(&b.t));

        let mut active = vec![false; self.balls.len()];
        for (k, event) in events.iter().enumerate() {
            active[event.ball] = event.entering;
            let Some(next) = events.get(k + 1) else {
                break;
            };

            let lo = event.t.max(mindist);
            let hi = next.t.min(*maxdist);
            if lo >= hi {
                continue;
            }

            let mut coeffs = [0.0; 5];
            for (ball, _) in self.balls.iter().zip(&active).filter(|(_, on)| **on) {
                for (acc, c) in coeffs.iter_mut().zip(Self::ball_coefficients(ball, ray)) {
                    *acc += c;
                }
            }
            if coeffs == [0.0; 5] {
                continue;
            }

            let roots = solve_quartic(coeffs[0], coeffs[1], coeffs[2], coeffs[3], coeffs[4] - self.threshold);
            if let Some(t) = roots.first_between(lo, hi) {
                *maxdist = t;
                return true;
            }
        }
        false
    }

    /// Field value at a point.
    pub fn field(&self, p: DVec3) -> f64 {
        self.balls
            .iter()
            .map(|ball| {
                let g = 1.0 - (p - ball.center).length_squared() / (ball.radius * ball.radius);
                if g > 0.0 {
                    ball.strength * g * g
                } else {
                    0.0
                }
            })
            .sum()
    }

    /// Outward normal: the negated field gradient.
    pub fn normal(&self, p: DVec3) -> DVec3 {
        let mut n = DVec3::ZERO;
        for ball in &self.balls {
            let inv_r2 = 1.0 / (ball.radius * ball.radius);
            let rel = p - ball.center;
            let g = 1.0 - rel.length_squared() * inv_r2;
            if g > 0.0 {
                n += rel * (4.0 * ball.strength * g * inv_r2);
            }
        }
        n.try_normalize()
            .or_else(|| (p - self.balls[0].center).try_normalize())
            .unwrap_or(DVec3::Z)
    }

    pub fn bounds(&self) -> Aabb {
        self.balls.iter().fold(Aabb::EMPTY, |acc, ball| {
            let r = DVec3::splat(ball.radius);
            Aabb::surrounding(&acc, &Aabb::from_points(ball.center - r, ball.center + r))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_ball_surface() {
        // field = (1 - d^2)^2 = 0.25  =>  d^2 = 0.5
        let blob = Blob::new(0.25, vec![MetaBall::new(DVec3::ZERO, 1.0, 1.0)]).unwrap();
        let ray = Ray::new(DVec3::new(0.0, 0.0, 5.0), -DVec3::Z);

        let mut t = f64::INFINITY;
        assert!(blob.intersect(&ray, 1e-5, &mut t));
        let expected = 5.0 - 0.5f64.sqrt();
        assert!((t - expected).abs() < 1e-7, "t = {t}");
        assert!((blob.field(ray.at(t)) - 0.25).abs() < 1e-7);
        assert!((blob.normal(ray.at(t)) - DVec3::Z).length() < 1e-9);

        let mut t2 = f64::INFINITY;
        assert!(blob.intersect(&ray, t + 1e-5, &mut t2));
        assert!((t2 - (5.0 + 0.5f64.sqrt())).abs() < 1e-7);
    }

    #[test]
    fn test_balls_merge_between_centers() {
        // Two weak balls that only reach the threshold together.
        let balls = vec![
            MetaBall::new(DVec3::new(-0.3, 0.0, 0.0), 1.0, 0.6),
            MetaBall::new(DVec3::new(0.3, 0.0, 0.0), 1.0, 0.6),
        ];
        let blob = Blob::new(0.7, balls).unwrap();
        assert!(blob.field(DVec3::ZERO) > 0.7);

        let ray = Ray::new(DVec3::new(0.0, 0.0, 5.0), -DVec3::Z);
        let mut t = f64::INFINITY;
        assert!(blob.intersect(&ray, 1e-5, &mut t));
        assert!((blob.field(ray.at(t)) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_weak_ball_is_invisible() {
        let blob = Blob::new(2.0, vec![MetaBall::new(DVec3::ZERO, 1.0, 1.0)]).unwrap();
        let mut t = f64::INFINITY;
        assert!(!blob.intersect(&Ray::new(DVec3::new(0.0, 0.0, 5.0), -DVec3::Z), 1e-5, &mut t));
    }

    #[test]
    fn test_degenerate_blobs() {
        assert!(Blob::new(0.5, vec![]).is_err());
        assert!(Blob::new(0.0, vec![MetaBall::new(DVec3::ZERO, 1.0, 1.0)]).is_err());
        assert!(Blob::new(0.5, vec![MetaBall::new(DVec3::ZERO, 0.0, 1.0)]).is_err());
    }
}
