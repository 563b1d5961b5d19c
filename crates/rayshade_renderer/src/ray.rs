//! Ray type for recursive ray tracing.
//!
//! Besides origin and direction, a tracing ray remembers its recursion
//! depth, the sample it belongs to, its time (for motion blur) and the stack
//! of transparent media it is currently traveling through.

use std::sync::Arc;

use rayshade_math::{DVec3, Transform};

/// One entry of the medium stack: the refractive index and specular
/// transmission attenuation of the body a ray is inside of.
#[derive(Debug, Clone, PartialEq)]
pub struct Medium {
    pub index: f64,
    pub statten: f64,
    outer: Option<Arc<Medium>>,
}

impl Medium {
    /// Push a new medium on top of `stack`.
    pub fn push(stack: &Option<Arc<Medium>>, index: f64, statten: f64) -> Arc<Medium> {
        Arc::new(Medium {
            index,
            statten,
            outer: stack.clone(),
        })
    }

    /// The stack with this medium removed.
    pub fn pop(&self) -> Option<Arc<Medium>> {
        self.outer.clone()
    }

    /// Number of media on the stack, this one included.
    pub fn depth(&self) -> usize {
        1 + self.outer.as_ref().map_or(0, |m| m.depth())
    }
}

/// Refractive index of empty space.
pub const VACUUM_INDEX: f64 = 1.0;

/// A ray with origin, unit direction and tracing state.
#[derive(Debug, Clone)]
pub struct Ray {
    /// Origin point of the ray
    pub origin: DVec3,
    /// Unit direction vector
    pub direction: DVec3,
    /// Recursion depth: 0 for eye rays
    pub depth: u32,
    /// Index of the pixel sample that spawned this ray
    pub sample: u32,
    /// Time value for motion blur
    pub time: f64,
    /// Top of the medium stack, `None` outside every transparent body
    pub media: Option<Arc<Medium>>,
}

impl Ray {
    /// Create an eye ray. The direction is normalized.
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            depth: 0,
            sample: 0,
            time: 0.0,
            media: None,
        }
    }

    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    pub fn with_sample(mut self, sample: u32) -> Self {
        self.sample = sample;
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// A secondary ray one level deeper, sharing sample, time and media.
    pub fn spawn(&self, origin: DVec3, direction: DVec3) -> Ray {
        Ray {
            origin,
            direction: direction.normalize_or_zero(),
            depth: self.depth + 1,
            sample: self.sample,
            time: self.time,
            media: self.media.clone(),
        }
    }

    /// Compute a point along the ray at parameter t.
    #[inline]
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + t * self.direction
    }

    /// Refractive index of the medium the ray travels through.
    pub fn medium_index(&self) -> f64 {
        self.media.as_ref().map_or(VACUUM_INDEX, |m| m.index)
    }

    /// Geometric part of the ray, for bounding box tests.
    #[inline]
    pub fn to_math(&self) -> rayshade_math::Ray {
        rayshade_math::Ray::new(self.origin, self.direction, self.time)
    }

    /// Take the ray through `xf`, renormalizing the direction.
    ///
    /// Returns the transformed ray and the distance scale factor: a world
    /// distance `d` becomes `d * scale` in the new space.
    pub fn transformed(&self, xf: &Transform) -> (Ray, f64) {
        let mut geometric = self.to_math();
        let scale = xf.transform_ray(&mut geometric);
        let ray = Ray {
            origin: geometric.origin,
            direction: geometric.direction,
            ..self.clone()
        };
        (ray, scale)
    }
}

impl Default for Ray {
    fn default() -> Self {
        Ray::new(DVec3::ZERO, DVec3::Z)
    }
}
