// Object-to-world transforms for ray tracing.
//
// A `Transform` pairs a matrix with its cached inverse so that rays can be
// taken into object space and normals brought back out without inverting on
// every intersection. A `TransformChain` is the ordered list of transforms
// attached to one geometry node; any step may be animated over time.

use crate::{Aabb, DMat4, DQuat, DVec3, Ray};

/// Determinants smaller than this are treated as singular.
const SINGULAR_DETERMINANT: f64 = 1.0e-12;

/// An affine transform with cached inverse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub matrix: DMat4,
    pub inverse: DMat4,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        matrix: DMat4::IDENTITY,
        inverse: DMat4::IDENTITY,
    };

    /// Wrap a matrix, caching its inverse. Returns `None` for a singular matrix.
    pub fn new(matrix: DMat4) -> Option<Self> {
        if !matrix.is_finite() || matrix.determinant().abs() < SINGULAR_DETERMINANT {
            return None;
        }
        Some(Self {
            matrix,
            inverse: matrix.inverse(),
        })
    }

    pub fn translate(offset: DVec3) -> Self {
        Self {
            matrix: DMat4::from_translation(offset),
            inverse: DMat4::from_translation(-offset),
        }
    }

    /// Non-uniform scale. Returns `None` if any factor is zero.
    pub fn scale(factors: DVec3) -> Option<Self> {
        Self::new(DMat4::from_scale(factors))
    }

    /// Rotation of `angle` radians about `axis`. Returns `None` for a zero axis.
    pub fn rotate(axis: DVec3, angle: f64) -> Option<Self> {
        let axis = axis.try_normalize()?;
        let matrix = DMat4::from_axis_angle(axis, angle);
        Some(Self {
            matrix,
            inverse: matrix.transpose(),
        })
    }

    /// Compose: apply `self` first, then `outer`.
    pub fn then(&self, outer: &Transform) -> Transform {
        Transform {
            matrix: outer.matrix * self.matrix,
            inverse: self.inverse * outer.inverse,
        }
    }

    /// The reverse transform.
    pub fn invert(&self) -> Transform {
        Transform {
            matrix: self.inverse,
            inverse: self.matrix,
        }
    }

    #[inline]
    pub fn transform_point(&self, p: DVec3) -> DVec3 {
        self.matrix.transform_point3(p)
    }

    /// Transform a direction (w = 0); translation does not apply.
    #[inline]
    pub fn transform_vector(&self, v: DVec3) -> DVec3 {
        self.matrix.transform_vector3(v)
    }

    /// Transform a surface normal using the inverse-transpose. Not normalized.
    #[inline]
    pub fn transform_normal(&self, n: DVec3) -> DVec3 {
        self.inverse.transpose().transform_vector3(n)
    }

    /// Transform a ray in place, renormalizing its direction.
    ///
    /// Returns the length of the transformed (unnormalized) direction. A
    /// distance `d` along the original ray corresponds to `d * scale` along
    /// the transformed one.
    pub fn transform_ray(&self, ray: &mut Ray) -> f64 {
        ray.origin = self.transform_point(ray.origin);
        let direction = self.transform_vector(ray.direction);
        let scale = direction.length();
        ray.direction = if scale > 0.0 { direction / scale } else { direction };
        scale
    }

    /// Bounding box of the eight transformed corners.
    pub fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_unbounded() {
            return *aabb;
        }
        Aabb::from_point_cloud(aabb.corners().iter().map(|&c| self.transform_point(c)))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Scale, rotation and translation at one instant of an animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub scale: DVec3,
    pub rotation: DQuat,
    pub translation: DVec3,
}

impl Keyframe {
    pub fn new(scale: DVec3, rotation: DQuat, translation: DVec3) -> Self {
        Self {
            scale,
            rotation,
            translation,
        }
    }

    pub fn from_translation(translation: DVec3) -> Self {
        Self::new(DVec3::ONE, DQuat::IDENTITY, translation)
    }

    fn lerp(&self, other: &Keyframe, s: f64) -> Keyframe {
        Keyframe {
            scale: self.scale.lerp(other.scale, s),
            rotation: self.rotation.slerp(other.rotation, s),
            translation: self.translation.lerp(other.translation, s),
        }
    }

    fn matrix(&self) -> DMat4 {
        DMat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// A transform interpolated between two keyframes over `[start_time, end_time]`.
///
/// Times outside the interval clamp to the nearer keyframe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimatedTransform {
    start: Keyframe,
    end: Keyframe,
    start_time: f64,
    end_time: f64,
}

impl AnimatedTransform {
    /// Returns `None` if either keyframe has a zero scale factor or the
    /// time interval is reversed.
    pub fn new(start: Keyframe, end: Keyframe, start_time: f64, end_time: f64) -> Option<Self> {
        let degenerate = |k: &Keyframe| k.scale.abs().min_element() < SINGULAR_DETERMINANT;
        if degenerate(&start) || degenerate(&end) || end_time < start_time {
            return None;
        }
        Some(Self {
            start,
            end,
            start_time,
            end_time,
        })
    }

    pub fn at(&self, time: f64) -> Transform {
        let span = self.end_time - self.start_time;
        let s = if span > 0.0 {
            ((time - self.start_time) / span).clamp(0.0, 1.0)
        } else if time < self.start_time {
            0.0
        } else {
            1.0
        };
        let matrix = self.start.lerp(&self.end, s).matrix();
        Transform {
            matrix,
            inverse: matrix.inverse(),
        }
    }
}

/// One element of a transform chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformStep {
    Static(Transform),
    Animated(AnimatedTransform),
}

impl TransformStep {
    fn at(&self, time: f64) -> Transform {
        match self {
            TransformStep::Static(xf) => *xf,
            TransformStep::Animated(anim) => anim.at(time),
        }
    }
}

/// Ordered object-to-world transforms; the first step is applied first.
///
/// A chain made only of static steps caches its composition.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformChain {
    steps: Vec<TransformStep>,
    composed: Option<Transform>,
}

impl TransformChain {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            composed: Some(Transform::IDENTITY),
        }
    }

    pub fn from_transform(xf: Transform) -> Self {
        let mut chain = Self::new();
        chain.push(xf);
        chain
    }

    /// Append a static transform, applied after every existing step.
    pub fn push(&mut self, xf: Transform) {
        self.steps.push(TransformStep::Static(xf));
        self.composed = self.composed.map(|acc| acc.then(&xf));
    }

    /// Append an animated transform; the chain stops caching its composition.
    pub fn push_animated(&mut self, anim: AnimatedTransform) {
        self.steps.push(TransformStep::Animated(anim));
        self.composed = None;
    }

    pub fn is_animated(&self) -> bool {
        self.composed.is_none()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The composed object-to-world transform at `time`.
    pub fn at(&self, time: f64) -> Transform {
        if let Some(xf) = self.composed {
            return xf;
        }
        self.steps
            .iter()
            .fold(Transform::IDENTITY, |acc, step| acc.then(&step.at(time)))
    }
}

impl Default for TransformChain {
    fn default() -> Self {
        Self::new()
    }
}
