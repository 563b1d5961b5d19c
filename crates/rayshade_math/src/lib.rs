// Re-export glam for convenience
pub use glam::*;

// Rayshade math types
mod aabb;
mod interval;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;
pub use transform::{AnimatedTransform, Keyframe, Transform, TransformChain, TransformStep};

/// Distance tolerance used for self-intersection avoidance and bounds padding.
pub const EPSILON: f64 = 1.0e-5;

/// Effectively infinite ray distance.
pub const FAR_AWAY: f64 = 1.0e14;
