//! Rayshade renderer core.
//!
//! A recursive Whitted-style ray tracer: analytic primitives, CSG, voxel
//! grids and instancing under a scene graph of shared nodes, with Phong
//! shading, reflection, refraction and filtered shadows.
//!
//! Scene data is immutable once [`Scene::prepare`] has run for a frame.
//! All mutable tracing state (statistics, mailbox, shadow cache) lives in a
//! [`Tracer`], one per worker.

mod camera;
mod csg;
mod error;
mod geom;
mod grid;
mod hit;
mod intersect;
mod light;
mod list;
mod options;
pub mod primitive;
mod ray;
mod renderer;
mod scene;
mod shade;
mod shadow;
mod stats;
mod surface;
mod tracer;

pub use camera::Camera;
pub use csg::{Csg, CsgOp};
pub use error::{report, GeomError, GeomResult, HitPathOverflow, OkOrReport, Severity};
pub use geom::{Aggregate, Frame, Geom, GeomId, GeomKind, SurfaceFlags};
pub use grid::Grid;
pub use hit::{HitNode, HitPath};
pub use light::{Light, LightKind, LightSample};
pub use list::List;
pub use options::{OptionsError, RenderOptions, ShadowOptions};
pub use primitive::{
    AaBox, Blob, Cone, Cylinder, Disc, HeightField, MetaBall, Plane, Polygon, Primitive, PrimitiveKind, Sphere,
    SurfaceNormal, Torus, Triangle, Uv,
};
pub use ray::{Medium, Ray, VACUUM_INDEX};
pub use renderer::{color_to_rgb, linear_to_gamma, render, render_pixel, ImageBuffer};
pub use scene::Scene;
pub use shadow::Visibility;
pub use stats::{Counter, Stats};
pub use surface::{Checker, Color, Surface, Texture, TextureHit};
pub use tracer::{Hit, Tracer};

/// Re-export the math types scenes are built from.
pub use rayshade_math::{
    Aabb, AnimatedTransform, DVec2, DVec3, Interval, Keyframe, Transform, TransformChain, EPSILON, FAR_AWAY,
};
