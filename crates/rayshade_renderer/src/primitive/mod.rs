//! Leaf geometry.
//!
//! Every primitive lives in its own object space and answers the same
//! questions: where does a ray first hit me past `mindist`, what is my
//! normal at a surface point, what are my bounds. Dispatch is a plain match
//! over [`Primitive`]; the set of shapes is closed.

mod aabox;
mod blob;
mod cone;
mod cylinder;
mod disc;
mod heightfield;
mod plane;
mod polygon;
pub mod roots;
mod sphere;
mod torus;
mod triangle;

pub use aabox::AaBox;
pub use blob::{Blob, MetaBall};
pub use cone::Cone;
pub use cylinder::Cylinder;
pub use disc::Disc;
pub use heightfield::HeightField;
pub use plane::Plane;
pub use polygon::Polygon;
pub use sphere::Sphere;
pub use torus::Torus;
pub use triangle::Triangle;

pub(crate) use triangle::moller_trumbore;

use rayshade_math::{Aabb, DVec2, DVec3};

use crate::Ray;

/// Shading and geometric normals at a surface point, both unit length and
/// pointing out of the primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceNormal {
    pub shading: DVec3,
    pub geometric: DVec3,
}

impl SurfaceNormal {
    /// Same vector for shading and geometry.
    pub fn flat(n: DVec3) -> Self {
        Self {
            shading: n,
            geometric: n,
        }
    }
}

/// Surface parameterization at a point, with the partial derivatives of
/// position along u and v.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uv {
    pub u: f64,
    pub v: f64,
    pub dpdu: DVec3,
    pub dpdv: DVec3,
}

impl Uv {
    pub fn coords(&self) -> DVec2 {
        DVec2::new(self.u, self.v)
    }
}

/// The kinds of primitive, used for statistics and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Sphere,
    Plane,
    Box,
    Triangle,
    Polygon,
    Disc,
    Cone,
    Cylinder,
    Torus,
    Blob,
    HeightField,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 11] = [
        PrimitiveKind::Sphere,
        PrimitiveKind::Plane,
        PrimitiveKind::Box,
        PrimitiveKind::Triangle,
        PrimitiveKind::Polygon,
        PrimitiveKind::Disc,
        PrimitiveKind::Cone,
        PrimitiveKind::Cylinder,
        PrimitiveKind::Torus,
        PrimitiveKind::Blob,
        PrimitiveKind::HeightField,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Sphere => "sphere",
            PrimitiveKind::Plane => "plane",
            PrimitiveKind::Box => "box",
            PrimitiveKind::Triangle => "triangle",
            PrimitiveKind::Polygon => "polygon",
            PrimitiveKind::Disc => "disc",
            PrimitiveKind::Cone => "cone",
            PrimitiveKind::Cylinder => "cylinder",
            PrimitiveKind::Torus => "torus",
            PrimitiveKind::Blob => "blob",
            PrimitiveKind::HeightField => "heightfield",
        }
    }

    /// Position in [`PrimitiveKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A leaf shape in object space.
#[derive(Debug, Clone)]
pub enum Primitive {
    Sphere(Sphere),
    Plane(Plane),
    Box(AaBox),
    Triangle(Triangle),
    Polygon(Polygon),
    Disc(Disc),
    Cone(Cone),
    Cylinder(Cylinder),
    Torus(Torus),
    Blob(Blob),
    HeightField(HeightField),
}

macro_rules! impl_from_shape {
    ($($variant:ident($shape:ty)),* $(,)?) => {
        $(
            impl From<$shape> for Primitive {
                fn from(shape: $shape) -> Self {
                    Primitive::$variant(shape)
                }
            }
        )*
    };
}

impl_from_shape!(
    Sphere(Sphere),
    Plane(Plane),
    Box(AaBox),
    Triangle(Triangle),
    Polygon(Polygon),
    Disc(Disc),
    Cone(Cone),
    Cylinder(Cylinder),
    Torus(Torus),
    Blob(Blob),
    HeightField(HeightField),
);

impl Primitive {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::Sphere(_) => PrimitiveKind::Sphere,
            Primitive::Plane(_) => PrimitiveKind::Plane,
            Primitive::Box(_) => PrimitiveKind::Box,
            Primitive::Triangle(_) => PrimitiveKind::Triangle,
            Primitive::Polygon(_) => PrimitiveKind::Polygon,
            Primitive::Disc(_) => PrimitiveKind::Disc,
            Primitive::Cone(_) => PrimitiveKind::Cone,
            Primitive::Cylinder(_) => PrimitiveKind::Cylinder,
            Primitive::Torus(_) => PrimitiveKind::Torus,
            Primitive::Blob(_) => PrimitiveKind::Blob,
            Primitive::HeightField(_) => PrimitiveKind::HeightField,
        }
    }

    /// Nearest hit with `mindist < t < *maxdist`. On a hit `*maxdist` becomes
    /// the hit distance.
    pub fn intersect(&self, ray: &Ray, mindist: f64, maxdist: &mut f64) -> bool {
        match self {
            Primitive::Sphere(s) => s.intersect(ray, mindist, maxdist),
            Primitive::Plane(s) => s.intersect(ray, mindist, maxdist),
            Primitive::Box(s) => s.intersect(ray, mindist, maxdist),
            Primitive::Triangle(s) => s.intersect(ray, mindist, maxdist),
            Primitive::Polygon(s) => s.intersect(ray, mindist, maxdist),
            Primitive::Disc(s) => s.intersect(ray, mindist, maxdist),
            Primitive::Cone(s) => s.intersect(ray, mindist, maxdist),
            Primitive::Cylinder(s) => s.intersect(ray, mindist, maxdist),
            Primitive::Torus(s) => s.intersect(ray, mindist, maxdist),
            Primitive::Blob(s) => s.intersect(ray, mindist, maxdist),
            Primitive::HeightField(s) => s.intersect(ray, mindist, maxdist),
        }
    }

    /// Outward normals at a point on the surface.
    pub fn normal(&self, p: DVec3) -> SurfaceNormal {
        match self {
            Primitive::Sphere(s) => SurfaceNormal::flat(s.normal(p)),
            Primitive::Plane(s) => SurfaceNormal::flat(s.normal()),
            Primitive::Box(s) => SurfaceNormal::flat(s.normal(p)),
            Primitive::Triangle(s) => s.normal(p),
            Primitive::Polygon(s) => SurfaceNormal::flat(s.normal()),
            Primitive::Disc(s) => SurfaceNormal::flat(s.normal()),
            Primitive::Cone(s) => SurfaceNormal::flat(s.normal(p)),
            Primitive::Cylinder(s) => SurfaceNormal::flat(s.normal(p)),
            Primitive::Torus(s) => SurfaceNormal::flat(s.normal(p)),
            Primitive::Blob(s) => SurfaceNormal::flat(s.normal(p)),
            Primitive::HeightField(s) => SurfaceNormal::flat(s.normal(p)),
        }
    }

    /// Object-space bounds; [`Aabb::UNBOUNDED`] for infinite shapes.
    pub fn bounds(&self) -> Aabb {
        match self {
            Primitive::Sphere(s) => s.bounds(),
            Primitive::Plane(_) => Aabb::UNBOUNDED,
            Primitive::Box(s) => s.bounds(),
            Primitive::Triangle(s) => s.bounds(),
            Primitive::Polygon(s) => s.bounds(),
            Primitive::Disc(s) => s.bounds(),
            Primitive::Cone(s) => s.bounds(),
            Primitive::Cylinder(s) => s.bounds(),
            Primitive::Torus(s) => s.bounds(),
            Primitive::Blob(s) => s.bounds(),
            Primitive::HeightField(s) => s.bounds(),
        }
    }

    /// Surface parameterization, for shapes that have one.
    pub fn uv(&self, p: DVec3) -> Option<Uv> {
        match self {
            Primitive::Sphere(s) => Some(s.uv(p)),
            Primitive::Plane(s) => Some(s.uv(p)),
            Primitive::Triangle(s) => Some(s.uv(p)),
            Primitive::Disc(s) => Some(s.uv(p)),
            Primitive::Cone(s) => Some(s.uv(p)),
            Primitive::Cylinder(s) => Some(s.uv(p)),
            Primitive::Torus(s) => Some(s.uv(p)),
            Primitive::Box(_) | Primitive::Polygon(_) | Primitive::Blob(_) | Primitive::HeightField(_) => None,
        }
    }

    /// Whether the ray, arriving at `hitdist`, is entering the solid.
    pub fn enter(&self, ray: &Ray, mindist: f64, hitdist: f64) -> bool {
        match self {
            Primitive::Sphere(s) => !s.contains(ray.at(mindist)),
            Primitive::Box(s) => !s.contains(ray.at(mindist)),
            _ => ray.direction.dot(self.normal(ray.at(hitdist)).geometric) < 0.0,
        }
    }

    /// Shapes whose own test is expensive enough to be worth a bounding box
    /// rejection first.
    pub fn checks_bounds(&self) -> bool {
        matches!(
            self,
            Primitive::Torus(_) | Primitive::Blob(_) | Primitive::HeightField(_) | Primitive::Polygon(_)
        )
    }
}

/// Two unit vectors completing `w` (unit) to a right-handed frame.
pub(crate) fn orthonormal_basis(w: DVec3) -> (DVec3, DVec3) {
    let helper = if w.x.abs() > 0.9 { DVec3::Y } else { DVec3::X };
    let u = helper.cross(w).normalize();
    let v = w.cross(u);
    (u, v)
}

/// Orthonormal frame with `w` along a shape's axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AxisFrame {
    pub origin: DVec3,
    pub u: DVec3,
    pub v: DVec3,
    pub w: DVec3,
}

impl AxisFrame {
    pub fn new(origin: DVec3, w: DVec3) -> Self {
        let (u, v) = orthonormal_basis(w);
        Self { origin, u, v, w }
    }

    pub fn point_to_local(&self, p: DVec3) -> DVec3 {
        self.vector_to_local(p - self.origin)
    }

    pub fn vector_to_local(&self, d: DVec3) -> DVec3 {
        DVec3::new(d.dot(self.u), d.dot(self.v), d.dot(self.w))
    }

    pub fn vector_to_world(&self, d: DVec3) -> DVec3 {
        self.u * d.x + self.v * d.y + self.w * d.z
    }
}

/// Half-extent on each world axis of a circle of `radius` around unit `axis`.
pub(crate) fn rim_extent(axis: DVec3, radius: f64) -> DVec3 {
    DVec3::new(
        (1.0 - axis.x * axis.x).max(0.0).sqrt(),
        (1.0 - axis.y * axis.y).max(0.0).sqrt(),
        (1.0 - axis.z * axis.z).max(0.0).sqrt(),
    ) * radius
}

/// Azimuth of `(x, y)` mapped to `[0, 1)`.
pub(crate) fn azimuth_fraction(x: f64, y: f64) -> f64 {
    let phi = y.atan2(x);
    let u = phi / std::f64::consts::TAU;
    if u < 0.0 {
        u + 1.0
    } else {
        u
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_are_unique() {
        let mut names: Vec<_> = PrimitiveKind::ALL.iter().map(|k| k.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), PrimitiveKind::ALL.len());
        for (i, kind) in PrimitiveKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_orthonormal_basis() {
        for w in [DVec3::X, DVec3::Y, DVec3::Z, DVec3::new(1.0, 2.0, 3.0).normalize()] {
            let (u, v) = orthonormal_basis(w);
            assert!(u.dot(w).abs() < 1e-12);
            assert!(v.dot(w).abs() < 1e-12);
            assert!(u.dot(v).abs() < 1e-12);
            assert!((u.cross(v) - w).length() < 1e-12);
        }
    }

    #[test]
    fn test_enter_uses_geometric_normal() {
        let plane: Primitive = Plane::new(DVec3::ZERO, DVec3::Z).unwrap().into();
        let down = Ray::new(DVec3::new(0.0, 0.0, 1.0), -DVec3::Z);
        let mut t = f64::INFINITY;
        assert!(plane.intersect(&down, 1e-5, &mut t));
        assert!(plane.enter(&down, 1e-5, t));

        let up = Ray::new(DVec3::new(0.0, 0.0, -1.0), DVec3::Z);
        let mut t = f64::INFINITY;
        assert!(plane.intersect(&up, 1e-5, &mut t));
        assert!(!plane.enter(&up, 1e-5, t));
    }
}
