//! Triangle primitive, flat or Phong-shaded.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use rayshade_math::{Aabb, DVec2, DVec3, EPSILON};

use super::{SurfaceNormal, Uv};
use crate::{GeomError, GeomResult, Ray};

/// Determinants smaller than this mean the ray is parallel to the triangle.
const PARALLEL_EPSILON: f64 = 1.0e-12;

/// Möller-Trumbore ray-triangle test.
///
/// Returns the ray parameter and the barycentric coordinates of `v0 + e1`
/// and `v0 + e2`. Any `t` is returned; range checks are up to the caller.
pub(crate) fn moller_trumbore(
    origin: DVec3,
    direction: DVec3,
    v0: DVec3,
    e1: DVec3,
    e2: DVec3,
) -> Option<(f64, f64, f64)> {
    let h = direction.cross(e2);
    let a = e1.dot(h);

    // Ray is parallel to triangle
    if a.abs() < PARALLEL_EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(e1);
    let v = f * direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    Some((f * e2.dot(q), u, v))
}

/// A triangle. Phong triangles carry per-vertex normals that are
/// interpolated for shading; the geometric normal stays flat.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    vertices: [DVec3; 3],
    e1: DVec3,
    e2: DVec3,
    /// Unit geometric normal
    normal: DVec3,
    vertex_normals: Option<[DVec3; 3]>,
    uvs: Option<[DVec2; 3]>,
}

impl Triangle {
    /// A flat triangle.
    pub fn new(p0: DVec3, p1: DVec3, p2: DVec3) -> GeomResult<Self> {
        let e1 = p1 - p0;
        let e2 = p2 - p0;
        let cross = e1.cross(e2);
        if !cross.is_finite() || cross.length() < EPSILON * EPSILON {
            return Err(GeomError::degenerate("triangle", "coincident or collinear vertices"));
        }
        Ok(Self {
            vertices: [p0, p1, p2],
            e1,
            e2,
            normal: cross.normalize(),
            vertex_normals: None,
            uvs: None,
        })
    }

    /// A Phong-shaded triangle. The geometric normal is oriented to agree
    /// with the vertex normals.
    pub fn phong(points: [DVec3; 3], normals: [DVec3; 3]) -> GeomResult<Self> {
        let mut tri = Self::new(points[0], points[1], points[2])?;
        let mut unit = [DVec3::ZERO; 3];
        for (dst, n) in unit.iter_mut().zip(normals) {
            *dst = n
                .try_normalize()
                .ok_or(GeomError::degenerate("triangle", "zero-length vertex normal"))?;
        }
        if (unit[0] + unit[1] + unit[2]).dot(tri.normal) < 0.0 {
            tri.normal = -tri.normal;
        }
        tri.vertex_normals = Some(unit);
        Ok(tri)
    }

    /// Attach per-vertex texture coordinates.
    pub fn with_uvs(mut self, uvs: [DVec2; 3]) -> Self {
        self.uvs = Some(uvs);
        self
    }

    pub fn is_phong(&self) -> bool {
        self.vertex_normals.is_some()
    }

    pub fn intersect(&self, ray: &Ray, mindist: f64, maxdist: &mut f64) -> bool {
        let Some((t, _, _)) = moller_trumbore(ray.origin, ray.direction, self.vertices[0], self.e1, self.e2) else {
            return false;
        };
        if t <= mindist || t >= *maxdist {
            return false;
        }
        *maxdist = t;
        true
    }

    /// Barycentric weights of `v1` and `v2` for a point in the plane.
    fn barycentric(&self, p: DVec3) -> (f64, f64) {
        let vp = p - self.vertices[0];
        let d00 = self.e1.dot(self.e1);
        let d01 = self.e1.dot(self.e2);
        let d11 = self.e2.dot(self.e2);
        let d20 = vp.dot(self.e1);
        let d21 = vp.dot(self.e2);
        let denom = d00 * d11 - d01 * d01;
        ((d11 * d20 - d01 * d21) / denom, (d00 * d21 - d01 * d20) / denom)
    }

    pub fn normal(&self, p: DVec3) -> SurfaceNormal {
        let Some([n0, n1, n2]) = self.vertex_normals else {
            return SurfaceNormal::flat(self.normal);
        };
        let (b1, b2) = self.barycentric(p);
        let shading = (n0 * (1.0 - b1 - b2) + n1 * b1 + n2 * b2)
            .try_normalize()
            .unwrap_or(self.normal);
        SurfaceNormal {
            shading,
            geometric: self.normal,
        }
    }

    /// Interpolated texture coordinates, or the barycentric weights when the
    /// triangle has none.
    pub fn uv(&self, p: DVec3) -> Uv {
        let (b1, b2) = self.barycentric(p);
        let Some([t0, t1, t2]) = self.uvs else {
            return Uv {
                u: b1,
                v: b2,
                dpdu: self.e1,
                dpdv: self.e2,
            };
        };

        let uv = t0 * (1.0 - b1 - b2) + t1 * b1 + t2 * b2;
        let du1 = t1 - t0;
        let du2 = t2 - t0;
        let det = du1.x * du2.y - du1.y * du2.x;
        let (dpdu, dpdv) = if det.abs() < PARALLEL_EPSILON {
            (self.e1, self.e2)
        } else {
            let inv = 1.0 / det;
            (
                (self.e1 * du2.y - self.e2 * du1.y) * inv,
                (self.e2 * du1.x - self.e1 * du2.x) * inv,
            )
        };
        Uv {
            u: uv.x,
            v: uv.y,
            dpdu,
            dpdv,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_point_cloud(self.vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri() -> Triangle {
        Triangle::new(
            DVec3::new(-1.0, -1.0, 0.0),
            DVec3::new(1.0, -1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        )
        .unwrap()
    }

    #[test]
    fn test_triangle_hit() {
        let t0 = tri();
        let ray = Ray::new(DVec3::new(0.0, 0.0, 2.0), -DVec3::Z);
        let mut t = f64::INFINITY;
        assert!(t0.intersect(&ray, 1e-5, &mut t));
        assert!((t - 2.0).abs() < 1e-12);
        assert_eq!(t0.normal(ray.at(t)).geometric, DVec3::Z);
    }

    #[test]
    fn test_triangle_miss_outside_edge() {
        let ray = Ray::new(DVec3::new(2.0, 0.0, 2.0), -DVec3::Z);
        let mut t = f64::INFINITY;
        assert!(!tri().intersect(&ray, 1e-5, &mut t));
    }

    #[test]
    fn test_collinear_is_degenerate() {
        let err = Triangle::new(DVec3::ZERO, DVec3::X, DVec3::X * 2.0).unwrap_err();
        assert!(matches!(err, GeomError::Degenerate { kind: "triangle", .. }));
    }

    #[test]
    fn test_phong_normals_interpolate() {
        let points = [DVec3::ZERO, DVec3::X, DVec3::Y];
        let normals = [DVec3::Z, DVec3::new(1.0, 0.0, 1.0), DVec3::Z];
        let t = Triangle::phong(points, normals).unwrap();

        let at_v0 = t.normal(DVec3::ZERO);
        assert!((at_v0.shading - DVec3::Z).length() < 1e-12);
        let at_v1 = t.normal(DVec3::X);
        assert!((at_v1.shading - DVec3::new(1.0, 0.0, 1.0).normalize()).length() < 1e-12);
        assert_eq!(at_v1.geometric, DVec3::Z);
    }

    #[test]
    fn test_phong_geometric_normal_follows_vertex_normals() {
        let points = [DVec3::ZERO, DVec3::X, DVec3::Y];
        let t = Triangle::phong(points, [-DVec3::Z; 3]).unwrap();
        assert_eq!(t.normal(DVec3::splat(0.1)).geometric, -DVec3::Z);
    }

    #[test]
    fn test_uv_interpolation() {
        let t = Triangle::new(DVec3::ZERO, DVec3::X, DVec3::Y)
            .unwrap()
            .with_uvs([DVec2::ZERO, DVec2::new(2.0, 0.0), DVec2::new(0.0, 4.0)]);
        let uv = t.uv(DVec3::new(0.25, 0.25, 0.0));
        assert!((uv.u - 0.5).abs() < 1e-12);
        assert!((uv.v - 1.0).abs() < 1e-12);
        assert!((uv.dpdu - DVec3::X * 0.5).length() < 1e-12);
    }
}
