//! The intersection dispatcher.
//!
//! Every node test goes through [`Tracer::intersect`]. It applies the
//! bounding box rejection, carries the ray into the node's space, delegates
//! to the primitive or aggregate, and records the node on the hit path with
//! distances converted back to the caller's space.

use std::sync::Arc;

use crate::geom::{Aggregate, GeomKind};
use crate::hit::{HitNode, HitPath};
use crate::{report, Geom, Ray, Severity, Tracer};

impl Tracer {
    /// Nearest hit of `ray` on `node` with `mindist < t < *maxdist`.
    ///
    /// Distances are in the space `ray` is expressed in, which is the space
    /// of `node`'s parent. On a hit `*maxdist` is set to the hit distance
    /// and the node's records are appended to `path`, innermost first. On a
    /// miss `path` is left as it was.
    pub fn intersect<'a>(
        &mut self,
        node: &'a Arc<Geom>,
        ray: &Ray,
        path: &mut HitPath<'a>,
        mindist: f64,
        maxdist: &mut f64,
    ) -> bool {
        if node.checks_bounds() {
            let bounds = node.bounds();
            if !bounds.is_unbounded() {
                let hit = bounds.hit_distance(&ray.to_math(), mindist, *maxdist).is_some();
                self.stats.bounds.record(hit);
                if !hit {
                    return false;
                }
            }
        }

        let mark = path.len();
        let transform = node.transform_at(ray.time);
        let (local, scale) = match &transform {
            Some(xf) => ray.transformed(&xf.invert()),
            None => (ray.clone(), 1.0),
        };
        let local_min = mindist * scale;
        let mut local_max = *maxdist * scale;

        let (hit, enter, flipped) = match node.kind() {
            GeomKind::Primitive(prim) => {
                let hit = prim.intersect(&local, local_min, &mut local_max);
                self.stats.record_primitive(prim.kind(), hit);
                let enter = hit && prim.enter(&local, local_min, local_max);
                (hit, enter, false)
            }
            GeomKind::Aggregate(agg) => {
                let hit = self.intersect_aggregate(agg, &local, path, local_min, &mut local_max);
                match path.get(mark) {
                    Some(inner) if hit => (true, inner.enter, inner.flipped),
                    _ => (false, false, false),
                }
            }
        };
        if !hit {
            path.truncate(mark);
            return false;
        }

        let record = HitNode {
            node,
            ray: local.to_math(),
            mindist: local_min,
            dist: local_max,
            enter,
            flipped,
            transform,
        };
        if let Err(overflow) = path.push(record) {
            self.stats.hit_path_overflows += 1;
            if !self.overflow_reported {
                self.overflow_reported = true;
                report(Severity::Warning, format_args!("{overflow} at {}; hit ignored", node.describe()));
            }
            path.truncate(mark);
            return false;
        }

        let dist = local_max / scale;
        if !(dist > mindist && dist < *maxdist) {
            path.truncate(mark);
            return false;
        }
        *maxdist = dist;
        true
    }

    fn intersect_aggregate<'a>(
        &mut self,
        agg: &'a Aggregate,
        ray: &Ray,
        path: &mut HitPath<'a>,
        mindist: f64,
        maxdist: &mut f64,
    ) -> bool {
        match agg {
            Aggregate::List(list) => list.intersect(self, ray, path, mindist, maxdist),
            Aggregate::Grid(grid) => grid.intersect(self, ray, path, mindist, maxdist),
            Aggregate::Csg(csg) => csg.intersect(self, ray, path, mindist, maxdist),
            Aggregate::Instance(object) => self.intersect(object, ray, path, mindist, maxdist),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Frame;
    use crate::primitive::{PrimitiveKind, Sphere, Torus};
    use rayshade_math::{DVec3, Transform, TransformChain, EPSILON, FAR_AWAY};

    fn unit_sphere() -> Geom {
        Geom::primitive(Sphere::new(DVec3::ZERO, 1.0).unwrap())
    }

    #[test]
    fn test_sphere_hit_from_outside() {
        let sphere = Arc::new(unit_sphere());
        let mut tracer = Tracer::new();
        let ray = Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::NEG_Z);
        let mut path = HitPath::new(4);
        let mut maxdist = FAR_AWAY;

        assert!(tracer.intersect(&sphere, &ray, &mut path, EPSILON, &mut maxdist));
        assert!((maxdist - 4.0).abs() < 1e-9);
        let inner = path.innermost().unwrap();
        assert!(inner.enter);
        assert_eq!(tracer.stats.primitive(PrimitiveKind::Sphere).hits, 1);

        // Past the near surface, the far one at 6.
        let mut path = HitPath::new(4);
        let mut maxdist = FAR_AWAY;
        assert!(tracer.intersect(&sphere, &ray, &mut path, 4.0 + EPSILON, &mut maxdist));
        assert!((maxdist - 6.0).abs() < 1e-9);
        assert!(!path.innermost().unwrap().enter);
    }

    #[test]
    fn test_scaled_instance_distances() {
        let sphere = Arc::new(unit_sphere());
        let scaled = Arc::new(
            Geom::instance(sphere)
                .with_transform(TransformChain::from_transform(Transform::scale(DVec3::splat(2.0)).unwrap())),
        );
        let mut tracer = Tracer::new();
        let ray = Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::NEG_Z);
        let mut path = HitPath::new(4);
        let mut maxdist = FAR_AWAY;

        assert!(tracer.intersect(&scaled, &ray, &mut path, EPSILON, &mut maxdist));
        assert!((maxdist - 3.0).abs() < 1e-9);
        assert_eq!(path.len(), 2);

        let world = path.to_world(0).transform_point(path.innermost().unwrap().local_point());
        assert!((world - DVec3::new(0.0, 0.0, 2.0)).length() < 1e-9);
    }

    #[test]
    fn test_miss_leaves_path_untouched() {
        let sphere = Arc::new(unit_sphere());
        let mut tracer = Tracer::new();
        let ray = Ray::new(DVec3::new(5.0, 5.0, 5.0), DVec3::Z);
        let mut path = HitPath::new(4);
        let mut maxdist = FAR_AWAY;
        assert!(!tracer.intersect(&sphere, &ray, &mut path, EPSILON, &mut maxdist));
        assert!(path.is_empty());
        assert_eq!(maxdist, FAR_AWAY);
    }

    #[test]
    fn test_bounds_rejection_is_counted() {
        let torus = Arc::new(Geom::primitive(Torus::new(DVec3::ZERO, DVec3::Z, 2.0, 0.5).unwrap()));
        torus.compute_bounds(&Frame::still(0));
        let mut tracer = Tracer::new();
        let ray = Ray::new(DVec3::new(10.0, 10.0, 10.0), DVec3::X);
        let mut path = HitPath::new(4);
        let mut maxdist = FAR_AWAY;
        assert!(!tracer.intersect(&torus, &ray, &mut path, EPSILON, &mut maxdist));
        assert_eq!(tracer.stats.bounds.tests, 1);
        assert_eq!(tracer.stats.bounds.hits, 0);
        assert_eq!(tracer.stats.primitive(PrimitiveKind::Torus).tests, 0);
    }

    #[test]
    fn test_overflow_fails_closed() {
        let sphere = Arc::new(unit_sphere());
        let nested = Arc::new(Geom::instance(Arc::new(Geom::instance(sphere))));
        let mut tracer = Tracer::new();
        let ray = Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::NEG_Z);
        let mut path = HitPath::new(2);
        let mut maxdist = FAR_AWAY;

        assert!(!tracer.intersect(&nested, &ray, &mut path, EPSILON, &mut maxdist));
        assert!(path.is_empty());
        assert_eq!(tracer.stats.hit_path_overflows, 1);
    }
}
