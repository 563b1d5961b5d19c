//! Plain lists of objects, tested one after another.
//!
//! Children without finite bounds go first so that a near plane can shrink
//! the search distance before any bounded child is tested.

use std::sync::{Arc, PoisonError, RwLock};

use rayshade_math::Aabb;

use crate::geom::Frame;
use crate::hit::HitPath;
use crate::{Geom, Ray, Tracer};

#[derive(Debug, Default)]
pub struct List {
    children: Vec<Arc<Geom>>,
    /// Test order, unbounded children first; declaration order until bounds are known
    order: RwLock<Option<Arc<[usize]>>>,
}

impl List {
    pub fn new(children: Vec<Arc<Geom>>) -> Self {
        Self {
            children,
            order: RwLock::new(None),
        }
    }

    pub fn children(&self) -> &[Arc<Geom>] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Union of the children's bounds; unbounded if any child is.
    pub fn compute_bounds(&self, frame: &Frame) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        let mut unbounded = Vec::new();
        let mut bounded = Vec::with_capacity(self.children.len());
        for (index, child) in self.children.iter().enumerate() {
            let b = child.compute_bounds(frame);
            if b.is_unbounded() {
                unbounded.push(index);
            } else {
                bounded.push(index);
                bounds = Aabb::surrounding(&bounds, &b);
            }
        }

        let any_unbounded = !unbounded.is_empty();
        unbounded.extend(bounded);
        *self.order.write().unwrap_or_else(PoisonError::into_inner) = Some(unbounded.into());

        if any_unbounded {
            Aabb::UNBOUNDED
        } else {
            bounds
        }
    }

    fn order(&self) -> Option<Arc<[usize]>> {
        self.order.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Nearest hit over all children. Records of a superseded hit are
    /// removed, so on success the path holds exactly one child's chain.
    pub(crate) fn intersect<'a>(
        &'a self,
        tracer: &mut Tracer,
        ray: &Ray,
        path: &mut HitPath<'a>,
        mindist: f64,
        maxdist: &mut f64,
    ) -> bool {
        let start = path.len();
        let mut hit = false;
        let mut test = |tracer: &mut Tracer, child: &'a Arc<Geom>| {
            let mark = path.len();
            if tracer.intersect(child, ray, path, mindist, maxdist) {
                path.discard(start..mark);
                hit = true;
            }
        };
        match self.order() {
            Some(order) => order.iter().for_each(|&index| test(tracer, &self.children[index])),
            None => self.children.iter().for_each(|child| test(tracer, child)),
        }
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::{Plane, PrimitiveKind, Sphere};
    use rayshade_math::DVec3;

    fn sphere(center: DVec3) -> Arc<Geom> {
        Arc::new(Geom::primitive(Sphere::new(center, 1.0).unwrap()))
    }

    #[test]
    fn test_nearest_child_wins() {
        let near = sphere(DVec3::new(0.0, 0.0, -5.0));
        let far = sphere(DVec3::new(0.0, 0.0, -10.0));
        // Far first so the near hit has to supersede it.
        let list = List::new(vec![far, near.clone()]);

        let mut tracer = Tracer::new();
        let ray = Ray::new(DVec3::ZERO, DVec3::NEG_Z);
        let mut path = HitPath::new(8);
        let mut maxdist = f64::MAX;
        assert!(list.intersect(&mut tracer, &ray, &mut path, 1e-5, &mut maxdist));
        assert!((maxdist - 4.0).abs() < 1e-9);
        assert_eq!(path.len(), 1);
        assert!(Arc::ptr_eq(path.innermost().unwrap().node, &near));
    }

    #[test]
    fn test_unbounded_children_first() {
        // The sphere is declared first but lies beyond the plane.
        let ball = sphere(DVec3::new(0.0, 0.0, -10.0));
        let floor = Arc::new(Geom::primitive(Plane::new(DVec3::new(0.0, 0.0, -2.0), DVec3::Z).unwrap()));
        let list = List::new(vec![ball, floor.clone()]);
        assert!(list.compute_bounds(&Frame::still(0)).is_unbounded());

        let mut tracer = Tracer::new();
        let ray = Ray::new(DVec3::ZERO, DVec3::NEG_Z);
        let mut path = HitPath::new(8);
        let mut maxdist = f64::MAX;
        assert!(list.intersect(&mut tracer, &ray, &mut path, 1e-5, &mut maxdist));
        assert!((maxdist - 2.0).abs() < 1e-9);
        assert!(Arc::ptr_eq(path.innermost().unwrap().node, &floor));

        // The plane shrank maxdist first, so the sphere was culled by its bounds.
        assert_eq!(tracer.stats.primitive(PrimitiveKind::Sphere).tests, 0);
        assert_eq!(tracer.stats.primitive(PrimitiveKind::Plane).tests, 1);
    }

    #[test]
    fn test_bounds() {
        let frame = Frame::still(0);
        let list = List::new(vec![sphere(DVec3::ZERO), sphere(DVec3::new(4.0, 0.0, 0.0))]);
        let b = list.compute_bounds(&frame);
        assert!(b.contains(DVec3::new(4.9, 0.0, 0.0)));
        assert!(b.contains(DVec3::new(-0.9, 0.0, 0.0)));

        let with_plane = List::new(vec![
            sphere(DVec3::ZERO),
            Arc::new(Geom::primitive(Plane::new(DVec3::ZERO, DVec3::Y).unwrap())),
        ]);
        assert!(with_plane.compute_bounds(&frame).is_unbounded());
    }
}
