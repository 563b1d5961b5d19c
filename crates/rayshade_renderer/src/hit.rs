//! Hit paths.
//!
//! A hit path records every node a ray passed through on its way to the
//! nearest primitive. Record 0 is the primitive itself, the last record is
//! the root the trace started from. Each record keeps the ray in that node's
//! local space and the node's own object-to-parent transform, so points and
//! normals can be carried back out to world space one level at a time.

use std::ops::Range;
use std::sync::Arc;

use rayshade_math::{DVec3, Ray as GeomRay, Transform};

use crate::{Geom, HitPathOverflow, Primitive, Surface};

/// One node on a hit path.
#[derive(Debug, Clone)]
pub struct HitNode<'a> {
    pub node: &'a Arc<Geom>,
    /// The ray in this node's local space
    pub ray: GeomRay,
    /// Minimum distance, in local units, the intersection was asked for
    pub mindist: f64,
    /// Hit distance in local units
    pub dist: f64,
    /// The ray is entering the solid at the hit
    pub enter: bool,
    /// The surface normal must be inverted (set by CSG difference)
    pub flipped: bool,
    /// This node's own object-to-parent transform at the ray's time
    pub transform: Option<Transform>,
}

impl HitNode<'_> {
    /// Hit point in this node's space.
    pub fn local_point(&self) -> DVec3 {
        self.ray.at(self.dist)
    }
}

/// Bounded stack of hit records.
#[derive(Debug, Clone)]
pub struct HitPath<'a> {
    nodes: Vec<HitNode<'a>>,
    capacity: usize,
}

impl<'a> HitPath<'a> {
    pub fn new(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a record; fails closed when the path is full.
    pub fn push(&mut self, node: HitNode<'a>) -> Result<(), HitPathOverflow> {
        if self.nodes.len() >= self.capacity {
            return Err(HitPathOverflow {
                capacity: self.capacity,
            });
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Append all of `other`'s records.
    pub fn extend_from(&mut self, other: &HitPath<'a>) -> Result<(), HitPathOverflow> {
        if self.nodes.len() + other.nodes.len() > self.capacity {
            return Err(HitPathOverflow {
                capacity: self.capacity,
            });
        }
        self.nodes.extend(other.nodes.iter().cloned());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Room left before the path overflows.
    pub fn remaining(&self) -> usize {
        self.capacity - self.nodes.len()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
    }

    /// Remove a range of records, keeping the ones after it.
    pub fn discard(&mut self, range: Range<usize>) {
        self.nodes.drain(range);
    }

    pub fn get(&self, index: usize) -> Option<&HitNode<'a>> {
        self.nodes.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut HitNode<'a>> {
        self.nodes.get_mut(index)
    }

    /// The innermost record: the primitive that was hit.
    pub fn innermost(&self) -> Option<&HitNode<'a>> {
        self.nodes.first()
    }

    /// The outermost record: the root of the trace.
    pub fn root(&self) -> Option<&HitNode<'a>> {
        self.nodes.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HitNode<'a>> {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, HitNode<'a>> {
        self.nodes.iter_mut()
    }

    /// The primitive at the bottom of the path.
    pub fn primitive(&self) -> Option<&'a Primitive> {
        let node: &'a Arc<Geom> = self.nodes.first()?.node;
        node.as_primitive()
    }

    /// The innermost surface on the path.
    pub fn surface(&self) -> Option<&'a Arc<Surface>> {
        self.nodes.iter().find_map(|record| {
            let node: &'a Arc<Geom> = record.node;
            node.surface()
        })
    }

    /// Cumulative object-to-world transform of the node at `index`: its own
    /// transform followed by every ancestor's.
    pub fn to_world(&self, index: usize) -> Transform {
        self.nodes[index.min(self.nodes.len())..]
            .iter()
            .filter_map(|n| n.transform.as_ref())
            .fold(Transform::IDENTITY, |acc, xf| acc.then(xf))
    }

    /// Cumulative transform of everything strictly above `index`.
    pub fn parent_to_world(&self, index: usize) -> Transform {
        self.to_world(index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::Sphere;

    fn record<'a>(node: &'a Arc<Geom>, transform: Option<Transform>) -> HitNode<'a> {
        HitNode {
            node,
            ray: GeomRay::new(DVec3::ZERO, DVec3::Z, 0.0),
            mindist: 0.0,
            dist: 1.0,
            enter: true,
            flipped: false,
            transform,
        }
    }

    #[test]
    fn test_push_fails_closed() {
        let geom = Arc::new(Geom::primitive(Sphere::new(DVec3::ZERO, 1.0).unwrap()));
        let mut path = HitPath::new(2);
        assert!(path.push(record(&geom, None)).is_ok());
        assert!(path.push(record(&geom, None)).is_ok());
        assert_eq!(path.push(record(&geom, None)), Err(HitPathOverflow { capacity: 2 }));
        assert_eq!(path.len(), 2);
        assert_eq!(path.remaining(), 0);
    }

    #[test]
    fn test_to_world_composes_inner_first() {
        let geom = Arc::new(Geom::primitive(Sphere::new(DVec3::ZERO, 1.0).unwrap()));
        let scale = Transform::scale(DVec3::splat(2.0)).unwrap();
        let shift = Transform::translate(DVec3::X);

        let mut path = HitPath::new(4);
        path.push(record(&geom, Some(scale))).unwrap();
        path.push(record(&geom, None)).unwrap();
        path.push(record(&geom, Some(shift))).unwrap();

        // Scale first, then translate.
        let p = path.to_world(0).transform_point(DVec3::ONE);
        assert_eq!(p, DVec3::new(3.0, 2.0, 2.0));
        assert_eq!(path.parent_to_world(0).transform_point(DVec3::ONE), DVec3::new(2.0, 1.0, 1.0));
        assert_eq!(path.to_world(3), Transform::IDENTITY);
    }

    #[test]
    fn test_discard_keeps_later_records() {
        let a = Arc::new(Geom::primitive(Sphere::new(DVec3::ZERO, 1.0).unwrap()));
        let b = Arc::new(Geom::primitive(Sphere::new(DVec3::X, 1.0).unwrap()));
        let mut path = HitPath::new(4);
        path.push(record(&a, None)).unwrap();
        path.push(record(&b, None)).unwrap();
        path.discard(0..1);
        assert_eq!(path.len(), 1);
        assert!(Arc::ptr_eq(path.innermost().unwrap().node, &b));
    }
}
