//! Constructive solid geometry.
//!
//! A CSG node combines two solids. Both operands are intersected along the
//! ray and their surface crossings are merged in distance order while each
//! operand's inside/outside state is tracked; the first crossing where the
//! combined state changes is the hit. Crossings of the two operands closer
//! than `EPSILON` count as one event so coincident surfaces do not leave
//! slivers.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rayshade_math::{Aabb, EPSILON, FAR_AWAY};

use crate::geom::{Aggregate, Frame};
use crate::hit::HitPath;
use crate::{Geom, GeomError, GeomResult, Ray, Tracer};

/// Boolean operator of a CSG node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CsgOp {
    Union,
    Intersect,
    /// Left minus right
    Difference,
}

impl CsgOp {
    /// Inside the combination, given inside-ness of each operand.
    pub fn combine(self, a: bool, b: bool) -> bool {
        match self {
            CsgOp::Union => a || b,
            CsgOp::Intersect => a && b,
            CsgOp::Difference => a && !b,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CsgOp::Union => "union",
            CsgOp::Intersect => "intersect",
            CsgOp::Difference => "difference",
        }
    }
}

impl fmt::Display for CsgOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CsgOp {
    type Err = GeomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "union" => Ok(CsgOp::Union),
            "intersect" | "intersection" => Ok(CsgOp::Intersect),
            "difference" => Ok(CsgOp::Difference),
            other => Err(GeomError::UnknownCsgOperator(other.to_string())),
        }
    }
}

#[derive(Debug)]
pub struct Csg {
    op: CsgOp,
    left: Arc<Geom>,
    right: Arc<Geom>,
}

impl Csg {
    pub fn new(op: CsgOp, left: Arc<Geom>, right: Arc<Geom>) -> Self {
        Self { op, left, right }
    }

    /// Combine any number of objects left to right:
    /// `a - b - c` is `(a - b) - c`.
    pub fn from_children(op: CsgOp, children: Vec<Arc<Geom>>) -> GeomResult<Self> {
        let count = children.len();
        let mut iter = children.into_iter();
        let (Some(first), Some(second)) = (iter.next(), iter.next()) else {
            return Err(GeomError::MalformedCsg(count));
        };
        let mut csg = Csg::new(op, first, second);
        for next in iter {
            let left = Arc::new(Geom::aggregate(Aggregate::Csg(csg)));
            csg = Csg::new(op, left, next);
        }
        Ok(csg)
    }

    pub fn op(&self) -> CsgOp {
        self.op
    }

    pub fn left(&self) -> &Arc<Geom> {
        &self.left
    }

    pub fn right(&self) -> &Arc<Geom> {
        &self.right
    }

    pub fn compute_bounds(&self, frame: &Frame) -> Aabb {
        let left = self.left.compute_bounds(frame);
        let right = self.right.compute_bounds(frame);
        match self.op {
            CsgOp::Union if left.is_unbounded() || right.is_unbounded() => Aabb::UNBOUNDED,
            CsgOp::Union => Aabb::surrounding(&left, &right),
            CsgOp::Intersect => Aabb::intersection(&left, &right),
            CsgOp::Difference => left,
        }
    }

    pub(crate) fn intersect<'a>(
        &'a self,
        tracer: &mut Tracer,
        ray: &Ray,
        path: &mut HitPath<'a>,
        mindist: f64,
        maxdist: &mut f64,
    ) -> bool {
        let capacity = path.remaining();
        let mut a = Operand::new(&self.left, capacity);
        let mut b = Operand::new(&self.right, capacity);
        a.start(tracer, ray, mindist);
        b.start(tracer, ray, mindist);

        loop {
            let t = match (a.dist, b.dist) {
                (None, None) => return false,
                (Some(ta), None) => ta,
                (None, Some(tb)) => tb,
                (Some(ta), Some(tb)) => ta.min(tb),
            };
            if t >= *maxdist {
                return false;
            }
            match self.op {
                CsgOp::Union => {}
                CsgOp::Intersect if a.exhausted_outside() || b.exhausted_outside() => return false,
                CsgOp::Difference if a.exhausted_outside() => return false,
                _ => {}
            }

            let a_event = a.dist.is_some_and(|ta| ta - t < EPSILON);
            let b_event = b.dist.is_some_and(|tb| tb - t < EPSILON);
            let a_after = if a_event { a.entering() } else { a.inside };
            let b_after = if b_event { b.entering() } else { b.inside };

            let before = self.op.combine(a.inside, b.inside);
            if self.op.combine(a_after, b_after) != before {
                // Credit the operand whose crossing alone flips the result.
                let from_left = a_event && (!b_event || self.op.combine(a_after, b.inside) != before);
                let source = if from_left { &mut a } else { &mut b };
                if !from_left && self.op == CsgOp::Difference {
                    for record in source.path.iter_mut() {
                        record.enter = !record.enter;
                        record.flipped = !record.flipped;
                    }
                }
                if path.extend_from(&source.path).is_err() {
                    tracer.stats.hit_path_overflows += 1;
                    return false;
                }
                *maxdist = t;
                return true;
            }

            if a_event {
                tracer.stats.csg_reintersections += 1;
                a.inside = a_after;
                a.advance(tracer, ray, t + EPSILON, *maxdist);
            }
            if b_event {
                tracer.stats.csg_reintersections += 1;
                b.inside = b_after;
                b.advance(tracer, ray, t + EPSILON, *maxdist);
            }
        }
    }
}

/// One side of a CSG node during a traversal.
struct Operand<'a> {
    node: &'a Arc<Geom>,
    path: HitPath<'a>,
    /// Next crossing, `None` once the operand is exhausted
    dist: Option<f64>,
    inside: bool,
}

impl<'a> Operand<'a> {
    fn new(node: &'a Arc<Geom>, capacity: usize) -> Self {
        Self {
            node,
            path: HitPath::new(capacity),
            dist: None,
            inside: false,
        }
    }

    /// First crossing. Whether the ray starts inside follows from it: a ray
    /// that first leaves the solid began inside.
    fn start(&mut self, tracer: &mut Tracer, ray: &Ray, mindist: f64) {
        self.advance(tracer, ray, mindist, FAR_AWAY);
        self.inside = self.dist.is_some() && !self.entering();
    }

    fn advance(&mut self, tracer: &mut Tracer, ray: &Ray, from: f64, limit: f64) {
        self.path.clear();
        let mut dist = limit;
        self.dist = tracer
            .intersect(self.node, ray, &mut self.path, from, &mut dist)
            .then_some(dist);
    }

    /// Whether the next crossing enters the operand's solid.
    fn entering(&self) -> bool {
        self.path.root().is_some_and(|r| r.enter)
    }

    fn exhausted_outside(&self) -> bool {
        self.dist.is_none() && !self.inside
    }
}
