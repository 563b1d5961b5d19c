//! Geometry nodes.
//!
//! A [`Geom`] wraps either a primitive or an aggregate of other nodes, plus
//! the metadata every node can carry: a transform chain, a surface, textures
//! and a bounding box cached per animation frame. Nodes are shared through
//! `Arc`; the same node may appear under several parents (instancing).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use rayshade_math::{Aabb, AnimatedTransform, DMat4, DVec3, Keyframe, Transform, TransformChain, EPSILON};

use crate::csg::{Csg, CsgOp};
use crate::grid::Grid;
use crate::list::List;
use crate::primitive::Primitive;
use crate::surface::{Surface, Texture};
use crate::{GeomError, GeomResult, RenderOptions};

/// Stable identity of a node, used by the grid mailbox.
pub type GeomId = usize;

static NEXT_GEOM_ID: AtomicUsize = AtomicUsize::new(0);

fn next_geom_id() -> GeomId {
    NEXT_GEOM_ID.fetch_add(1, Ordering::Relaxed)
}

/// The time window a set of cached bounds is valid for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub number: u64,
    pub shutter_start: f64,
    pub shutter_duration: f64,
    /// Instants sampled when bounding animated nodes, endpoints included
    pub time_samples: usize,
}

impl Frame {
    pub fn new(number: u64, options: &RenderOptions) -> Self {
        Self {
            number,
            shutter_start: options.shutter_start,
            shutter_duration: options.shutter_duration,
            time_samples: options.time_samples,
        }
    }

    /// A frame with the shutter closed at time zero.
    pub fn still(number: u64) -> Self {
        Self {
            number,
            shutter_start: 0.0,
            shutter_duration: 0.0,
            time_samples: 2,
        }
    }

    /// Evenly spaced instants from shutter open to shutter close.
    pub fn sample_times(&self) -> impl Iterator<Item = f64> + '_ {
        let n = self.time_samples.max(2);
        (0..n).map(move |i| self.shutter_start + self.shutter_duration * i as f64 / (n - 1) as f64)
    }
}

/// Which surface properties occur anywhere in a subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceFlags {
    pub no_shadow: bool,
    pub transparent: bool,
}

impl SurfaceFlags {
    fn of(surface: &Surface) -> Self {
        Self {
            no_shadow: surface.no_shadow,
            transparent: surface.is_transparent(),
        }
    }

    fn union(self, other: SurfaceFlags) -> Self {
        Self {
            no_shadow: self.no_shadow || other.no_shadow,
            transparent: self.transparent || other.transparent,
        }
    }
}

/// Nodes that contain other nodes.
#[derive(Debug)]
pub enum Aggregate {
    List(List),
    Grid(Grid),
    Csg(Csg),
    /// A shared object placed again, usually under its own transform
    Instance(Arc<Geom>),
}

impl Aggregate {
    pub fn name(&self) -> &'static str {
        match self {
            Aggregate::List(_) => "list",
            Aggregate::Grid(_) => "grid",
            Aggregate::Csg(_) => "csg",
            Aggregate::Instance(_) => "instance",
        }
    }

    fn children(&self) -> Vec<&Arc<Geom>> {
        match self {
            Aggregate::List(list) => list.children().iter().collect(),
            Aggregate::Grid(grid) => grid.children().iter().collect(),
            Aggregate::Csg(csg) => vec![csg.left(), csg.right()],
            Aggregate::Instance(object) => vec![object],
        }
    }

    fn bounds(&self, frame: &Frame) -> Aabb {
        match self {
            Aggregate::List(list) => list.compute_bounds(frame),
            Aggregate::Grid(grid) => grid.compute_bounds(frame),
            Aggregate::Csg(csg) => csg.compute_bounds(frame),
            Aggregate::Instance(object) => object.compute_bounds(frame),
        }
    }
}

#[derive(Debug)]
pub enum GeomKind {
    Primitive(Primitive),
    Aggregate(Aggregate),
}

/// A node of the scene graph.
#[derive(Debug)]
pub struct Geom {
    id: GeomId,
    name: Option<String>,
    kind: GeomKind,
    transform: Option<Arc<TransformChain>>,
    surface: Option<Arc<Surface>>,
    textures: Vec<Arc<dyn Texture>>,
    /// Surface flags of everything below this node
    descendants: SurfaceFlags,
    /// Bounds in the parent's space, tagged with the frame they were computed for
    bounds: RwLock<Option<(u64, Aabb)>>,
}

impl Geom {
    fn new(kind: GeomKind) -> Self {
        let descendants = match &kind {
            GeomKind::Primitive(_) => SurfaceFlags::default(),
            GeomKind::Aggregate(agg) => agg
                .children()
                .into_iter()
                .fold(SurfaceFlags::default(), |acc, child| acc.union(child.subtree_surfaces())),
        };
        Self {
            id: next_geom_id(),
            name: None,
            kind,
            transform: None,
            surface: None,
            textures: Vec::new(),
            descendants,
            bounds: RwLock::new(None),
        }
    }

    pub fn primitive(shape: impl Into<Primitive>) -> Self {
        Self::new(GeomKind::Primitive(shape.into()))
    }

    pub fn aggregate(aggregate: Aggregate) -> Self {
        Self::new(GeomKind::Aggregate(aggregate))
    }

    pub fn list(children: Vec<Arc<Geom>>) -> Self {
        Self::aggregate(Aggregate::List(List::new(children)))
    }

    pub fn grid(children: Vec<Arc<Geom>>, resolution: [usize; 3]) -> GeomResult<Self> {
        Ok(Self::aggregate(Aggregate::Grid(Grid::new(children, resolution)?)))
    }

    pub fn csg(op: CsgOp, left: Arc<Geom>, right: Arc<Geom>) -> Self {
        Self::aggregate(Aggregate::Csg(Csg::new(op, left, right)))
    }

    pub fn instance(object: Arc<Geom>) -> Self {
        Self::aggregate(Aggregate::Instance(object))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_transform(mut self, chain: TransformChain) -> Self {
        self.transform = (!chain.is_empty()).then(|| Arc::new(chain));
        self
    }

    /// Share a transform chain with other nodes.
    pub fn with_shared_transform(mut self, chain: Arc<TransformChain>) -> Self {
        self.transform = Some(chain);
        self
    }

    /// Append `xf` to this node's chain, after any existing steps.
    pub fn then_transform(self, xf: Transform) -> Self {
        self.map_chain(|chain| chain.push(xf))
    }

    pub fn translated(self, offset: DVec3) -> Self {
        self.then_transform(Transform::translate(offset))
    }

    pub fn scaled(self, factors: DVec3) -> GeomResult<Self> {
        let xf = Transform::scale(factors).ok_or(GeomError::SingularTransform)?;
        Ok(self.then_transform(xf))
    }

    /// Rotate by `angle` radians about `axis`.
    pub fn rotated(self, axis: DVec3, angle: f64) -> GeomResult<Self> {
        let xf = Transform::rotate(axis, angle).ok_or(GeomError::SingularTransform)?;
        Ok(self.then_transform(xf))
    }

    /// Append an arbitrary affine matrix.
    pub fn transformed(self, matrix: DMat4) -> GeomResult<Self> {
        let xf = Transform::new(matrix).ok_or(GeomError::SingularTransform)?;
        Ok(self.then_transform(xf))
    }

    /// Append a transform interpolated from `start` to `end` over
    /// `[start_time, end_time]`.
    pub fn animated(self, start: Keyframe, end: Keyframe, start_time: f64, end_time: f64) -> GeomResult<Self> {
        let anim = AnimatedTransform::new(start, end, start_time, end_time).ok_or(GeomError::SingularTransform)?;
        Ok(self.map_chain(|chain| chain.push_animated(anim)))
    }

    fn map_chain(mut self, edit: impl FnOnce(&mut TransformChain)) -> Self {
        let mut chain = self.transform.as_deref().cloned().unwrap_or_default();
        edit(&mut chain);
        self.transform = Some(Arc::new(chain));
        self
    }

    pub fn with_surface(mut self, surface: Arc<Surface>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn with_texture(mut self, texture: Arc<dyn Texture>) -> Self {
        self.textures.push(texture);
        self
    }

    pub fn id(&self) -> GeomId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> &GeomKind {
        &self.kind
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match &self.kind {
            GeomKind::Primitive(p) => Some(p),
            GeomKind::Aggregate(_) => None,
        }
    }

    pub fn as_aggregate(&self) -> Option<&Aggregate> {
        match &self.kind {
            GeomKind::Aggregate(a) => Some(a),
            GeomKind::Primitive(_) => None,
        }
    }

    pub fn is_csg(&self) -> bool {
        matches!(self.kind, GeomKind::Aggregate(Aggregate::Csg(_)))
    }

    /// Short description for diagnostics.
    pub fn describe(&self) -> String {
        let kind = match &self.kind {
            GeomKind::Primitive(p) => p.kind().name(),
            GeomKind::Aggregate(a) => a.name(),
        };
        match &self.name {
            Some(name) => format!("{kind} `{name}`"),
            None => format!("{kind} #{}", self.id),
        }
    }

    pub fn transform(&self) -> Option<&Arc<TransformChain>> {
        self.transform.as_ref()
    }

    /// This node's own object-to-parent transform at `time`.
    pub fn transform_at(&self, time: f64) -> Option<Transform> {
        self.transform.as_ref().map(|chain| chain.at(time))
    }

    /// Whether this node's own transform varies over time.
    pub fn is_animated(&self) -> bool {
        self.transform.as_ref().is_some_and(|chain| chain.is_animated())
    }

    pub fn surface(&self) -> Option<&Arc<Surface>> {
        self.surface.as_ref()
    }

    pub fn textures(&self) -> &[Arc<dyn Texture>] {
        &self.textures
    }

    /// Surface flags of this node and everything below it.
    pub fn subtree_surfaces(&self) -> SurfaceFlags {
        match &self.surface {
            Some(surface) => self.descendants.union(SurfaceFlags::of(surface)),
            None => self.descendants,
        }
    }

    /// Whether the dispatcher should try the bounding box before the node.
    pub fn checks_bounds(&self) -> bool {
        match &self.kind {
            GeomKind::Primitive(p) => p.checks_bounds(),
            GeomKind::Aggregate(_) => true,
        }
    }

    /// Bounds for `frame`, computed at most once per frame.
    ///
    /// The box is in the parent's space, padded by `EPSILON` on every face.
    /// Animated nodes are bounded by sampling their transform across the
    /// shutter.
    pub fn compute_bounds(&self, frame: &Frame) -> Aabb {
        if let Some((number, cached)) = *self.bounds.read().unwrap_or_else(PoisonError::into_inner) {
            if number == frame.number {
                return cached;
            }
        }

        let local = match &self.kind {
            GeomKind::Primitive(p) => p.bounds(),
            GeomKind::Aggregate(agg) => agg.bounds(frame),
        };

        let bounds = match &self.transform {
            _ if local.is_unbounded() => Aabb::UNBOUNDED,
            None => local.enlarge(EPSILON),
            Some(chain) if chain.is_animated() => frame
                .sample_times()
                .map(|t| chain.at(t).transform_aabb(&local))
                .fold(Aabb::EMPTY, |acc, b| Aabb::surrounding(&acc, &b))
                .enlarge(EPSILON),
            Some(chain) => chain.at(frame.shutter_start).transform_aabb(&local).enlarge(EPSILON),
        };

        *self.bounds.write().unwrap_or_else(PoisonError::into_inner) = Some((frame.number, bounds));
        bounds
    }

    /// The most recently computed bounds; unbounded if none were computed yet,
    /// so an unprepared node is always tested.
    pub fn bounds(&self) -> Aabb {
        self.bounds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .map_or(Aabb::UNBOUNDED, |(_, b)| b)
    }
}
