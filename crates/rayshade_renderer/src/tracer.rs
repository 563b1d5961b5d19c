//! Per-worker tracing state.
//!
//! Scene data is shared and read-only while rendering. Everything a trace
//! mutates lives here: statistics, the grid mailbox, the shadow cache and a
//! few one-shot diagnostic flags. A parallel driver would give each worker
//! its own `Tracer` and merge the statistics afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use rayshade_math::{EPSILON, FAR_AWAY};

use crate::geom::GeomId;
use crate::hit::HitPath;
use crate::shadow::ShadowCache;
use crate::{Geom, Ray, Stats};

/// A completed top-level intersection.
#[derive(Debug, Clone)]
pub struct Hit<'a> {
    pub path: HitPath<'a>,
    /// World-space distance along the ray
    pub dist: f64,
}

#[derive(Debug, Default)]
pub struct Tracer {
    pub stats: Stats,
    /// Last traversal number each node was tested in
    mailbox: HashMap<GeomId, u64>,
    traversal: u64,
    pub(crate) shadow_cache: ShadowCache,
    pub(crate) overflow_reported: bool,
    pub(crate) normal_advisory_reported: bool,
}

impl Tracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new grid traversal.
    pub(crate) fn next_traversal(&mut self) -> u64 {
        self.traversal += 1;
        self.traversal
    }

    /// Stamp `id` with `traversal`; true if it was already stamped with it.
    pub(crate) fn already_tested(&mut self, id: GeomId, traversal: u64) -> bool {
        match self.mailbox.insert(id, traversal) {
            Some(previous) => previous == traversal,
            None => false,
        }
    }

    /// Nearest hit of `ray` against `world` past `EPSILON`.
    pub fn trace<'a>(&mut self, world: &'a Arc<Geom>, ray: &Ray, capacity: usize) -> Option<Hit<'a>> {
        self.trace_between(world, ray, capacity, EPSILON, FAR_AWAY)
    }

    /// Nearest hit with `mindist < t < maxdist`.
    pub fn trace_between<'a>(
        &mut self,
        world: &'a Arc<Geom>,
        ray: &Ray,
        capacity: usize,
        mindist: f64,
        maxdist: f64,
    ) -> Option<Hit<'a>> {
        let mut path = HitPath::new(capacity);
        let mut dist = maxdist;
        self.intersect(world, ray, &mut path, mindist, &mut dist)
            .then_some(Hit { path, dist })
    }

    /// Drop the shadow cache, e.g. between frames.
    pub fn clear_shadow_cache(&mut self) {
        self.shadow_cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_stamps() {
        let mut tracer = Tracer::new();
        let first = tracer.next_traversal();
        assert!(!tracer.already_tested(7, first));
        assert!(tracer.already_tested(7, first));

        let second = tracer.next_traversal();
        assert_ne!(first, second);
        assert!(!tracer.already_tested(7, second));
    }
}
