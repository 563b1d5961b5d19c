//! Shadow rays.
//!
//! A shadow ray decides how much of a light reaches a point. Opaque
//! occluders block it outright; in transparent mode light passing through a
//! transparent body is filtered by its body color on the way in and
//! attenuated by its `statten` over the distance traveled inside.
//!
//! The last opaque occluder found for each light and ray depth is cached
//! and tried first on the next shadow ray. Only occluders whose whole
//! subtree is guaranteed to block are cached, so a cache hit is always a
//! correct answer.

use std::collections::HashMap;
use std::sync::Arc;

use rayshade_math::{Transform, EPSILON};

use crate::hit::HitPath;
use crate::{Color, Geom, Ray, Scene, Surface, Tracer};

/// How much of a light gets through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Visibility {
    Clear,
    /// Partially transmitted; multiply the light color by this.
    Filtered(Color),
    Blocked,
}

/// A node known to have blocked a light, and how to reach its parent's
/// space from world space.
#[derive(Debug, Clone)]
struct CachedOccluder {
    node: Arc<Geom>,
    to_parent: Transform,
}

/// Last occluder per (light index, ray depth).
#[derive(Debug, Default)]
pub(crate) struct ShadowCache {
    slots: HashMap<(usize, u32), CachedOccluder>,
}

impl ShadowCache {
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

impl Tracer {
    /// Visibility of light `light_index` from `ray.origin` along
    /// `ray.direction`, up to `distance`.
    pub fn light_visibility(&mut self, scene: &Scene, light_index: usize, ray: &Ray, distance: f64) -> Visibility {
        let options = &scene.options.shadows;
        let no_shadow = scene.lights.get(light_index).is_some_and(|l| l.no_shadow);
        if !options.enabled || no_shadow {
            return Visibility::Clear;
        }
        self.stats.shadow_rays += 1;

        let key = (light_index, ray.depth);
        if options.cache {
            if let Some(cached) = self.shadow_cache.slots.get(&key).cloned() {
                let (local, scale) = ray.transformed(&cached.to_parent);
                let mut path = HitPath::new(scene.options.hit_path_capacity);
                let mut maxdist = distance * scale;
                if self.intersect(&cached.node, &local, &mut path, EPSILON * scale, &mut maxdist) {
                    self.stats.shadow_cache_hits += 1;
                    return Visibility::Blocked;
                }
                self.stats.shadow_cache_misses += 1;
                self.shadow_cache.slots.remove(&key);
            }
        }

        let capacity = scene.options.hit_path_capacity;
        let mut filter = Color::ONE;
        let mut from = EPSILON;
        let mut segment_start = 0.0;

        while let Some(hit) = self.trace_between(&scene.world, ray, capacity, from, distance) {
            let default_surface = Surface::default();
            let surface = hit.path.surface().map_or(&default_surface, |s| s.as_ref());
            from = hit.dist + EPSILON;
            if surface.no_shadow {
                continue;
            }

            if !options.transparent || !surface.is_transparent() {
                if options.cache {
                    if let Some(occluder) = cacheable(&hit.path, options.transparent) {
                        self.shadow_cache.slots.insert(key, occluder);
                    }
                }
                return Visibility::Blocked;
            }

            let entering = hit.path.innermost().is_some_and(|r| r.enter);
            if entering {
                filter *= surface.body * surface.transp;
                segment_start = hit.dist;
            } else {
                filter *= surface.statten.powf(hit.dist - segment_start);
            }
            if filter.max_element() < EPSILON {
                return Visibility::Blocked;
            }
        }

        if filter == Color::ONE {
            Visibility::Clear
        } else {
            Visibility::Filtered(filter)
        }
    }
}

/// The node to remember for a blocking hit, if one can be remembered
/// safely.
///
/// The outermost CSG or animated node on the path is cached, since testing
/// anything below it alone could report hits that do not exist (CSG) or miss
/// motion above it (animation). Without either, the primitive itself is
/// cached. Subtrees containing surfaces that let shadow rays through are
/// never cached, and neither are subtrees whose surface-less nodes would
/// inherit a transparent surface from above the cached node.
fn cacheable(path: &HitPath<'_>, transparent: bool) -> Option<CachedOccluder> {
    if path.iter().any(|r| r.node.surface().is_some_and(|s| s.no_shadow)) {
        return None;
    }
    let index = path
        .iter()
        .rposition(|r| r.node.is_csg() || r.node.is_animated())
        .unwrap_or(0);
    let record = path.get(index)?;
    let flags = record.node.subtree_surfaces();
    if flags.no_shadow || (transparent && flags.transparent) {
        return None;
    }
    if transparent {
        let inherits_transparency = path
            .iter()
            .skip(index + 1)
            .any(|r| r.node.surface().is_some_and(|s| s.is_transparent()));
        let resolved_above = path
            .iter()
            .position(|r| r.node.surface().is_some())
            .is_some_and(|owner| owner > index);
        if inherits_transparency || resolved_above {
            return None;
        }
    }
    Some(CachedOccluder {
        node: Arc::clone(record.node),
        to_parent: path.parent_to_world(index).invert(),
    })
}
