//! Ray tracing statistics.
//!
//! Each worker owns a [`Stats`]; totals are obtained by merging.

use crate::primitive::PrimitiveKind;

/// Tests performed and how many of them hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter {
    pub tests: u64,
    pub hits: u64,
}

impl Counter {
    #[inline]
    pub fn record(&mut self, hit: bool) {
        self.tests += 1;
        if hit {
            self.hits += 1;
        }
    }

    pub fn merge(&mut self, other: &Counter) {
        self.tests += other.tests;
        self.hits += other.hits;
    }

    /// Percentage of tests that hit.
    pub fn hit_rate(&self) -> f64 {
        if self.tests == 0 {
            0.0
        } else {
            100.0 * self.hits as f64 / self.tests as f64
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    primitives: [Counter; PrimitiveKind::ALL.len()],
    pub bounds: Counter,
    pub eye_rays: u64,
    pub reflected_rays: u64,
    pub refracted_rays: u64,
    pub shadow_rays: u64,
    pub total_internal_reflections: u64,
    pub shadow_cache_hits: u64,
    pub shadow_cache_misses: u64,
    pub voxel_steps: u64,
    pub csg_reintersections: u64,
    pub hit_path_overflows: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_primitive(&mut self, kind: PrimitiveKind, hit: bool) {
        self.primitives[kind.index()].record(hit);
    }

    pub fn primitive(&self, kind: PrimitiveKind) -> Counter {
        self.primitives[kind.index()]
    }

    /// Add another worker's counts to these.
    pub fn merge(&mut self, other: &Stats) {
        for (mine, theirs) in self.primitives.iter_mut().zip(&other.primitives) {
            mine.merge(theirs);
        }
        self.bounds.merge(&other.bounds);
        self.eye_rays += other.eye_rays;
        self.reflected_rays += other.reflected_rays;
        self.refracted_rays += other.refracted_rays;
        self.shadow_rays += other.shadow_rays;
        self.total_internal_reflections += other.total_internal_reflections;
        self.shadow_cache_hits += other.shadow_cache_hits;
        self.shadow_cache_misses += other.shadow_cache_misses;
        self.voxel_steps += other.voxel_steps;
        self.csg_reintersections += other.csg_reintersections;
        self.hit_path_overflows += other.hit_path_overflows;
    }

    /// Total rays cast of every kind.
    pub fn total_rays(&self) -> u64 {
        self.eye_rays + self.reflected_rays + self.refracted_rays + self.shadow_rays
    }

    /// Log a summary at info level.
    pub fn report(&self) {
        log::info!(
            "rays: {} eye, {} reflected, {} refracted, {} shadow ({} total)",
            self.eye_rays,
            self.reflected_rays,
            self.refracted_rays,
            self.shadow_rays,
            self.total_rays()
        );
        log::info!("total internal reflections: {}", self.total_internal_reflections);
        log::info!(
            "shadow cache: {} hits, {} misses",
            self.shadow_cache_hits,
            self.shadow_cache_misses
        );
        for kind in PrimitiveKind::ALL {
            let c = self.primitive(kind);
            if c.tests > 0 {
                log::info!("{:>12}: {:>10} tests {:>10} hits ({:.2}%)", kind.name(), c.tests, c.hits, c.hit_rate());
            }
        }
        log::info!(
            "{:>12}: {:>10} tests {:>10} hits ({:.2}%)",
            "bounds",
            self.bounds.tests,
            self.bounds.hits,
            self.bounds.hit_rate()
        );
        log::info!("voxel steps: {}, CSG re-intersections: {}", self.voxel_steps, self.csg_reintersections);
        if self.hit_path_overflows > 0 {
            log::warn!("{} hit path overflows", self.hit_path_overflows);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        let mut c = Counter::default();
        c.record(true);
        c.record(false);
        c.record(false);
        c.record(true);
        assert_eq!(c, Counter { tests: 4, hits: 2 });
        assert_eq!(c.hit_rate(), 50.0);
        assert_eq!(Counter::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_merge() {
        let mut a = Stats::new();
        a.record_primitive(PrimitiveKind::Sphere, true);
        a.eye_rays = 10;

        let mut b = Stats::new();
        b.record_primitive(PrimitiveKind::Sphere, false);
        b.record_primitive(PrimitiveKind::Torus, true);
        b.eye_rays = 5;
        b.shadow_rays = 3;

        a.merge(&b);
        assert_eq!(a.primitive(PrimitiveKind::Sphere), Counter { tests: 2, hits: 1 });
        assert_eq!(a.primitive(PrimitiveKind::Torus), Counter { tests: 1, hits: 1 });
        assert_eq!(a.total_rays(), 18);
    }
}
