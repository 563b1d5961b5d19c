/// Extent of a bounding box along one axis.
///
/// `min > max` marks an empty extent; [`Interval::EMPTY`] uses infinities so
/// that taking the hull with any other extent yields that extent unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn size(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Inclusive at both ends.
    pub fn contains(&self, x: f64) -> bool {
        self.min <= x && x <= self.max
    }

    /// Pad both ends by `delta`.
    pub fn enlarge(&self, delta: f64) -> Interval {
        Interval::new(self.min - delta, self.max + delta)
    }

    /// Smallest extent covering both.
    pub fn hull(&self, other: &Interval) -> Interval {
        Interval::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Common part of both; empty when they are disjoint.
    pub fn overlap(&self, other: &Interval) -> Interval {
        Interval::new(self.min.max(other.min), self.max.min(other.max))
    }

    pub const EMPTY: Interval = Interval {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_contains_endpoints() {
        let extent = Interval::new(-1.0, 3.0);
        assert_eq!(extent.size(), 4.0);
        assert!(extent.contains(-1.0));
        assert!(extent.contains(3.0));
        assert!(!extent.contains(3.000_001));
    }

    #[test]
    fn test_interval_enlarge() {
        let padded = Interval::new(0.0, 10.0).enlarge(2.0);
        assert_eq!(padded, Interval::new(-2.0, 12.0));
    }

    #[test]
    fn test_interval_overlap() {
        let a = Interval::new(0.0, 5.0);
        assert_eq!(a.overlap(&Interval::new(3.0, 8.0)), Interval::new(3.0, 5.0));
        assert!(a.overlap(&Interval::new(6.0, 8.0)).is_empty());
    }

    #[test]
    fn test_empty_is_hull_identity() {
        assert!(Interval::EMPTY.is_empty());
        assert!(!Interval::EMPTY.contains(0.0));
        let unit = Interval::new(1.0, 2.0);
        assert_eq!(Interval::EMPTY.hull(&unit), unit);
        assert_eq!(unit.hull(&Interval::EMPTY), unit);
    }
}
