use crate::{DVec3, Interval, Ray};

/// Axis-aligned bounding box used for culling and the voxel grid.
///
/// A box is defined by three intervals (one per axis). A box whose low X
/// extent exceeds its high X extent is *unbounded*: it stands for geometry
/// of infinite extent (planes, aggregates containing planes) and must always
/// be tested. The same value is the identity for [`Aabb::surrounding`], which
/// is why freshly initialised boxes are "unbounded" until something is added.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Create a new AABB from three intervals.
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        Self { x, y, z }
    }

    /// Create an AABB from two corner points.
    pub fn from_points(a: DVec3, b: DVec3) -> Self {
        let lo = a.min(b);
        let hi = a.max(b);
        Self {
            x: Interval::new(lo.x, hi.x),
            y: Interval::new(lo.y, hi.y),
            z: Interval::new(lo.z, hi.z),
        }
    }

    /// Create the tightest AABB containing every point.
    pub fn from_point_cloud(points: impl IntoIterator<Item = DVec3>) -> Self {
        points.into_iter().fold(Aabb::EMPTY, |acc, p| {
            Aabb::surrounding(&acc, &Aabb::from_points(p, p))
        })
    }

    /// True for the unbounded sentinel (low X above high X).
    #[inline]
    pub fn is_unbounded(&self) -> bool {
        self.x.min > self.x.max
    }

    /// Create an AABB that surrounds two other AABBs.
    ///
    /// The unbounded sentinel acts as the empty set here; callers that need
    /// "unbounded absorbs everything" semantics check [`Aabb::is_unbounded`].
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: box0.x.hull(&box1.x),
            y: box0.y.hull(&box1.y),
            z: box0.z.hull(&box1.z),
        }
    }

    /// The overlap of two boxes. An unbounded operand yields the other box.
    pub fn intersection(box0: &Aabb, box1: &Aabb) -> Self {
        if box0.is_unbounded() {
            return *box1;
        }
        if box1.is_unbounded() {
            return *box0;
        }
        let overlap = Self {
            x: box0.x.overlap(&box1.x),
            y: box0.y.overlap(&box1.y),
            z: box0.z.overlap(&box1.z),
        };
        if overlap.x.is_empty() || overlap.y.is_empty() || overlap.z.is_empty() {
            // Degenerate, but keep it a bounded zero-volume box so it is
            // never mistaken for the unbounded sentinel.
            let c = box0.centroid();
            return Aabb::from_points(c, c);
        }
        overlap
    }

    /// Grow every face outward by `delta`. The sentinel is left untouched.
    pub fn enlarge(&self, delta: f64) -> Self {
        if self.is_unbounded() {
            return *self;
        }
        Self {
            x: self.x.enlarge(delta),
            y: self.y.enlarge(delta),
            z: self.z.enlarge(delta),
        }
    }

    /// Get the interval for a specific axis (0=X, 1=Y, 2=Z).
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Low corner.
    pub fn min(&self) -> DVec3 {
        DVec3::new(self.x.min, self.y.min, self.z.min)
    }

    /// High corner.
    pub fn max(&self) -> DVec3 {
        DVec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// Extent along each axis.
    pub fn size(&self) -> DVec3 {
        self.max() - self.min()
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> DVec3 {
        (self.min() + self.max()) * 0.5
    }

    /// The eight corners, used when transforming a box.
    pub fn corners(&self) -> [DVec3; 8] {
        let lo = self.min();
        let hi = self.max();
        [
            DVec3::new(lo.x, lo.y, lo.z),
            DVec3::new(hi.x, lo.y, lo.z),
            DVec3::new(lo.x, hi.y, lo.z),
            DVec3::new(hi.x, hi.y, lo.z),
            DVec3::new(lo.x, lo.y, hi.z),
            DVec3::new(hi.x, lo.y, hi.z),
            DVec3::new(lo.x, hi.y, hi.z),
            DVec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Returns true if the point lies inside or on the box.
    pub fn contains(&self, p: DVec3) -> bool {
        self.x.contains(p.x) && self.y.contains(p.y) && self.z.contains(p.z)
    }

    /// Slab test against a ray.
    ///
    /// Returns the nearest distance along the ray at which it is inside the
    /// box, restricted to `[mindist, maxdist]`; a ray starting inside the box
    /// reports `mindist`. The unbounded sentinel always reports `mindist`.
    pub fn hit_distance(&self, ray: &Ray, mindist: f64, maxdist: f64) -> Option<f64> {
        if self.is_unbounded() {
            return Some(mindist);
        }

        let mut t_near = mindist;
        let mut t_far = maxdist;

        for axis in 0..3 {
            let slab = self.axis_interval(axis);
            let origin = ray.origin[axis];
            let dir = ray.direction[axis];

            if dir == 0.0 {
                // Parallel to this slab: either always inside or never.
                if origin < slab.min || origin > slab.max {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let mut t0 = (slab.min - origin) * inv;
            let mut t1 = (slab.max - origin) * inv;
            if inv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_near > t_far {
                return None;
            }
        }

        Some(t_near)
    }

    /// The unbounded sentinel, also used as the starting value for unions.
    pub const UNBOUNDED: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };

    /// Alias of [`Aabb::UNBOUNDED`] when used as an accumulator.
    pub const EMPTY: Aabb = Aabb::UNBOUNDED;
}
