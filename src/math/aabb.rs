use super::{Point3, Vector3, TOLERANCE};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Creates the tightest box around the given points.
    ///
    /// Returns `None` for an empty iterator.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut aabb = Self {
            min: first,
            max: first,
        };
        for p in iter {
            aabb.include(p);
        }
        Some(aabb)
    }

    /// Grows the box to contain `p`.
    pub fn include(&mut self, p: &Point3) {
        self.min = Point3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z));
        self.max = Point3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z));
    }

    /// Returns the union of two boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut out = *self;
        out.include(&other.min);
        out.include(&other.max);
        out
    }

    /// Returns the box grown by `margin` on every side.
    #[must_use]
    pub fn inflated(&self, margin: f64) -> Self {
        let m = Vector3::new(margin, margin, margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// Checks if two boxes overlap (touching counts).
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x <= other.max.x + TOLERANCE
            && self.max.x >= other.min.x - TOLERANCE
            && self.min.y <= other.max.y + TOLERANCE
            && self.max.y >= other.min.y - TOLERANCE
            && self.min.z <= other.max.z + TOLERANCE
            && self.max.z >= other.min.z - TOLERANCE
    }

    /// Length of the box diagonal.
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        (self.max - self.min).norm()
    }
}
