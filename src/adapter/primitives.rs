use crate::math::{Aabb, Frame, Plane, Point3, Vector3};

/// A straight sweep path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point3,
    pub end: Point3,
}

impl Segment {
    #[must_use]
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    /// Length of the segment.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// Direction from start to end (not normalized).
    #[must_use]
    pub fn delta(&self) -> Vector3 {
        self.end - self.start
    }

    /// Point at parameter `t` in `[0, 1]`.
    #[must_use]
    pub fn at(&self, t: f64) -> Point3 {
        self.start + self.delta() * t
    }

    #[must_use]
    pub fn bounding_box(&self) -> Aabb {
        let mut aabb = Aabb {
            min: self.start,
            max: self.start,
        };
        aabb.include(&self.end);
        aabb
    }
}

/// A rectangle spanned by perpendicular edge vectors `u` and `v`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Patch {
    pub origin: Point3,
    pub u: Vector3,
    pub v: Vector3,
}

impl Patch {
    #[must_use]
    pub fn new(origin: Point3, u: Vector3, v: Vector3) -> Self {
        Self { origin, u, v }
    }

    /// Frame with axes along `u`, `v` and the normal; `None` if degenerate.
    #[must_use]
    pub fn frame(&self) -> Option<Frame> {
        Frame::from_axes(&self.u, &self.v)
    }

    /// The supporting plane.
    #[must_use]
    pub fn plane(&self) -> Option<Plane> {
        Plane::from_edges(self.origin, &self.u, &self.v)
    }

    /// Corners, counter-clockwise about `u × v`.
    #[must_use]
    pub fn corners(&self) -> [Point3; 4] {
        [
            self.origin,
            self.origin + self.u,
            self.origin + self.u + self.v,
            self.origin + self.v,
        ]
    }

    /// Area of the rectangle.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.u.cross(&self.v).norm()
    }

    #[must_use]
    pub fn bounding_box(&self) -> Aabb {
        let corners = self.corners();
        let mut aabb = Aabb {
            min: corners[0],
            max: corners[0],
        };
        for c in &corners[1..] {
            aabb.include(c);
        }
        aabb
    }
}

/// A rectangular block spanned by three perpendicular edge vectors.
///
/// Stored right-handed: `(u × v) · w > 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    pub origin: Point3,
    pub edges: [Vector3; 3],
}

impl Block {
    /// Creates a block, swapping the first two edges if needed so the
    /// stored edges are right-handed.
    #[must_use]
    pub fn new(origin: Point3, edges: [Vector3; 3]) -> Self {
        let [u, v, w] = edges;
        let edges = if u.cross(&v).dot(&w) < 0.0 {
            [v, u, w]
        } else {
            edges
        };
        Self { origin, edges }
    }

    /// Frame with axes along the edges; `None` unless all three are
    /// perpendicular.
    #[must_use]
    pub fn frame(&self) -> Option<Frame> {
        let [u, v, w] = self.edges;
        let frame = Frame::from_axes(&u, &v)?;
        (frame.axis_of(&w) == Some(2)).then_some(frame)
    }

    /// The eight corners (bit 0 → `u`, bit 1 → `v`, bit 2 → `w`).
    #[must_use]
    pub fn corners(&self) -> [Point3; 8] {
        let [u, v, w] = self.edges;
        std::array::from_fn(|i| {
            let mut p = self.origin;
            if i & 1 != 0 {
                p += u;
            }
            if i & 2 != 0 {
                p += v;
            }
            if i & 4 != 0 {
                p += w;
            }
            p
        })
    }

    #[must_use]
    pub fn bounding_box(&self) -> Aabb {
        let corners = self.corners();
        let mut aabb = Aabb {
            min: corners[0],
            max: corners[0],
        };
        for c in &corners[1..] {
            aabb.include(c);
        }
        aabb
    }
}
