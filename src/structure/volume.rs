use crate::math::{Aabb, Point3, Vector3};

use super::CadObject;

/// A rectangular solid spanned by three perpendicular edge vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxVolume {
    name: String,
    origin: Point3,
    edges: [Vector3; 3],
}

impl BoxVolume {
    #[must_use]
    pub fn new(name: impl Into<String>, origin: Point3, u: Vector3, v: Vector3, w: Vector3) -> Self {
        Self {
            name: name.into(),
            origin,
            edges: [u, v, w],
        }
    }

    /// Creates a box aligned with the world axes.
    #[must_use]
    pub fn axis_aligned(name: impl Into<String>, min: Point3, max: Point3) -> Self {
        let d = max - min;
        Self::new(
            name,
            min,
            Vector3::new(d.x, 0.0, 0.0),
            Vector3::new(0.0, d.y, 0.0),
            Vector3::new(0.0, 0.0, d.z),
        )
    }

    /// Corner the edges start from.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// The three edge vectors.
    #[must_use]
    pub fn edges(&self) -> &[Vector3; 3] {
        &self.edges
    }
}

impl CadObject for BoxVolume {
    fn name(&self) -> &str {
        &self.name
    }

    fn bounding_box(&self) -> Aabb {
        let [u, v, w] = self.edges;
        let mut aabb = Aabb {
            min: self.origin,
            max: self.origin,
        };
        for i in 0..8u8 {
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
            aabb.include(&p);
        }
        aabb
    }
}
