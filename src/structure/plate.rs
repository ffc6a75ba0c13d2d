use crate::math::{Aabb, Point3, Vector3};

use super::CadObject;

/// A flat rectangular plate.
///
/// The mid-surface is the rectangle spanned by the edge vectors `u` and `v`
/// at `origin`; the thickness is centered on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Plate {
    name: String,
    origin: Point3,
    u: Vector3,
    v: Vector3,
    thickness: f64,
}

impl Plate {
    #[must_use]
    pub fn new(name: impl Into<String>, origin: Point3, u: Vector3, v: Vector3, thickness: f64) -> Self {
        Self {
            name: name.into(),
            origin,
            u,
            v,
            thickness,
        }
    }

    /// Creates a horizontal plate covering `[x0, x1] × [y0, y1]` at height `z`.
    #[must_use]
    pub fn horizontal(
        name: impl Into<String>,
        min: (f64, f64),
        max: (f64, f64),
        z: f64,
        thickness: f64,
    ) -> Self {
        Self::new(
            name,
            Point3::new(min.0, min.1, z),
            Vector3::new(max.0 - min.0, 0.0, 0.0),
            Vector3::new(0.0, max.1 - min.1, 0.0),
            thickness,
        )
    }

    /// Corner of the mid-surface rectangle.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// First edge vector.
    #[must_use]
    pub fn u(&self) -> &Vector3 {
        &self.u
    }

    /// Second edge vector.
    #[must_use]
    pub fn v(&self) -> &Vector3 {
        &self.v
    }

    /// Plate thickness.
    #[must_use]
    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    /// Corners of the mid-surface, counter-clockwise about `u × v`.
    #[must_use]
    pub fn corners(&self) -> [Point3; 4] {
        [
            self.origin,
            self.origin + self.u,
            self.origin + self.u + self.v,
            self.origin + self.v,
        ]
    }
}

impl CadObject for Plate {
    fn name(&self) -> &str {
        &self.name
    }

    fn bounding_box(&self) -> Aabb {
        let mut aabb = Aabb {
            min: self.origin,
            max: self.origin,
        };
        for c in &self.corners() {
            aabb.include(c);
        }
        aabb.inflated(0.5 * self.thickness)
    }
}
