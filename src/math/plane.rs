use super::{Point3, Vector3, TOLERANCE};

/// An infinite plane in 3D space, defined by an origin and a unit normal.
#[derive(Debug, Clone)]
pub struct Plane {
    origin: Point3,
    normal: Vector3,
}

impl Plane {
    /// Creates a plane from an origin and a normal vector.
    ///
    /// Returns `None` if the normal vector is zero-length.
    #[must_use]
    pub fn from_normal(origin: Point3, normal: Vector3) -> Option<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return None;
        }
        Some(Self {
            origin,
            normal: normal / len,
        })
    }

    /// Creates the plane spanned by two edge vectors at `origin`.
    ///
    /// Returns `None` if the edges are parallel or zero-length.
    #[must_use]
    pub fn from_edges(origin: Point3, u: &Vector3, v: &Vector3) -> Option<Self> {
        Self::from_normal(origin, u.cross(v))
    }

    /// Returns the origin point of the plane.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit normal of the plane.
    #[must_use]
    pub fn plane_normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Orthogonal projection of `p` onto the plane.
    #[must_use]
    pub fn project(&self, p: &Point3) -> Point3 {
        p - self.normal * self.normal.dot(&(p - self.origin))
    }
}
