//! Structural CAD objects handed to the meshing pipeline.

mod beam;
mod plate;
pub mod section;
mod volume;

pub use beam::Beam;
pub use plate::Plate;
pub use section::{CrossSection, FaceTag, SectionPoint, SectionProfile};
pub use volume::BoxVolume;

use crate::math::Aabb;

/// Behavior shared by every structural object.
pub trait CadObject {
    /// Stable name; also the name of the object's finite-element set.
    fn name(&self) -> &str;

    /// Bounding box of the full geometry (including section or thickness).
    fn bounding_box(&self) -> Aabb;
}

/// A structural object to be meshed.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuralObject {
    Beam(Beam),
    Plate(Plate),
    Volume(BoxVolume),
}

impl StructuralObject {
    /// Returns the object as a [`CadObject`].
    #[must_use]
    pub fn as_cad(&self) -> &dyn CadObject {
        match self {
            Self::Beam(b) => b,
            Self::Plate(p) => p,
            Self::Volume(v) => v,
        }
    }

    /// Stable name of the object.
    #[must_use]
    pub fn name(&self) -> &str {
        self.as_cad().name()
    }

    /// Bounding box of the object.
    #[must_use]
    pub fn bounding_box(&self) -> Aabb {
        self.as_cad().bounding_box()
    }

    /// Returns the beam if this object is one.
    #[must_use]
    pub fn as_beam(&self) -> Option<&Beam> {
        match self {
            Self::Beam(b) => Some(b),
            _ => None,
        }
    }
}

impl From<Beam> for StructuralObject {
    fn from(beam: Beam) -> Self {
        Self::Beam(beam)
    }
}

impl From<Plate> for StructuralObject {
    fn from(plate: Plate) -> Self {
        Self::Plate(plate)
    }
}

impl From<BoxVolume> for StructuralObject {
    fn from(volume: BoxVolume) -> Self {
        Self::Volume(volume)
    }
}
