//! Conversion of structural objects into kernel-ready geometry.

mod primitives;

pub use primitives::{Block, Patch, Segment};

use std::fmt;

use crate::error::AdapterError;
use crate::math::{Aabb, Frame, TOLERANCE};
use crate::structure::{Beam, BoxVolume, CadObject, Plate, StructuralObject};

/// Idealization level chosen for meshing an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeomRepr {
    /// Centerline (beam elements).
    Line,
    /// Mid-surfaces (shell elements).
    Shell,
    /// Bodies (volume elements).
    Solid,
}

impl fmt::Display for GeomRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Line => "LINE",
            Self::Shell => "SHELL",
            Self::Solid => "SOLID",
        };
        f.write_str(name)
    }
}

/// Kernel-ingestible description of one object.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometrySource {
    /// Sweep path.
    Line(Vec<Segment>),
    /// Bounded surfaces.
    Shell(Vec<Patch>),
    /// Solid bodies.
    Solid(Vec<Block>),
}

impl GeometrySource {
    /// The representation this description was built for.
    #[must_use]
    pub fn repr(&self) -> GeomRepr {
        match self {
            Self::Line(_) => GeomRepr::Line,
            Self::Shell(_) => GeomRepr::Shell,
            Self::Solid(_) => GeomRepr::Solid,
        }
    }

    /// Number of primitives (segments, patches or blocks).
    #[must_use]
    pub fn primitive_count(&self) -> usize {
        match self {
            Self::Line(s) => s.len(),
            Self::Shell(p) => p.len(),
            Self::Solid(b) => b.len(),
        }
    }

    /// Bounding box of every primitive.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Aabb> {
        let boxes: Vec<Aabb> = match self {
            Self::Line(s) => s.iter().map(Segment::bounding_box).collect(),
            Self::Shell(p) => p.iter().map(Patch::bounding_box).collect(),
            Self::Solid(b) => b.iter().map(Block::bounding_box).collect(),
        };
        boxes.iter().copied().reduce(|a, b| a.union(&b))
    }

    /// Grid frame of the first surface or block; `None` for sweep paths.
    #[must_use]
    pub fn frame(&self) -> Option<Frame> {
        match self {
            Self::Line(_) => None,
            Self::Shell(p) => p.iter().find_map(Patch::frame),
            Self::Solid(b) => b.iter().find_map(Block::frame),
        }
    }
}

/// Converts a structural object to a [`GeometrySource`] at a given fidelity.
pub struct Adapt<'a> {
    object: &'a StructuralObject,
    repr: GeomRepr,
}

impl<'a> Adapt<'a> {
    /// Creates a new `Adapt` operation.
    #[must_use]
    pub fn new(object: &'a StructuralObject, repr: GeomRepr) -> Self {
        Self { object, repr }
    }

    /// Executes the conversion.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::UnsupportedGeomRepr`] if no conversion exists
    /// for this object/representation pair, or
    /// [`AdapterError::InvalidGeometry`] for degenerate input.
    pub fn execute(&self) -> Result<GeometrySource, AdapterError> {
        match (self.object, self.repr) {
            (StructuralObject::Beam(beam), GeomRepr::Line) => beam_line(beam),
            (StructuralObject::Beam(beam), GeomRepr::Shell) => beam_shell(beam),
            (StructuralObject::Beam(beam), GeomRepr::Solid) => beam_solid(beam),
            (StructuralObject::Plate(plate), GeomRepr::Shell) => plate_shell(plate),
            (StructuralObject::Plate(plate), GeomRepr::Solid) => plate_solid(plate),
            (StructuralObject::Volume(volume), GeomRepr::Solid) => volume_solid(volume),
            (object, repr) => Err(AdapterError::UnsupportedGeomRepr {
                object: object.name().to_owned(),
                repr,
            }),
        }
    }
}

fn invalid(object: &dyn CadObject, reason: &str) -> AdapterError {
    AdapterError::InvalidGeometry {
        object: object.name().to_owned(),
        reason: reason.to_owned(),
    }
}

fn beam_frame(beam: &Beam) -> Result<Frame, AdapterError> {
    if beam.length() < TOLERANCE {
        return Err(invalid(beam, "zero-length centerline"));
    }
    if !beam.section().profile().is_valid() {
        return Err(invalid(beam, "cross-section dimensions are inconsistent"));
    }
    beam.local_frame()
        .ok_or_else(|| invalid(beam, "up direction is parallel to the beam axis"))
}

fn beam_line(beam: &Beam) -> Result<GeometrySource, AdapterError> {
    beam_frame(beam)?;
    Ok(GeometrySource::Line(vec![Segment::new(*beam.start(), *beam.end())]))
}

fn beam_shell(beam: &Beam) -> Result<GeometrySource, AdapterError> {
    let frame = beam_frame(beam)?;
    let Some(walls) = beam.section().profile().shell_walls() else {
        return Err(AdapterError::UnsupportedGeomRepr {
            object: beam.name().to_owned(),
            repr: GeomRepr::Shell,
        });
    };
    let [_, ey, ez] = *frame.axes();
    let axis = beam.end() - beam.start();
    let patches = walls
        .iter()
        .map(|w| {
            let origin = beam.start() + ey * w.y.0 + ez * w.z.0;
            let across = if (w.y.1 - w.y.0).abs() < TOLERANCE {
                ez * (w.z.1 - w.z.0)
            } else {
                ey * (w.y.1 - w.y.0)
            };
            Patch::new(origin, axis, across)
        })
        .collect();
    Ok(GeometrySource::Shell(patches))
}

fn beam_solid(beam: &Beam) -> Result<GeometrySource, AdapterError> {
    let frame = beam_frame(beam)?;
    let [_, ey, ez] = *frame.axes();
    let axis = beam.end() - beam.start();
    let blocks = beam
        .section()
        .profile()
        .solid_walls()
        .iter()
        .map(|w| {
            let origin = beam.start() + ey * w.y.0 + ez * w.z.0;
            Block::new(origin, [axis, ey * (w.y.1 - w.y.0), ez * (w.z.1 - w.z.0)])
        })
        .collect();
    Ok(GeometrySource::Solid(blocks))
}

fn plate_patch(plate: &Plate) -> Result<Patch, AdapterError> {
    let patch = Patch::new(*plate.origin(), *plate.u(), *plate.v());
    if patch.frame().is_none() {
        return Err(invalid(plate, "edges must be non-zero and perpendicular"));
    }
    Ok(patch)
}

fn plate_shell(plate: &Plate) -> Result<GeometrySource, AdapterError> {
    Ok(GeometrySource::Shell(vec![plate_patch(plate)?]))
}

fn plate_solid(plate: &Plate) -> Result<GeometrySource, AdapterError> {
    let patch = plate_patch(plate)?;
    if plate.thickness() < TOLERANCE {
        return Err(invalid(plate, "solid plates need a positive thickness"));
    }
    let n = patch.u.cross(&patch.v).normalize() * plate.thickness();
    let origin = patch.origin - n * 0.5;
    Ok(GeometrySource::Solid(vec![Block::new(origin, [patch.u, patch.v, n])]))
}

fn volume_solid(volume: &BoxVolume) -> Result<GeometrySource, AdapterError> {
    let block = Block::new(*volume.origin(), *volume.edges());
    if block.frame().is_none() {
        return Err(invalid(volume, "edges must be non-zero and mutually perpendicular"));
    }
    Ok(GeometrySource::Solid(vec![block]))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Point3, Vector3};
    use crate::structure::section::{CrossSection, ISection, RectangularSection};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn i_beam() -> StructuralObject {
        Beam::new(
            "girder",
            p(0.0, 0.0, 0.0),
            p(4.0, 0.0, 0.0),
            CrossSection::I(ISection::new(0.3, 0.15, 0.0071, 0.0107)),
        )
        .into()
    }

    #[test]
    fn beam_line_is_its_centerline() {
        let src = Adapt::new(&i_beam(), GeomRepr::Line).execute().unwrap();
        match src {
            GeometrySource::Line(segs) => {
                assert_eq!(segs.len(), 1);
                assert!((segs[0].length() - 4.0).abs() < 1e-12);
            }
            other => panic!("expected Line, got {other:?}"),
        }
    }

    #[test]
    fn i_beam_shell_has_three_walls() {
        let src = Adapt::new(&i_beam(), GeomRepr::Shell).execute().unwrap();
        assert_eq!(src.repr(), GeomRepr::Shell);
        assert_eq!(src.primitive_count(), 3);
        let GeometrySource::Shell(patches) = src else {
            panic!("expected Shell");
        };
        // Top flange mid-surface sits at (h - tf) / 2 above the centerline.
        let top = &patches[1];
        assert!((top.origin.z - 0.5 * (0.3 - 0.0107)).abs() < 1e-12);
    }

    #[test]
    fn only_surfaces_and_blocks_carry_a_grid_frame() {
        let line = Adapt::new(&i_beam(), GeomRepr::Line).execute().unwrap();
        let shell = Adapt::new(&i_beam(), GeomRepr::Shell).execute().unwrap();
        assert!(line.frame().is_none());
        assert!(shell.frame().unwrap().is_aligned_with(&Frame::world()));
    }

    #[test]
    fn i_beam_solid_blocks_are_right_handed() {
        let src = Adapt::new(&i_beam(), GeomRepr::Solid).execute().unwrap();
        let GeometrySource::Solid(blocks) = src else {
            panic!("expected Solid");
        };
        assert_eq!(blocks.len(), 3);
        for b in &blocks {
            let [u, v, w] = b.edges;
            assert!(u.cross(&v).dot(&w) > 0.0);
        }
    }

    #[test]
    fn solid_section_cannot_be_a_shell() {
        let beam: StructuralObject = Beam::new(
            "bar",
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            CrossSection::Rectangle(RectangularSection::new(0.05, 0.05)),
        )
        .into();
        let err = Adapt::new(&beam, GeomRepr::Shell).execute().unwrap_err();
        assert!(matches!(err, AdapterError::UnsupportedGeomRepr { repr: GeomRepr::Shell, .. }));
    }

    #[test]
    fn plates_and_volumes_have_no_line_form() {
        let plate: StructuralObject = Plate::horizontal("deck", (0.0, 0.0), (1.0, 1.0), 0.0, 0.01).into();
        let volume: StructuralObject =
            BoxVolume::axis_aligned("block", p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).into();
        assert!(matches!(
            Adapt::new(&plate, GeomRepr::Line).execute(),
            Err(AdapterError::UnsupportedGeomRepr { .. })
        ));
        assert!(matches!(
            Adapt::new(&volume, GeomRepr::Shell).execute(),
            Err(AdapterError::UnsupportedGeomRepr { .. })
        ));
    }

    #[test]
    fn plate_solid_is_centered_on_mid_surface() {
        let plate: StructuralObject = Plate::horizontal("deck", (0.0, 0.0), (1.0, 1.0), 2.0, 0.02).into();
        let GeometrySource::Solid(blocks) = Adapt::new(&plate, GeomRepr::Solid).execute().unwrap() else {
            panic!("expected Solid");
        };
        let aabb = blocks[0].bounding_box();
        assert!((aabb.min.z - 1.99).abs() < 1e-12);
        assert!((aabb.max.z - 2.01).abs() < 1e-12);
    }

    #[test]
    fn skewed_plate_is_rejected() {
        let plate: StructuralObject = Plate::new(
            "skew",
            p(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            0.01,
        )
        .into();
        assert!(matches!(
            Adapt::new(&plate, GeomRepr::Shell).execute(),
            Err(AdapterError::InvalidGeometry { .. })
        ));
    }
}
