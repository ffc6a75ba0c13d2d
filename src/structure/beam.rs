use crate::math::{Aabb, Frame, Point3, Vector3, TOLERANCE};

use super::section::{CrossSection, SectionPoint};
use super::CadObject;

/// A straight beam defined by its centerline and cross-section.
///
/// The local frame has `x` along the centerline, `y` along the section
/// height (following the `up` hint) and `z = x × y`.
#[derive(Debug, Clone, PartialEq)]
pub struct Beam {
    name: String,
    start: Point3,
    end: Point3,
    section: CrossSection,
    up: Vector3,
}

impl Beam {
    /// Creates a beam with the section height pointing along world `z`
    /// (world `y` for vertical beams).
    #[must_use]
    pub fn new(name: impl Into<String>, start: Point3, end: Point3, section: CrossSection) -> Self {
        let axis = end - start;
        let up = if axis.norm() > TOLERANCE && axis.normalize().z.abs() > 0.999 {
            Vector3::y()
        } else {
            Vector3::z()
        };
        Self {
            name: name.into(),
            start,
            end,
            section,
            up,
        }
    }

    /// Overrides the direction the section height points to.
    #[must_use]
    pub fn with_up(mut self, up: Vector3) -> Self {
        self.up = up;
        self
    }

    /// Start of the centerline.
    #[must_use]
    pub fn start(&self) -> &Point3 {
        &self.start
    }

    /// End of the centerline.
    #[must_use]
    pub fn end(&self) -> &Point3 {
        &self.end
    }

    /// The beam's cross-section.
    #[must_use]
    pub fn section(&self) -> &CrossSection {
        &self.section
    }

    /// Length of the centerline.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// Local frame `(x, y, z)`, or `None` if the beam is degenerate or the
    /// up hint is parallel to the axis.
    #[must_use]
    pub fn local_frame(&self) -> Option<Frame> {
        let x = self.end - self.start;
        if x.norm() < TOLERANCE {
            return None;
        }
        let x = x.normalize();
        let y = self.up - x * self.up.dot(&x);
        Frame::from_axes(&x, &y)
    }

    /// Expresses a world point in section coordinates.
    #[must_use]
    pub fn section_point(&self, frame: &Frame, p: &Point3) -> SectionPoint {
        let d = p - self.start;
        let [_, ey, ez] = frame.axes();
        SectionPoint::new(d.dot(ey), d.dot(ez))
    }
}

impl CadObject for Beam {
    fn name(&self) -> &str {
        &self.name
    }

    fn bounding_box(&self) -> Aabb {
        let profile = self.section.profile();
        let reach = 0.5 * profile.height().hypot(profile.width());
        let mut aabb = Aabb {
            min: self.start,
            max: self.start,
        };
        aabb.include(&self.end);
        aabb.inflated(reach)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::structure::section::RectangularSection;

    fn rect() -> CrossSection {
        CrossSection::Rectangle(RectangularSection::new(0.2, 0.1))
    }

    #[test]
    fn horizontal_beam_height_points_up() {
        let beam = Beam::new("b", Point3::origin(), Point3::new(2.0, 0.0, 0.0), rect());
        let frame = beam.local_frame().unwrap();
        let [x, y, z] = frame.axes();
        assert!((x.x - 1.0).abs() < TOLERANCE);
        assert!((y.z - 1.0).abs() < TOLERANCE);
        assert!((z.y + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn vertical_beam_uses_fallback_up() {
        let beam = Beam::new("col", Point3::origin(), Point3::new(0.0, 0.0, 3.0), rect());
        assert!(beam.local_frame().is_some());
    }

    #[test]
    fn degenerate_beam_has_no_frame() {
        let beam = Beam::new("b", Point3::origin(), Point3::origin(), rect());
        assert!(beam.local_frame().is_none());
    }

    #[test]
    fn section_point_measures_offsets() {
        let beam = Beam::new("b", Point3::origin(), Point3::new(2.0, 0.0, 0.0), rect());
        let frame = beam.local_frame().unwrap();
        let sp = beam.section_point(&frame, &Point3::new(1.0, -0.03, 0.05));
        assert!((sp.y - 0.05).abs() < 1e-12);
        assert!((sp.z - 0.03).abs() < 1e-12);
    }
}
