use super::{SectionProfile, SectionWall};

/// A solid rectangular section. Has no web/flange decomposition.
#[derive(Debug, Clone, PartialEq)]
pub struct RectangularSection {
    height: f64,
    width: f64,
}

impl RectangularSection {
    #[must_use]
    pub fn new(height: f64, width: f64) -> Self {
        Self { height, width }
    }
}

impl SectionProfile for RectangularSection {
    fn height(&self) -> f64 {
        self.height
    }

    fn width(&self) -> f64 {
        self.width
    }

    fn shell_walls(&self) -> Option<Vec<SectionWall>> {
        None
    }

    fn solid_walls(&self) -> Vec<SectionWall> {
        let h = 0.5 * self.height;
        let b = 0.5 * self.width;
        vec![SectionWall::new(None, (-h, h), (-b, b))]
    }

    fn is_valid(&self) -> bool {
        self.height > 0.0 && self.width > 0.0
    }
}
