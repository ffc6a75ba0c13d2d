use super::{FaceTag, SectionProfile, SectionWall};

/// A channel (C / U) section with the web on the `-z` side.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSection {
    height: f64,
    width: f64,
    web_thickness: f64,
    flange_thickness: f64,
}

impl ChannelSection {
    /// Creates a channel from overall height, flange width, and wall
    /// thicknesses.
    #[must_use]
    pub fn new(height: f64, width: f64, web_thickness: f64, flange_thickness: f64) -> Self {
        Self {
            height,
            width,
            web_thickness,
            flange_thickness,
        }
    }
}

impl SectionProfile for ChannelSection {
    fn height(&self) -> f64 {
        self.height
    }

    fn width(&self) -> f64 {
        self.width
    }

    fn shell_walls(&self) -> Option<Vec<SectionWall>> {
        let ym = 0.5 * (self.height - self.flange_thickness);
        let zw = -0.5 * self.width + 0.5 * self.web_thickness;
        let zf = 0.5 * self.width;
        Some(vec![
            SectionWall::new(Some(FaceTag::Web), (-ym, ym), (zw, zw)),
            SectionWall::new(Some(FaceTag::TopFlange), (ym, ym), (zw, zf)),
            SectionWall::new(Some(FaceTag::BottomFlange), (-ym, -ym), (zw, zf)),
        ])
    }

    fn solid_walls(&self) -> Vec<SectionWall> {
        let h = 0.5 * self.height;
        let yi = h - self.flange_thickness;
        let zf = 0.5 * self.width;
        let zw = -zf + self.web_thickness;
        vec![
            SectionWall::new(Some(FaceTag::Web), (-yi, yi), (-zf, zw)),
            SectionWall::new(Some(FaceTag::TopFlange), (yi, h), (-zf, zf)),
            SectionWall::new(Some(FaceTag::BottomFlange), (-h, -yi), (-zf, zf)),
        ]
    }

    fn is_valid(&self) -> bool {
        self.web_thickness > 0.0
            && self.flange_thickness > 0.0
            && self.width > self.web_thickness
            && self.height > 2.0 * self.flange_thickness
    }
}
