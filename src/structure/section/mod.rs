mod box_section;
mod channel;
mod i_section;
mod rectangle;

pub use box_section::BoxSection;
pub use channel::ChannelSection;
pub use i_section::ISection;
pub use rectangle::RectangularSection;

use std::fmt;

/// A face of a thin-walled cross-section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FaceTag {
    Web,
    TopFlange,
    BottomFlange,
}

impl FaceTag {
    /// Suffix used for face set names.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::TopFlange => "top_flange",
            Self::BottomFlange => "bottom_flange",
        }
    }
}

impl fmt::Display for FaceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A point in section coordinates.
///
/// `y` runs along the web (section height), `z` along the flanges (section
/// width). The origin is the center of the section's bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionPoint {
    pub y: f64,
    pub z: f64,
}

impl SectionPoint {
    #[must_use]
    pub fn new(y: f64, z: f64) -> Self {
        Self { y, z }
    }
}

/// A rectangular wall region in section coordinates.
///
/// Shell walls are mid-surface lines, so one of the two ranges is
/// degenerate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionWall {
    /// The face this wall belongs to; `None` for solid sections.
    pub face: Option<FaceTag>,
    /// Range along section `y`.
    pub y: (f64, f64),
    /// Range along section `z`.
    pub z: (f64, f64),
}

impl SectionWall {
    #[must_use]
    pub fn new(face: Option<FaceTag>, y: (f64, f64), z: (f64, f64)) -> Self {
        Self { face, y, z }
    }

    /// Wall thickness (the shorter side).
    #[must_use]
    pub fn thickness(&self) -> f64 {
        (self.y.1 - self.y.0).min(self.z.1 - self.z.0)
    }

    fn contains(&self, p: &SectionPoint, tol: f64) -> bool {
        p.y >= self.y.0 - tol && p.y <= self.y.1 + tol && p.z >= self.z.0 - tol && p.z <= self.z.1 + tol
    }

    /// Distance from `p` to the wall's idealized mid-plane.
    fn midplane_distance(&self, p: &SectionPoint) -> f64 {
        let dy = self.y.1 - self.y.0;
        let dz = self.z.1 - self.z.0;
        if dy <= dz {
            (p.y - 0.5 * (self.y.0 + self.y.1)).abs()
        } else {
            (p.z - 0.5 * (self.z.0 + self.z.1)).abs()
        }
    }
}

/// Why a section point could not be assigned a face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FaceAmbiguity {
    /// The section has no web/flange decomposition.
    NotThinWalled,
    /// The point lies outside every wall.
    Unclassified,
    /// The point is equally close to two walls.
    Ambiguous(FaceTag, FaceTag),
}

impl fmt::Display for FaceAmbiguity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotThinWalled => f.write_str("section is not thin-walled"),
            Self::Unclassified => f.write_str("point lies outside every wall"),
            Self::Ambiguous(a, b) => write!(f, "point is equally close to {a} and {b}"),
        }
    }
}

/// Shape capability shared by all cross-section families.
///
/// New families are added by implementing this trait; face identification
/// comes for free from [`solid_walls`](Self::solid_walls) unless overridden.
pub trait SectionProfile {
    /// Overall section height (along `y`).
    fn height(&self) -> f64;

    /// Overall section width (along `z`).
    fn width(&self) -> f64;

    /// Mid-surface walls for shell idealization, or `None` if the section
    /// is not thin-walled.
    fn shell_walls(&self) -> Option<Vec<SectionWall>>;

    /// Wall regions filling the section, used for solid idealization.
    fn solid_walls(&self) -> Vec<SectionWall>;

    /// Thickness of the thinnest wall.
    fn thinnest_wall(&self) -> f64 {
        self.solid_walls()
            .iter()
            .map(SectionWall::thickness)
            .fold(f64::INFINITY, f64::min)
    }

    /// Classification tolerance. Kept below half the thinnest wall so two
    /// adjacent walls never both claim a mid-plane point.
    fn face_tolerance(&self) -> f64 {
        0.25 * self.thinnest_wall()
    }

    /// Checks that every dimension is positive and walls fit.
    fn is_valid(&self) -> bool;

    /// Classifies a section point as web or flange.
    ///
    /// # Errors
    ///
    /// Returns a [`FaceAmbiguity`] when no single face can be chosen.
    fn identify_face(&self, point: &SectionPoint, tolerance: f64) -> Result<FaceTag, FaceAmbiguity> {
        let walls = self.solid_walls();
        let mut candidates: Vec<(FaceTag, f64)> = walls
            .iter()
            .filter(|w| w.contains(point, tolerance))
            .filter_map(|w| w.face.map(|f| (f, w.midplane_distance(point))))
            .collect();
        if walls.iter().all(|w| w.face.is_none()) {
            return Err(FaceAmbiguity::NotThinWalled);
        }
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
        match candidates.as_slice() {
            [] => Err(FaceAmbiguity::Unclassified),
            [(face, _)] => Ok(*face),
            [(first, d1), rest @ ..] => {
                match rest.iter().find(|(f, _)| f != first) {
                    Some((other, d2)) if (d2 - d1).abs() <= tolerance => {
                        Err(FaceAmbiguity::Ambiguous(*first, *other))
                    }
                    _ => Ok(*first),
                }
            }
        }
    }
}

/// Cross-section data, tagged by family.
#[derive(Debug, Clone, PartialEq)]
pub enum CrossSection {
    I(ISection),
    Channel(ChannelSection),
    Box(BoxSection),
    Rectangle(RectangularSection),
}

impl CrossSection {
    /// Returns the shape capability for this section's family.
    #[must_use]
    pub fn profile(&self) -> &dyn SectionProfile {
        match self {
            Self::I(s) => s,
            Self::Channel(s) => s,
            Self::Box(s) => s,
            Self::Rectangle(s) => s,
        }
    }

    /// Checks if the section can be idealized as shell walls.
    #[must_use]
    pub fn is_thin_walled(&self) -> bool {
        self.profile().shell_walls().is_some()
    }
}
