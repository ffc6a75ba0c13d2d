use super::{Point3, Vector3, TOLERANCE};

/// Angular slack for treating two unit vectors as parallel.
const PARALLEL_TOLERANCE: f64 = 1e-9;

/// A right-handed orthonormal basis anchored at the world origin.
///
/// Local coordinates are plain projections onto the axes, so two frames with
/// parallel axes describe the same grid lines regardless of where the
/// geometry sits.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    axes: [Vector3; 3],
}

impl Frame {
    /// The world XYZ frame.
    #[must_use]
    pub fn world() -> Self {
        Self {
            axes: [Vector3::x(), Vector3::y(), Vector3::z()],
        }
    }

    /// Creates a frame whose first axis follows `u` and second axis follows `v`.
    ///
    /// The third axis is `u × v`. Returns `None` if either vector is
    /// zero-length or the two are not perpendicular.
    #[must_use]
    pub fn from_axes(u: &Vector3, v: &Vector3) -> Option<Self> {
        let u_len = u.norm();
        let v_len = v.norm();
        if u_len < TOLERANCE || v_len < TOLERANCE {
            return None;
        }
        let u = u / u_len;
        let v = v / v_len;
        if u.dot(&v).abs() > PARALLEL_TOLERANCE.sqrt() {
            return None;
        }
        let w = u.cross(&v).normalize();
        // Re-orthogonalize v so accumulated round-off never tilts the grid.
        let v = w.cross(&u);
        Some(Self { axes: [u, v, w] })
    }

    /// Returns the three unit axes.
    #[must_use]
    pub fn axes(&self) -> &[Vector3; 3] {
        &self.axes
    }

    /// Projects a world point onto the frame axes.
    #[must_use]
    pub fn to_local(&self, p: &Point3) -> [f64; 3] {
        let c = p.coords;
        [
            c.dot(&self.axes[0]),
            c.dot(&self.axes[1]),
            c.dot(&self.axes[2]),
        ]
    }

    /// Maps local coordinates back to a world point.
    #[must_use]
    pub fn to_world(&self, local: [f64; 3]) -> Point3 {
        Point3::from(self.axes[0] * local[0] + self.axes[1] * local[1] + self.axes[2] * local[2])
    }

    /// Returns the index of the axis parallel (or anti-parallel) to `dir`.
    #[must_use]
    pub fn axis_of(&self, dir: &Vector3) -> Option<usize> {
        let len = dir.norm();
        if len < TOLERANCE {
            return None;
        }
        let d = dir / len;
        self.axes
            .iter()
            .position(|a| (a.dot(&d).abs() - 1.0).abs() < PARALLEL_TOLERANCE)
    }

    /// Checks if every axis of `other` is parallel to some axis of `self`.
    #[must_use]
    pub fn is_aligned_with(&self, other: &Frame) -> bool {
        other.axes.iter().all(|a| self.axis_of(a).is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3::new(x, y, z)
    }

    #[test]
    fn frame_is_right_handed() {
        let f = Frame::from_axes(&v(0.0, 2.0, 0.0), &v(0.0, 0.0, 3.0)).unwrap();
        let [a, b, c] = f.axes();
        assert!((a.cross(b) - c).norm() < TOLERANCE);
        assert!((c.x - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn skewed_axes_are_rejected() {
        assert!(Frame::from_axes(&v(1.0, 0.0, 0.0), &v(1.0, 1.0, 0.0)).is_none());
        assert!(Frame::from_axes(&v(0.0, 0.0, 0.0), &v(1.0, 1.0, 0.0)).is_none());
    }

    #[test]
    fn local_round_trip() {
        let f = Frame::from_axes(&v(1.0, 1.0, 0.0), &v(-1.0, 1.0, 0.0)).unwrap();
        let p = Point3::new(0.3, -1.2, 4.0);
        let back = f.to_world(f.to_local(&p));
        assert!((back - p).norm() < 1e-12);
    }

    #[test]
    fn permuted_frames_are_aligned() {
        let a = Frame::world();
        let b = Frame::from_axes(&v(0.0, 0.0, 1.0), &v(-1.0, 0.0, 0.0)).unwrap();
        let c = Frame::from_axes(&v(1.0, 1.0, 0.0), &v(0.0, 0.0, 1.0)).unwrap();
        assert!(a.is_aligned_with(&b));
        assert!(!a.is_aligned_with(&c));
        assert_eq!(a.axis_of(&v(0.0, -2.0, 0.0)), Some(1));
    }
}
