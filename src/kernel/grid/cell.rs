use crate::adapter::Segment;
use crate::math::{Frame, Point3};

/// A box aligned with a frame, in that frame's local coordinates.
///
/// Degenerate axes (`hi - lo` within tolerance) lower the dimension: one
/// open axis is a curve, two a surface, three a volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Cell {
    pub lo: [f64; 3],
    pub hi: [f64; 3],
}

impl Cell {
    /// The tightest cell around world points.
    pub fn around(frame: &Frame, points: &[Point3]) -> Self {
        let mut lo = [f64::INFINITY; 3];
        let mut hi = [f64::NEG_INFINITY; 3];
        for p in points {
            let local = frame.to_local(p);
            for axis in 0..3 {
                lo[axis] = lo[axis].min(local[axis]);
                hi[axis] = hi[axis].max(local[axis]);
            }
        }
        Self { lo, hi }
    }

    /// A curve cell for a segment parallel to one of the frame axes.
    pub fn from_segment(frame: &Frame, segment: &Segment) -> Option<Self> {
        frame.axis_of(&segment.delta())?;
        Some(Self::around(frame, &[segment.start, segment.end]))
    }

    /// Re-expresses the cell in another frame with parallel axes.
    pub fn reframed(&self, from: &Frame, to: &Frame) -> Option<Self> {
        if !to.is_aligned_with(from) {
            return None;
        }
        Some(Self::around(to, &[from.to_world(self.lo), from.to_world(self.hi)]))
    }

    pub fn is_open(&self, axis: usize, tol: f64) -> bool {
        self.hi[axis] - self.lo[axis] > tol
    }

    pub fn dim(&self, tol: f64) -> u8 {
        let open = (0..3).filter(|&a| self.is_open(a, tol)).count();
        u8::try_from(open).unwrap_or(3)
    }

    /// The closed axis of a surface cell.
    pub fn normal_axis(&self, tol: f64) -> Option<usize> {
        if self.dim(tol) != 2 {
            return None;
        }
        (0..3).find(|&a| !self.is_open(a, tol))
    }

    /// The open axis of a curve cell.
    pub fn curve_axis(&self, tol: f64) -> Option<usize> {
        if self.dim(tol) != 1 {
            return None;
        }
        (0..3).find(|&a| self.is_open(a, tol))
    }

    pub fn center(&self) -> [f64; 3] {
        std::array::from_fn(|a| 0.5 * (self.lo[a] + self.hi[a]))
    }

    pub fn extent(&self, axis: usize) -> f64 {
        self.hi[axis] - self.lo[axis]
    }

    /// Checks if the closed boxes intersect.
    pub fn touches(&self, other: &Self, tol: f64) -> bool {
        (0..3).all(|a| self.lo[a] <= other.hi[a] + tol && self.hi[a] >= other.lo[a] - tol)
    }

    pub fn contains(&self, local: &[f64; 3], tol: f64) -> bool {
        (0..3).all(|a| local[a] >= self.lo[a] - tol && local[a] <= self.hi[a] + tol)
    }

    /// Checks if `value` splits the cell along `axis`.
    pub fn splits_at(&self, axis: usize, value: f64, tol: f64) -> bool {
        value > self.lo[axis] + tol && value < self.hi[axis] - tol
    }

    pub fn coincides(&self, other: &Self, tol: f64) -> bool {
        (0..3).all(|a| (self.lo[a] - other.lo[a]).abs() <= tol && (self.hi[a] - other.hi[a]).abs() <= tol)
    }

    /// Splits the cell at interior values along each axis.
    pub fn split(&self, cuts: &[Vec<f64>; 3], tol: f64) -> Vec<Self> {
        let ranges: [Vec<(f64, f64)>; 3] = std::array::from_fn(|axis| {
            let mut values: Vec<f64> = cuts[axis]
                .iter()
                .copied()
                .filter(|&v| self.splits_at(axis, v, tol))
                .collect();
            values.sort_by(f64::total_cmp);
            values.dedup_by(|a, b| (*a - *b).abs() <= tol);
            let mut bounds = Vec::with_capacity(values.len() + 2);
            bounds.push(self.lo[axis]);
            bounds.extend(values);
            bounds.push(self.hi[axis]);
            bounds.windows(2).map(|w| (w[0], w[1])).collect()
        });
        let mut pieces = Vec::new();
        for &(x0, x1) in &ranges[0] {
            for &(y0, y1) in &ranges[1] {
                for &(z0, z1) in &ranges[2] {
                    pieces.push(Self {
                        lo: [x0, y0, z0],
                        hi: [x1, y1, z1],
                    });
                }
            }
        }
        pieces
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vector3;

    fn patch(lo: [f64; 3], hi: [f64; 3]) -> Cell {
        Cell { lo, hi }
    }

    #[test]
    fn dimension_counts_open_axes() {
        let tol = 1e-9;
        assert_eq!(patch([0.0; 3], [1.0, 0.0, 0.0]).dim(tol), 1);
        assert_eq!(patch([0.0; 3], [1.0, 1.0, 0.0]).dim(tol), 2);
        assert_eq!(patch([0.0; 3], [1.0, 1.0, 1.0]).dim(tol), 3);
        assert_eq!(patch([0.0; 3], [1.0, 1.0, 0.0]).normal_axis(tol), Some(2));
        assert_eq!(patch([0.0; 3], [0.0, 2.0, 0.0]).curve_axis(tol), Some(1));
    }

    #[test]
    fn split_ignores_boundary_values() {
        let cell = patch([0.0; 3], [1.0, 1.0, 0.0]);
        let cuts = [vec![0.0, 0.5, 1.0], vec![0.25], vec![0.0]];
        let pieces = cell.split(&cuts, 1e-9);
        assert_eq!(pieces.len(), 4);
        assert!(pieces.iter().all(|p| p.dim(1e-9) == 2));
    }

    #[test]
    fn reframing_swaps_axes() {
        let world = Frame::world();
        let turned = Frame::from_axes(&Vector3::y(), &Vector3::x()).unwrap();
        let cell = patch([0.0, 0.0, 0.0], [2.0, 1.0, 0.0]);
        let moved = cell.reframed(&world, &turned).unwrap();
        assert!((moved.extent(0) - 1.0).abs() < 1e-12);
        assert!((moved.extent(1) - 2.0).abs() < 1e-12);
        assert!(moved.extent(2).abs() < 1e-12);
    }
}
