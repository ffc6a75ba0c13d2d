use crate::config::{MeshParams, SolidAlgorithm};
use crate::math::span_count;

use super::cell::Cell;

/// Largest ratio between a volume cell's spacing and the thinnest solid
/// extent under [`SolidAlgorithm::AspectLimited`].
const MAX_ASPECT: f64 = 2.0;

/// Mesh coordinates along each axis of a group frame.
///
/// Every cell boundary is a station, so cells meshed on the same stations
/// share nodes wherever they touch.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Stations {
    axes: [Vec<f64>; 3],
    tolerance: f64,
}

impl Stations {
    #[allow(clippy::cast_precision_loss)]
    pub fn build(cells: &[Cell], params: &MeshParams, tolerance: f64) -> Self {
        let spacing = spacing(cells, params, tolerance);
        let axes = std::array::from_fn(|axis| {
            let mut breaks: Vec<f64> = cells.iter().flat_map(|c| [c.lo[axis], c.hi[axis]]).collect();
            breaks.sort_by(f64::total_cmp);
            breaks.dedup_by(|a, b| (*a - *b).abs() <= tolerance);
            let mut stations = Vec::new();
            for w in breaks.windows(2) {
                let (a, b) = (w[0], w[1]);
                let n = span_count(b - a, spacing);
                stations.extend((0..n).map(|i| a + (b - a) * i as f64 / n as f64));
            }
            if let Some(&last) = breaks.last() {
                stations.push(last);
            }
            stations
        });
        Self { axes, tolerance }
    }

    /// Stations of `axis` between `lo` and `hi`, inclusive.
    pub fn within(&self, axis: usize, lo: f64, hi: f64) -> &[f64] {
        let s = &self.axes[axis];
        let first = s.partition_point(|&v| v < lo - self.tolerance);
        let last = s.partition_point(|&v| v <= hi + self.tolerance);
        &s[first..last.max(first)]
    }
}

fn spacing(cells: &[Cell], params: &MeshParams, tolerance: f64) -> f64 {
    if params.algorithm_3d != SolidAlgorithm::AspectLimited || params.use_hex {
        return params.size;
    }
    let thinnest = cells
        .iter()
        .filter(|c| c.dim(tolerance) == 3)
        .flat_map(|c| (0..3).map(|a| c.extent(a)))
        .fold(f64::INFINITY, f64::min);
    if thinnest.is_finite() {
        params.size.min(MAX_ASPECT * thinnest)
    } else {
        params.size
    }
}
