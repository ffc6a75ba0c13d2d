//! Split-value computation for one fragmentation batch.

use crate::adapter::Segment;
use crate::error::KernelError;
use crate::kernel::{CutGeometry, KernelEntity};
use crate::math::intersect_3d::{
    collinear_overlap, line_plane_intersect, point_segment_param, segment_segment_closest,
    LinePlaneRelation,
};
use crate::math::{Frame, Plane};

use super::cell::Cell;

/// Values at which a cell must be split so it conforms to its neighbors.
///
/// Every peer cell touching `cell` contributes its bounds that fall strictly
/// inside `cell`.
pub(super) fn peer_splits(cell: &Cell, peers: &[Cell], tol: f64) -> [Vec<f64>; 3] {
    let mut cuts: [Vec<f64>; 3] = Default::default();
    for peer in peers.iter().filter(|p| cell.touches(p, tol)) {
        for (axis, values) in cuts.iter_mut().enumerate() {
            for v in [peer.lo[axis], peer.hi[axis]] {
                if cell.splits_at(axis, v, tol) {
                    values.push(v);
                }
            }
        }
    }
    cuts
}

/// Adds the split values a cut tool induces on a cell.
///
/// # Errors
///
/// Returns [`KernelError::NonConformingCut`] when a line or plane tool is not
/// parallel to the cell's grid.
pub(super) fn tool_splits_cell(
    entity: KernelEntity,
    cell: &Cell,
    frame: &Frame,
    tool: &CutGeometry,
    tol: f64,
    cuts: &mut [Vec<f64>; 3],
) -> Result<(), KernelError> {
    let non_conforming = |reason: &str| KernelError::NonConformingCut {
        entity,
        reason: reason.to_owned(),
    };
    match tool {
        CutGeometry::Point(p) => {
            let local = frame.to_local(p);
            if cell.contains(&local, tol) {
                for (axis, values) in cuts.iter_mut().enumerate() {
                    values.push(local[axis]);
                }
            }
        }
        CutGeometry::Line { start, end } => {
            if frame.axis_of(&(end - start)).is_none() {
                return Err(non_conforming("line cut is not parallel to a grid axis"));
            }
            let line = Cell::around(frame, &[*start, *end]);
            if cell.touches(&line, tol) {
                for (axis, values) in cuts.iter_mut().enumerate() {
                    values.extend([line.lo[axis], line.hi[axis]]);
                }
            }
        }
        CutGeometry::Plane { origin, normal } => {
            let axis = frame
                .axis_of(normal)
                .ok_or_else(|| non_conforming("plane cut is not normal to a grid axis"))?;
            cuts[axis].push(frame.to_local(origin)[axis]);
        }
    }
    Ok(())
}

/// Adds the parameters at which a cut tool splits a free segment.
pub(super) fn tool_splits_segment(segment: &Segment, tool: &CutGeometry, tol: f64, params: &mut Vec<f64>) {
    match tool {
        CutGeometry::Point(p) => {
            let (t, distance) = point_segment_param(p, &segment.start, &segment.end);
            if distance <= tol {
                params.push(t);
            }
        }
        CutGeometry::Line { start, end } => {
            if let Some((lo, hi)) = collinear_overlap(&segment.start, &segment.end, start, end, tol) {
                params.extend([lo, hi]);
            } else if let Some(pair) = segment_segment_closest(&segment.start, &segment.end, start, end) {
                if pair.distance <= tol {
                    params.push(pair.s);
                }
            }
        }
        CutGeometry::Plane { origin, normal } => {
            let Some(plane) = Plane::from_normal(*origin, *normal) else {
                return;
            };
            if let LinePlaneRelation::Point { t, .. } =
                line_plane_intersect(&segment.start, &segment.delta(), &plane, tol)
            {
                if (0.0..=1.0).contains(&t) {
                    params.push(t);
                }
            }
        }
    }
}

/// Splits a segment at interior parameters, dropping splits closer than
/// `tol` to an end or to each other.
pub(super) fn split_segment(segment: &Segment, params: &[f64], tol: f64) -> Vec<Segment> {
    let length = segment.length();
    let mut ts: Vec<f64> = params
        .iter()
        .copied()
        .filter(|&t| t * length > tol && (1.0 - t) * length > tol)
        .collect();
    ts.sort_by(f64::total_cmp);
    ts.dedup_by(|a, b| (*a - *b).abs() * length <= tol);

    let mut points = Vec::with_capacity(ts.len() + 2);
    points.push(segment.start);
    points.extend(ts.iter().map(|&t| segment.at(t)));
    points.push(segment.end);
    points.windows(2).map(|w| Segment::new(w[0], w[1])).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Point3, Vector3};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn abutting_plates_split_each_other() {
        let a = Cell {
            lo: [0.0, 0.0, 0.0],
            hi: [1.0, 1.0, 0.0],
        };
        let b = Cell {
            lo: [1.0, 0.5, 0.0],
            hi: [2.0, 1.5, 0.0],
        };
        let on_a = peer_splits(&a, &[b], 1e-9);
        assert_eq!(on_a[1], vec![0.5]);
        assert!(on_a[0].is_empty());
        let on_b = peer_splits(&b, &[a], 1e-9);
        assert_eq!(on_b[1], vec![1.0]);
    }

    #[test]
    fn skewed_plane_does_not_conform() {
        let cell = Cell {
            lo: [0.0; 3],
            hi: [1.0, 1.0, 1.0],
        };
        let mut cuts = Default::default();
        let err = tool_splits_cell(
            KernelEntity::new(3, 1),
            &cell,
            &Frame::world(),
            &CutGeometry::Plane {
                origin: p(0.5, 0.5, 0.5),
                normal: Vector3::new(1.0, 1.0, 0.0),
            },
            1e-9,
            &mut cuts,
        );
        assert!(matches!(err, Err(KernelError::NonConformingCut { .. })));
    }

    #[test]
    fn segment_splits_at_interior_points_only() {
        let seg = Segment::new(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0));
        let mut params = Vec::new();
        tool_splits_segment(&seg, &CutGeometry::Point(p(0.5, 0.0, 0.0)), 1e-9, &mut params);
        tool_splits_segment(&seg, &CutGeometry::Point(p(1.0, 0.0, 0.0)), 1e-9, &mut params);
        tool_splits_segment(&seg, &CutGeometry::Point(p(0.5, 0.2, 0.0)), 1e-9, &mut params);
        let pieces = split_segment(&seg, &params, 1e-9);
        assert_eq!(pieces.len(), 2);
        assert!((pieces[0].length() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn plane_splits_crossing_segment() {
        let seg = Segment::new(p(0.0, 0.0, -1.0), p(0.0, 0.0, 3.0));
        let mut params = Vec::new();
        tool_splits_segment(
            &seg,
            &CutGeometry::Plane {
                origin: p(5.0, 5.0, 0.0),
                normal: Vector3::z(),
            },
            1e-9,
            &mut params,
        );
        assert_eq!(params.len(), 1);
        assert!((params[0] - 0.25).abs() < 1e-12);
    }
}
