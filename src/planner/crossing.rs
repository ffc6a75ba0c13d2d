//! Member-member interactions.

use crate::adapter::Segment;
use crate::math::intersect_3d::{collinear_overlap, point_segment_param, segment_segment_closest};

use super::{is_interior, PairContext, PartitionCut};

/// Crossings, T-junctions and collinear overlaps between two segments.
///
/// Every intersection point interior to a segment becomes a point cut on
/// that segment's object. Contact at shared endpoints still links the two
/// objects so their end nodes coincide.
pub(super) fn segment_segment(ctx: &mut PairContext<'_>, a: &Segment, b: &Segment, swapped: bool) {
    let tol = ctx.options.tolerance;
    let ((ka, _), (kb, _)) = ctx.ordered(swapped);
    let (la, lb) = (a.length(), b.length());

    if let Some((lo, hi)) = collinear_overlap(&a.start, &a.end, &b.start, &b.end, tol) {
        for t in [lo, hi] {
            let point = a.at(t);
            if is_interior(t, la, tol) {
                ctx.cut(PartitionCut::point(point, ka));
            }
            let (s, _) = point_segment_param(&point, &b.start, &b.end);
            if is_interior(s, lb, tol) {
                ctx.cut(PartitionCut::point(point, kb));
            }
        }
        ctx.touch();
        return;
    }

    let Some(pair) = segment_segment_closest(&a.start, &a.end, &b.start, &b.end) else {
        return;
    };
    if pair.distance > tol {
        ctx.miss(pair.distance);
        return;
    }
    let point = nalgebra::center(&pair.on_a, &pair.on_b);
    if is_interior(pair.s, la, tol) {
        ctx.cut(PartitionCut::point(point, ka));
    }
    if is_interior(pair.t, lb, tol) {
        ctx.cut(PartitionCut::point(point, kb));
    }
    ctx.touch();
}
