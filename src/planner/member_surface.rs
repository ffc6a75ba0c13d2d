//! Members lying on, piercing or passing through surfaces and solids.

use crate::adapter::{Block, Patch, Segment};
use crate::math::intersect_3d::{clip_to_slabs, signed_distance_to_plane};
use crate::math::Frame;

use super::{is_interior, PairContext, PartitionCut};

/// Start, direction and box extents of a segment in a frame anchored at
/// `origin`.
struct Local {
    start: [f64; 3],
    delta: [f64; 3],
    extent: [f64; 3],
}

impl Local {
    fn new(frame: &Frame, origin: &crate::math::Point3, segment: &Segment, extent: [f64; 3]) -> Self {
        let o = frame.to_local(origin);
        let s = frame.to_local(&segment.start);
        let e = frame.to_local(&segment.end);
        Self {
            start: std::array::from_fn(|i| s[i] - o[i]),
            delta: std::array::from_fn(|i| e[i] - s[i]),
            extent,
        }
    }

    fn clip(&self, axes: usize, tol: f64) -> Option<(f64, f64)> {
        clip_to_slabs(
            &self.start[..axes],
            &self.delta[..axes],
            &[0.0; 3][..axes],
            &self.extent[..axes],
            (0.0, 1.0),
            tol,
        )
    }

    /// Distance from the point at `t` to the box, ignoring axes past `axes`.
    fn gap_at(&self, t: f64, axes: usize) -> f64 {
        (0..axes)
            .map(|i| {
                let x = self.start[i] + t * self.delta[i];
                (-x).max(x - self.extent[i]).max(0.0)
            })
            .fold(0.0, f64::hypot)
    }
}

/// A member lying in, or piercing, a rectangular patch.
///
/// In-plane members become a line cut on the patch plus point cuts on the
/// member where it enters and leaves. In-plane members not parallel to a
/// patch edge cannot be embedded conformingly and are reported.
pub(super) fn segment_patch(ctx: &mut PairContext<'_>, segment: &Segment, patch: &Patch, swapped: bool) {
    let tol = ctx.options.tolerance;
    let ((member, member_name), (surface, surface_name)) = ctx.ordered(swapped);
    let (Some(frame), Some(plane)) = (patch.frame(), patch.plane()) else {
        return;
    };
    let length = segment.length();
    let da = signed_distance_to_plane(&segment.start, &plane);
    let db = signed_distance_to_plane(&segment.end, &plane);
    let local = Local::new(&frame, &patch.origin, segment, [patch.u.norm(), patch.v.norm(), 0.0]);

    if da.abs() <= tol && db.abs() <= tol {
        let Some((t0, t1)) = local.clip(2, tol) else {
            ctx.miss(local.gap_at(0.0, 2).min(local.gap_at(1.0, 2)));
            return;
        };
        if (t1 - t0) * length > tol && frame.axis_of(&segment.delta()).is_none() {
            ctx.ambiguous(
                member_name,
                format!("lies on '{surface_name}' but is not parallel to any of its edges"),
            );
            return;
        }
        let (p0, p1) = (segment.at(t0), segment.at(t1));
        if (t1 - t0) * length > tol {
            ctx.cut(PartitionCut::line(p0, p1, surface));
        } else {
            ctx.cut(PartitionCut::point(p0, surface));
        }
        for (t, p) in [(t0, p0), (t1, p1)] {
            if is_interior(t, length, tol) {
                ctx.cut(PartitionCut::point(p, member));
            }
        }
        ctx.touch();
        return;
    }

    if da.signum() == db.signum() && da.abs() > tol && db.abs() > tol {
        let (near, t) = if da.abs() < db.abs() { (da.abs(), 0.0) } else { (db.abs(), 1.0) };
        if local.gap_at(t, 2) <= tol {
            ctx.miss(near);
        }
        return;
    }

    let t = if (da - db).abs() > f64::EPSILON { da / (da - db) } else { 0.0 };
    let point = segment.at(t);
    let gap = local.gap_at(t, 2);
    if gap > tol {
        ctx.miss(gap);
        return;
    }
    ctx.cut(PartitionCut::point(point, surface));
    if is_interior(t, length, tol) {
        ctx.cut(PartitionCut::point(point, member));
    }
    ctx.touch();
}

/// A member passing through or ending inside a block.
///
/// The member is split where it enters and leaves the block and the block
/// is split at those points. A member parallel to a block edge is also
/// embedded as a line cut.
pub(super) fn segment_block(ctx: &mut PairContext<'_>, segment: &Segment, block: &Block, swapped: bool) {
    let tol = ctx.options.tolerance;
    let ((member, _), (solid, _)) = ctx.ordered(swapped);
    let Some(frame) = block.frame() else {
        return;
    };
    let extent = block.edges.map(|e| e.norm());
    let local = Local::new(&frame, &block.origin, segment, extent);
    let length = segment.length();

    let Some((t0, t1)) = local.clip(3, tol) else {
        ctx.miss(local.gap_at(0.0, 3).min(local.gap_at(1.0, 3)));
        return;
    };
    let (p0, p1) = (segment.at(t0), segment.at(t1));
    if (t1 - t0) * length > tol && frame.axis_of(&segment.delta()).is_some() {
        ctx.cut(PartitionCut::line(p0, p1, solid));
    } else {
        ctx.cut(PartitionCut::point(p0, solid));
        ctx.cut(PartitionCut::point(p1, solid));
    }
    for (t, p) in [(t0, p0), (t1, p1)] {
        if is_interior(t, length, tol) {
            ctx.cut(PartitionCut::point(p, member));
        }
    }
    ctx.touch();
}
