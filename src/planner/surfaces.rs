//! Contacts between patches and blocks.
//!
//! Surfaces and solids that share a grid orientation only need to be
//! fragmented together; the kernel splits touching pieces at each other's
//! bounds. Pieces on skewed grids cannot be made conforming and are
//! reported instead.

use crate::adapter::{Block, Patch};
use crate::math::intersect_3d::{plane_plane_intersect, PlanePairRelation};
use crate::math::{Aabb, Frame, Point3};

use super::{PairContext, PartitionCut};

/// Axis-aligned extents in some frame.
#[derive(Debug, Clone, Copy)]
struct LocalBox {
    lo: [f64; 3],
    hi: [f64; 3],
}

impl LocalBox {
    fn around(frame: &Frame, points: &[Point3]) -> Self {
        let mut lo = [f64::INFINITY; 3];
        let mut hi = [f64::NEG_INFINITY; 3];
        for p in points {
            let l = frame.to_local(p);
            for i in 0..3 {
                lo[i] = lo[i].min(l[i]);
                hi[i] = hi[i].max(l[i]);
            }
        }
        Self { lo, hi }
    }

    /// Euclidean gap between the boxes; zero when they touch.
    fn gap(&self, other: &Self) -> f64 {
        (0..3)
            .map(|i| (other.lo[i] - self.hi[i]).max(self.lo[i] - other.hi[i]).max(0.0))
            .fold(0.0, f64::hypot)
    }
}

fn classify(ctx: &mut PairContext<'_>, a: &LocalBox, b: &LocalBox) -> bool {
    let gap = a.gap(b);
    if gap <= ctx.options.tolerance {
        ctx.touch();
        true
    } else {
        ctx.miss(gap);
        false
    }
}

fn skewed(ctx: &mut PairContext<'_>, a: &Aabb, b: &Aabb, detail: &str) {
    if a.inflated(ctx.options.tolerance).overlaps(b) {
        let (first, second) = ctx.names;
        ctx.ambiguous(first, format!("meets '{second}' {detail}; grids are not aligned"));
    }
}

pub(super) fn patch_patch(ctx: &mut PairContext<'_>, a: &Patch, b: &Patch) {
    let (Some(fa), Some(fb)) = (a.frame(), b.frame()) else {
        return;
    };
    if !fa.is_aligned_with(&fb) {
        let (Some(pa), Some(pb)) = (a.plane(), b.plane()) else {
            return;
        };
        match plane_plane_intersect(&pa, &pb, ctx.options.tolerance) {
            PlanePairRelation::Parallel { distance } => ctx.miss(distance),
            PlanePairRelation::Coincident => {
                skewed(ctx, &a.bounding_box(), &b.bounding_box(), "in a shared plane");
            }
            PlanePairRelation::IntersectionLine { .. } => {
                skewed(ctx, &a.bounding_box(), &b.bounding_box(), "along a skew line");
            }
        }
        return;
    }
    classify(
        ctx,
        &LocalBox::around(&fa, &a.corners()),
        &LocalBox::around(&fa, &b.corners()),
    );
}

/// A patch touching or passing through a block.
///
/// When the patch plane lies strictly inside the block, the block gets a
/// plane cut along it.
pub(super) fn patch_block(ctx: &mut PairContext<'_>, patch: &Patch, block: &Block, swapped: bool) {
    let (_, (solid, _)) = ctx.ordered(swapped);
    let (Some(fp), Some(fb)) = (patch.frame(), block.frame()) else {
        return;
    };
    if !fp.is_aligned_with(&fb) {
        skewed(ctx, &patch.bounding_box(), &block.bounding_box(), "through a solid");
        return;
    }
    let pb = LocalBox::around(&fb, &patch.corners());
    let bb = LocalBox::around(&fb, &block.corners());
    if !classify(ctx, &pb, &bb) {
        return;
    }
    let Some(axis) = fb.axis_of(&fp.axes()[2]) else {
        return;
    };
    let tol = ctx.options.tolerance;
    let level = pb.lo[axis];
    if level > bb.lo[axis] + tol && level < bb.hi[axis] - tol {
        ctx.cut(PartitionCut::plane(patch.origin, fp.axes()[2], vec![solid]));
    }
}

pub(super) fn block_block(ctx: &mut PairContext<'_>, a: &Block, b: &Block) {
    let (Some(fa), Some(fb)) = (a.frame(), b.frame()) else {
        return;
    };
    if !fa.is_aligned_with(&fb) {
        skewed(ctx, &a.bounding_box(), &b.bounding_box(), "at an angle");
        return;
    }
    classify(
        ctx,
        &LocalBox::around(&fa, &a.corners()),
        &LocalBox::around(&fa, &b.corners()),
    );
}
