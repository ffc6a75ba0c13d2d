use super::plane::Plane;
use super::{Point3, Vector3, TOLERANCE};

/// Relationship between two planes.
#[derive(Debug)]
pub enum PlanePairRelation {
    /// Planes intersect along a line.
    IntersectionLine {
        origin: Point3,
        direction: Vector3,
    },
    /// Planes are parallel but not coincident.
    Parallel { distance: f64 },
    /// Planes are the same (coincident).
    Coincident,
}

/// Computes the intersection of two planes.
///
/// Returns an [`IntersectionLine`](PlanePairRelation::IntersectionLine) with a
/// unit-length `direction` when the planes cross, [`Parallel`](PlanePairRelation::Parallel)
/// when they don't, or [`Coincident`](PlanePairRelation::Coincident) when they overlap.
#[must_use]
pub fn plane_plane_intersect(a: &Plane, b: &Plane, tolerance: f64) -> PlanePairRelation {
    let na = a.plane_normal();
    let nb = b.plane_normal();

    let dir = na.cross(nb);
    let dir_len = dir.norm();

    if dir_len < TOLERANCE {
        // Normals are (anti-)parallel: planes are parallel or coincident.
        let diff = b.origin() - a.origin();
        let dist = diff.dot(na).abs();
        if dist < tolerance {
            PlanePairRelation::Coincident
        } else {
            PlanePairRelation::Parallel { distance: dist }
        }
    } else {
        let dir = dir / dir_len;

        // Point on both planes: p = oa + s * na + t * nb.
        let d2 = nb.dot(&(b.origin() - a.origin()));
        let dot_nn = na.dot(nb);
        let denom = 1.0 - dot_nn * dot_nn;

        let origin = if denom.abs() < TOLERANCE {
            *a.origin()
        } else {
            let s = -dot_nn * d2 / denom;
            let t = d2 / denom;
            a.origin() + na * s + nb * t
        };

        PlanePairRelation::IntersectionLine { origin, direction: dir }
    }
}

/// Relationship of a line with a plane.
#[derive(Debug)]
pub enum LinePlaneRelation {
    /// Line intersects the plane at a single point.
    Point { point: Point3, t: f64 },
    /// Line is parallel to the plane (does not intersect).
    Parallel,
    /// Line lies entirely on the plane.
    OnPlane,
}

/// Computes the intersection of a line `origin + t * dir` with a plane.
#[must_use]
pub fn line_plane_intersect(
    origin: &Point3,
    dir: &Vector3,
    plane: &Plane,
    tolerance: f64,
) -> LinePlaneRelation {
    let normal = plane.plane_normal();
    let denom = normal.dot(dir);

    let diff = plane.origin() - origin;
    let numer = normal.dot(&diff);

    if denom.abs() < TOLERANCE {
        if numer.abs() < tolerance {
            LinePlaneRelation::OnPlane
        } else {
            LinePlaneRelation::Parallel
        }
    } else {
        let t = numer / denom;
        let point = origin + dir * t;
        LinePlaneRelation::Point { point, t }
    }
}

/// Signed distance from a point to a plane.
/// Positive = on the normal side, negative = opposite.
#[must_use]
pub fn signed_distance_to_plane(point: &Point3, plane: &Plane) -> f64 {
    let diff = point - plane.origin();
    plane.plane_normal().dot(&diff)
}

/// Closest approach between two segments.
#[derive(Debug, Clone, Copy)]
pub struct SegmentPair {
    /// Parameter on the first segment, in `[0, 1]`.
    pub s: f64,
    /// Parameter on the second segment, in `[0, 1]`.
    pub t: f64,
    /// Closest point on the first segment.
    pub on_a: Point3,
    /// Closest point on the second segment.
    pub on_b: Point3,
    /// Distance between the closest points.
    pub distance: f64,
}

/// Computes the closest points of segments `a0-a1` and `b0-b1`.
///
/// Returns `None` when either segment is degenerate. Parallel segments
/// report one representative pair; use [`collinear_overlap`] for the full
/// shared span.
#[must_use]
pub fn segment_segment_closest(
    a0: &Point3,
    a1: &Point3,
    b0: &Point3,
    b1: &Point3,
) -> Option<SegmentPair> {
    let d1 = a1 - a0;
    let d2 = b1 - b0;
    let r = a0 - b0;
    let a = d1.dot(&d1);
    let e = d2.dot(&d2);
    if a < TOLERANCE * TOLERANCE || e < TOLERANCE * TOLERANCE {
        return None;
    }
    let f = d2.dot(&r);
    let c = d1.dot(&r);
    let b = d1.dot(&d2);
    let denom = a * e - b * b;

    let mut s = if denom > TOLERANCE * a * e {
        ((b * f - c * e) / denom).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let mut t = (b * s + f) / e;
    if t < 0.0 {
        t = 0.0;
        s = (-c / a).clamp(0.0, 1.0);
    } else if t > 1.0 {
        t = 1.0;
        s = ((b - c) / a).clamp(0.0, 1.0);
    }

    let on_a = a0 + d1 * s;
    let on_b = b0 + d2 * t;
    Some(SegmentPair {
        s,
        t,
        on_a,
        on_b,
        distance: (on_a - on_b).norm(),
    })
}

/// Parameter range on `a0-a1` shared with a collinear segment `b0-b1`.
///
/// Returns `None` unless both segments lie on one line (within `tolerance`)
/// and overlap over a positive length.
#[must_use]
pub fn collinear_overlap(
    a0: &Point3,
    a1: &Point3,
    b0: &Point3,
    b1: &Point3,
    tolerance: f64,
) -> Option<(f64, f64)> {
    let d = a1 - a0;
    let len = d.norm();
    if len < TOLERANCE {
        return None;
    }
    let dir = d / len;
    let off_line = |p: &Point3| {
        let w = p - a0;
        (w - dir * w.dot(&dir)).norm()
    };
    if off_line(b0) > tolerance || off_line(b1) > tolerance {
        return None;
    }
    let tb0 = (b0 - a0).dot(&dir) / len;
    let tb1 = (b1 - a0).dot(&dir) / len;
    let lo = tb0.min(tb1).max(0.0);
    let hi = tb0.max(tb1).min(1.0);
    if (hi - lo) * len > tolerance {
        Some((lo, hi))
    } else {
        None
    }
}

/// Parameter of the projection of `p` onto `a-b`, and the distance to it.
///
/// The parameter is clamped to `[0, 1]`.
#[must_use]
pub fn point_segment_param(p: &Point3, a: &Point3, b: &Point3) -> (f64, f64) {
    let d = b - a;
    let len2 = d.dot(&d);
    if len2 < TOLERANCE * TOLERANCE {
        return (0.0, (p - a).norm());
    }
    let t = ((p - a).dot(&d) / len2).clamp(0.0, 1.0);
    (t, (p - (a + d * t)).norm())
}

/// Clips the line `start + t * delta` against axis ranges (slab method).
///
/// `start`, `delta`, `lo` and `hi` are coordinates along the same set of
/// axes; the line must stay within `[lo - tol, hi + tol]` on every axis.
/// Returns the surviving parameter interval inside `t_range`.
#[must_use]
pub fn clip_to_slabs(
    start: &[f64],
    delta: &[f64],
    lo: &[f64],
    hi: &[f64],
    t_range: (f64, f64),
    tolerance: f64,
) -> Option<(f64, f64)> {
    let (mut t0, mut t1) = t_range;
    for axis in 0..start.len() {
        let (p, d) = (start[axis], delta[axis]);
        let (min, max) = (lo[axis] - tolerance, hi[axis] + tolerance);
        if d.abs() < TOLERANCE {
            if p < min || p > max {
                return None;
            }
            continue;
        }
        let mut ta = (min - p) / d;
        let mut tb = (max - p) / d;
        if ta > tb {
            std::mem::swap(&mut ta, &mut tb);
        }
        t0 = t0.max(ta);
        t1 = t1.min(tb);
        if t0 > t1 {
            return None;
        }
    }
    Some((t0, t1))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn v(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3::new(x, y, z)
    }

    // ── plane_plane_intersect ──

    #[test]
    fn perpendicular_planes_intersect() {
        let xy = Plane::from_normal(p(0.0, 0.0, 0.0), v(0.0, 0.0, 1.0)).unwrap();
        let xz = Plane::from_normal(p(0.0, 0.0, 0.0), v(0.0, 1.0, 0.0)).unwrap();

        match plane_plane_intersect(&xy, &xz, TOLERANCE) {
            PlanePairRelation::IntersectionLine { direction, .. } => {
                assert!(
                    direction.x.abs() > 0.99,
                    "expected X-axis direction, got {direction:?}"
                );
            }
            other => panic!("expected IntersectionLine, got {other:?}"),
        }
    }

    #[test]
    fn intersection_point_lies_on_both_planes() {
        let a = Plane::from_normal(p(1.0, 0.0, 0.0), v(1.0, 0.0, 0.0)).unwrap();
        let b = Plane::from_normal(p(0.0, 2.0, 0.0), v(0.0, 1.0, 0.0)).unwrap();

        match plane_plane_intersect(&a, &b, TOLERANCE) {
            PlanePairRelation::IntersectionLine { origin, direction } => {
                assert!(signed_distance_to_plane(&origin, &a).abs() < TOLERANCE);
                assert!(signed_distance_to_plane(&origin, &b).abs() < TOLERANCE);
                assert!(direction.z.abs() > 0.99);
            }
            other => panic!("expected IntersectionLine, got {other:?}"),
        }
    }

    #[test]
    fn parallel_and_coincident_planes() {
        let a = Plane::from_normal(p(0.0, 0.0, 0.0), v(0.0, 0.0, 1.0)).unwrap();
        let b = Plane::from_normal(p(0.0, 0.0, 3.0), v(0.0, 0.0, -1.0)).unwrap();
        let c = Plane::from_normal(p(1.0, 2.0, 0.0), v(0.0, 0.0, 1.0)).unwrap();

        match plane_plane_intersect(&a, &b, TOLERANCE) {
            PlanePairRelation::Parallel { distance } => {
                assert!((distance - 3.0).abs() < TOLERANCE);
            }
            other => panic!("expected Parallel, got {other:?}"),
        }
        assert!(matches!(
            plane_plane_intersect(&a, &c, TOLERANCE),
            PlanePairRelation::Coincident
        ));
    }

    // ── line_plane_intersect ──

    #[test]
    fn line_hits_plane() {
        let plane = Plane::from_normal(p(0.0, 0.0, 5.0), v(0.0, 0.0, 1.0)).unwrap();
        let result = line_plane_intersect(&p(0.0, 0.0, 0.0), &v(0.0, 0.0, 1.0), &plane, TOLERANCE);
        match result {
            LinePlaneRelation::Point { point, t } => {
                assert!((t - 5.0).abs() < TOLERANCE);
                assert!((point.z - 5.0).abs() < TOLERANCE);
            }
            other => panic!("expected Point, got {other:?}"),
        }
    }

    #[test]
    fn line_on_and_parallel_to_plane() {
        let plane = Plane::from_normal(p(0.0, 0.0, 0.0), v(0.0, 0.0, 1.0)).unwrap();
        let on = line_plane_intersect(&p(1.0, 2.0, 0.0), &v(1.0, 0.0, 0.0), &plane, TOLERANCE);
        let off = line_plane_intersect(&p(1.0, 2.0, 1.0), &v(1.0, 0.0, 0.0), &plane, TOLERANCE);
        assert!(matches!(on, LinePlaneRelation::OnPlane));
        assert!(matches!(off, LinePlaneRelation::Parallel));
    }

    // ── segments ──

    #[test]
    fn crossing_segments_meet_at_interior_point() {
        let pair = segment_segment_closest(
            &p(0.0, 0.5, 0.0),
            &p(1.0, 0.5, 0.0),
            &p(0.5, 0.0, 0.0),
            &p(0.5, 1.0, 0.0),
        )
        .unwrap();
        assert!(pair.distance < TOLERANCE);
        assert!((pair.s - 0.5).abs() < TOLERANCE);
        assert!((pair.t - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn skew_segments_report_gap() {
        let pair = segment_segment_closest(
            &p(0.0, 0.0, 0.0),
            &p(1.0, 0.0, 0.0),
            &p(0.5, -1.0, 0.2),
            &p(0.5, 1.0, 0.2),
        )
        .unwrap();
        assert!((pair.distance - 0.2).abs() < 1e-12);
    }

    #[test]
    fn collinear_segments_share_a_span() {
        let span = collinear_overlap(
            &p(0.0, 0.0, 0.0),
            &p(2.0, 0.0, 0.0),
            &p(1.0, 0.0, 0.0),
            &p(3.0, 0.0, 0.0),
            1e-9,
        )
        .unwrap();
        assert!((span.0 - 0.5).abs() < 1e-12);
        assert!((span.1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn slab_clip_keeps_inside_part() {
        let (t0, t1) = clip_to_slabs(
            &[-1.0, 0.5],
            &[3.0, 0.0],
            &[0.0, 0.0],
            &[1.0, 1.0],
            (0.0, 1.0),
            0.0,
        )
        .unwrap();
        assert!((t0 - 1.0 / 3.0).abs() < 1e-12);
        assert!((t1 - 2.0 / 3.0).abs() < 1e-12);
        assert!(clip_to_slabs(&[0.0, 2.0], &[1.0, 0.0], &[0.0, 0.0], &[1.0, 1.0], (0.0, 1.0), 0.0)
            .is_none());
    }
}
