//! Sort-and-sweep over inflated bounding boxes.

use crate::math::Aabb;
use crate::registry::ObjectKey;

/// Index pairs `(i, j)` with `i < j` whose boxes overlap after inflating
/// both by `margin`.
pub(super) fn candidate_pairs(boxes: &[(ObjectKey, Aabb)], margin: f64) -> Vec<(usize, usize)> {
    let inflated: Vec<Aabb> = boxes.iter().map(|(_, b)| b.inflated(margin)).collect();
    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by(|&a, &b| inflated[a].min.x.total_cmp(&inflated[b].min.x));

    let mut pairs = Vec::new();
    let mut active: Vec<usize> = Vec::new();
    for &i in &order {
        active.retain(|&j| inflated[j].max.x >= inflated[i].min.x);
        for &j in &active {
            if inflated[i].overlaps(&inflated[j]) {
                pairs.push((i.min(j), i.max(j)));
            }
        }
        active.push(i);
    }
    pairs.sort_unstable();
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use slotmap::KeyData;

    fn boxed(i: u64, min: (f64, f64, f64), max: (f64, f64, f64)) -> (ObjectKey, Aabb) {
        (
            ObjectKey::from(KeyData::from_ffi(i)),
            Aabb {
                min: Point3::new(min.0, min.1, min.2),
                max: Point3::new(max.0, max.1, max.2),
            },
        )
    }

    #[test]
    fn only_overlapping_boxes_pair() {
        let boxes = [
            boxed(1, (0.0, 0.0, 0.0), (1.0, 1.0, 0.0)),
            boxed(2, (0.5, 0.5, 0.0), (2.0, 2.0, 0.0)),
            boxed(3, (5.0, 0.0, 0.0), (6.0, 1.0, 0.0)),
            boxed(4, (0.0, 5.0, 0.0), (1.0, 6.0, 0.0)),
        ];
        assert_eq!(candidate_pairs(&boxes, 1e-6), vec![(0, 1)]);
    }

    #[test]
    fn margin_catches_small_gaps() {
        let boxes = [
            boxed(1, (0.0, 0.0, 0.0), (1.0, 1.0, 0.0)),
            boxed(2, (1.0005, 0.0, 0.0), (2.0, 1.0, 0.0)),
        ];
        assert!(candidate_pairs(&boxes, 1e-6).is_empty());
        assert_eq!(candidate_pairs(&boxes, 1e-3), vec![(0, 1)]);
    }
}
