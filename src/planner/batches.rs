//! Grouping of connected objects into fragmentation batches.

use std::collections::HashMap;

use tracing::warn;

use crate::error::PartitionError;
use crate::math::Frame;
use crate::registry::{EntityRegistry, ObjectKey};

use super::{FragmentBatch, PartitionCut};

/// Disjoint-set forest with path halving.
///
/// Each root remembers the grid frame of its set; sets on misaligned grids
/// are never merged.
struct UnionFind {
    parent: Vec<usize>,
    frame: Vec<Option<Frame>>,
}

impl UnionFind {
    fn new(frames: Vec<Option<Frame>>) -> Self {
        Self {
            parent: (0..frames.len()).collect(),
            frame: frames,
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    /// Merges the sets of `a` and `b`. Returns `false` if their frames are
    /// not aligned.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return true;
        }
        if let (Some(fa), Some(fb)) = (&self.frame[ra], &self.frame[rb]) {
            if !fa.is_aligned_with(fb) {
                return false;
            }
        }
        let (root, child) = (ra.min(rb), ra.max(rb));
        self.parent[child] = root;
        if self.frame[root].is_none() {
            self.frame[root] = self.frame[child].take();
        }
        true
    }
}

/// Connected components over contacts and shared cut targets.
///
/// A component becomes a batch when it has more than one object, carries a
/// cut, or holds an object made of several primitives (whose pieces must
/// conform to each other). Batches and their objects follow registration
/// order.
///
/// A contact that would join two grids with misaligned frames is dropped
/// and reported; both sides keep their own batch. A cut targeting objects
/// in different batches is split between them.
pub(super) fn group(
    registry: &EntityRegistry,
    contacts: &[(ObjectKey, ObjectKey)],
    cuts: &[PartitionCut],
) -> (Vec<FragmentBatch>, Vec<PartitionError>) {
    let keys: Vec<ObjectKey> = registry.iter().map(|(k, _)| k).collect();
    let index: HashMap<ObjectKey, usize> = keys.iter().enumerate().map(|(i, &k)| (k, i)).collect();
    let frames = registry.iter().map(|(_, o)| o.source.frame()).collect();
    let mut sets = UnionFind::new(frames);
    let mut warnings = Vec::new();

    for (a, b) in contacts {
        let (Some(&ia), Some(&ib)) = (index.get(a), index.get(b)) else {
            continue;
        };
        if !sets.union(ia, ib) {
            let (Some(first), Some(second)) = (registry.name_of(*a), registry.name_of(*b)) else {
                continue;
            };
            warn!(first, second, "contact joins misaligned grids; not shared");
            warnings.push(PartitionError::Ambiguous {
                object: first.to_owned(),
                reason: format!("touches '{second}' but their batches have misaligned grids"),
            });
        }
    }
    for cut in cuts {
        let mut targets = cut.targets.iter().filter_map(|k| index.get(k).copied());
        if let Some(first) = targets.next() {
            for other in targets {
                sets.union(first, other);
            }
        }
    }

    let mut batches: Vec<FragmentBatch> = Vec::new();
    let mut batch_of_root: HashMap<usize, usize> = HashMap::new();
    for (i, &key) in keys.iter().enumerate() {
        let root = sets.find(i);
        let slot = *batch_of_root.entry(root).or_insert_with(|| {
            batches.push(FragmentBatch::default());
            batches.len() - 1
        });
        batches[slot].objects.push(key);
    }
    for cut in cuts {
        let mut split: Vec<(usize, Vec<ObjectKey>)> = Vec::new();
        for &target in &cut.targets {
            let Some(&i) = index.get(&target) else {
                continue;
            };
            let Some(&slot) = batch_of_root.get(&sets.find(i)) else {
                continue;
            };
            match split.iter_mut().find(|(s, _)| *s == slot) {
                Some((_, targets)) => targets.push(target),
                None => split.push((slot, vec![target])),
            }
        }
        for (slot, targets) in split {
            batches[slot].cuts.push(PartitionCut {
                geometry: cut.geometry.clone(),
                targets,
            });
        }
    }

    batches.retain(|b| {
        b.objects.len() > 1
            || !b.cuts.is_empty()
            || b
                .objects
                .iter()
                .any(|&k| registry.get(k).is_some_and(|o| o.source.primitive_count() > 1))
    });
    (batches, warnings)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vector3;

    #[test]
    fn union_find_merges_chains() {
        let mut sets = UnionFind::new(vec![None; 5]);
        sets.union(0, 1);
        sets.union(3, 4);
        sets.union(1, 4);
        assert_eq!(sets.find(4), 0);
        assert_eq!(sets.find(3), 0);
        assert_eq!(sets.find(2), 2);
    }

    #[test]
    fn misaligned_frames_stay_apart() {
        let tilted = Frame::from_axes(&Vector3::x(), &Vector3::new(0.0, 1.0, 1.0)).unwrap();
        let turned = Frame::from_axes(&Vector3::y(), &Vector3::x()).unwrap();
        let mut sets = UnionFind::new(vec![Some(Frame::world()), None, Some(tilted), Some(turned)]);
        assert!(sets.union(0, 1));
        assert!(!sets.union(1, 2));
        assert!(!sets.union(2, 0));
        assert!(sets.union(3, 1));
        assert_eq!(sets.find(3), 0);
        assert_eq!(sets.find(2), 2);
    }
}
