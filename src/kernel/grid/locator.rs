use std::collections::HashMap;

use crate::math::Point3;

/// Spatial hash used to merge coincident mesh nodes.
///
/// Buckets are at least as wide as the merge tolerance, so a search over the
/// 27 neighboring buckets finds every candidate.
pub(super) struct NodeLocator {
    bucket: f64,
    tolerance: f64,
    buckets: HashMap<[i64; 3], Vec<usize>>,
}

impl NodeLocator {
    pub fn new(tolerance: f64) -> Self {
        Self {
            bucket: tolerance * 4.0,
            tolerance,
            buckets: HashMap::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn key(&self, p: &Point3) -> [i64; 3] {
        [
            (p.x / self.bucket).floor() as i64,
            (p.y / self.bucket).floor() as i64,
            (p.z / self.bucket).floor() as i64,
        ]
    }

    /// Returns the tag of an existing node within tolerance of `p`.
    ///
    /// `nodes[tag - 1]` holds the coordinates of node `tag`.
    pub fn find(&self, p: &Point3, nodes: &[Point3]) -> Option<usize> {
        let [kx, ky, kz] = self.key(p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(tags) = self.buckets.get(&[kx + dx, ky + dy, kz + dz]) else {
                        continue;
                    };
                    let hit = tags
                        .iter()
                        .copied()
                        .find(|&t| (nodes[t - 1] - p).norm() <= self.tolerance);
                    if hit.is_some() {
                        return hit;
                    }
                }
            }
        }
        None
    }

    pub fn insert(&mut self, p: &Point3, tag: usize) {
        self.buckets.entry(self.key(p)).or_default().push(tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nodes_across_bucket_borders() {
        let tol = 1e-8;
        let mut locator = NodeLocator::new(tol);
        let nodes = vec![Point3::new(4e-8 - 1e-12, 0.0, 0.0)];
        locator.insert(&nodes[0], 1);
        assert_eq!(locator.find(&Point3::new(4e-8 + 1e-12, 0.0, 0.0), &nodes), Some(1));
        assert_eq!(locator.find(&Point3::new(1e-6, 0.0, 0.0), &nodes), None);
    }
}
