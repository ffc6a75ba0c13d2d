//! Kernel-native to canonical node order.
//!
//! Corner order already matches for every shape; only the edge nodes of
//! quadratic tetrahedra and hexahedra are listed differently by the kernel.

use crate::fem::ElementShape;

/// Tet10: kernel lists edge 23 before edge 13.
const TET10: [usize; 10] = [0, 1, 2, 3, 4, 5, 6, 7, 9, 8];

/// Hex20: kernel lists edges in vertex-pair order
/// (01, 03, 04, 12, 15, 23, 26, 37, 45, 47, 56, 67); canonical order walks
/// the bottom ring, the top ring, then the vertical edges.
const HEX20: [usize; 20] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 11, 13, 9, 16, 18, 19, 17, 10, 12, 14, 15];

/// Position in the kernel list of each canonical node, or `None` when the
/// orders agree.
#[must_use]
pub fn permutation(shape: ElementShape) -> Option<&'static [usize]> {
    match shape {
        ElementShape::Tet10 => Some(&TET10),
        ElementShape::Hex20 => Some(&HEX20),
        _ => None,
    }
}

/// Reorders one element's kernel node tags into canonical order.
#[must_use]
pub fn canonical<T: Copy>(shape: ElementShape, native: &[T]) -> Vec<T> {
    match permutation(shape) {
        Some(perm) if perm.len() == native.len() => perm.iter().map(|&i| native[i]).collect(),
        _ => native.to_vec(),
    }
}
