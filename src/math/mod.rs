pub mod aabb;
pub mod frame;
pub mod intersect_3d;
pub mod plane;

pub use aabb::Aabb;
pub use frame::Frame;
pub use plane::Plane;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Number of equal spans needed to cover `length` with spans no longer than `size`.
///
/// Always at least one. A small slack keeps exact multiples (1.0 / 0.1) from
/// rounding up to an extra span.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn span_count(length: f64, size: f64) -> usize {
    if length <= 0.0 || size <= 0.0 {
        return 1;
    }
    let n = (length / size - 1e-9).ceil();
    if n < 1.0 {
        1
    } else {
        n as usize
    }
}
