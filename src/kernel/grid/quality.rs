//! Shape quality of simplices, normalized so an equilateral element scores 1.

use crate::math::Point3;

/// Signed volume of a tetrahedron (positive for right-handed `a→b, a→c, a→d`).
pub(super) fn tet_volume(p: &[Point3; 4]) -> f64 {
    let [a, b, c, d] = p;
    (b - a).cross(&(c - a)).dot(&(d - a)) / 6.0
}

/// `6√2 · V / l_max³`.
pub(super) fn tet_quality(p: &[Point3; 4]) -> f64 {
    let mut l_max: f64 = 0.0;
    for i in 0..4 {
        for j in (i + 1)..4 {
            l_max = l_max.max((p[j] - p[i]).norm());
        }
    }
    if l_max <= 0.0 {
        return 0.0;
    }
    6.0 * std::f64::consts::SQRT_2 * tet_volume(p).abs() / l_max.powi(3)
}

/// `4√3 · A / Σ l²`.
pub(super) fn tri_quality(p: &[Point3; 3]) -> f64 {
    let [a, b, c] = p;
    let area = 0.5 * (b - a).cross(&(c - a)).norm();
    let sum_sq = (b - a).norm_squared() + (c - b).norm_squared() + (a - c).norm_squared();
    if sum_sq <= 0.0 {
        return 0.0;
    }
    4.0 * 3.0_f64.sqrt() * area / sum_sq
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn regular_simplices_score_one() {
        let tri = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.5, 0.75_f64.sqrt(), 0.0)];
        assert_relative_eq!(tri_quality(&tri), 1.0, epsilon = 1e-12);
        let tet = [
            p(1.0, 1.0, 1.0),
            p(1.0, -1.0, -1.0),
            p(-1.0, 1.0, -1.0),
            p(-1.0, -1.0, 1.0),
        ];
        assert_relative_eq!(tet_quality(&tet), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn cube_corner_tet() {
        let tet = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(1.0, 1.0, 1.0)];
        assert_relative_eq!(tet_volume(&tet), 1.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(tet_quality(&tet), 2.0_f64.sqrt() / 3.0_f64.powf(1.5), epsilon = 1e-12);
    }

    #[test]
    fn slender_tet_scores_low() {
        let tet = [p(0.0, 0.0, 0.0), p(0.5, 0.0, 0.0), p(0.5, 0.05, 0.0), p(0.5, 0.05, 0.05)];
        assert!(tet_quality(&tet) < 0.02);
    }
}
