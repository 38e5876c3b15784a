//! Small-matrix eigen helpers for the reduced 3×3 generalized eigenproblem.
//!
//! The constraint matrix has rank 3, so the 6×6 eigenproblem of the fitter
//! reduces to a 3×3 system whose eigenvalues come from the characteristic
//! cubic and whose eigenvectors come from adjugate null vectors. The reduced
//! system is not symmetric in general, which rules out symmetric
//! eigendecomposition.

use nalgebra::{Matrix3, Vector3};

/// Real eigenvalues of a 3×3 matrix via the characteristic polynomial:
/// λ³ − tr(A) λ² + (sum of 2×2 principal minors) λ − det(A) = 0.
pub(super) fn real_eigenvalues_3x3(a: &Matrix3<f64>) -> Vec<f64> {
    let tr = a[(0, 0)] + a[(1, 1)] + a[(2, 2)];

    let minor_sum = a[(0, 0)] * a[(1, 1)] - a[(0, 1)] * a[(1, 0)] + a[(0, 0)] * a[(2, 2)]
        - a[(0, 2)] * a[(2, 0)]
        + a[(1, 1)] * a[(2, 2)]
        - a[(1, 2)] * a[(2, 1)];

    let det = a.determinant();

    solve_cubic_real(1.0, -tr, minor_sum, -det)
}

/// Eigenvector of `a` for eigenvalue `ev`, via the null space of (A − λI).
///
/// For a rank-2 shifted matrix every row of the adjugate is proportional to
/// the null vector; the largest-norm row is the numerically safest choice.
pub(super) fn eigenvector_3x3(a: &Matrix3<f64>, ev: f64) -> Option<Vector3<f64>> {
    let m = a - Matrix3::identity() * ev;
    let cofactor_rows = [
        Vector3::new(
            m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)],
            -(m[(1, 0)] * m[(2, 2)] - m[(1, 2)] * m[(2, 0)]),
            m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)],
        ),
        Vector3::new(
            -(m[(0, 1)] * m[(2, 2)] - m[(0, 2)] * m[(2, 1)]),
            m[(0, 0)] * m[(2, 2)] - m[(0, 2)] * m[(2, 0)],
            -(m[(0, 0)] * m[(2, 1)] - m[(0, 1)] * m[(2, 0)]),
        ),
        Vector3::new(
            m[(0, 1)] * m[(1, 2)] - m[(0, 2)] * m[(1, 1)],
            -(m[(0, 0)] * m[(1, 2)] - m[(0, 2)] * m[(1, 0)]),
            m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)],
        ),
    ];

    let mut best = &cofactor_rows[0];
    let mut best_norm = best.norm_squared();
    for row in &cofactor_rows[1..] {
        let n = row.norm_squared();
        if n > best_norm {
            best = row;
            best_norm = n;
        }
    }

    if best_norm < 1e-30 {
        return None;
    }

    Some(best / best_norm.sqrt())
}

/// Solve a real cubic equation a x³ + b x² + c x + d = 0.
/// Returns all real roots (1 or 3).
fn solve_cubic_real(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    // Reduce to depressed cubic t³ + pt + q = 0 with x = t − b/(3a)
    let a_inv = 1.0 / a;
    let b_ = b * a_inv;
    let c_ = c * a_inv;
    let d_ = d * a_inv;

    let p = c_ - b_ * b_ / 3.0;
    let q = 2.0 * b_ * b_ * b_ / 27.0 - b_ * c_ / 3.0 + d_;

    let disc = -4.0 * p * p * p - 27.0 * q * q;
    let shift = -b_ / 3.0;

    if disc >= 0.0 {
        // Three real roots (or repeated roots)
        let r = (-p / 3.0).sqrt();
        let cos_arg = if r.abs() < 1e-15 {
            0.0
        } else {
            (-q / (2.0 * r * r * r)).clamp(-1.0, 1.0)
        };
        let theta = cos_arg.acos();
        let two_r = 2.0 * r;

        vec![
            two_r * (theta / 3.0).cos() + shift,
            two_r * ((theta + 2.0 * std::f64::consts::PI) / 3.0).cos() + shift,
            two_r * ((theta + 4.0 * std::f64::consts::PI) / 3.0).cos() + shift,
        ]
    } else {
        // One real root (Cardano's formula)
        let sqrt_disc = (q * q / 4.0 + p * p * p / 27.0).sqrt();
        let u = (-q / 2.0 + sqrt_disc).cbrt();
        let v = (-q / 2.0 - sqrt_disc).cbrt();
        vec![u + v + shift]
    }
}
