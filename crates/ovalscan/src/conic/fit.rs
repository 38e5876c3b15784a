//! Least-squares conic fit with the ellipse constraint.
//!
//! Solves the constrained problem `B v = μ A v` on the full 6×6 power-sum
//! scatter matrix `A`, where `B` encodes the ellipse constraint
//! `4AC − B² = 1`. `B` has rank 3, so the nonzero eigenvalues reduce to a
//! 3×3 problem solved through the characteristic cubic. The winning
//! eigenvector is scaled so that `vᵀAv·μ = 1`, which normalizes the conic
//! to `4AC − B² = 1`.

use nalgebra::{Matrix3, Matrix6, Vector6};

use super::eigen::{eigenvector_3x3, real_eigenvalues_3x3};
use super::types::ConicCoeffs;

/// Scatter matrices with |det| below this are treated as degenerate point
/// configurations (collinear or too few distinct points).
pub const DETERMINANT_EPS: f64 = 1e-3;

/// Minimum accepted generalized eigenvalue.
pub const EIGENVALUE_THRESHOLD: f64 = 1e-10;

/// Fit a conic to a point set by constrained least squares.
///
/// Requires at least 5 points. Returns `None` for degenerate inputs: a
/// near-singular scatter matrix, failed inversion, or no eigenvalue passing
/// the sign/threshold screening.
pub fn fit_conic(points: &[[f64; 2]]) -> Option<ConicCoeffs> {
    if points.len() < 5 {
        return None;
    }

    let a_mat = scatter_matrix(points);
    if a_mat.determinant().abs() < DETERMINANT_EPS {
        return None;
    }

    // Partition A into 3x3 blocks:
    //   A = [S11  S12]
    //       [S12ᵀ S22]
    let s11 = a_mat.fixed_view::<3, 3>(0, 0).into_owned();
    let s12 = a_mat.fixed_view::<3, 3>(0, 3).into_owned();
    let s22 = a_mat.fixed_view::<3, 3>(3, 3).into_owned();

    // Constraint matrix: nonzero corner of B, encoding 4AC − B² = 1.
    let c1 = Matrix3::new(0.0, 0.0, 2.0, 0.0, -1.0, 0.0, 2.0, 0.0, 0.0);

    // With v = (a1; a2), `B v = μ A v` forces a2 = −S22⁻¹ S12ᵀ a1 and
    // reduces to C1 a1 = μ M a1 with M = S11 − S12 S22⁻¹ S12ᵀ, i.e.
    // (C1⁻¹ M) a1 = (1/μ) a1.
    let s22_inv = s22.try_inverse()?;
    let m = s11 - s12 * s22_inv * s12.transpose();
    let c1_inv = c1.try_inverse()?;
    let system = c1_inv * m;

    for &nu in &real_eigenvalues_3x3(&system) {
        let Some(a1) = eigenvector_3x3(&system, nu) else {
            continue;
        };
        let a2 = -s22_inv * s12.transpose() * a1;
        let v = Vector6::new(a1[0], a1[1], a1[2], a2[0], a2[1], a2[2]);

        // vᵀAv·μ for the eigenpair equals vᵀBv = 4 v₀v₂ − v₁², which is the
        // numerically stable form of the sign screen: the residual vᵀAv is a
        // sum of squares and vanishes for noiseless data.
        let constraint = 4.0 * v[0] * v[2] - v[1] * v[1];
        if constraint <= 0.0 {
            continue;
        }

        // Eigenvalue positivity/threshold screen: μ = constraint / vᵀAv.
        let residual = sum_squared_residuals(points, &v);
        if constraint <= EIGENVALUE_THRESHOLD * residual {
            continue;
        }

        let multiplier = 1.0 / constraint.sqrt();
        return Some(ConicCoeffs([
            v[0] * multiplier,
            v[1] * multiplier,
            v[2] * multiplier,
            v[3] * multiplier,
            v[4] * multiplier,
            v[5] * multiplier,
        ]));
    }

    None
}

/// Σ over points of (A x² + B xy + C y² + D x + E y + F)², i.e. vᵀAv
/// computed as a guaranteed non-negative sum of squares.
fn sum_squared_residuals(points: &[[f64; 2]], v: &Vector6<f64>) -> f64 {
    points
        .iter()
        .map(|&[x, y]| {
            let r = v[0] * x * x + v[1] * x * y + v[2] * y * y + v[3] * x + v[4] * y + v[5];
            r * r
        })
        .sum()
}

/// Build the 6×6 scatter matrix from power sums of the coordinates up to
/// 4th order.
fn scatter_matrix(points: &[[f64; 2]]) -> Matrix6<f64> {
    let mut x4 = 0.0;
    let mut x3y = 0.0;
    let mut x2y2 = 0.0;
    let mut xy3 = 0.0;
    let mut y4 = 0.0;
    let mut x3 = 0.0;
    let mut x2y = 0.0;
    let mut xy2 = 0.0;
    let mut y3 = 0.0;
    let mut x2 = 0.0;
    let mut xy = 0.0;
    let mut y2 = 0.0;
    let mut sx = 0.0;
    let mut sy = 0.0;
    for &[x, y] in points {
        let xx = x * x;
        let yy = y * y;
        x4 += xx * xx;
        x3y += xx * x * y;
        x2y2 += xx * yy;
        xy3 += x * yy * y;
        y4 += yy * yy;
        x3 += xx * x;
        x2y += xx * y;
        xy2 += x * yy;
        y3 += yy * y;
        x2 += xx;
        xy += x * y;
        y2 += yy;
        sx += x;
        sy += y;
    }
    let n = points.len() as f64;

    Matrix6::new(
        x4, x3y, x2y2, x3, x2y, x2, //
        x3y, x2y2, xy3, x2y, xy2, xy, //
        x2y2, xy3, y4, xy2, y3, y2, //
        x3, x2y, xy2, x2, xy, sx, //
        x2y, xy2, y3, xy, y2, sy, //
        x2, xy, y2, sx, sy, n,
    )
}

#[cfg(test)]
mod tests {
    use super::super::decode_conic;
    use super::super::types::Ellipse;
    use super::*;
    use approx::assert_relative_eq;
    use rand::prelude::*;

    fn make_test_ellipse() -> Ellipse {
        Ellipse {
            cx: 100.0,
            cy: 80.0,
            a: 30.0,
            b: 15.0,
            angle_deg: 17.0,
        }
    }

    /// Angle distance modulo the ellipse's 180° symmetry.
    fn angle_diff_deg(x: f64, y: f64) -> f64 {
        let mut d = (x - y).abs() % 180.0;
        if d > 90.0 {
            d = 180.0 - d;
        }
        d
    }

    #[test]
    fn fit_recovers_exact_points() {
        let e = make_test_ellipse();
        let pts = e.sample_points(50);

        let conic = fit_conic(&pts).expect("fit should succeed");
        assert!(conic.is_ellipse());
        let fitted = decode_conic(&conic).expect("decode should succeed");

        assert_relative_eq!(fitted.cx, e.cx, epsilon = 1e-6);
        assert_relative_eq!(fitted.cy, e.cy, epsilon = 1e-6);
        assert_relative_eq!(fitted.a.max(fitted.b), e.a, epsilon = 1e-6);
        assert_relative_eq!(fitted.a.min(fitted.b), e.b, epsilon = 1e-6);
        assert!(angle_diff_deg(fitted.angle_deg, e.angle_deg) < 1e-6);
    }

    #[test]
    fn fit_normalizes_constraint_form() {
        let e = make_test_ellipse();
        let conic = fit_conic(&e.sample_points(60)).expect("fit should succeed");
        let [a, b, c, ..] = conic.0;
        assert_relative_eq!(4.0 * a * c - b * b, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn fit_with_minimum_point_count() {
        let e = make_test_ellipse();
        let pts = e.sample_points(5);
        let conic = fit_conic(&pts).expect("5-point fit should succeed");
        let fitted = decode_conic(&conic).expect("decode should succeed");
        assert_relative_eq!(fitted.cx, e.cx, epsilon = 1e-4);
        assert_relative_eq!(fitted.cy, e.cy, epsilon = 1e-4);
    }

    #[test]
    fn four_points_yield_none() {
        let pts = vec![[10.0, 0.0], [0.0, 10.0], [-10.0, 0.0], [0.0, -10.0]];
        assert!(fit_conic(&pts).is_none());
    }

    #[test]
    fn fit_noisy_points() {
        let e = make_test_ellipse();
        let mut pts = e.sample_points(200);
        let mut rng = StdRng::seed_from_u64(123);
        let noise_sigma = 0.5; // pixels

        for p in &mut pts {
            p[0] += rng.gen::<f64>() * noise_sigma * 2.0 - noise_sigma;
            p[1] += rng.gen::<f64>() * noise_sigma * 2.0 - noise_sigma;
        }

        let conic = fit_conic(&pts).expect("fit should succeed with noise");
        let fitted = decode_conic(&conic).expect("decode should succeed");

        assert_relative_eq!(fitted.cx, e.cx, epsilon = 1.0);
        assert_relative_eq!(fitted.cy, e.cy, epsilon = 1.0);
        assert_relative_eq!(fitted.a.max(fitted.b), e.a, epsilon = 2.0);
        assert_relative_eq!(fitted.a.min(fitted.b), e.b, epsilon = 2.0);
    }

    #[test]
    fn fit_circle() {
        let e = Ellipse {
            cx: 50.0,
            cy: 50.0,
            a: 20.0,
            b: 20.0,
            angle_deg: 0.0,
        };
        let conic = fit_conic(&e.sample_points(100)).expect("circle fit should succeed");
        let fitted = decode_conic(&conic).expect("decode should succeed");

        assert_relative_eq!(fitted.cx, 50.0, epsilon = 1e-6);
        assert_relative_eq!(fitted.cy, 50.0, epsilon = 1e-6);
        assert_relative_eq!(fitted.a, 20.0, epsilon = 1e-6);
        assert_relative_eq!(fitted.b, 20.0, epsilon = 1e-6);
    }

    #[test]
    fn various_ellipses_roundtrip() {
        let cases = [
            Ellipse {
                cx: 50.0,
                cy: 50.0,
                a: 40.0,
                b: 10.0,
                angle_deg: 0.0,
            }, // very elongated, axis-aligned
            Ellipse {
                cx: 200.0,
                cy: 150.0,
                a: 25.0,
                b: 24.0,
                angle_deg: 57.0,
            }, // nearly circular
            Ellipse {
                cx: 300.0,
                cy: 100.0,
                a: 50.0,
                b: 20.0,
                angle_deg: -40.0,
            }, // tilted
            Ellipse {
                cx: 110.0,
                cy: 110.0,
                a: 8.0,
                b: 5.0,
                angle_deg: 45.0,
            }, // small, 45°
        ];

        for (i, e) in cases.iter().enumerate() {
            let conic = fit_conic(&e.sample_points(100))
                .unwrap_or_else(|| panic!("fit should succeed for case {}", i));
            let fitted = decode_conic(&conic)
                .unwrap_or_else(|| panic!("decode should succeed for case {}", i));

            assert_relative_eq!(fitted.cx, e.cx, epsilon = 1e-4);
            assert_relative_eq!(fitted.cy, e.cy, epsilon = 1e-4);
            assert_relative_eq!(fitted.a.max(fitted.b), e.a, epsilon = 1e-4);
            assert_relative_eq!(fitted.a.min(fitted.b), e.b, epsilon = 1e-4);
            assert!(
                angle_diff_deg(fitted.angle_deg, e.angle_deg) < 1e-4,
                "angle mismatch for case {}: expected {}, got {}",
                i,
                e.angle_deg,
                fitted.angle_deg
            );
        }
    }

    #[test]
    fn degenerate_inputs_yield_none() {
        // Collinear points
        let line: Vec<[f64; 2]> = (0..8).map(|i| [i as f64 * 10.0, i as f64 * 5.0]).collect();
        assert!(fit_conic(&line).is_none());

        // Duplicate points
        let dup: Vec<[f64; 2]> = vec![[7.0, 7.0]; 10];
        assert!(fit_conic(&dup).is_none());

        // Empty
        let empty: Vec<[f64; 2]> = vec![];
        assert!(fit_conic(&empty).is_none());
    }
}
