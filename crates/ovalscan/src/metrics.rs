//! Fit-quality metrics: how well a candidate ellipse matches its source
//! points.
//!
//! Three interchangeable metrics, selected by configuration. All are pure
//! functions of the candidate geometry and point arrays, return
//! non-negative scores (smaller is better) and evaluate to ~0 for points
//! sampled exactly on the ellipse.

use serde::{Deserialize, Serialize};

use crate::conic::{ConicCoeffs, Ellipse};

/// Newton iteration budget for the geometric metric.
pub const NEWTON_MAX_ITERATIONS: usize = 20;
/// Newton stationarity tolerance.
pub const NEWTON_ACCURACY: f64 = 1e-5;
/// Fixed scale applied to both geometric metrics.
pub const ERROR_SCALE: f64 = 0.01;

/// Fit-error metric selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMethod {
    /// Normalized residual of the conic equation. Cheap, scale-sensitive,
    /// no iteration.
    #[default]
    Algebraic,
    /// True point-to-ellipse Euclidean distance via Newton root-finding.
    Geometric,
    /// Normalized-radius proxy for geometric distance, iteration-free.
    GeometricSimple,
}

/// Algebraic fit error: mean over points of |q + F| / (|q| + |F|), where
/// q is the conic's quadratic-plus-linear part.
///
/// The denominator can approach zero when q ≈ −F with both terms tiny; the
/// fitter's normalization keeps coefficients well-scaled so this is not
/// guarded further.
pub fn algebraic_error(conic: &ConicCoeffs, points: &[[f64; 2]]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let f = conic.0[5];
    let total: f64 = points
        .iter()
        .map(|&[x, y]| {
            let q = conic.eval_without_constant(x, y);
            (q + f).abs() / (q.abs() + f.abs())
        })
        .sum();
    total / points.len() as f64
}

/// Rotate a point into the ellipse's center-relative, unrotated frame.
fn rotate_into_frame(x: f64, y: f64, ellipse: &Ellipse, angle_rad: f64) -> (f64, f64) {
    let dx = x - ellipse.cx;
    let dy = y - ellipse.cy;
    (
        dx * angle_rad.cos() + dy * angle_rad.sin(),
        -dx * angle_rad.sin() + dy * angle_rad.cos(),
    )
}

/// Euclidean distance from a point (in the ellipse frame) to the ellipse
/// `(a·cos t, b·sin t)` via Newton–Raphson on the stationarity condition
/// f(t) = (x(t)−x)·x'(t) + (y(t)−y)·y'(t) = 0, seeded at t₀ = atan2(y, x).
///
/// On non-convergence within the iteration budget the last iterate's
/// distance is used. The point at the center is special-cased to min(a, b):
/// the gradient is undefined there.
pub fn distance_to_ellipse_newton(x: f64, y: f64, a: f64, b: f64) -> f64 {
    if x == 0.0 && y == 0.0 {
        return a.min(b);
    }

    let mut t = y.atan2(x);

    for _ in 0..NEWTON_MAX_ITERATIONS {
        let cos_t = t.cos();
        let sin_t = t.sin();

        let x_ell = a * cos_t;
        let y_ell = b * sin_t;

        let dx_dt = -a * sin_t;
        let dy_dt = b * cos_t;

        let f = (x_ell - x) * dx_dt + (y_ell - y) * dy_dt;
        if f.abs() < NEWTON_ACCURACY {
            break;
        }

        let df_dt =
            dx_dt * dx_dt + dy_dt * dy_dt + (x_ell - x) * (-a * cos_t) + (y_ell - y) * (-b * sin_t);
        if df_dt == 0.0 {
            break;
        }

        t -= f / df_dt;
    }

    let x_ell = a * t.cos();
    let y_ell = b * t.sin();
    ((x - x_ell) * (x - x_ell) + (y - y_ell) * (y - y_ell)).sqrt()
}

/// Geometric fit error: summed Newton point-to-ellipse distances, scaled by
/// `ERROR_SCALE / (√(a²+b²) · N)` to normalize across ellipse sizes and
/// point counts.
pub fn geometric_error_newton(ellipse: &Ellipse, points: &[[f64; 2]]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let angle_rad = ellipse.angle_deg.to_radians();
    let total: f64 = points
        .iter()
        .map(|&[x, y]| {
            let (xr, yr) = rotate_into_frame(x, y, ellipse, angle_rad);
            distance_to_ellipse_newton(xr, yr, ellipse.a, ellipse.b)
        })
        .sum();

    total * ERROR_SCALE / ((ellipse.a * ellipse.a + ellipse.b * ellipse.b).sqrt() * points.len() as f64)
}

/// Simplified geometric error: mean of |r−1| / (r+1) over the normalized
/// radii r = √((x/a)² + (y/b)²) of the rotated points, scaled by
/// `ERROR_SCALE`. Bounded, iteration-free proxy for geometric distance.
pub fn geometric_error_simple(ellipse: &Ellipse, points: &[[f64; 2]]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let angle_rad = ellipse.angle_deg.to_radians();
    let total: f64 = points
        .iter()
        .map(|&[x, y]| {
            let (xr, yr) = rotate_into_frame(x, y, ellipse, angle_rad);
            let r = ((xr / ellipse.a).powi(2) + (yr / ellipse.b).powi(2)).sqrt();
            (r - 1.0).abs() / (r + 1.0)
        })
        .sum();

    total * ERROR_SCALE / points.len() as f64
}

/// Score a candidate's points against its fitted geometry with the chosen
/// metric.
pub fn fit_error(
    method: ErrorMethod,
    conic: &ConicCoeffs,
    ellipse: &Ellipse,
    points: &[[f64; 2]],
) -> f64 {
    match method {
        ErrorMethod::Algebraic => algebraic_error(conic, points),
        ErrorMethod::Geometric => geometric_error_newton(ellipse, points),
        ErrorMethod::GeometricSimple => geometric_error_simple(ellipse, points),
    }
}
