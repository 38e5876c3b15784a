//! Core conic and ellipse types.

use serde::{Deserialize, Serialize};

/// General conic: A x² + B xy + C y² + D x + E y + F = 0.
/// Stored as [A, B, C, D, E, F], normalized by the fitter so that
/// 4AC − B² = 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConicCoeffs(pub [f64; 6]);

impl ConicCoeffs {
    /// Evaluate the quadratic-plus-linear part A x² + B xy + C y² + D x + E y
    /// at a point (the constant term F is excluded).
    pub fn eval_without_constant(&self, x: f64, y: f64) -> f64 {
        let [a, b, c, d, e, _f] = self.0;
        a * x * x + b * x * y + c * y * y + d * x + e * y
    }

    /// Check whether the conic represents an ellipse (discriminant B²−4AC < 0).
    pub fn is_ellipse(&self) -> bool {
        let [a, b, c, ..] = self.0;
        b * b - 4.0 * a * c < 0.0
    }
}

/// Geometric ellipse parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    /// Center x in image pixels.
    pub cx: f64,
    /// Center y in image pixels.
    pub cy: f64,
    /// First semi-axis length.
    pub a: f64,
    /// Second semi-axis length.
    pub b: f64,
    /// Rotation angle in degrees.
    pub angle_deg: f64,
}

impl Ellipse {
    /// Check basic validity: non-negative semi-axes, finite values.
    pub fn is_valid(&self) -> bool {
        self.a >= 0.0
            && self.b >= 0.0
            && self.a.is_finite()
            && self.b.is_finite()
            && self.cx.is_finite()
            && self.cy.is_finite()
            && self.angle_deg.is_finite()
    }

    /// Enclosed area π·a·b.
    pub fn area(&self) -> f64 {
        std::f64::consts::PI * self.a * self.b
    }

    /// Ratio of the longer to the shorter semi-axis.
    ///
    /// Returns `None` when either axis is zero (the ratio is undefined).
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.a == 0.0 || self.b == 0.0 {
            return None;
        }
        Some(self.a.max(self.b) / self.a.min(self.b))
    }

    /// Build the conic coefficients of this ellipse, scaled to the
    /// 4AC − B² = 1 convention.
    ///
    /// Exact inverse of the conic decode for ellipses with positive
    /// semi-axes.
    pub fn to_conic(&self) -> ConicCoeffs {
        let angle = self.angle_deg.to_radians();
        let cos_a = angle.cos();
        let sin_a = angle.sin();
        let a2 = self.a * self.a;
        let b2 = self.b * self.b;

        let ca = cos_a * cos_a / a2 + sin_a * sin_a / b2;
        let cb = 2.0 * cos_a * sin_a * (1.0 / a2 - 1.0 / b2);
        let cc = sin_a * sin_a / a2 + cos_a * cos_a / b2;
        let cd = -2.0 * ca * self.cx - cb * self.cy;
        let ce = -cb * self.cx - 2.0 * cc * self.cy;
        let cf = ca * self.cx * self.cx + cb * self.cx * self.cy + cc * self.cy * self.cy - 1.0;

        // 4 ca·cc − cb² = 4/(a²b²); scaling by ab/2 lands on the fitter's
        // normalization.
        let scale = self.a * self.b / 2.0;
        ConicCoeffs([
            ca * scale,
            cb * scale,
            cc * scale,
            cd * scale,
            ce * scale,
            cf * scale,
        ])
    }

    /// Sample `n` points on the ellipse boundary at uniform parameter steps.
    pub fn sample_points(&self, n: usize) -> Vec<[f64; 2]> {
        let angle = self.angle_deg.to_radians();
        let cos_a = angle.cos();
        let sin_a = angle.sin();
        (0..n)
            .map(|i| {
                let t = 2.0 * std::f64::consts::PI * (i as f64) / (n as f64);
                let px = self.a * t.cos();
                let py = self.b * t.sin();
                let x = self.cx + cos_a * px - sin_a * py;
                let y = self.cy + sin_a * px + cos_a * py;
                [x, y]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ellipse_area() {
        let e = Ellipse {
            cx: 0.0,
            cy: 0.0,
            a: 3.0,
            b: 2.0,
            angle_deg: 0.0,
        };
        assert_relative_eq!(e.area(), 6.0 * std::f64::consts::PI, epsilon = 1e-12);
    }

    #[test]
    fn aspect_ratio_is_axis_order_independent() {
        let e1 = Ellipse {
            cx: 0.0,
            cy: 0.0,
            a: 10.0,
            b: 4.0,
            angle_deg: 0.0,
        };
        let e2 = Ellipse { a: 4.0, b: 10.0, ..e1 };
        assert_relative_eq!(e1.aspect_ratio().unwrap(), 2.5);
        assert_relative_eq!(e2.aspect_ratio().unwrap(), 2.5);
    }

    #[test]
    fn aspect_ratio_of_degenerate_ellipse_is_none() {
        let e = Ellipse {
            cx: 0.0,
            cy: 0.0,
            a: 0.0,
            b: 5.0,
            angle_deg: 0.0,
        };
        assert!(e.aspect_ratio().is_none());
    }

    #[test]
    fn to_conic_is_normalized_and_vanishes_on_the_boundary() {
        let e = Ellipse {
            cx: 40.0,
            cy: -10.0,
            a: 12.0,
            b: 7.0,
            angle_deg: 25.0,
        };
        let conic = e.to_conic();
        assert!(conic.is_ellipse());

        let [a, b, c, _, _, f] = conic.0;
        assert_relative_eq!(4.0 * a * c - b * b, 1.0, epsilon = 1e-12);

        for &[x, y] in &e.sample_points(32) {
            assert_relative_eq!(conic.eval_without_constant(x, y) + f, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn sampled_points_lie_on_the_boundary() {
        let e = Ellipse {
            cx: 12.0,
            cy: -3.0,
            a: 8.0,
            b: 5.0,
            angle_deg: 30.0,
        };
        let angle = e.angle_deg.to_radians();
        for &[x, y] in &e.sample_points(64) {
            let dx = x - e.cx;
            let dy = y - e.cy;
            let xr = dx * angle.cos() + dy * angle.sin();
            let yr = -dx * angle.sin() + dy * angle.cos();
            let r = (xr / e.a).powi(2) + (yr / e.b).powi(2);
            assert_relative_eq!(r, 1.0, epsilon = 1e-12);
        }
    }
}
