//! Conic coefficients → geometric ellipse parameters.

use super::types::{ConicCoeffs, Ellipse};

/// Decode general conic coefficients into geometric ellipse parameters.
///
/// Closed-form conic-to-ellipse conversion. Returns `None` whenever an
/// intermediate quantity is negative under a square root or a result is not
/// finite: that rejects parabolas and hyperbolas that slipped past the
/// fitter on numeric noise, and is the sole gate ensuring only genuine
/// ellipses proceed.
pub fn decode_conic(coeffs: &ConicCoeffs) -> Option<Ellipse> {
    let [a, b, c, d, e, f] = coeffs.0;

    // Major-axis rotation, reported in degrees.
    let theta_deg = ((-b).atan2(c - a) / 2.0).to_degrees();
    if !theta_deg.is_finite() {
        return None;
    }

    let delta = ((a - c) * (a - c) + b * b).sqrt();
    let common = 2.0 * (a * e * e + c * d * d - b * d * e + (b * b - 4.0 * a * c) * f);

    let a_sq = common * ((a + c) + delta);
    let b_sq = common * ((a + c) - delta);
    if a_sq < 0.0 || b_sq < 0.0 {
        return None;
    }

    let denom = b * b - 4.0 * a * c;
    let axis_a = -a_sq.sqrt() / denom;
    let axis_b = -b_sq.sqrt() / denom;
    if !(axis_a.is_finite() && axis_b.is_finite()) {
        return None;
    }

    let x0 = (2.0 * c * d - b * e) / denom;
    let y0 = (2.0 * a * e - b * d) / denom;
    if !(x0.is_finite() && y0.is_finite()) {
        return None;
    }

    let ellipse = Ellipse {
        cx: x0,
        cy: y0,
        a: axis_a,
        b: axis_b,
        angle_deg: theta_deg,
    };
    ellipse.is_valid().then_some(ellipse)
}
