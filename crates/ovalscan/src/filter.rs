//! Threshold filtering of candidate ellipses.
//!
//! Four short-circuit checks in a fixed order: fit error, minimum area,
//! aspect ratio, contour/ellipse area mismatch. The first failing check
//! rejects the candidate outright.

use crate::config::DetectConfig;
use crate::conic::Ellipse;

/// Pixel area of the ellipse clipped to the image bounds.
///
/// Center and axes are truncated to integers before rasterization, matching
/// the integer-geometry drawing used for the displayed overlay so the area
/// check compares like with like.
pub fn ellipse_area_in_bounds(ellipse: &Ellipse, height: u32, width: u32) -> f64 {
    let cx = ellipse.cx as i64;
    let cy = ellipse.cy as i64;
    let a = ellipse.a as i64;
    let b = ellipse.b as i64;
    if a <= 0 || b <= 0 {
        return 0.0;
    }

    let angle = ellipse.angle_deg.to_radians();
    let (sin_t, cos_t) = angle.sin_cos();
    let (a_f, b_f) = (a as f64, b as f64);

    // Bounding box of the rotated ellipse, clipped to the image.
    let reach = a.max(b);
    let x_min = (cx - reach).max(0);
    let x_max = (cx + reach).min(width as i64 - 1);
    let y_min = (cy - reach).max(0);
    let y_max = (cy + reach).min(height as i64 - 1);

    let mut count = 0u64;
    for py in y_min..=y_max {
        for px in x_min..=x_max {
            let dx = (px - cx) as f64;
            let dy = (py - cy) as f64;
            let xr = dx * cos_t + dy * sin_t;
            let yr = -dx * sin_t + dy * cos_t;
            if (xr / a_f).powi(2) + (yr / b_f).powi(2) <= 1.0 {
                count += 1;
            }
        }
    }
    count as f64
}

/// Decide whether a candidate ellipse passes the configured thresholds.
///
/// `contour_area` is the border-closed area of the candidate's source
/// contour. Checks run in order and short-circuit on the first failure:
///
/// 1. fit error above `error_factor / 10^⌊error_exponent⌋`;
/// 2. ellipse area below `min_area`;
/// 3. aspect ratio above `max_aspect_ratio` (0 disables; a zero axis
///    rejects when enabled);
/// 4. relative mismatch between the contour area and the ellipse's
///    in-bounds pixel area above `area_error` (0 disables; a zero area on
///    either side rejects when enabled).
pub fn accept(
    ellipse: &Ellipse,
    contour_area: f64,
    error: f64,
    config: &DetectConfig,
    height: u32,
    width: u32,
) -> bool {
    let max_error = config.error_factor / 10f64.powi(config.error_exponent as i32);
    if error > max_error {
        return false;
    }

    if ellipse.area() < config.min_area {
        return false;
    }

    if config.max_aspect_ratio > 0.0 {
        match ellipse.aspect_ratio() {
            None => return false,
            Some(ratio) if ratio > config.max_aspect_ratio => return false,
            Some(_) => {}
        }
    }

    if config.area_error > 0.0 {
        let ellipse_area_in_image = ellipse_area_in_bounds(ellipse, height, width);
        if contour_area == 0.0 || ellipse_area_in_image == 0.0 {
            return false;
        }
        let area_diff = (contour_area - ellipse_area_in_image).abs() / contour_area;
        if area_diff > config.area_error {
            return false;
        }
    }

    true
}
