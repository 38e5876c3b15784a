//! Border closing: reconstructing the true closed boundary of a contour
//! that was clipped by the image edge.
//!
//! A contour traced from an edge image loses the part of the object boundary
//! that runs along the image border. Area and geometric error must be
//! computed on the object's full extent, so the contour is re-closed by
//! rasterizing it into a mask whose border rows/columns are painted as
//! boundary, then re-extracting closed contours from that mask. The border
//! frame and the contour arc together enclose the clipped region, which
//! reappears as a closed hole boundary.

use image::GrayImage;

use crate::contour::{Contour, ContourMethod};

/// Contours covering at least this fraction of the image area are assumed
/// to be the border frame itself and are discarded.
pub const MAX_CONTOUR_AREA_RATIO: f64 = 0.8;

const FG: u8 = 255;

/// Close a possibly border-clipped contour into a closed region boundary.
///
/// Rasterizes the contour into a mask sized to the image, paints the four
/// 1-px border rows/columns as boundary, re-extracts all closed contours
/// (outer boundaries and hole boundaries), discards those covering ≥ 80% of
/// the image area and returns the largest remaining one. If none qualifies
/// the input contour is returned unchanged, which makes the operation
/// idempotent for contours that do not touch the border.
pub fn close_at_border(contour: &Contour, height: u32, width: u32) -> Contour {
    if height == 0 || width == 0 || contour.is_empty() {
        return contour.clone();
    }

    let mut mask = GrayImage::new(width, height);
    paint_border(&mut mask);
    draw_contour_filled(&mut mask, contour);

    let candidates = trace_mask_contours(&mask, ContourMethod::All);
    let max_area = f64::from(height) * f64::from(width) * MAX_CONTOUR_AREA_RATIO;

    candidates
        .into_iter()
        .filter(|c| c.area() < max_area)
        .max_by(|a, b| a.area().total_cmp(&b.area()))
        .unwrap_or_else(|| contour.clone())
}

/// Area of a contour after closing it at the image border, in px².
pub fn contour_area_closed(contour: &Contour, height: u32, width: u32) -> f64 {
    close_at_border(contour, height, width).area()
}

// ── Mask rasterization ─────────────────────────────────────────────────────

/// Paint the four 1-px border rows/columns as foreground.
fn paint_border(mask: &mut GrayImage) {
    let (w, h) = mask.dimensions();
    for x in 0..w {
        mask.put_pixel(x, 0, image::Luma([FG]));
        mask.put_pixel(x, h - 1, image::Luma([FG]));
    }
    for y in 0..h {
        mask.put_pixel(0, y, image::Luma([FG]));
        mask.put_pixel(w - 1, y, image::Luma([FG]));
    }
}

fn put_clipped(mask: &mut GrayImage, x: i32, y: i32) {
    let (w, h) = mask.dimensions();
    if x >= 0 && y >= 0 && (x as u32) < w && (y as u32) < h {
        mask.put_pixel(x as u32, y as u32, image::Luma([FG]));
    }
}

/// Draw a closed contour into the mask: polygon outline plus even-odd
/// scanline fill.
///
/// The even-odd fill collapses to nothing for out-and-back polylines (the
/// contour of an open edge arc), leaving only the outline; simple closed
/// contours are filled solid. This mirrors filled-contour rasterization of
/// traced edge contours.
fn draw_contour_filled(mask: &mut GrayImage, contour: &Contour) {
    let n = contour.len();
    if n == 0 {
        return;
    }
    if n == 1 {
        let [x, y] = contour.points[0];
        put_clipped(mask, x, y);
        return;
    }

    // Outline
    for i in 0..n {
        let [x0, y0] = contour.points[i];
        let [x1, y1] = contour.points[(i + 1) % n];
        draw_segment(mask, x0, y0, x1, y1);
    }

    // Even-odd scanline fill. Half-open edge rule: an edge spans
    // [min(y), max(y)), so shared vertices are counted exactly once and
    // horizontal edges contribute nothing.
    let (w, h) = mask.dimensions();
    let mut xs: Vec<f64> = Vec::new();
    for y in 0..h as i32 {
        xs.clear();
        let fy = f64::from(y);
        for i in 0..n {
            let [x0, y0] = contour.points[i];
            let [x1, y1] = contour.points[(i + 1) % n];
            if y0 == y1 {
                continue;
            }
            let (ymin, ymax) = (y0.min(y1), y0.max(y1));
            if y < ymin || y >= ymax {
                continue;
            }
            let t = (fy - f64::from(y0)) / f64::from(y1 - y0);
            xs.push(f64::from(x0) + t * f64::from(x1 - x0));
        }
        xs.sort_by(|a, b| a.total_cmp(b));
        for pair in xs.chunks_exact(2) {
            let xa = pair[0].ceil() as i32;
            let xb = pair[1].floor() as i32;
            for x in xa.max(0)..=xb.min(w as i32 - 1) {
                put_clipped(mask, x, y);
            }
        }
    }
}

/// Bresenham line between two integer points, clipped to the mask.
fn draw_segment(mask: &mut GrayImage, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);
    loop {
        put_clipped(mask, x, y);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

// ── Contour re-extraction ──────────────────────────────────────────────────

/// Trace closed contours in a binary mask (nonzero = foreground).
///
/// `External` yields one outer boundary per 8-connected foreground
/// component; `All` additionally yields the boundaries of 4-connected
/// background holes (background regions not reaching the image edge).
/// Contours are returned in row-major discovery order.
pub(crate) fn trace_mask_contours(mask: &GrayImage, method: ContourMethod) -> Vec<Contour> {
    let (w, h) = mask.dimensions();
    if w == 0 || h == 0 {
        return Vec::new();
    }
    let (w_i, h_i) = (w as i32, h as i32);
    let fg = |x: i32, y: i32| -> bool {
        x >= 0 && y >= 0 && x < w_i && y < h_i && mask.get_pixel(x as u32, y as u32)[0] != 0
    };

    let mut contours = Vec::new();

    // Outer boundaries of foreground components.
    let fg_labels = label_components(w, h, |x, y| fg(x, y), true);
    for comp in &fg_labels.seeds {
        let label = fg_labels.at(comp[0], comp[1]);
        let trace = moore_trace(
            |x, y| {
                x >= 0 && y >= 0 && x < w_i && y < h_i && fg_labels.at(x, y) == label
            },
            (comp[0], comp[1]),
        );
        contours.push(Contour::new(trace));
    }

    if method == ContourMethod::All {
        // Hole boundaries: background components that never touch the edge.
        let bg_labels = label_components(w, h, |x, y| !fg(x, y), false);
        for comp in &bg_labels.seeds {
            let label = bg_labels.at(comp[0], comp[1]);
            if bg_labels.touches_edge[label as usize - 1] {
                continue;
            }
            let trace = moore_trace(
                |x, y| {
                    x >= 0 && y >= 0 && x < w_i && y < h_i && bg_labels.at(x, y) == label
                },
                (comp[0], comp[1]),
            );
            contours.push(Contour::new(trace));
        }
    }

    contours
}

struct Labels {
    width: i32,
    data: Vec<u32>,
    /// Topmost-then-leftmost pixel of each component, in discovery order.
    seeds: Vec<[i32; 2]>,
    touches_edge: Vec<bool>,
}

impl Labels {
    fn at(&self, x: i32, y: i32) -> u32 {
        self.data[(y * self.width + x) as usize]
    }
}

/// Flood-fill component labeling over the predicate `inside`.
///
/// `eight_connected` selects 8- vs 4-connectivity. Row-major seeding
/// guarantees each component's seed is its topmost-then-leftmost pixel.
fn label_components(
    w: u32,
    h: u32,
    inside: impl Fn(i32, i32) -> bool,
    eight_connected: bool,
) -> Labels {
    let (w_i, h_i) = (w as i32, h as i32);
    let mut labels = Labels {
        width: w_i,
        data: vec![0; (w * h) as usize],
        seeds: Vec::new(),
        touches_edge: Vec::new(),
    };
    let offsets: &[(i32, i32)] = if eight_connected {
        &[
            (1, 0),
            (-1, 0),
            (0, 1),
            (0, -1),
            (1, 1),
            (1, -1),
            (-1, 1),
            (-1, -1),
        ]
    } else {
        &[(1, 0), (-1, 0), (0, 1), (0, -1)]
    };

    let mut stack: Vec<(i32, i32)> = Vec::new();
    let mut next_label = 0u32;
    for y in 0..h_i {
        for x in 0..w_i {
            if !inside(x, y) || labels.at(x, y) != 0 {
                continue;
            }
            next_label += 1;
            labels.seeds.push([x, y]);
            let mut touches = false;
            stack.push((x, y));
            labels.data[(y * w_i + x) as usize] = next_label;
            while let Some((cx, cy)) = stack.pop() {
                if cx == 0 || cy == 0 || cx == w_i - 1 || cy == h_i - 1 {
                    touches = true;
                }
                for &(dx, dy) in offsets {
                    let (nx, ny) = (cx + dx, cy + dy);
                    if nx < 0 || ny < 0 || nx >= w_i || ny >= h_i {
                        continue;
                    }
                    if inside(nx, ny) && labels.at(nx, ny) == 0 {
                        labels.data[(ny * w_i + nx) as usize] = next_label;
                        stack.push((nx, ny));
                    }
                }
            }
            labels.touches_edge.push(touches);
        }
    }
    labels
}

/// 8-neighborhood in clockwise order starting East (x right, y down).
const NB8: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

fn dir_index(dx: i32, dy: i32) -> usize {
    NB8.iter()
        .position(|&(ox, oy)| ox == dx && oy == dy)
        .unwrap_or(4)
}

/// Moore-neighbor boundary trace starting at the component's
/// topmost-then-leftmost pixel.
///
/// The starting pixel's west neighbor is guaranteed outside the component,
/// so tracing begins there and walks clockwise. Terminates when the walk
/// returns to the start pixel with the original backtrack, with a hard step
/// cap as a safety net against pathological masks.
fn moore_trace(inside: impl Fn(i32, i32) -> bool, start: (i32, i32)) -> Vec<[i32; 2]> {
    let mut points = vec![[start.0, start.1]];
    let mut cur = start;
    let start_backtrack = (start.0 - 1, start.1);
    let mut backtrack = start_backtrack;

    // A boundary pixel is visited at most once per approach direction, so
    // any genuine trace finishes well under this cap.
    const MAX_TRACE_STEPS: usize = 1 << 24;
    for _ in 0..MAX_TRACE_STEPS {
        let from = dir_index(backtrack.0 - cur.0, backtrack.1 - cur.1);
        let mut advanced = false;
        for k in 1..=8 {
            let dir = (from + k) % 8;
            let (dx, dy) = NB8[dir];
            let next = (cur.0 + dx, cur.1 + dy);
            if inside(next.0, next.1) {
                let (bx, by) = NB8[(from + k + 7) % 8];
                backtrack = (cur.0 + bx, cur.1 + by);
                cur = next;
                advanced = true;
                break;
            }
        }
        if !advanced {
            // Isolated pixel
            break;
        }
        if cur == start && backtrack == start_backtrack {
            break;
        }
        points.push([cur.0, cur.1]);
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Filled axis-aligned rectangle contour.
    fn rect_contour(x0: i32, y0: i32, x1: i32, y1: i32) -> Contour {
        Contour::new(vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]])
    }

    #[test]
    fn trace_recovers_filled_square() {
        let mut mask = GrayImage::new(40, 40);
        for y in 10..20u32 {
            for x in 10..20u32 {
                mask.put_pixel(x, y, image::Luma([255]));
            }
        }
        let contours = trace_mask_contours(&mask, ContourMethod::External);
        assert_eq!(contours.len(), 1);
        // 10x10 pixel block: traced boundary encloses a 9x9 px² polygon
        assert_relative_eq!(contours[0].area(), 81.0, epsilon = 1e-9);
    }

    #[test]
    fn trace_all_includes_holes() {
        // Hollow square: 20x20 ring with a 10x10 hole
        let mut mask = GrayImage::new(60, 60);
        for y in 10..30u32 {
            for x in 10..30u32 {
                if (15..25).contains(&x) && (15..25).contains(&y) {
                    continue;
                }
                mask.put_pixel(x, y, image::Luma([255]));
            }
        }
        let external = trace_mask_contours(&mask, ContourMethod::External);
        assert_eq!(external.len(), 1);
        let all = trace_mask_contours(&mask, ContourMethod::All);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn close_is_idempotent_away_from_border() {
        let contour = rect_contour(15, 15, 30, 30);
        let closed = close_at_border(&contour, 60, 60);
        assert_relative_eq!(closed.area(), contour.area(), epsilon = contour.area() * 0.05);

        let closed_twice = close_at_border(&closed, 60, 60);
        assert_relative_eq!(closed_twice.area(), closed.area(), epsilon = closed.area() * 0.05);
    }

    #[test]
    fn close_recovers_region_clipped_at_border() {
        // Open arc: three sides of a square whose fourth side was lost at
        // the left image border. Traced edge contour goes out and back.
        let contour = Contour::new(vec![
            [0, 10],
            [20, 10],
            [20, 30],
            [0, 30],
            [20, 30],
            [20, 10],
        ]);
        assert_eq!(contour.area(), 0.0);

        let closed = close_at_border(&contour, 100, 100);
        // The enclosed ~20x20 region must reappear as a closed boundary.
        assert!(
            closed.area() > 300.0 && closed.area() < 500.0,
            "expected recovered region area, got {}",
            closed.area()
        );
    }

    #[test]
    fn close_of_single_pixel_contour_stays_tiny() {
        let contour = Contour::new(vec![[5, 5]]);
        let closed = close_at_border(&contour, 300, 300);
        assert!(closed.area() <= 1.0);
    }

    #[test]
    fn contour_area_closed_matches_shoelace_for_interior_contour() {
        let contour = rect_contour(10, 10, 25, 25);
        let area = contour_area_closed(&contour, 80, 80);
        assert_relative_eq!(area, contour.area(), epsilon = contour.area() * 0.05);
    }
}
