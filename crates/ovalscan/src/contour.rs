//! Contour representation and the contour-extraction seam.
//!
//! Contour extraction from the binary edge image is an external concern:
//! the pipeline consumes any [`ContourExtractor`] implementation. The crate
//! ships [`MaskTracer`], a boundary-following extractor built on the same
//! tracer the border closer uses internally.

use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Contour retrieval mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContourMethod {
    /// Only outer boundaries of connected foreground regions.
    #[default]
    External,
    /// All closed boundaries, including those of enclosed holes.
    All,
}

/// Ordered closed sequence of integer image points.
///
/// Produced by a [`ContourExtractor`] once per run and read-only downstream.
/// Contours with fewer than 5 points cannot be fitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contour {
    /// Boundary points as `[x, y]` pixel coordinates.
    pub points: Vec<[i32; 2]>,
}

impl Contour {
    /// Construct a contour from a point list.
    pub fn new(points: Vec<[i32; 2]>) -> Self {
        Self { points }
    }

    /// Number of boundary points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the contour has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Enclosed area via the shoelace formula (Green's theorem), in px².
    ///
    /// Matches the usual planimetric contour-area convention: the polygon is
    /// implicitly closed from the last point back to the first.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut acc = 0.0_f64;
        for i in 0..n {
            let [x0, y0] = self.points[i];
            let [x1, y1] = self.points[(i + 1) % n];
            acc += f64::from(x0) * f64::from(y1) - f64::from(x1) * f64::from(y0);
        }
        acc.abs() * 0.5
    }

    /// Boundary points as `f64` coordinates, the form the fitter consumes.
    pub fn float_points(&self) -> Vec<[f64; 2]> {
        self.points
            .iter()
            .map(|&[x, y]| [f64::from(x), f64::from(y)])
            .collect()
    }
}

/// Source of ordered point sequences from a binary edge image.
///
/// Implementations own the pixel-level tracing strategy; the detection
/// pipeline only requires that returned contours are in a stable order so
/// cached candidates line up across runs.
pub trait ContourExtractor {
    /// Extract contours from a binary image (nonzero = foreground).
    fn extract(&self, edges: &GrayImage, method: ContourMethod) -> Vec<Contour>;
}

/// Boundary-following contour extractor over binary masks.
///
/// `External` returns one outer boundary per 8-connected foreground
/// component; `All` additionally returns the boundaries of enclosed
/// background holes.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaskTracer;

impl ContourExtractor for MaskTracer {
    fn extract(&self, edges: &GrayImage, method: ContourMethod) -> Vec<Contour> {
        crate::border::trace_mask_contours(edges, method)
    }
}

impl<F> ContourExtractor for F
where
    F: Fn(&GrayImage, ContourMethod) -> Vec<Contour>,
{
    fn extract(&self, edges: &GrayImage, method: ContourMethod) -> Vec<Contour> {
        self(edges, method)
    }
}
