//! Detection pipeline: contours → candidates → error scores → accepted
//! ellipses, with a tiered cache keyed on parameter categories.
//!
//! Cache tiers, cheapest to drop last:
//! - contours, recomputed when a preprocessing-category parameter changes;
//! - candidates (fit + decode per contour), dropped with the contours;
//! - error scores, one list per metric kind, dropped with the candidates.
//!
//! Filter- and display-category changes drop nothing: thresholds reapply
//! over cached candidates, and switching the active metric only computes
//! the missing score list.

use std::collections::HashMap;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::border::contour_area_closed;
use crate::config::{changed_categories, DetectConfig, ParamCategory};
use crate::conic::{decode_conic, fit_conic, ConicCoeffs, Ellipse};
use crate::contour::{Contour, ContourExtractor};
use crate::filter;
use crate::metrics::{fit_error, ErrorMethod};

/// A contour that fitted and decoded to an ellipse, with everything the
/// scoring and filtering stages need.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Decoded geometric parameters.
    pub ellipse: Ellipse,
    /// Fitted conic coefficients, normalized to 4AC − B² = 1.
    pub conic: ConicCoeffs,
    /// Source contour points in float form.
    pub points: Vec<[f64; 2]>,
    /// Index of the source contour in the extraction order.
    pub contour_index: usize,
    /// Border-closed area of the source contour, in px².
    pub contour_area: f64,
}

impl Candidate {
    /// Fit a contour; `None` when it has fewer than 5 points or the fit or
    /// decode rejects it.
    fn from_contour(contour: &Contour, index: usize, height: u32, width: u32) -> Option<Self> {
        if contour.len() < 5 {
            return None;
        }
        let points = contour.float_points();
        let conic = fit_conic(&points)?;
        let ellipse = decode_conic(&conic)?;
        let contour_area = contour_area_closed(contour, height, width);

        Some(Self {
            ellipse,
            conic,
            points,
            contour_index: index,
            contour_area,
        })
    }
}

/// An accepted ellipse with its score and provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedEllipse {
    /// Center `[x, y]` in image pixels.
    pub center: [f64; 2],
    /// Semi-axes `[a, b]`, major first.
    pub semi_axes: [f64; 2],
    /// Rotation of the major axis in degrees.
    pub angle_deg: f64,
    /// Enclosed area π·a·b.
    pub ellipse_area: f64,
    /// Border-closed area of the source contour.
    pub contour_area: f64,
    /// Fit error under the active metric.
    pub error: f64,
    /// Index of the source contour in the extraction order.
    pub contour_index: usize,
}

/// Output of one detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Candidates passing every threshold, in contour order.
    pub ellipses: Vec<DetectedEllipse>,
    /// Every extracted contour, accepted or not.
    pub contours: Vec<Contour>,
}

/// Stateful detection driver owning the cache.
#[derive(Debug, Default)]
pub struct DetectionPipeline {
    cached_contours: Option<Vec<Contour>>,
    cached_candidates: Option<Vec<Candidate>>,
    cached_errors: HashMap<ErrorMethod, Vec<f64>>,
    last_config: Option<DetectConfig>,
}

impl DetectionPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one invalidation tier. `Preprocessing` clears every cache
    /// level; other categories are a no-op at this layer.
    pub fn invalidate(&mut self, category: ParamCategory) {
        if category == ParamCategory::Preprocessing {
            self.clear_cache();
        }
    }

    fn clear_cache(&mut self) {
        self.cached_contours = None;
        self.cached_candidates = None;
        self.cached_errors.clear();
    }

    /// Run detection over a binary edge image.
    ///
    /// The config is diffed against the previous run's snapshot to decide
    /// which cache tiers to drop before any work happens. Accepted ellipses
    /// come back in the extractor's contour order.
    ///
    /// The cache is keyed on the config only, not on the image: a pipeline
    /// instance is bound to one edge image between invalidations. To run
    /// the same instance on a different image, call
    /// [`invalidate`](Self::invalidate) with
    /// [`ParamCategory::Preprocessing`] first.
    pub fn detect(
        &mut self,
        edges: &GrayImage,
        extractor: &dyn ContourExtractor,
        config: &DetectConfig,
    ) -> DetectionResult {
        if let Some(last) = &self.last_config {
            for category in changed_categories(last, config) {
                self.invalidate(category);
            }
        }
        self.last_config = Some(config.clone());

        let (width, height) = edges.dimensions();

        if self.cached_contours.is_none() {
            let contours = extractor.extract(edges, config.contour_method);
            tracing::debug!(count = contours.len(), "extracted contours");
            self.cached_contours = Some(contours);
        }
        let contours = self.cached_contours.as_deref().unwrap_or(&[]);

        if !config.show_ellipses {
            return DetectionResult {
                ellipses: Vec::new(),
                contours: contours.to_vec(),
            };
        }

        if self.cached_candidates.is_none() {
            let candidates: Vec<Candidate> = contours
                .iter()
                .enumerate()
                .filter_map(|(i, c)| Candidate::from_contour(c, i, height, width))
                .collect();
            tracing::debug!(count = candidates.len(), "fitted candidates");
            self.cached_candidates = Some(candidates);
        }
        let candidates = self.cached_candidates.as_deref().unwrap_or(&[]);

        let errors = self
            .cached_errors
            .entry(config.error_method)
            .or_insert_with(|| {
                tracing::debug!(method = ?config.error_method, "scoring candidates");
                candidates
                    .iter()
                    .map(|c| fit_error(config.error_method, &c.conic, &c.ellipse, &c.points))
                    .collect()
            });

        let ellipses: Vec<DetectedEllipse> = candidates
            .iter()
            .zip(errors.iter())
            .filter(|(c, &error)| {
                filter::accept(&c.ellipse, c.contour_area, error, config, height, width)
            })
            .map(|(c, &error)| DetectedEllipse {
                center: [c.ellipse.cx, c.ellipse.cy],
                semi_axes: [c.ellipse.a, c.ellipse.b],
                angle_deg: c.ellipse.angle_deg,
                ellipse_area: c.ellipse.area(),
                contour_area: c.contour_area,
                error,
                contour_index: c.contour_index,
            })
            .collect();

        tracing::debug!(
            accepted = ellipses.len(),
            total = candidates.len(),
            "filtered candidates"
        );

        DetectionResult {
            ellipses,
            contours: contours.to_vec(),
        }
    }
}
