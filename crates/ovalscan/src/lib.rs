//! Detection of elliptical objects in binary edge images.
//!
//! The crate takes a preprocessed edge image and produces the set of
//! contours whose shape is well approximated by an ellipse, together with
//! the fitted geometry and a fit-quality score per accepted contour.
//!
//! Stages, run by [`DetectionPipeline`]:
//! 1. contour extraction through a caller-supplied [`ContourExtractor`]
//!    ([`MaskTracer`] is the built-in implementation);
//! 2. least-squares conic fitting with the ellipse constraint
//!    ([`fit_conic`]) and decoding to geometric parameters
//!    ([`decode_conic`]);
//! 3. fit-error scoring under one of three metrics ([`ErrorMethod`]);
//! 4. threshold filtering on error, area, aspect ratio and contour/ellipse
//!    area agreement.
//!
//! Intermediate results are cached between runs and invalidated per
//! parameter category, so threshold tuning does not re-run fitting.
//!
//! ```no_run
//! use ovalscan::{DetectConfig, DetectionPipeline, MaskTracer};
//!
//! let edges = image::open("edges.png").unwrap().to_luma8();
//! let mut pipeline = DetectionPipeline::new();
//! let result = pipeline.detect(&edges, &MaskTracer, &DetectConfig::default());
//! for e in &result.ellipses {
//!     println!("center {:?} axes {:?}", e.center, e.semi_axes);
//! }
//! ```

pub mod border;
pub mod config;
pub mod conic;
pub mod contour;
pub mod filter;
pub mod metrics;
pub mod pipeline;

pub use border::{close_at_border, contour_area_closed, MAX_CONTOUR_AREA_RATIO};
pub use config::{changed_categories, DetectConfig, ParamCategory};
pub use conic::{decode_conic, fit_conic, ConicCoeffs, Ellipse};
pub use contour::{Contour, ContourExtractor, ContourMethod, MaskTracer};
pub use filter::{accept, ellipse_area_in_bounds};
pub use metrics::{
    algebraic_error, distance_to_ellipse_newton, fit_error, geometric_error_newton,
    geometric_error_simple, ErrorMethod,
};
pub use pipeline::{Candidate, DetectedEllipse, DetectionPipeline, DetectionResult};
