//! Detection configuration and the parameter-category model driving cache
//! invalidation.

use serde::{Deserialize, Serialize};

use crate::contour::ContourMethod;
use crate::metrics::ErrorMethod;

/// Invalidation tier of a configuration parameter.
///
/// `Preprocessing` changes alter the contour set and clear every cache
/// level. `Filter` changes only affect threshold decisions, which are cheap
/// to reapply over cached candidates. `Display` changes touch rendering
/// only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamCategory {
    Preprocessing,
    Filter,
    Display,
}

/// Detection parameters consumed by the pipeline.
///
/// Treated as an immutable snapshot per run; the pipeline diffs consecutive
/// snapshots to decide which cache tiers to drop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    /// Contour retrieval mode passed to the extractor.
    pub contour_method: ContourMethod,
    /// Active fit-error metric.
    pub error_method: ErrorMethod,
    /// Mantissa of the maximum accepted fit error.
    pub error_factor: f64,
    /// Decimal exponent of the maximum accepted fit error; the bound is
    /// `error_factor / 10^⌊error_exponent⌋`.
    pub error_exponent: f64,
    /// Minimum accepted ellipse area in square pixels.
    pub min_area: f64,
    /// Maximum major/minor axis ratio; 0 disables the check.
    pub max_aspect_ratio: f64,
    /// Maximum relative contour/ellipse area mismatch; 0 disables the check.
    pub area_error: f64,
    /// Whether candidate fitting and filtering run at all.
    pub show_ellipses: bool,
    /// Rendering hint for the caller's overlay; unused by detection.
    pub fill_contours: bool,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            contour_method: ContourMethod::External,
            error_method: ErrorMethod::Algebraic,
            error_factor: 1.0,
            error_exponent: 4.0,
            min_area: 50.0,
            max_aspect_ratio: 2.0,
            area_error: 0.0,
            show_ellipses: true,
            fill_contours: false,
        }
    }
}

struct ParamDescriptor {
    category: ParamCategory,
    differs: fn(&DetectConfig, &DetectConfig) -> bool,
}

/// Category of every parameter, with a field-level comparison. Each config
/// field must appear exactly once.
const PARAMETERS: &[ParamDescriptor] = &[
    ParamDescriptor {
        category: ParamCategory::Preprocessing,
        differs: |a, b| a.contour_method != b.contour_method,
    },
    ParamDescriptor {
        category: ParamCategory::Filter,
        differs: |a, b| a.error_method != b.error_method,
    },
    ParamDescriptor {
        category: ParamCategory::Filter,
        differs: |a, b| a.error_factor != b.error_factor,
    },
    ParamDescriptor {
        category: ParamCategory::Filter,
        differs: |a, b| a.error_exponent != b.error_exponent,
    },
    ParamDescriptor {
        category: ParamCategory::Filter,
        differs: |a, b| a.min_area != b.min_area,
    },
    ParamDescriptor {
        category: ParamCategory::Filter,
        differs: |a, b| a.max_aspect_ratio != b.max_aspect_ratio,
    },
    ParamDescriptor {
        category: ParamCategory::Filter,
        differs: |a, b| a.area_error != b.area_error,
    },
    ParamDescriptor {
        category: ParamCategory::Display,
        differs: |a, b| a.show_ellipses != b.show_ellipses,
    },
    ParamDescriptor {
        category: ParamCategory::Display,
        differs: |a, b| a.fill_contours != b.fill_contours,
    },
];

/// Categories of every parameter that differs between two snapshots.
pub fn changed_categories(old: &DetectConfig, new: &DetectConfig) -> Vec<ParamCategory> {
    let mut categories = Vec::new();
    for descriptor in PARAMETERS {
        if (descriptor.differs)(old, new) && !categories.contains(&descriptor.category) {
            categories.push(descriptor.category);
        }
    }
    categories
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_snapshots_change_nothing() {
        let config = DetectConfig::default();
        assert!(changed_categories(&config, &config.clone()).is_empty());
    }

    #[test]
    fn contour_method_is_a_preprocessing_change() {
        let old = DetectConfig::default();
        let new = DetectConfig {
            contour_method: ContourMethod::All,
            ..old.clone()
        };
        assert_eq!(changed_categories(&old, &new), vec![ParamCategory::Preprocessing]);
    }

    #[test]
    fn threshold_changes_are_filter_category() {
        let old = DetectConfig::default();
        let new = DetectConfig {
            min_area: 120.0,
            error_method: ErrorMethod::Geometric,
            ..old.clone()
        };
        assert_eq!(changed_categories(&old, &new), vec![ParamCategory::Filter]);
    }

    #[test]
    fn display_changes_do_not_touch_other_categories() {
        let old = DetectConfig::default();
        let new = DetectConfig {
            show_ellipses: false,
            fill_contours: true,
            ..old.clone()
        };
        assert_eq!(changed_categories(&old, &new), vec![ParamCategory::Display]);
    }

    #[test]
    fn mixed_changes_report_each_category_once() {
        let old = DetectConfig::default();
        let new = DetectConfig {
            contour_method: ContourMethod::All,
            min_area: 10.0,
            area_error: 0.5,
            fill_contours: true,
            ..old.clone()
        };
        let cats = changed_categories(&old, &new);
        assert_eq!(
            cats,
            vec![
                ParamCategory::Preprocessing,
                ParamCategory::Filter,
                ParamCategory::Display
            ]
        );
    }

    #[test]
    fn default_round_trips_through_json() {
        let config = DetectConfig::default();
        let json = serde_json::to_string(&config).expect("serialize");
        let back: DetectConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(config, back);
    }
}
