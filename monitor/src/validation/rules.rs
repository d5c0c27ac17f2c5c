//! Individual consistency checks
//!
//! Every check is a pure function of its inputs and the tolerance settings.
//! None of them touch shared state.

use super::{ValidationResult, ValidationSeverity};
use crate::config::ValidationSettings;
use crate::types::Platform;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypographySpec {
    pub font_size: f64,
    pub font_weight: String,
    pub line_height: f64,
}

pub struct ConsistencyRules {
    settings: ValidationSettings,
    platform: Platform,
}

/// Lowercase hex colors and expand `#rgb`/`#rgba` shorthand. Anything that is
/// not a hex color is returned unchanged.
pub fn normalize_color(value: &str) -> String {
    let trimmed = value.trim();
    let Some(digits) = trimmed.strip_prefix('#') else {
        return value.to_string();
    };
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return value.to_string();
    }
    let digits = digits.to_ascii_lowercase();
    match digits.len() {
        3 | 4 => {
            let expanded: String = digits.chars().flat_map(|c| [c, c]).collect();
            format!("#{}", expanded)
        }
        6 | 8 => format!("#{}", digits),
        _ => value.to_string(),
    }
}

impl ConsistencyRules {
    pub fn new(settings: ValidationSettings, platform: Platform) -> Self {
        Self { settings, platform }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    #[allow(clippy::too_many_arguments)]
    fn result(
        &self,
        passed: bool,
        failure_severity: ValidationSeverity,
        metric_name: &str,
        component: &str,
        message: String,
        expected: serde_json::Value,
        actual: serde_json::Value,
    ) -> ValidationResult {
        ValidationResult {
            passed,
            severity: if passed { ValidationSeverity::Info } else { failure_severity },
            message,
            metric_name: metric_name.to_string(),
            component: Some(component.to_string()),
            platform: self.platform,
            expected,
            actual,
        }
    }

    pub fn spacing_tolerance(&self, expected: f64) -> f64 {
        self.settings
            .spacing_min_tolerance_px
            .max(expected.abs() * self.settings.spacing_tolerance_ratio)
    }

    pub fn validate_spacing(&self, component: &str, measured: f64, expected: f64) -> ValidationResult {
        let tolerance = self.spacing_tolerance(expected);
        let deviation = (measured - expected).abs();
        let passed = deviation <= tolerance;
        let message = if passed {
            format!("Spacing {}px within {:.1}px of {}px", measured, tolerance, expected)
        } else {
            format!("Spacing {}px deviates {:.1}px from {}px (tolerance {:.1}px)", measured, deviation, expected, tolerance)
        };
        self.result(
            passed,
            ValidationSeverity::Warning,
            "spacing",
            component,
            message,
            json!({ "value": expected, "tolerance": tolerance }),
            json!(measured),
        )
    }

    pub fn validate_color(&self, component: &str, measured: &str, expected: &str) -> ValidationResult {
        let passed = normalize_color(measured) == normalize_color(expected);
        let message = if passed {
            format!("Color {} matches", measured)
        } else {
            format!("Color {} does not match {}", measured, expected)
        };
        self.result(
            passed,
            ValidationSeverity::Warning,
            "color",
            component,
            message,
            json!(expected),
            json!(measured),
        )
    }

    pub fn validate_typography(
        &self,
        component: &str,
        measured: &TypographySpec,
        expected: &TypographySpec,
    ) -> ValidationResult {
        let size_ok = (measured.font_size - expected.font_size).abs() <= self.settings.font_size_tolerance;
        let weight_ok = measured.font_weight == expected.font_weight;
        let line_ok = (measured.line_height - expected.line_height).abs() <= self.settings.line_height_tolerance;

        let mut mismatches = Vec::new();
        if !size_ok {
            mismatches.push(format!("font size {} vs {}", measured.font_size, expected.font_size));
        }
        if !weight_ok {
            mismatches.push(format!("weight {} vs {}", measured.font_weight, expected.font_weight));
        }
        if !line_ok {
            mismatches.push(format!("line height {} vs {}", measured.line_height, expected.line_height));
        }

        let passed = mismatches.is_empty();
        let message = if passed {
            "Typography matches".to_string()
        } else {
            format!("Typography mismatch: {}", mismatches.join(", "))
        };
        self.result(
            passed,
            ValidationSeverity::Warning,
            "typography",
            component,
            message,
            json!(expected),
            json!(measured),
        )
    }

    pub fn radius_tolerance(&self, expected: f64) -> f64 {
        self.settings
            .radius_min_tolerance_px
            .max(expected.abs() * self.settings.radius_tolerance_ratio)
    }

    pub fn validate_border_radius(&self, component: &str, measured: f64, expected: f64) -> ValidationResult {
        let tolerance = self.radius_tolerance(expected);
        let passed = (measured - expected).abs() <= tolerance;
        let message = if passed {
            format!("Border radius {}px within tolerance", measured)
        } else {
            format!("Border radius {}px differs from {}px (tolerance {:.1}px)", measured, expected, tolerance)
        };
        self.result(
            passed,
            ValidationSeverity::Warning,
            "border_radius",
            component,
            message,
            json!({ "value": expected, "tolerance": tolerance }),
            json!(measured),
        )
    }

    pub fn validate_touch_target(&self, component: &str, width: f64, height: f64) -> ValidationResult {
        let minimum = self.settings.touch_target.for_platform(self.platform);
        let passed = width >= minimum && height >= minimum;
        let message = if passed {
            format!("Touch target {}x{} meets the {}pt minimum", width, height, minimum)
        } else {
            format!("Touch target {}x{} is below the {}pt minimum on {}", width, height, minimum, self.platform)
        };
        self.result(
            passed,
            ValidationSeverity::Error,
            "touch_target",
            component,
            message,
            json!({ "min_width": minimum, "min_height": minimum }),
            json!({ "width": width, "height": height }),
        )
    }

    pub fn validate_contrast(&self, component: &str, ratio: f64) -> ValidationResult {
        let minimum = self.settings.min_contrast_ratio;
        let passed = ratio >= minimum;
        let message = if passed {
            format!("Contrast ratio {:.2}:1 meets {:.1}:1", ratio, minimum)
        } else {
            format!("Contrast ratio {:.2}:1 is below {:.1}:1", ratio, minimum)
        };
        self.result(
            passed,
            ValidationSeverity::Error,
            "contrast",
            component,
            message,
            json!(minimum),
            json!(ratio),
        )
    }

    pub fn validate_accessibility_label(&self, component: &str, label: Option<&str>) -> ValidationResult {
        let passed = label.map(|l| !l.trim().is_empty()).unwrap_or(false);
        let message = if passed {
            "Accessibility label present".to_string()
        } else {
            "Missing accessibility label".to_string()
        };
        self.result(
            passed,
            ValidationSeverity::Error,
            "accessibility_label",
            component,
            message,
            json!(true),
            json!(passed),
        )
    }

    pub fn validate_screen_reader(&self, component: &str, supported: bool) -> ValidationResult {
        let message = if supported {
            "Screen reader support declared".to_string()
        } else {
            "Component is not exposed to screen readers".to_string()
        };
        self.result(
            supported,
            ValidationSeverity::Warning,
            "screen_reader",
            component,
            message,
            json!(true),
            json!(supported),
        )
    }

    /// Runtime frame rate against the warning threshold
    pub fn validate_frame_rate(&self, component: &str, average_fps: f64, minimum_fps: f64) -> ValidationResult {
        let passed = average_fps >= minimum_fps;
        self.result(
            passed,
            ValidationSeverity::Warning,
            "frame_rate",
            component,
            format!("Average FPS {:.1} (minimum {:.0})", average_fps, minimum_fps),
            json!(minimum_fps),
            json!(average_fps),
        )
    }

    /// Average latency of interactions or requests against a target
    pub fn validate_response_time(
        &self,
        component: &str,
        metric_name: &str,
        average_ms: f64,
        target_ms: f64,
    ) -> ValidationResult {
        let passed = average_ms <= target_ms;
        self.result(
            passed,
            ValidationSeverity::Warning,
            metric_name,
            component,
            format!("Average {} {:.1}ms (target {:.0}ms)", metric_name.replace('_', " "), average_ms, target_ms),
            json!(target_ms),
            json!(average_ms),
        )
    }
}
