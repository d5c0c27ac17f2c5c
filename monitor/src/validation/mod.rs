//! Cross-platform consistency validation
//!
//! Hosts record measured UI properties (spacing, colors, typography, touch
//! targets, accessibility metadata) next to the values the design expects.
//! [`ConsistencyValidator::run_full_validation`] evaluates them with the
//! checks in [`rules`], adds runtime performance checks, and aggregates a
//! [`ConsistencyReport`].

pub mod device;
pub mod rules;

pub use device::{DeviceInfo, DeviceInfoProvider, StaticDeviceInfo, UnavailableDeviceInfo};
pub use rules::{normalize_color, ConsistencyRules, TypographySpec};

use crate::history::ScoredReport;
use crate::types::Platform;
use crate::utils::sync::lock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

/// Outcome of one consistency check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub severity: ValidationSeverity,
    pub message: String,
    pub metric_name: String,
    pub component: Option<String>,
    pub platform: Platform,
    pub expected: serde_json::Value,
    pub actual: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationCategory {
    Visual,
    Functional,
    Performance,
    Accessibility,
}

/// A measured property paired with its expected value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Measurement {
    Spacing {
        component: String,
        measured: f64,
        expected: f64,
    },
    Color {
        component: String,
        measured: String,
        expected: String,
    },
    Typography {
        component: String,
        measured: TypographySpec,
        expected: TypographySpec,
    },
    BorderRadius {
        component: String,
        measured: f64,
        expected: f64,
    },
    TouchTarget {
        component: String,
        width: f64,
        height: f64,
    },
    Contrast {
        component: String,
        ratio: f64,
    },
    AccessibilityLabel {
        component: String,
        label: Option<String>,
    },
    ScreenReader {
        component: String,
        supported: bool,
    },
}

impl Measurement {
    pub fn component(&self) -> &str {
        match self {
            Measurement::Spacing { component, .. }
            | Measurement::Color { component, .. }
            | Measurement::Typography { component, .. }
            | Measurement::BorderRadius { component, .. }
            | Measurement::TouchTarget { component, .. }
            | Measurement::Contrast { component, .. }
            | Measurement::AccessibilityLabel { component, .. }
            | Measurement::ScreenReader { component, .. } => component,
        }
    }

    pub fn category(&self) -> ValidationCategory {
        match self {
            Measurement::Spacing { .. }
            | Measurement::Color { .. }
            | Measurement::Typography { .. }
            | Measurement::BorderRadius { .. } => ValidationCategory::Visual,
            Measurement::TouchTarget { .. } => ValidationCategory::Functional,
            Measurement::Contrast { .. }
            | Measurement::AccessibilityLabel { .. }
            | Measurement::ScreenReader { .. } => ValidationCategory::Accessibility,
        }
    }

    pub fn evaluate(&self, rules: &ConsistencyRules) -> ValidationResult {
        match self {
            Measurement::Spacing { component, measured, expected } => {
                rules.validate_spacing(component, *measured, *expected)
            }
            Measurement::Color { component, measured, expected } => {
                rules.validate_color(component, measured, expected)
            }
            Measurement::Typography { component, measured, expected } => {
                rules.validate_typography(component, measured, expected)
            }
            Measurement::BorderRadius { component, measured, expected } => {
                rules.validate_border_radius(component, *measured, *expected)
            }
            Measurement::TouchTarget { component, width, height } => {
                rules.validate_touch_target(component, *width, *height)
            }
            Measurement::Contrast { component, ratio } => rules.validate_contrast(component, *ratio),
            Measurement::AccessibilityLabel { component, label } => {
                rules.validate_accessibility_label(component, label.as_deref())
            }
            Measurement::ScreenReader { component, supported } => {
                rules.validate_screen_reader(component, *supported)
            }
        }
    }
}

/// Runtime averages the performance checks compare against their targets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeObservations {
    pub average_fps: Option<f64>,
    pub minimum_fps: f64,
    pub average_interaction_ms: Option<f64>,
    pub interaction_target_ms: f64,
    pub average_network_ms: Option<f64>,
    pub network_target_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub timestamp: DateTime<Utc>,
    pub platform: Platform,
    pub device_info: DeviceInfo,
    pub visual_results: Vec<ValidationResult>,
    pub functional_results: Vec<ValidationResult>,
    pub performance_results: Vec<ValidationResult>,
    pub accessibility_results: Vec<ValidationResult>,
    pub overall_score: f64,
    pub recommendations: Vec<String>,
}

impl ConsistencyReport {
    pub fn all_results(&self) -> impl Iterator<Item = &ValidationResult> + '_ {
        self.visual_results
            .iter()
            .chain(&self.functional_results)
            .chain(&self.performance_results)
            .chain(&self.accessibility_results)
    }

    pub fn total_checks(&self) -> usize {
        self.all_results().count()
    }

    pub fn failing(&self) -> Vec<&ValidationResult> {
        self.all_results().filter(|r| !r.passed).collect()
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Consistency report ({})", self.platform);
        let _ = writeln!(out, "Generated: {}", self.timestamp.to_rfc3339());
        let _ = writeln!(
            out,
            "Device: {}x{} @{}x, font scale {}{}",
            self.device_info.width,
            self.device_info.height,
            self.device_info.pixel_density,
            self.device_info.font_scale,
            if self.device_info.is_tablet { ", tablet" } else { "" }
        );
        let failing = self.failing();
        let _ = writeln!(
            out,
            "Score: {:.1}/100 ({} of {} checks passed)",
            self.overall_score,
            self.total_checks() - failing.len(),
            self.total_checks()
        );

        if !failing.is_empty() {
            let _ = writeln!(out, "\nFailing checks:");
            for result in failing {
                let _ = writeln!(
                    out,
                    "  [{:?}] {} {}: {}",
                    result.severity,
                    result.component.as_deref().unwrap_or("-"),
                    result.metric_name,
                    result.message
                );
            }
        }
        if !self.recommendations.is_empty() {
            let _ = writeln!(out, "\nRecommendations:");
            for rec in &self.recommendations {
                let _ = writeln!(out, "  - {}", rec);
            }
        }
        out
    }
}

impl ScoredReport for ConsistencyReport {
    fn overall_score(&self) -> f64 {
        self.overall_score
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

fn recommendation_for(metric_name: &str) -> &'static str {
    match metric_name {
        "spacing" => "Use spacing tokens from the shared scale instead of literal offsets",
        "color" => "Reference palette tokens so colors resolve identically on every platform",
        "typography" => "Apply the shared text styles for font size, weight and line height",
        "border_radius" => "Use the radius tokens for rounded corners",
        "touch_target" => "Enlarge touch targets to the platform minimum or add hit slop",
        "contrast" => "Raise text contrast to at least 4.5:1 against its background",
        "accessibility_label" => "Add accessibility labels to interactive elements",
        "screen_reader" => "Expose the component to assistive technologies",
        "frame_rate" => "Reduce render work to keep the frame rate above the warning threshold",
        "interaction_response_time" => "Respond to input faster by deferring non-critical work",
        "network_response_time" => "Cache or prefetch data to cut request latency",
        _ => "Review the failing consistency checks",
    }
}

/// Pass rate in percent; no checks counts as fully consistent
pub fn consistency_score(results: &[&ValidationResult]) -> f64 {
    if results.is_empty() {
        return 100.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    passed as f64 / results.len() as f64 * 100.0
}

/// Deduplicated recommendations, one per failing metric, in first-seen order
pub fn build_recommendations<'a, I>(results: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a ValidationResult>,
{
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|r| !r.passed)
        .filter(|r| seen.insert(r.metric_name.clone()))
        .map(|r| recommendation_for(&r.metric_name).to_string())
        .collect()
}

pub struct ConsistencyValidator {
    rules: ConsistencyRules,
    device: Box<dyn DeviceInfoProvider>,
    pending: Mutex<Vec<Measurement>>,
}

impl ConsistencyValidator {
    pub fn new(rules: ConsistencyRules, device: Box<dyn DeviceInfoProvider>) -> Self {
        Self {
            rules,
            device,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn rules(&self) -> &ConsistencyRules {
        &self.rules
    }

    pub fn device_info(&self) -> DeviceInfo {
        device::resolve(self.device.as_ref(), self.rules.platform())
    }

    pub fn record_measurement(&self, measurement: Measurement) {
        debug!(component = measurement.component(), category = ?measurement.category(), "Measurement recorded");
        lock(&self.pending).push(measurement);
    }

    pub fn clear_measurements(&self) {
        lock(&self.pending).clear();
    }

    /// Evaluate pending measurements, restricted to `component` when given,
    /// plus runtime checks for whichever averages are available.
    ///
    /// Every evaluated measurement is consumed. Measurements for other
    /// components stay pending for a later run.
    pub fn run_full_validation(
        &self,
        component: Option<&str>,
        observations: &RuntimeObservations,
    ) -> ConsistencyReport {
        let measurements: Vec<Measurement> = {
            let mut pending = lock(&self.pending);
            let (selected, rest): (Vec<Measurement>, Vec<Measurement>) = std::mem::take(&mut *pending)
                .into_iter()
                .partition(|m| component.map_or(true, |c| m.component() == c));
            *pending = rest;
            selected
        };

        let mut visual_results = Vec::new();
        let mut functional_results = Vec::new();
        let mut performance_results = Vec::new();
        let mut accessibility_results = Vec::new();
        for measurement in &measurements {
            let result = measurement.evaluate(&self.rules);
            match measurement.category() {
                ValidationCategory::Visual => visual_results.push(result),
                ValidationCategory::Functional => functional_results.push(result),
                ValidationCategory::Performance => performance_results.push(result),
                ValidationCategory::Accessibility => accessibility_results.push(result),
            }
        }

        let subject = component.unwrap_or("app");
        if let Some(fps) = observations.average_fps {
            performance_results.push(self.rules.validate_frame_rate(subject, fps, observations.minimum_fps));
        }
        if let Some(ms) = observations.average_interaction_ms {
            performance_results.push(self.rules.validate_response_time(
                subject,
                "interaction_response_time",
                ms,
                observations.interaction_target_ms,
            ));
        }
        if let Some(ms) = observations.average_network_ms {
            performance_results.push(self.rules.validate_response_time(
                subject,
                "network_response_time",
                ms,
                observations.network_target_ms,
            ));
        }

        let mut report = ConsistencyReport {
            timestamp: Utc::now(),
            platform: self.rules.platform(),
            device_info: self.device_info(),
            visual_results,
            functional_results,
            performance_results,
            accessibility_results,
            overall_score: 0.0,
            recommendations: Vec::new(),
        };
        let all: Vec<&ValidationResult> = report.all_results().collect();
        let overall_score = consistency_score(&all);
        let recommendations = build_recommendations(all);
        report.overall_score = overall_score;
        report.recommendations = recommendations;

        info!(
            component = subject,
            checks = report.total_checks(),
            score = report.overall_score,
            "Consistency validation complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationSettings;

    fn validator() -> ConsistencyValidator {
        ConsistencyValidator::new(
            ConsistencyRules::new(ValidationSettings::default(), Platform::Ios),
            Box::new(UnavailableDeviceInfo),
        )
    }

    fn spacing(component: &str, measured: f64, expected: f64) -> Measurement {
        Measurement::Spacing {
            component: component.to_string(),
            measured,
            expected,
        }
    }

    #[test]
    fn test_empty_validation_scores_100() {
        let report = validator().run_full_validation(None, &RuntimeObservations::default());
        assert_eq!(report.overall_score, 100.0);
        assert_eq!(report.total_checks(), 0);
        assert!(report.recommendations.is_empty());
        assert_eq!(report.device_info, DeviceInfo::conservative(Platform::Ios));
    }

    #[test]
    fn test_score_and_dedup_recommendations() {
        let validator = validator();
        validator.record_measurement(spacing("Card", 26.0, 24.0));
        validator.record_measurement(spacing("Card", 30.0, 24.0));
        validator.record_measurement(spacing("List", 40.0, 24.0));
        validator.record_measurement(Measurement::Contrast {
            component: "Button".to_string(),
            ratio: 3.9,
        });

        let report = validator.run_full_validation(None, &RuntimeObservations::default());
        assert_eq!(report.visual_results.len(), 3);
        assert_eq!(report.accessibility_results.len(), 1);
        assert_eq!(report.overall_score, 25.0);
        assert_eq!(report.failing().len(), 3);
        assert_eq!(report.recommendations.len(), 2);

        let text = report.to_text();
        assert!(text.contains("1 of 4 checks passed"));
        assert!(text.contains("Contrast ratio 3.90:1"));
    }

    #[test]
    fn test_component_filter() {
        let validator = validator();
        validator.record_measurement(spacing("Card", 24.0, 24.0));
        validator.record_measurement(spacing("List", 40.0, 24.0));

        let report = validator.run_full_validation(Some("Card"), &RuntimeObservations::default());
        assert_eq!(report.total_checks(), 1);
        assert_eq!(report.overall_score, 100.0);

        // the List measurement is still pending
        let rest = validator.run_full_validation(None, &RuntimeObservations::default());
        assert_eq!(rest.total_checks(), 1);
        assert_eq!(rest.overall_score, 0.0);
    }

    #[test]
    fn test_every_recorded_measurement_is_scored() {
        let validator = validator();
        for i in 0..250 {
            let measured = if i < 50 { 40.0 } else { 24.0 };
            validator.record_measurement(spacing("Card", measured, 24.0));
        }

        let report = validator.run_full_validation(None, &RuntimeObservations::default());
        assert_eq!(report.total_checks(), 250);
        assert_eq!(report.failing().len(), 50);
        assert_eq!(report.overall_score, 80.0);

        let again = validator.run_full_validation(None, &RuntimeObservations::default());
        assert_eq!(again.total_checks(), 0);
    }

    #[test]
    fn test_clear_drops_pending_measurements() {
        let validator = validator();
        validator.record_measurement(spacing("Card", 40.0, 24.0));
        validator.clear_measurements();
        let report = validator.run_full_validation(None, &RuntimeObservations::default());
        assert_eq!(report.total_checks(), 0);
        assert_eq!(report.overall_score, 100.0);
    }

    #[test]
    fn test_runtime_observations_add_performance_checks() {
        let observations = RuntimeObservations {
            average_fps: Some(58.0),
            minimum_fps: 45.0,
            average_interaction_ms: Some(180.0),
            interaction_target_ms: 100.0,
            average_network_ms: None,
            network_target_ms: 3000.0,
        };
        let report = validator().run_full_validation(None, &observations);
        assert_eq!(report.performance_results.len(), 2);
        assert_eq!(report.overall_score, 50.0);
        assert_eq!(report.performance_results[0].component.as_deref(), Some("app"));
    }

    #[test]
    fn test_measurement_json_shape() {
        let json = r##"[
            {"kind": "spacing", "component": "Card", "measured": 16, "expected": 16},
            {"kind": "color", "component": "Card", "measured": "#FFF", "expected": "#ffffff"},
            {"kind": "touch_target", "component": "Icon", "width": 48, "height": 48},
            {"kind": "accessibility_label", "component": "Icon", "label": "Close"}
        ]"##;
        let measurements: Vec<Measurement> = serde_json::from_str(json).unwrap();
        assert_eq!(measurements.len(), 4);
        assert_eq!(measurements[2].category(), ValidationCategory::Functional);
        assert_eq!(measurements[3].component(), "Icon");
    }
}
