//! Configuration management for the performance monitor

use crate::error::{ConfigError, Result};
use crate::types::Platform;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    pub platform: Platform,
    pub sampling: SamplingSettings,
    pub retention: RetentionSettings,
    pub alerts: AlertThresholds,
    pub scoring: ScoringWeights,
    pub targets: PlatformTargetTable,
    pub validation: ValidationSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingSettings {
    /// Display refresh rate the frame tick is scheduled at
    pub target_fps: f64,
    pub resource_interval_ms: u64,
    /// The host drives frames through `record_frame_time` instead of the
    /// monitor's own frame timer
    pub host_frame_callbacks: bool,
}

/// One retention policy for every buffer: all sample buffers and the alert
/// log share `sample_capacity`, report histories use `history_capacity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionSettings {
    pub sample_capacity: usize,
    pub history_capacity: usize,
    /// Number of most recent samples the scoring engine reads per collector
    pub scoring_window: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub warning_fps: f64,
    pub critical_fps: f64,
    pub max_active_animations: usize,
    pub resource_estimate_warning: f64,
    pub frame_skip_threshold: u32,
    pub sustained_pressure_samples: u32,
    pub response_warning_ms: f64,
    pub network_warning_ms: f64,
}

/// Points deducted from 100 when a category misses its target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub frame_time: f64,
    pub memory: f64,
    pub interaction: f64,
    pub network: f64,
    /// Deducted once per failed interaction or request in the window
    pub failure: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformTargets {
    pub frame_time_ms: f64,
    pub memory_ceiling: f64,
    pub interaction_ms: f64,
    pub network_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformTargetTable {
    pub ios: PlatformTargets,
    pub android: PlatformTargets,
    pub web: PlatformTargets,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    pub spacing_min_tolerance_px: f64,
    pub spacing_tolerance_ratio: f64,
    pub radius_min_tolerance_px: f64,
    pub radius_tolerance_ratio: f64,
    pub font_size_tolerance: f64,
    pub line_height_tolerance: f64,
    pub min_contrast_ratio: f64,
    pub touch_target: TouchTargetMinimums,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchTargetMinimums {
    pub ios: f64,
    pub android: f64,
    pub web: f64,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            target_fps: 60.0,
            resource_interval_ms: 5000,
            host_frame_callbacks: false,
        }
    }
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            sample_capacity: 200,
            history_capacity: 50,
            scoring_window: 60,
        }
    }
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            warning_fps: 45.0,
            critical_fps: 30.0,
            max_active_animations: 10,
            resource_estimate_warning: 5.0,
            frame_skip_threshold: 4,
            sustained_pressure_samples: 3,
            response_warning_ms: 100.0,
            network_warning_ms: 3000.0,
        }
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            frame_time: 10.0,
            memory: 15.0,
            interaction: 10.0,
            network: 15.0,
            failure: 5.0,
        }
    }
}

impl Default for PlatformTargetTable {
    fn default() -> Self {
        Self {
            ios: PlatformTargets {
                frame_time_ms: 1000.0 / 60.0,
                memory_ceiling: 5.0,
                interaction_ms: 100.0,
                network_ms: 3000.0,
            },
            android: PlatformTargets {
                frame_time_ms: 1000.0 / 60.0,
                memory_ceiling: 4.0,
                interaction_ms: 100.0,
                network_ms: 3000.0,
            },
            web: PlatformTargets {
                frame_time_ms: 1000.0 / 60.0,
                memory_ceiling: 6.0,
                interaction_ms: 100.0,
                network_ms: 2000.0,
            },
        }
    }
}

impl PlatformTargetTable {
    pub fn for_platform(&self, platform: Platform) -> &PlatformTargets {
        match platform {
            Platform::Ios => &self.ios,
            Platform::Android => &self.android,
            Platform::Web => &self.web,
        }
    }
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            spacing_min_tolerance_px: 2.0,
            spacing_tolerance_ratio: 0.05,
            radius_min_tolerance_px: 1.0,
            radius_tolerance_ratio: 0.10,
            font_size_tolerance: 1.0,
            line_height_tolerance: 2.0,
            min_contrast_ratio: 4.5,
            touch_target: TouchTargetMinimums::default(),
        }
    }
}

impl Default for TouchTargetMinimums {
    fn default() -> Self {
        Self {
            ios: 44.0,
            android: 48.0,
            web: 44.0,
        }
    }
}

impl TouchTargetMinimums {
    pub fn for_platform(&self, platform: Platform) -> f64 {
        match platform {
            Platform::Ios => self.ios,
            Platform::Android => self.android,
            Platform::Web => self.web,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: MonitorConfig = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml_string()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Result<Self> {
        MonitorConfig::default().apply_env_overrides()
    }

    /// Override fields from `PERF_*` environment variables, then validate
    pub fn apply_env_overrides(self) -> Result<Self> {
        let mut config = self;

        if let Ok(platform) = std::env::var("PERF_PLATFORM") {
            config.platform = platform
                .parse()
                .map_err(|_| invalid_value("platform", &platform))?;
        }

        if let Ok(fps) = std::env::var("PERF_TARGET_FPS") {
            config.sampling.target_fps = fps.parse().map_err(|_| invalid_value("sampling.target_fps", &fps))?;
        }

        if let Ok(capacity) = std::env::var("PERF_SAMPLE_CAPACITY") {
            config.retention.sample_capacity = capacity
                .parse()
                .map_err(|_| invalid_value("retention.sample_capacity", &capacity))?;
        }

        if let Ok(capacity) = std::env::var("PERF_HISTORY_CAPACITY") {
            config.retention.history_capacity = capacity
                .parse()
                .map_err(|_| invalid_value("retention.history_capacity", &capacity))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.sampling.target_fps <= 0.0 {
            return Err(failed("Target FPS must be greater than 0"));
        }

        if self.sampling.resource_interval_ms == 0 {
            return Err(failed("Resource sample interval must be greater than 0"));
        }

        if self.retention.sample_capacity == 0 || self.retention.history_capacity == 0 {
            return Err(failed("Retention capacities must be greater than 0"));
        }

        if self.retention.scoring_window == 0 {
            return Err(failed("Scoring window must be greater than 0"));
        }

        if self.alerts.critical_fps > self.alerts.warning_fps {
            return Err(failed("Critical FPS threshold must not exceed the warning threshold"));
        }

        let weights = &self.scoring;
        if [weights.frame_time, weights.memory, weights.interaction, weights.network, weights.failure]
            .iter()
            .any(|w| *w < 0.0)
        {
            return Err(failed("Scoring weights must not be negative"));
        }

        for (name, targets) in [
            ("ios", &self.targets.ios),
            ("android", &self.targets.android),
            ("web", &self.targets.web),
        ] {
            if targets.frame_time_ms <= 0.0
                || targets.memory_ceiling <= 0.0
                || targets.interaction_ms <= 0.0
                || targets.network_ms <= 0.0
            {
                return Err(failed(&format!("Targets for {} must be positive", name)));
            }
        }

        if self.validation.min_contrast_ratio <= 0.0 {
            return Err(failed("Minimum contrast ratio must be positive"));
        }

        Ok(())
    }

    /// Interval between frame ticks at the target refresh rate
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.sampling.target_fps
    }

    pub fn platform_targets(&self) -> &PlatformTargets {
        self.targets.for_platform(self.platform)
    }
}

fn invalid_value(field: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn failed(reason: &str) -> crate::error::MonitorError {
    ConfigError::ValidationFailed {
        reason: reason.to_string(),
    }
    .into()
}
