//! Sample and alert types shared by the collectors, the alert engine and
//! the report builders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Target platform the monitored UI runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Ios,
    Android,
    Web,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Ios => write!(f, "ios"),
            Platform::Android => write!(f, "android"),
            Platform::Web => write!(f, "web"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            "web" => Ok(Platform::Web),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}

/// One frame-to-frame timing measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSample {
    pub timestamp: DateTime<Utc>,
    pub frame_time_ms: f64,
    /// Instantaneous FPS, `1000 / frame_time_ms`
    pub fps: f64,
    /// Refresh intervals that elapsed without a frame
    pub dropped_frame_count: u32,
}

/// Memory pressure classification of a resource estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressureLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for PressureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PressureLevel::Low => write!(f, "low"),
            PressureLevel::Medium => write!(f, "medium"),
            PressureLevel::High => write!(f, "high"),
        }
    }
}

/// Periodic memory-pressure estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSample {
    pub timestamp: DateTime<Utc>,
    /// Approximation in arbitrary units, derived from animation load and FPS deviation
    pub used_memory_estimate: f64,
    pub pressure_level: PressureLevel,
    pub active_animations: usize,
    /// Resident memory of this process when the platform exposes it
    pub process_memory_mb: Option<f64>,
}

/// A completed UI interaction reported by event-handling code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionSample {
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub response_time_ms: f64,
    pub component_name: Option<String>,
    pub succeeded: bool,
}

/// A completed outbound request reported by the network instrumentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSample {
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub method: String,
    pub response_time_ms: f64,
    pub byte_size: u64,
    pub succeeded: bool,
    pub error_message: Option<String>,
}

/// Kind of threshold breach an alert reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    FpsDrop,
    MemoryWarning,
    BatteryDrain,
    FrameSkip,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::FpsDrop => "fps_drop",
            AlertType::MemoryWarning => "memory_warning",
            AlertType::BatteryDrain => "battery_drain",
            AlertType::FrameSkip => "frame_skip",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low = 1,
    Medium = 2,
    High = 3,
}

/// A classified, severity-tagged threshold breach. Never mutated after emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Metric values observed when the alert was raised
    pub metrics_snapshot: BTreeMap<String, f64>,
}

impl Alert {
    pub fn new(alert_type: AlertType, severity: AlertSeverity, message: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            alert_type,
            severity,
            message: message.into(),
            timestamp: Utc::now(),
            metrics_snapshot: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, name: &str, value: f64) -> Self {
        self.metrics_snapshot.insert(name.to_string(), value);
        self
    }
}

/// Snapshot of the frame collector returned by `get_metrics`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMetrics {
    pub fps: f64,
    pub average_fps: f64,
    pub frame_drops: u64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for FrameMetrics {
    fn default() -> Self {
        Self {
            fps: 0.0,
            average_fps: 0.0,
            frame_drops: 0,
            last_updated: None,
        }
    }
}

/// Aggregated live view over every collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorMetrics {
    pub frame: FrameMetrics,
    pub memory_estimate: f64,
    pub pressure_level: PressureLevel,
    pub active_animations: usize,
    pub interaction_samples: usize,
    pub network_samples: usize,
    pub alerts_emitted: u64,
}
