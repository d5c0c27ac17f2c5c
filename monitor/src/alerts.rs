//! Threshold classification and alert fan-out
//!
//! Collectors ask the engine to classify a measurement, then hand any
//! resulting [`Alert`] to [`AlertEngine::emit`]. Emission logs the alert,
//! appends it to a bounded alert log and invokes every subscriber. A
//! subscriber that panics is logged and skipped; delivery continues.

use crate::buffer::RingBuffer;
use crate::config::AlertThresholds;
use crate::metrics::MetricsRegistry;
use crate::types::{Alert, AlertSeverity, AlertType};
use crate::utils::sync::lock;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tracing::{error, info, warn};

/// Alert subscriber callback
pub type AlertCallback = Arc<dyn Fn(&Alert) + Send + Sync>;

#[derive(Default)]
struct SubscriberList {
    next_id: u64,
    entries: Vec<(u64, AlertCallback)>,
}

/// Handle returned by [`AlertEngine::subscribe`]. Dropping it keeps the
/// subscription alive; call [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    id: u64,
    subscribers: Weak<Mutex<SubscriberList>>,
}

impl Subscription {
    /// Remove the callback. Returns `false` if it was already removed or the
    /// engine is gone.
    pub fn unsubscribe(self) -> bool {
        let Some(subscribers) = self.subscribers.upgrade() else {
            return false;
        };
        let mut list = lock(&subscribers);
        let before = list.entries.len();
        list.entries.retain(|(id, _)| *id != self.id);
        list.entries.len() != before
    }
}

/// How an instantaneous FPS value compares to the thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FpsClass {
    Normal,
    /// Below `warning_fps`: counted as a frame drop
    Drop,
    /// Below `critical_fps`: counted as a drop and raises a high `fps_drop`
    Critical,
}

pub struct AlertEngine {
    thresholds: AlertThresholds,
    subscribers: Arc<Mutex<SubscriberList>>,
    log: Mutex<RingBuffer<Alert>>,
    emitted: AtomicU64,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl AlertEngine {
    pub fn new(thresholds: AlertThresholds, log_capacity: usize) -> Self {
        Self {
            thresholds,
            subscribers: Arc::new(Mutex::new(SubscriberList::default())),
            log: Mutex::new(RingBuffer::new(log_capacity)),
            emitted: AtomicU64::new(0),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn thresholds(&self) -> &AlertThresholds {
        &self.thresholds
    }

    /// Register a listener invoked for every emitted alert
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Alert) + Send + Sync + 'static,
    {
        let mut list = lock(&self.subscribers);
        list.next_id += 1;
        let id = list.next_id;
        list.entries.push((id, Arc::new(callback)));

        Subscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).entries.len()
    }

    /// Log, retain and fan out an alert.
    ///
    /// Subscribers are invoked from a snapshot of the list taken before
    /// dispatch, so a callback may subscribe or unsubscribe without affecting
    /// the current round.
    pub fn emit(&self, alert: Alert) {
        match alert.severity {
            AlertSeverity::High | AlertSeverity::Medium => {
                warn!(
                    alert_id = %alert.id,
                    alert_type = %alert.alert_type,
                    severity = ?alert.severity,
                    message = %alert.message,
                    "Performance alert"
                );
            }
            AlertSeverity::Low => {
                info!(
                    alert_id = %alert.id,
                    alert_type = %alert.alert_type,
                    message = %alert.message,
                    "Performance alert"
                );
            }
        }

        lock(&self.log).push(alert.clone());
        self.emitted.fetch_add(1, Ordering::Relaxed);
        if let Some(metrics) = &self.metrics {
            metrics.record_alert(&alert);
        }

        let snapshot: Vec<AlertCallback> = lock(&self.subscribers)
            .entries
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in snapshot {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(&alert))) {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(alert_id = %alert.id, %reason, "Alert subscriber failed");
            }
        }
    }

    pub fn classify_fps(&self, fps: f64) -> FpsClass {
        if fps < self.thresholds.critical_fps {
            FpsClass::Critical
        } else if fps < self.thresholds.warning_fps {
            FpsClass::Drop
        } else {
            FpsClass::Normal
        }
    }

    /// High-severity `fps_drop` for frames under the critical threshold
    pub fn check_fps(&self, fps: f64, average_fps: f64) -> Option<Alert> {
        if self.classify_fps(fps) != FpsClass::Critical {
            return None;
        }
        Some(
            Alert::new(
                AlertType::FpsDrop,
                AlertSeverity::High,
                format!("FPS dropped to {:.1} (critical below {:.0})", fps, self.thresholds.critical_fps),
            )
            .with_metric("fps", fps)
            .with_metric("average_fps", average_fps),
        )
    }

    pub fn check_frame_skip(&self, dropped_frames: u32, frame_time_ms: f64) -> Option<Alert> {
        if dropped_frames < self.thresholds.frame_skip_threshold {
            return None;
        }
        Some(
            Alert::new(
                AlertType::FrameSkip,
                AlertSeverity::Medium,
                format!("{} frames skipped in a {:.1}ms frame", dropped_frames, frame_time_ms),
            )
            .with_metric("dropped_frames", dropped_frames as f64)
            .with_metric("frame_time_ms", frame_time_ms),
        )
    }

    pub fn check_animation_load(&self, active_animations: usize) -> Option<Alert> {
        if active_animations <= self.thresholds.max_active_animations {
            return None;
        }
        Some(
            Alert::new(
                AlertType::MemoryWarning,
                AlertSeverity::Medium,
                format!(
                    "{} concurrent animations exceed the limit of {}",
                    active_animations, self.thresholds.max_active_animations
                ),
            )
            .with_metric("active_animations", active_animations as f64),
        )
    }

    pub fn check_resource_estimate(&self, estimate: f64) -> Option<Alert> {
        if estimate <= self.thresholds.resource_estimate_warning {
            return None;
        }
        Some(
            Alert::new(
                AlertType::MemoryWarning,
                AlertSeverity::Medium,
                format!(
                    "Memory estimate {:.2} exceeds {:.2}",
                    estimate, self.thresholds.resource_estimate_warning
                ),
            )
            .with_metric("memory_estimate", estimate),
        )
    }

    /// `battery_drain` once a streak of high-pressure samples reaches the limit
    pub fn check_sustained_pressure(&self, high_pressure_streak: u32) -> Option<Alert> {
        let limit = self.thresholds.sustained_pressure_samples;
        if limit == 0 || high_pressure_streak < limit {
            return None;
        }
        Some(
            Alert::new(
                AlertType::BatteryDrain,
                AlertSeverity::Low,
                format!("High memory pressure sustained for {} samples", high_pressure_streak),
            )
            .with_metric("high_pressure_samples", high_pressure_streak as f64),
        )
    }

    pub fn total_emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    /// Most recent alerts, newest first
    pub fn recent_alerts(&self, limit: usize) -> Vec<Alert> {
        lock(&self.log).iter().rev().take(limit).cloned().collect()
    }

    pub fn alerts_by_severity(&self, severity: AlertSeverity, limit: usize) -> Vec<Alert> {
        lock(&self.log)
            .iter()
            .rev()
            .filter(|alert| alert.severity == severity)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Retained alerts counted per type
    pub fn counts_by_type(&self) -> HashMap<AlertType, usize> {
        let mut counts = HashMap::new();
        for alert in lock(&self.log).iter() {
            *counts.entry(alert.alert_type).or_insert(0) += 1;
        }
        counts
    }

    pub fn clear_log(&self) {
        lock(&self.log).clear();
    }
}
