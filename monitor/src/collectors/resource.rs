//! Resource pressure collector
//!
//! There is no portable API for a UI's memory footprint, so the collector
//! derives an estimate from animation load and how far FPS sits below target.
//! When the host exposes process memory, it is attached to the sample for
//! reference but does not drive classification.

use crate::alerts::AlertEngine;
use crate::animations::AnimationRegistry;
use crate::buffer::RingBuffer;
use crate::collectors::{FrameMetricsCollector, MonitoringComponent};
use crate::error::Result;
use crate::metrics::MetricsRegistry;
use crate::types::{Alert, PressureLevel, ResourceSample};
use crate::utils::sync::lock;
use chrono::Utc;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use sysinfo::{Pid, System};
use tracing::{debug, trace};

const ANIMATION_WEIGHT: f64 = 0.5;
const FPS_DEVIATION_DIVISOR: f64 = 10.0;
const LOW_PRESSURE_RATIO: f64 = 0.6;

/// Source of the process's resident memory
pub trait MemoryProbe: Send + Sync {
    /// Resident memory in MiB, `None` when unavailable
    fn process_memory_mb(&self) -> Option<f64>;
}

/// Reads resident memory of the current process through `sysinfo`
pub struct SysinfoProbe {
    system: Mutex<System>,
    pid: Pid,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            pid: Pid::from(std::process::id() as usize),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SysinfoProbe {
    fn process_memory_mb(&self) -> Option<f64> {
        let mut system = lock(&self.system);
        if !system.refresh_process(self.pid) {
            return None;
        }
        system
            .process(self.pid)
            .map(|p| p.memory() as f64 / 1024.0 / 1024.0)
    }
}

/// Probe for hosts without a memory API
pub struct NoopProbe;

impl MemoryProbe for NoopProbe {
    fn process_memory_mb(&self) -> Option<f64> {
        None
    }
}

struct ResourceState {
    samples: RingBuffer<ResourceSample>,
    high_streak: u32,
}

pub struct ResourceMetricsCollector {
    alerts: Arc<AlertEngine>,
    frames: Arc<FrameMetricsCollector>,
    animations: Arc<AnimationRegistry>,
    probe: Box<dyn MemoryProbe>,
    metrics: Option<Arc<MetricsRegistry>>,
    target_fps: f64,
    running: AtomicBool,
    state: Mutex<ResourceState>,
}

impl ResourceMetricsCollector {
    pub fn new(
        target_fps: f64,
        capacity: usize,
        alerts: Arc<AlertEngine>,
        frames: Arc<FrameMetricsCollector>,
        animations: Arc<AnimationRegistry>,
        probe: Box<dyn MemoryProbe>,
    ) -> Self {
        Self {
            alerts,
            frames,
            animations,
            probe,
            metrics: None,
            target_fps,
            running: AtomicBool::new(false),
            state: Mutex::new(ResourceState {
                samples: RingBuffer::new(capacity),
                high_streak: 0,
            }),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn begin(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    pub fn end(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Estimate in arbitrary units from animation load and FPS shortfall
    pub fn estimate(&self, active_animations: usize, average_fps: Option<f64>) -> f64 {
        let shortfall = average_fps
            .map(|avg| (self.target_fps - avg).max(0.0))
            .unwrap_or(0.0);
        active_animations as f64 * ANIMATION_WEIGHT + shortfall / FPS_DEVIATION_DIVISOR
    }

    pub fn classify(&self, estimate: f64) -> PressureLevel {
        let warning = self.alerts.thresholds().resource_estimate_warning;
        if estimate < warning * LOW_PRESSURE_RATIO {
            PressureLevel::Low
        } else if estimate <= warning {
            PressureLevel::Medium
        } else {
            PressureLevel::High
        }
    }

    /// Take one sample now. Returns `None` while the collector is stopped.
    pub fn sample_now(&self) -> Option<ResourceSample> {
        if !self.is_running() {
            trace!("Resource collector stopped, skipping sample");
            return None;
        }

        let active_animations = self.animations.active_count();
        let used_memory_estimate = self.estimate(active_animations, self.frames.average_fps());
        let sample = ResourceSample {
            timestamp: Utc::now(),
            used_memory_estimate,
            pressure_level: self.classify(used_memory_estimate),
            active_animations,
            process_memory_mb: self.probe.process_memory_mb(),
        };

        let pending = {
            let mut state = lock(&self.state);
            state.samples.push(sample.clone());
            if sample.pressure_level == PressureLevel::High {
                state.high_streak += 1;
            } else {
                state.high_streak = 0;
            }

            let mut pending: Vec<Alert> = Vec::new();
            pending.extend(self.alerts.check_resource_estimate(used_memory_estimate));
            if let Some(alert) = self.alerts.check_sustained_pressure(state.high_streak) {
                state.high_streak = 0;
                pending.push(alert);
            }
            pending
        };

        debug!(
            estimate = used_memory_estimate,
            pressure = %sample.pressure_level,
            active_animations,
            "Resource sample"
        );
        if let Some(metrics) = &self.metrics {
            metrics.record_resource(&sample);
        }
        for alert in pending {
            self.alerts.emit(alert);
        }

        Some(sample)
    }

    pub fn latest(&self) -> Option<ResourceSample> {
        lock(&self.state).samples.latest().cloned()
    }

    pub fn samples(&self) -> Vec<ResourceSample> {
        lock(&self.state).samples.to_vec()
    }

    pub fn recent_samples(&self, n: usize) -> Vec<ResourceSample> {
        lock(&self.state).samples.recent(n).cloned().collect()
    }
}

impl MonitoringComponent for ResourceMetricsCollector {
    fn name(&self) -> &'static str {
        "resource"
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn sample_count(&self) -> usize {
        lock(&self.state).samples.len()
    }

    fn clear(&self) {
        let mut state = lock(&self.state);
        state.samples.clear();
        state.high_streak = 0;
    }

    fn snapshot(&self) -> Result<serde_json::Value> {
        let state = lock(&self.state);
        Ok(json!({
            "samples": state.samples.len(),
            "high_pressure_streak": state.high_streak,
            "latest": state.samples.latest(),
        }))
    }
}
