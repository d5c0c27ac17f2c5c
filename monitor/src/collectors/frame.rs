//! Frame timing collector
//!
//! Each tick measures the time since the previous tick, converts it to an
//! instantaneous FPS and retains it in a ring buffer. Ticks arrive from the
//! monitor's periodic task or from a host frame callback via
//! [`FrameMetricsCollector::record_frame_time`].

use crate::alerts::{AlertEngine, FpsClass};
use crate::buffer::RingBuffer;
use crate::collectors::MonitoringComponent;
use crate::error::Result;
use crate::metrics::MetricsRegistry;
use crate::types::{Alert, FrameMetrics, FrameSample};
use crate::utils::sync::lock;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::debug;

struct FrameState {
    samples: RingBuffer<FrameSample>,
    last_tick: Option<Instant>,
    last_fps: f64,
    frame_drops: u64,
    last_updated: Option<DateTime<Utc>>,
}

pub struct FrameMetricsCollector {
    frame_interval_ms: f64,
    alerts: Arc<AlertEngine>,
    metrics: Option<Arc<MetricsRegistry>>,
    running: AtomicBool,
    state: Mutex<FrameState>,
}

impl FrameMetricsCollector {
    pub fn new(target_fps: f64, capacity: usize, alerts: Arc<AlertEngine>) -> Self {
        let target_fps = if target_fps > 0.0 { target_fps } else { 60.0 };
        Self {
            frame_interval_ms: 1000.0 / target_fps,
            alerts,
            metrics: None,
            running: AtomicBool::new(false),
            state: Mutex::new(FrameState {
                samples: RingBuffer::new(capacity),
                last_tick: None,
                last_fps: 0.0,
                frame_drops: 0,
                last_updated: None,
            }),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn frame_interval_ms(&self) -> f64 {
        self.frame_interval_ms
    }

    /// Start accepting ticks. `now` becomes the reference for the first delta.
    pub fn begin(&self, now: Instant) {
        if !self.running.swap(true, Ordering::SeqCst) {
            lock(&self.state).last_tick = Some(now);
        }
    }

    /// Stop accepting ticks. Retained samples are kept.
    pub fn end(&self) {
        self.running.store(false, Ordering::SeqCst);
        lock(&self.state).last_tick = None;
    }

    /// Handle a scheduled tick at `now`. Zero or negative deltas are skipped.
    pub fn tick_at(&self, now: Instant) -> Option<FrameSample> {
        if !self.is_running() {
            return None;
        }
        let previous = lock(&self.state).last_tick.replace(now);
        let previous = previous?;
        if now <= previous {
            debug!("Skipping frame sample with non-positive delta");
            return None;
        }
        let delta_ms = now.duration_since(previous).as_secs_f64() * 1000.0;
        self.record_frame_time(delta_ms)
    }

    /// Record one frame of `frame_time_ms`. Ignored while stopped or when the
    /// duration is not a positive finite number.
    pub fn record_frame_time(&self, frame_time_ms: f64) -> Option<FrameSample> {
        if !self.is_running() {
            return None;
        }
        if !(frame_time_ms > 0.0) || !frame_time_ms.is_finite() {
            debug!(frame_time_ms, "Skipping invalid frame duration");
            return None;
        }

        let fps = 1000.0 / frame_time_ms;
        let dropped_frame_count = ((frame_time_ms / self.frame_interval_ms).round() as i64 - 1).max(0) as u32;
        let class = self.alerts.classify_fps(fps);
        let sample = FrameSample {
            timestamp: Utc::now(),
            frame_time_ms,
            fps,
            dropped_frame_count,
        };

        let (snapshot, pending) = {
            let mut state = lock(&self.state);
            state.samples.push(sample.clone());
            state.last_fps = fps;
            state.last_updated = Some(sample.timestamp);
            if class != FpsClass::Normal {
                state.frame_drops += 1;
            }
            let snapshot = Self::metrics_from(&state);

            let mut pending: Vec<Alert> = Vec::new();
            pending.extend(self.alerts.check_fps(fps, snapshot.average_fps));
            pending.extend(self.alerts.check_frame_skip(dropped_frame_count, frame_time_ms));
            (snapshot, pending)
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_frame(&snapshot, class != FpsClass::Normal);
        }
        for alert in pending {
            self.alerts.emit(alert);
        }

        Some(sample)
    }

    fn metrics_from(state: &FrameState) -> FrameMetrics {
        let (sum, count) = state
            .samples
            .iter()
            .fold((0.0, 0usize), |(sum, count), s| (sum + s.fps, count + 1));
        FrameMetrics {
            fps: state.last_fps,
            average_fps: if count == 0 { 0.0 } else { sum / count as f64 },
            frame_drops: state.frame_drops,
            last_updated: state.last_updated,
        }
    }

    pub fn get_metrics(&self) -> FrameMetrics {
        Self::metrics_from(&lock(&self.state))
    }

    /// Mean FPS of the retained window, `None` before the first sample
    pub fn average_fps(&self) -> Option<f64> {
        let state = lock(&self.state);
        if state.samples.is_empty() {
            None
        } else {
            Some(Self::metrics_from(&state).average_fps)
        }
    }

    pub fn samples(&self) -> Vec<FrameSample> {
        lock(&self.state).samples.to_vec()
    }

    pub fn recent_samples(&self, n: usize) -> Vec<FrameSample> {
        lock(&self.state).samples.recent(n).cloned().collect()
    }
}

impl MonitoringComponent for FrameMetricsCollector {
    fn name(&self) -> &'static str {
        "frame"
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
        state.last_fps = 0.0;
        state.frame_drops = 0;
        state.last_updated = None;
    }

    fn snapshot(&self) -> Result<serde_json::Value> {
        let state = lock(&self.state);
        let metrics = Self::metrics_from(&state);
        Ok(json!({
            "samples": state.samples.len(),
            "frame_drops": metrics.frame_drops,
            "fps": metrics.fps,
            "average_fps": metrics.average_fps,
            "last_updated": metrics.last_updated,
            "latest": state.samples.latest(),
        }))
    }
}
