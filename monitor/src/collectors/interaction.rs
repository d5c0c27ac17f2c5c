//! Interaction latency recorder
//!
//! UI event handlers report completed interactions here. While the monitor is
//! running, recording is a plain append to a bounded buffer; slow interactions
//! are logged, not alerted.

use crate::buffer::RingBuffer;
use crate::collectors::{note_slow, MonitoringComponent};
use crate::error::Result;
use crate::metrics::MetricsRegistry;
use crate::types::InteractionSample;
use crate::utils::sync::lock;
use chrono::Utc;
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{trace, warn};

struct InteractionState {
    samples: RingBuffer<InteractionSample>,
    /// component+metric pairs already logged in the current reporting period
    slow_noted: HashSet<String>,
}

pub struct InteractionLatencyTracker {
    warning_ms: f64,
    capacity: usize,
    metrics: Option<Arc<MetricsRegistry>>,
    running: AtomicBool,
    state: Mutex<InteractionState>,
}

impl InteractionLatencyTracker {
    pub fn new(warning_ms: f64, capacity: usize) -> Self {
        Self {
            warning_ms,
            capacity,
            metrics: None,
            running: AtomicBool::new(false),
            state: Mutex::new(InteractionState {
                samples: RingBuffer::new(capacity),
                slow_noted: HashSet::new(),
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

    /// Append one interaction. Returns `None` while stopped; a non-finite or
    /// negative duration is stored as zero.
    pub fn record(
        &self,
        event_type: &str,
        response_time_ms: f64,
        component_name: Option<&str>,
        succeeded: bool,
    ) -> Option<InteractionSample> {
        if !self.is_running() {
            trace!(event_type, "Dropping interaction recorded while stopped");
            return None;
        }
        let response_time_ms = if response_time_ms.is_finite() {
            response_time_ms.max(0.0)
        } else {
            0.0
        };

        let sample = InteractionSample {
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            response_time_ms,
            component_name: component_name.map(str::to_string),
            succeeded,
        };

        let first_slow_note = {
            let mut state = lock(&self.state);
            state.samples.push(sample.clone());
            if response_time_ms > self.warning_ms {
                let subject = component_name.unwrap_or(event_type);
                note_slow(&mut state.slow_noted, format!("{}:response_time", subject), self.capacity)
            } else {
                false
            }
        };

        if first_slow_note {
            warn!(
                event_type,
                component = component_name.unwrap_or("-"),
                response_time_ms,
                threshold_ms = self.warning_ms,
                "Slow interaction"
            );
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_interaction();
        }

        Some(sample)
    }

    /// Start a new reporting period so slow notes are logged again
    pub fn reset_period(&self) {
        lock(&self.state).slow_noted.clear();
    }

    pub fn samples(&self) -> Vec<InteractionSample> {
        lock(&self.state).samples.to_vec()
    }

    pub fn recent_samples(&self, n: usize) -> Vec<InteractionSample> {
        lock(&self.state).samples.recent(n).cloned().collect()
    }

    pub fn samples_for_component(&self, component: &str) -> Vec<InteractionSample> {
        lock(&self.state)
            .samples
            .iter()
            .filter(|s| s.component_name.as_deref() == Some(component))
            .cloned()
            .collect()
    }

    /// Number of distinct slow notes logged in the current period
    pub fn slow_note_count(&self) -> usize {
        lock(&self.state).slow_noted.len()
    }
}

impl MonitoringComponent for InteractionLatencyTracker {
    fn name(&self) -> &'static str {
        "interaction"
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
        state.slow_noted.clear();
    }

    fn snapshot(&self) -> Result<serde_json::Value> {
        let state = lock(&self.state);
        let failed = state.samples.iter().filter(|s| !s.succeeded).count();
        Ok(json!({
            "samples": state.samples.len(),
            "failed": failed,
            "latest": state.samples.latest(),
        }))
    }
}
