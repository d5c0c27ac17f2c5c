//! Network latency recorder and the opt-in request instrumentation
//!
//! The host's network layer wraps outbound calls with a [`NetworkInstrument`].
//! The wrapper times the call, records a [`NetworkSample`] and hands the
//! original result back untouched, including the caller's own error value.

use crate::buffer::RingBuffer;
use crate::collectors::{note_slow, MonitoringComponent};
use crate::error::Result;
use crate::metrics::MetricsRegistry;
use crate::types::NetworkSample;
use crate::utils::sync::lock;
use chrono::Utc;
use serde_json::json;
use std::collections::HashSet;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Size in bytes of a response body, used for `NetworkSample::byte_size`
pub trait ResponseSize {
    fn response_size(&self) -> u64;
}

impl ResponseSize for Vec<u8> {
    fn response_size(&self) -> u64 {
        self.len() as u64
    }
}

impl ResponseSize for String {
    fn response_size(&self) -> u64 {
        self.len() as u64
    }
}

impl ResponseSize for &str {
    fn response_size(&self) -> u64 {
        self.len() as u64
    }
}

impl ResponseSize for serde_json::Value {
    fn response_size(&self) -> u64 {
        serde_json::to_vec(self).map(|v| v.len() as u64).unwrap_or(0)
    }
}

impl ResponseSize for () {
    fn response_size(&self) -> u64 {
        0
    }
}

struct NetworkState {
    samples: RingBuffer<NetworkSample>,
    slow_noted: HashSet<String>,
}

pub struct NetworkLatencyTracker {
    warning_ms: f64,
    capacity: usize,
    metrics: Option<Arc<MetricsRegistry>>,
    running: AtomicBool,
    state: Mutex<NetworkState>,
}

impl NetworkLatencyTracker {
    pub fn new(warning_ms: f64, capacity: usize) -> Self {
        Self {
            warning_ms,
            capacity,
            metrics: None,
            running: AtomicBool::new(false),
            state: Mutex::new(NetworkState {
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

    /// Append one completed request. Never fails; returns `None` while stopped.
    pub fn record(
        &self,
        url: &str,
        method: &str,
        response_time_ms: f64,
        byte_size: u64,
        succeeded: bool,
        error_message: Option<&str>,
    ) -> Option<NetworkSample> {
        if !self.is_running() {
            trace!(url, "Dropping network request recorded while stopped");
            return None;
        }
        let response_time_ms = if response_time_ms.is_finite() {
            response_time_ms.max(0.0)
        } else {
            0.0
        };

        let sample = NetworkSample {
            timestamp: Utc::now(),
            url: url.to_string(),
            method: method.to_uppercase(),
            response_time_ms,
            byte_size,
            succeeded,
            error_message: error_message.map(str::to_string),
        };

        let first_slow_note = {
            let mut state = lock(&self.state);
            state.samples.push(sample.clone());
            response_time_ms > self.warning_ms
                && note_slow(&mut state.slow_noted, format!("{}:response_time", url), self.capacity)
        };

        if first_slow_note {
            warn!(
                url,
                method = %sample.method,
                response_time_ms,
                threshold_ms = self.warning_ms,
                "Slow network request"
            );
        }
        if !succeeded {
            debug!(url, error = error_message.unwrap_or("-"), "Network request failed");
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_network_request();
        }

        Some(sample)
    }

    pub fn reset_period(&self) {
        lock(&self.state).slow_noted.clear();
    }

    pub fn samples(&self) -> Vec<NetworkSample> {
        lock(&self.state).samples.to_vec()
    }

    pub fn recent_samples(&self, n: usize) -> Vec<NetworkSample> {
        lock(&self.state).samples.recent(n).cloned().collect()
    }

    pub fn failed_count(&self) -> usize {
        lock(&self.state).samples.iter().filter(|s| !s.succeeded).count()
    }

    pub fn slow_note_count(&self) -> usize {
        lock(&self.state).slow_noted.len()
    }
}

impl MonitoringComponent for NetworkLatencyTracker {
    fn name(&self) -> &'static str {
        "network"
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
        let bytes: u64 = state.samples.iter().map(|s| s.byte_size).sum();
        Ok(json!({
            "samples": state.samples.len(),
            "failed": state.samples.iter().filter(|s| !s.succeeded).count(),
            "bytes": bytes,
        }))
    }
}

/// Explicit request wrapper handed to the host's network layer
#[derive(Clone)]
pub struct NetworkInstrument {
    tracker: Arc<NetworkLatencyTracker>,
}

impl NetworkInstrument {
    pub fn new(tracker: Arc<NetworkLatencyTracker>) -> Self {
        Self { tracker }
    }

    /// Await `request`, record it, and return its result unchanged
    pub async fn instrument<T, E, Fut>(&self, method: &str, url: &str, request: Fut) -> std::result::Result<T, E>
    where
        Fut: Future<Output = std::result::Result<T, E>>,
        T: ResponseSize,
        E: Display,
    {
        self.instrument_with(method, url, request, ResponseSize::response_size)
            .await
    }

    /// Like [`instrument`](Self::instrument) with a caller-supplied size function
    pub async fn instrument_with<T, E, Fut, S>(
        &self,
        method: &str,
        url: &str,
        request: Fut,
        size_of: S,
    ) -> std::result::Result<T, E>
    where
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Display,
        S: FnOnce(&T) -> u64,
    {
        let started = Instant::now();
        let outcome = request.await;
        self.finish(method, url, started, outcome, size_of)
    }

    /// Synchronous variant for blocking clients
    pub fn instrument_blocking<T, E, F>(&self, method: &str, url: &str, request: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        T: ResponseSize,
        E: Display,
    {
        let started = Instant::now();
        let outcome = request();
        self.finish(method, url, started, outcome, ResponseSize::response_size)
    }

    fn finish<T, E, S>(
        &self,
        method: &str,
        url: &str,
        started: Instant,
        outcome: std::result::Result<T, E>,
        size_of: S,
    ) -> std::result::Result<T, E>
    where
        E: Display,
        S: FnOnce(&T) -> u64,
    {
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        match &outcome {
            Ok(body) => {
                self.tracker.record(url, method, elapsed_ms, size_of(body), true, None);
            }
            Err(e) => {
                let message = e.to_string();
                self.tracker.record(url, method, elapsed_ms, 0, false, Some(&message));
            }
        }
        outcome
    }

    pub fn tracker(&self) -> &Arc<NetworkLatencyTracker> {
        &self.tracker
    }
}
