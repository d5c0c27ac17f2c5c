//! Prometheus exposition of live monitor values
//!
//! Each `PerformanceMonitor` owns one registry; nothing here is global.

use crate::error::Result;
use crate::types::{Alert, FrameMetrics, ResourceSample};
use prometheus::{Encoder, Gauge, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

pub struct MetricsRegistry {
    registry: Registry,

    // Frame metrics
    fps: Gauge,
    average_fps: Gauge,
    frame_drops_total: IntCounter,

    // Resource metrics
    resource_estimate: Gauge,
    active_animations: IntGauge,

    // Recorder metrics
    interactions_total: IntCounter,
    network_requests_total: IntCounter,

    // Alert and score metrics
    alerts_total: IntCounterVec,
    performance_score: Gauge,
    consistency_score: Gauge,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let fps = Gauge::new("perf_fps", "Instantaneous frames per second")?;
        registry.register(Box::new(fps.clone()))?;

        let average_fps = Gauge::new("perf_average_fps", "Mean FPS over the retained frame window")?;
        registry.register(Box::new(average_fps.clone()))?;

        let frame_drops_total = IntCounter::new("perf_frame_drops_total", "Frames below the warning FPS threshold")?;
        registry.register(Box::new(frame_drops_total.clone()))?;

        let resource_estimate = Gauge::new("perf_resource_estimate", "Latest memory pressure estimate")?;
        registry.register(Box::new(resource_estimate.clone()))?;

        let active_animations = IntGauge::new("perf_active_animations", "Currently registered animations")?;
        registry.register(Box::new(active_animations.clone()))?;

        let interactions_total = IntCounter::new("perf_interactions_total", "Recorded UI interactions")?;
        registry.register(Box::new(interactions_total.clone()))?;

        let network_requests_total = IntCounter::new("perf_network_requests_total", "Recorded outbound requests")?;
        registry.register(Box::new(network_requests_total.clone()))?;

        let alerts_total = IntCounterVec::new(
            Opts::new("perf_alerts_total", "Alerts emitted by type"),
            &["alert_type"],
        )?;
        registry.register(Box::new(alerts_total.clone()))?;

        let performance_score = Gauge::new("perf_performance_score", "Score of the latest performance report")?;
        registry.register(Box::new(performance_score.clone()))?;

        let consistency_score = Gauge::new("perf_consistency_score", "Score of the latest consistency report")?;
        registry.register(Box::new(consistency_score.clone()))?;

        Ok(Self {
            registry,
            fps,
            average_fps,
            frame_drops_total,
            resource_estimate,
            active_animations,
            interactions_total,
            network_requests_total,
            alerts_total,
            performance_score,
            consistency_score,
        })
    }

    pub fn record_frame(&self, metrics: &FrameMetrics, dropped: bool) {
        self.fps.set(metrics.fps);
        self.average_fps.set(metrics.average_fps);
        if dropped {
            self.frame_drops_total.inc();
        }
    }

    pub fn record_resource(&self, sample: &ResourceSample) {
        self.resource_estimate.set(sample.used_memory_estimate);
        self.active_animations.set(sample.active_animations as i64);
    }

    pub fn set_active_animations(&self, count: usize) {
        self.active_animations.set(count as i64);
    }

    pub fn record_interaction(&self) {
        self.interactions_total.inc();
    }

    pub fn record_network_request(&self) {
        self.network_requests_total.inc();
    }

    pub fn record_alert(&self, alert: &Alert) {
        self.alerts_total.with_label_values(&[alert.alert_type.as_str()]).inc();
    }

    pub fn set_performance_score(&self, score: f64) {
        self.performance_score.set(score);
    }

    pub fn set_consistency_score(&self, score: f64) {
        self.consistency_score.set(score);
    }

    /// Zero the gauges after `clear_metrics`. Counters stay monotonic.
    pub fn reset_gauges(&self) {
        self.fps.set(0.0);
        self.average_fps.set(0.0);
        self.resource_estimate.set(0.0);
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlertSeverity, AlertType};

    #[test]
    fn test_export_contains_recorded_values() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics.record_frame(
            &FrameMetrics {
                fps: 20.0,
                average_fps: 40.0,
                frame_drops: 1,
                last_updated: None,
            },
            true,
        );
        metrics.record_alert(&Alert::new(AlertType::FpsDrop, AlertSeverity::High, "low"));
        metrics.set_performance_score(85.0);

        let text = metrics.export_prometheus().unwrap();
        assert!(text.contains("perf_fps 20"));
        assert!(text.contains("perf_frame_drops_total 1"));
        assert!(text.contains("perf_alerts_total{alert_type=\"fps_drop\"} 1"));
        assert!(text.contains("perf_performance_score 85"));
    }

    #[test]
    fn test_reset_gauges_keeps_counters() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics.record_interaction();
        metrics.record_frame(&FrameMetrics { fps: 60.0, average_fps: 60.0, frame_drops: 0, last_updated: None }, false);
        metrics.reset_gauges();

        let text = metrics.export_prometheus().unwrap();
        assert!(text.contains("perf_fps 0"));
        assert!(text.contains("perf_interactions_total 1"));
    }
}
