//! The monitor facade
//!
//! [`PerformanceMonitor`] owns every collector, the alert engine, the scorer,
//! the consistency validator and both report histories. The application
//! constructs one instance at its root and passes it (usually in an `Arc`)
//! to whatever needs to record or query.

use crate::alerts::{AlertEngine, Subscription};
use crate::animations::{AnimationId, AnimationProfile, AnimationRegistry, RegisteredAnimation};
use crate::collectors::{
    FrameMetricsCollector, InteractionLatencyTracker, MemoryProbe, MonitoringComponent, NetworkInstrument,
    NetworkLatencyTracker, ResourceMetricsCollector, SysinfoProbe,
};
use crate::config::MonitorConfig;
use crate::error::Result;
use crate::history::{BaselineComparison, BenchmarkComparator, HistoryStore, ScoreTrend};
use crate::metrics::MetricsRegistry;
use crate::report::{BenchmarkSummary, PerformanceBenchmark};
use crate::scheduler::PeriodicTask;
use crate::scoring::{ScoringEngine, ScoringInput};
use crate::types::{Alert, FrameSample, MonitorMetrics, PressureLevel, ResourceSample};
use crate::utils::stats::mean_of;
use crate::utils::sync::lock;
use crate::validation::{
    ConsistencyReport, ConsistencyRules, ConsistencyValidator, DeviceInfoProvider, Measurement, RuntimeObservations,
    UnavailableDeviceInfo,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Lifecycle state of the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorState {
    Stopped,
    Monitoring,
}

struct Lifecycle {
    state: MonitorState,
    tasks: Vec<PeriodicTask>,
}

pub struct PerformanceMonitorBuilder {
    config: MonitorConfig,
    probe: Option<Box<dyn MemoryProbe>>,
    device: Option<Box<dyn DeviceInfoProvider>>,
}

impl PerformanceMonitorBuilder {
    pub fn config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn memory_probe(mut self, probe: Box<dyn MemoryProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn device_info(mut self, provider: Box<dyn DeviceInfoProvider>) -> Self {
        self.device = Some(provider);
        self
    }

    pub fn build(self) -> Result<PerformanceMonitor> {
        let config = self.config;
        config.validate()?;

        let capacity = config.retention.sample_capacity;
        let target_fps = config.sampling.target_fps;
        let metrics = Arc::new(MetricsRegistry::new()?);
        let alerts = Arc::new(AlertEngine::new(config.alerts.clone(), capacity).with_metrics(metrics.clone()));

        let frames = Arc::new(
            FrameMetricsCollector::new(target_fps, capacity, alerts.clone()).with_metrics(metrics.clone()),
        );
        let animations = Arc::new(AnimationRegistry::new(alerts.clone()).with_metrics(metrics.clone()));
        let probe = self.probe.unwrap_or_else(|| Box::new(SysinfoProbe::new()));
        let resources = Arc::new(
            ResourceMetricsCollector::new(
                target_fps,
                capacity,
                alerts.clone(),
                frames.clone(),
                animations.clone(),
                probe,
            )
            .with_metrics(metrics.clone()),
        );
        let interactions = Arc::new(
            InteractionLatencyTracker::new(config.alerts.response_warning_ms, capacity)
                .with_metrics(metrics.clone()),
        );
        let network = Arc::new(
            NetworkLatencyTracker::new(config.alerts.network_warning_ms, capacity).with_metrics(metrics.clone()),
        );

        let scoring = ScoringEngine::new(
            config.scoring.clone(),
            config.platform_targets().clone(),
            config.retention.scoring_window,
        );
        let device = self.device.unwrap_or_else(|| Box::new(UnavailableDeviceInfo));
        let validator = ConsistencyValidator::new(
            ConsistencyRules::new(config.validation.clone(), config.platform),
            device,
        );

        info!(
            platform = %config.platform,
            target_fps,
            sample_capacity = capacity,
            "Performance monitor created"
        );

        Ok(PerformanceMonitor {
            performance_history: HistoryStore::new(config.retention.history_capacity),
            consistency_history: HistoryStore::new(config.retention.history_capacity),
            config,
            metrics,
            alerts,
            frames,
            resources,
            interactions,
            network,
            animations,
            scoring,
            validator,
            lifecycle: Mutex::new(Lifecycle {
                state: MonitorState::Stopped,
                tasks: Vec::new(),
            }),
        })
    }
}

pub struct PerformanceMonitor {
    config: MonitorConfig,
    metrics: Arc<MetricsRegistry>,
    alerts: Arc<AlertEngine>,
    frames: Arc<FrameMetricsCollector>,
    resources: Arc<ResourceMetricsCollector>,
    interactions: Arc<InteractionLatencyTracker>,
    network: Arc<NetworkLatencyTracker>,
    animations: Arc<AnimationRegistry>,
    scoring: ScoringEngine,
    validator: ConsistencyValidator,
    performance_history: HistoryStore<PerformanceBenchmark>,
    consistency_history: HistoryStore<ConsistencyReport>,
    lifecycle: Mutex<Lifecycle>,
}

impl PerformanceMonitor {
    pub fn builder() -> PerformanceMonitorBuilder {
        PerformanceMonitorBuilder {
            config: MonitorConfig::default(),
            probe: None,
            device: None,
        }
    }

    pub fn new(config: MonitorConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn state(&self) -> MonitorState {
        lock(&self.lifecycle).state
    }

    pub fn is_monitoring(&self) -> bool {
        self.state() == MonitorState::Monitoring
    }

    /// Enter `Monitoring`. Calling it while already monitoring does nothing.
    ///
    /// Inside a tokio runtime the frame and resource collectors are driven by
    /// periodic tasks. Outside one, the monitor still enters `Monitoring` and
    /// samples only when the host calls [`record_frame_time`](Self::record_frame_time)
    /// or [`sample_resources_now`](Self::sample_resources_now).
    pub fn start(&self) {
        let mut lifecycle = lock(&self.lifecycle);
        if lifecycle.state == MonitorState::Monitoring {
            debug!("Monitor already running");
            return;
        }

        self.frames.begin(Instant::now());
        self.resources.begin();
        self.interactions.begin();
        self.network.begin();

        let resource_period = Duration::from_millis(self.config.sampling.resource_interval_ms);
        let resources = Arc::clone(&self.resources);
        let spawned = PeriodicTask::spawn("resource-sampler", resource_period, move || {
            resources.sample_now();
        })
        .and_then(|resource_task| {
            let mut tasks = vec![resource_task];
            if !self.config.sampling.host_frame_callbacks {
                let frame_period = Duration::from_secs_f64(self.frames.frame_interval_ms() / 1000.0);
                let frames = Arc::clone(&self.frames);
                tasks.push(PeriodicTask::spawn("frame-sampler", frame_period, move || {
                    frames.tick_at(Instant::now());
                })?);
            }
            Ok(tasks)
        });

        match spawned {
            Ok(tasks) => lifecycle.tasks = tasks,
            Err(e) => warn!(error = %e, "No async runtime available, automatic sampling disabled"),
        }

        lifecycle.state = MonitorState::Monitoring;
        info!(
            platform = %self.config.platform,
            automatic_sampling = !lifecycle.tasks.is_empty(),
            "Performance monitoring started"
        );
    }

    /// Return to `Stopped`. A tick already in flight finishes; no new one is armed.
    pub fn stop(&self) {
        let mut lifecycle = lock(&self.lifecycle);
        if lifecycle.state == MonitorState::Stopped {
            return;
        }
        for task in lifecycle.tasks.drain(..) {
            task.stop();
        }
        self.frames.end();
        self.resources.end();
        self.interactions.end();
        self.network.end();
        lifecycle.state = MonitorState::Stopped;
        info!("Performance monitoring stopped");
    }

    /// Drop every retained sample, alert and pending measurement. Histories
    /// and registered animations are kept.
    pub fn clear_metrics(&self) {
        let components: [&dyn MonitoringComponent; 4] = [
            self.frames.as_ref(),
            self.resources.as_ref(),
            self.interactions.as_ref(),
            self.network.as_ref(),
        ];
        for component in components {
            component.clear();
        }
        self.validator.clear_measurements();
        self.alerts.clear_log();
        self.metrics.reset_gauges();
        info!("Performance metrics cleared");
    }

    /// Feed a frame duration from a host frame callback
    pub fn record_frame_time(&self, frame_time_ms: f64) -> Option<FrameSample> {
        self.frames.record_frame_time(frame_time_ms)
    }

    pub fn sample_resources_now(&self) -> Option<ResourceSample> {
        self.resources.sample_now()
    }

    pub fn record_interaction(
        &self,
        event_type: &str,
        response_time_ms: f64,
        component_name: Option<&str>,
        succeeded: bool,
    ) {
        self.interactions
            .record(event_type, response_time_ms, component_name, succeeded);
    }

    pub fn record_network_request(
        &self,
        url: &str,
        method: &str,
        response_time_ms: f64,
        byte_size: u64,
        succeeded: bool,
        error_message: Option<&str>,
    ) {
        self.network
            .record(url, method, response_time_ms, byte_size, succeeded, error_message);
    }

    /// Wrapper the host's network layer routes outbound calls through
    pub fn network_instrument(&self) -> NetworkInstrument {
        NetworkInstrument::new(Arc::clone(&self.network))
    }

    pub fn register_animation(&self, profile: AnimationProfile) -> AnimationId {
        self.animations.register(profile)
    }

    pub fn unregister_animation(&self, id: AnimationId) -> bool {
        self.animations.unregister(id)
    }

    pub fn get_animation_profiles(&self) -> Vec<RegisteredAnimation> {
        self.animations.profiles()
    }

    pub fn on_alert<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Alert) + Send + Sync + 'static,
    {
        self.alerts.subscribe(callback)
    }

    /// Newest first
    pub fn recent_alerts(&self, limit: usize) -> Vec<Alert> {
        self.alerts.recent_alerts(limit)
    }

    pub fn get_metrics(&self) -> MonitorMetrics {
        let latest = self.resources.latest();
        MonitorMetrics {
            frame: self.frames.get_metrics(),
            memory_estimate: latest.as_ref().map(|s| s.used_memory_estimate).unwrap_or(0.0),
            pressure_level: latest.map(|s| s.pressure_level).unwrap_or(PressureLevel::Low),
            active_animations: self.animations.active_count(),
            interaction_samples: self.interactions.sample_count(),
            network_samples: self.network.sample_count(),
            alerts_emitted: self.alerts.total_emitted(),
        }
    }

    /// Score the current buffers, append the report to the history and
    /// start a new slow-note period
    pub fn generate_performance_report(&self) -> PerformanceBenchmark {
        let frame_samples = self.frames.samples();
        let resource_samples = self.resources.samples();
        let interaction_samples = self.interactions.samples();
        let network_samples = self.network.samples();

        let breakdown = self.scoring.compute_score(&ScoringInput {
            frames: &frame_samples,
            resources: &resource_samples,
            interactions: &interaction_samples,
            network: &network_samples,
        });
        let recommendations = self.scoring.generate_recommendations(&breakdown.deductions);
        let summary = BenchmarkSummary::from_samples(
            &frame_samples,
            &resource_samples,
            &interaction_samples,
            &network_samples,
            self.frames.get_metrics().frame_drops,
            self.animations.active_count(),
        );
        let alert_counts: BTreeMap<String, usize> = self
            .alerts
            .counts_by_type()
            .into_iter()
            .map(|(alert_type, count)| (alert_type.as_str().to_string(), count))
            .collect();

        let report = PerformanceBenchmark {
            id: uuid::Uuid::new_v4().to_string(),
            platform: self.config.platform,
            timestamp: Utc::now(),
            frame_samples,
            resource_samples,
            interaction_samples,
            network_samples,
            overall_score: breakdown.score,
            deductions: breakdown.deductions,
            recommendations,
            summary,
            alert_counts,
        };

        self.metrics.set_performance_score(report.overall_score);
        self.interactions.reset_period();
        self.network.reset_period();
        self.performance_history.append(report.clone());
        info!(
            report_id = %report.id,
            score = report.overall_score,
            deductions = report.deductions.len(),
            "Performance report generated"
        );
        report
    }

    /// Generate a report and render it as text
    pub fn get_performance_report(&self) -> String {
        self.generate_performance_report().to_text()
    }

    pub fn record_measurement(&self, measurement: Measurement) {
        self.validator.record_measurement(measurement);
    }

    fn runtime_observations(&self) -> RuntimeObservations {
        let window = self.config.retention.scoring_window;
        let targets = self.config.platform_targets();
        RuntimeObservations {
            average_fps: self.frames.average_fps(),
            minimum_fps: self.config.alerts.warning_fps,
            average_interaction_ms: mean_of(
                self.interactions
                    .recent_samples(window)
                    .iter()
                    .map(|s| s.response_time_ms),
            ),
            interaction_target_ms: targets.interaction_ms,
            average_network_ms: mean_of(self.network.recent_samples(window).iter().map(|s| s.response_time_ms)),
            network_target_ms: targets.network_ms,
        }
    }

    /// Run every consistency check, restricted to `component` when given
    pub fn run_full_validation(&self, component: Option<&str>) -> ConsistencyReport {
        let report = self
            .validator
            .run_full_validation(component, &self.runtime_observations());
        self.metrics.set_consistency_score(report.overall_score);
        self.consistency_history.append(report.clone());
        report
    }

    pub fn compare_with_previous_report(&self) -> Option<ScoreTrend> {
        self.performance_history.compare_with_previous()
    }

    pub fn compare_with_previous_validation(&self) -> Option<ScoreTrend> {
        self.consistency_history.compare_with_previous()
    }

    /// Compare the latest stored report against `baseline`
    pub fn compare_with_baseline(&self, baseline: &PerformanceBenchmark) -> Option<BaselineComparison> {
        let current = self.performance_history.get_latest()?;
        Some(BenchmarkComparator::compare_with_baseline(&current, baseline))
    }

    pub fn performance_history(&self) -> &HistoryStore<PerformanceBenchmark> {
        &self.performance_history
    }

    pub fn consistency_history(&self) -> &HistoryStore<ConsistencyReport> {
        &self.consistency_history
    }

    pub fn export_prometheus(&self) -> Result<String> {
        self.metrics.export_prometheus()
    }

    /// Per-collector diagnostics keyed by collector name
    pub fn component_snapshots(&self) -> Result<serde_json::Value> {
        let components: [&dyn MonitoringComponent; 4] = [
            self.frames.as_ref(),
            self.resources.as_ref(),
            self.interactions.as_ref(),
            self.network.as_ref(),
        ];
        let mut map = serde_json::Map::new();
        for component in components {
            let mut snapshot = component.snapshot()?;
            if let Some(object) = snapshot.as_object_mut() {
                object.insert("running".to_string(), component.is_running().into());
            }
            map.insert(component.name().to_string(), snapshot);
        }
        Ok(serde_json::Value::Object(map))
    }
}

impl Drop for PerformanceMonitor {
    fn drop(&mut self) {
        for task in lock(&self.lifecycle).tasks.drain(..) {
            task.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::NoopProbe;
    use crate::types::AlertType;

    fn monitor() -> PerformanceMonitor {
        PerformanceMonitor::builder()
            .memory_probe(Box::new(NoopProbe))
            .build()
            .unwrap()
    }

    #[test]
    fn test_lifecycle_transitions() {
        let monitor = monitor();
        assert_eq!(monitor.state(), MonitorState::Stopped);
        monitor.start();
        monitor.start();
        assert!(monitor.is_monitoring());
        monitor.stop();
        monitor.stop();
        assert_eq!(monitor.state(), MonitorState::Stopped);
    }

    #[test]
    fn test_frames_only_recorded_while_monitoring() {
        let monitor = monitor();
        assert!(monitor.record_frame_time(16.0).is_none());
        monitor.start();
        assert!(monitor.record_frame_time(16.0).is_some());
        monitor.stop();
        assert!(monitor.record_frame_time(16.0).is_none());
        assert_eq!(monitor.get_metrics().frame.average_fps, 62.5);
    }

    #[test]
    fn test_recorders_ignore_samples_while_stopped() {
        let monitor = monitor();
        monitor.record_interaction("tap", 30.0, Some("Button"), true);
        monitor.record_network_request("https://api.test", "GET", 200.0, 512, true, None);
        let metrics = monitor.get_metrics();
        assert_eq!(metrics.interaction_samples, 0);
        assert_eq!(metrics.network_samples, 0);

        monitor.start();
        monitor.record_interaction("tap", 30.0, Some("Button"), true);
        monitor.record_network_request("https://api.test", "GET", 200.0, 512, true, None);
        let snapshots = monitor.component_snapshots().unwrap();
        assert_eq!(snapshots["interaction"]["running"], true);
        assert_eq!(snapshots["network"]["running"], true);

        monitor.stop();
        monitor.record_interaction("tap", 30.0, Some("Button"), true);
        let metrics = monitor.get_metrics();
        assert_eq!(metrics.interaction_samples, 1);
        assert_eq!(metrics.network_samples, 1);
        assert_eq!(monitor.component_snapshots().unwrap()["interaction"]["running"], false);
    }

    #[test]
    fn test_report_appends_history() {
        let monitor = monitor();
        monitor.start();
        for _ in 0..10 {
            monitor.record_frame_time(16.0);
        }
        monitor.record_interaction("tap", 250.0, Some("Button"), false);

        let first = monitor.generate_performance_report();
        // interaction latency (10) + one failure (5)
        assert_eq!(first.overall_score, 85.0);
        assert_eq!(first.recommendations.len(), 2);
        assert!(monitor.compare_with_previous_report().is_none());

        monitor.clear_metrics();
        let second = monitor.generate_performance_report();
        assert_eq!(second.overall_score, 100.0);

        let trend = monitor.compare_with_previous_report().unwrap();
        assert_eq!(trend.delta, 15.0);
        assert_eq!(trend.improvements.len(), 1);
        assert_eq!(monitor.performance_history().len(), 2);
    }

    #[test]
    fn test_clear_metrics_keeps_animations() {
        let monitor = monitor();
        let id = monitor.register_animation(AnimationProfile::new("spinner"));
        monitor.start();
        monitor.record_frame_time(50.0);
        assert_eq!(monitor.recent_alerts(10).len(), 1);

        monitor.clear_metrics();
        assert!(monitor.recent_alerts(10).is_empty());
        assert_eq!(monitor.get_metrics().frame.frame_drops, 0);
        assert_eq!(monitor.get_animation_profiles().len(), 1);
        assert!(monitor.unregister_animation(id));
    }

    #[test]
    fn test_clear_metrics_drops_pending_measurements() {
        let monitor = monitor();
        monitor.record_measurement(Measurement::Contrast {
            component: "Button".to_string(),
            ratio: 2.0,
        });
        monitor.clear_metrics();

        let report = monitor.run_full_validation(None);
        assert_eq!(report.total_checks(), 0);
        assert_eq!(report.overall_score, 100.0);
    }

    #[test]
    fn test_manual_resource_sampling() {
        let monitor = monitor();
        monitor.start();
        for i in 0..12 {
            monitor.register_animation(AnimationProfile::new(format!("a{}", i)));
        }
        let sample = monitor.sample_resources_now().unwrap();
        assert_eq!(sample.active_animations, 12);
        assert_eq!(sample.pressure_level, PressureLevel::High);

        let metrics = monitor.get_metrics();
        assert_eq!(metrics.memory_estimate, 6.0);
        assert!(monitor
            .recent_alerts(20)
            .iter()
            .all(|a| a.alert_type == AlertType::MemoryWarning));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = MonitorConfig::default();
        config.retention.sample_capacity = 0;
        assert!(PerformanceMonitor::new(config).is_err());
    }

    #[test]
    fn test_component_snapshots_and_export() {
        let monitor = monitor();
        monitor.start();
        monitor.record_frame_time(16.0);
        let snapshots = monitor.component_snapshots().unwrap();
        assert_eq!(snapshots["frame"]["running"], true);
        assert_eq!(snapshots["interaction"]["samples"], 0);

        let text = monitor.export_prometheus().unwrap();
        assert!(text.contains("perf_average_fps"));
    }
}
