use perf_monitor::{
    AlertSeverity, AlertType, BenchmarkComparator, Measurement, MonitorConfig, MonitorState, NoopProbe,
    PerformanceMonitor, TypographySpec,
};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn manual_monitor(config: MonitorConfig) -> PerformanceMonitor {
    PerformanceMonitor::builder()
        .config(config)
        .memory_probe(Box::new(NoopProbe))
        .build()
        .unwrap()
}

#[derive(Debug)]
struct UpstreamError(&'static str);

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "upstream: {}", self.0)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_timers_sample_until_stopped() {
    let mut config = MonitorConfig::default();
    config.sampling.resource_interval_ms = 20;
    let monitor = manual_monitor(config);

    monitor.start();
    assert_eq!(monitor.state(), MonitorState::Monitoring);
    tokio::time::sleep(Duration::from_millis(250)).await;
    monitor.stop();

    let snapshots = monitor.component_snapshots().unwrap();
    let frames = snapshots["frame"]["samples"].as_u64().unwrap();
    let resources = snapshots["resource"]["samples"].as_u64().unwrap();
    assert!(frames > 0, "frame timer produced no samples");
    assert!(resources > 0, "resource timer produced no samples");
    assert_eq!(snapshots["frame"]["running"], false);

    tokio::time::sleep(Duration::from_millis(100)).await;
    let after = monitor.component_snapshots().unwrap();
    assert_eq!(after["frame"]["samples"].as_u64().unwrap(), frames);
    assert_eq!(after["resource"]["samples"].as_u64().unwrap(), resources);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_restart_does_not_leak_timers() {
    let mut config = MonitorConfig::default();
    config.sampling.host_frame_callbacks = true;
    config.sampling.resource_interval_ms = 10;
    let monitor = manual_monitor(config);

    for _ in 0..5 {
        monitor.start();
        monitor.stop();
    }
    monitor.clear_metrics();
    tokio::time::sleep(Duration::from_millis(80)).await;

    let snapshots = monitor.component_snapshots().unwrap();
    assert_eq!(snapshots["resource"]["samples"], 0);
    assert_eq!(snapshots["frame"]["samples"], 0);
}

#[test]
fn test_steady_frames_raise_no_alerts() {
    let monitor = manual_monitor(MonitorConfig::default());
    monitor.start();
    for _ in 0..60 {
        monitor.record_frame_time(16.0);
    }

    let metrics = monitor.get_metrics();
    assert!((metrics.frame.average_fps - 62.5).abs() < 1e-9);
    assert_eq!(metrics.frame.frame_drops, 0);
    assert!(monitor
        .recent_alerts(100)
        .iter()
        .all(|a| a.alert_type != AlertType::FpsDrop));
}

#[test]
fn test_single_long_frame_raises_one_high_alert() {
    let monitor = manual_monitor(MonitorConfig::default());
    let received = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&received);
    let _subscription = monitor.on_alert(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    monitor.start();
    monitor.record_frame_time(50.0);

    let alerts = monitor.recent_alerts(10);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::FpsDrop);
    assert_eq!(alerts[0].severity, AlertSeverity::High);
    assert_eq!(monitor.get_metrics().frame.frame_drops, 1);
    assert_eq!(received.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_instrumentation_preserves_outcomes() {
    let mut config = MonitorConfig::default();
    config.sampling.host_frame_callbacks = true;
    config.sampling.resource_interval_ms = 60_000;
    let monitor = manual_monitor(config);
    monitor.start();
    let instrument = monitor.network_instrument();

    let ok: Result<String, UpstreamError> = instrument
        .instrument("get", "https://api.test/users", async { Ok("payload".to_string()) })
        .await;
    assert_eq!(ok.unwrap(), "payload");

    let err: Result<String, UpstreamError> = instrument
        .instrument("post", "https://api.test/orders", async { Err(UpstreamError("503")) })
        .await;
    assert_eq!(err.unwrap_err().0, "503");

    let report = monitor.generate_performance_report();
    assert_eq!(report.network_samples.len(), 2);
    assert_eq!(report.network_samples[0].method, "GET");
    assert_eq!(report.network_samples[0].byte_size, 7);
    assert!(!report.network_samples[1].succeeded);
    assert_eq!(
        report.network_samples[1].error_message.as_deref(),
        Some("upstream: 503")
    );
    // one failed request
    assert_eq!(report.overall_score, 95.0);

    monitor.stop();
    let late: Result<String, UpstreamError> = instrument
        .instrument("get", "https://api.test/late", async { Ok("after stop".to_string()) })
        .await;
    assert_eq!(late.unwrap(), "after stop");
    assert_eq!(monitor.get_metrics().network_samples, 2);
}

#[test]
fn test_report_against_itself_is_unchanged() {
    let monitor = manual_monitor(MonitorConfig::default());
    monitor.start();
    for ms in [16.0, 18.0, 33.0, 16.5] {
        monitor.record_frame_time(ms);
    }
    monitor.record_interaction("tap", 80.0, Some("Button"), true);
    monitor.record_network_request("https://api.test", "GET", 400.0, 1024, true, None);
    monitor.sample_resources_now();

    let report = monitor.generate_performance_report();
    let comparison = BenchmarkComparator::compare_with_baseline(&report, &report);
    assert!(comparison
        .categories
        .iter()
        .filter(|c| c.comparable)
        .all(|c| c.improvement_pct.abs() < 1e-9));
    assert_eq!(comparison.improvements().count(), 0);
    assert_eq!(comparison.regressions().count(), 0);

    let via_monitor = monitor.compare_with_baseline(&report).unwrap();
    assert_eq!(via_monitor.categories.len(), comparison.categories.len());
}

#[test]
fn test_history_is_bounded() {
    let mut config = MonitorConfig::default();
    config.retention.history_capacity = 3;
    let monitor = manual_monitor(config);

    for _ in 0..5 {
        monitor.generate_performance_report();
    }
    assert_eq!(monitor.performance_history().len(), 3);
    assert!(monitor.compare_with_previous_report().is_some());
}

#[test]
fn test_validation_with_runtime_checks() {
    let monitor = manual_monitor(MonitorConfig::default());
    monitor.start();
    for _ in 0..10 {
        monitor.record_frame_time(40.0);
    }
    monitor.record_measurement(Measurement::Spacing {
        component: "Card".to_string(),
        measured: 26.0,
        expected: 24.0,
    });

    let report = monitor.run_full_validation(Some("Card"));
    assert_eq!(report.visual_results.len(), 1);
    assert!(report.visual_results[0].passed);
    // 25 FPS is under the 45 FPS warning threshold
    assert_eq!(report.performance_results.len(), 1);
    assert!(!report.performance_results[0].passed);
    assert_eq!(report.overall_score, 50.0);
    assert!(monitor.compare_with_previous_validation().is_none());
}

#[test]
fn test_validation_scores_more_measurements_than_sample_capacity() {
    let config = MonitorConfig::default();
    assert!(config.retention.sample_capacity < 250);
    let monitor = manual_monitor(config);

    for i in 0..250 {
        monitor.record_measurement(Measurement::Spacing {
            component: "Card".to_string(),
            measured: if i < 50 { 40.0 } else { 24.0 },
            expected: 24.0,
        });
    }

    let report = monitor.run_full_validation(None);
    assert_eq!(report.total_checks(), 250);
    assert_eq!(report.failing().len(), 50);
    assert_eq!(report.overall_score, 80.0);
}

proptest! {
    #[test]
    fn prop_average_fps_is_mean_of_instantaneous(frames in prop::collection::vec(1.0f64..200.0, 1..100)) {
        let monitor = manual_monitor(MonitorConfig::default());
        monitor.start();
        for ms in &frames {
            monitor.record_frame_time(*ms);
        }
        let expected = frames.iter().map(|ms| 1000.0 / ms).sum::<f64>() / frames.len() as f64;
        let actual = monitor.get_metrics().frame.average_fps;
        prop_assert!((actual - expected).abs() < 1e-6 * expected.max(1.0));
    }

    #[test]
    fn prop_matching_measurements_score_full(
        spacing in 0.0f64..64.0,
        radius in 0.0f64..32.0,
        font_size in 8.0f64..40.0,
        side in 48.0f64..120.0,
        ratio in 4.5f64..21.0,
    ) {
        let monitor = manual_monitor(MonitorConfig::default());
        let typography = TypographySpec {
            font_size,
            font_weight: "600".to_string(),
            line_height: font_size * 1.4,
        };
        let component = "Card".to_string();
        for measurement in [
            Measurement::Spacing { component: component.clone(), measured: spacing, expected: spacing },
            Measurement::BorderRadius { component: component.clone(), measured: radius, expected: radius },
            Measurement::Color { component: component.clone(), measured: "#1A2B3C".to_string(), expected: "#1a2b3c".to_string() },
            Measurement::Typography { component: component.clone(), measured: typography.clone(), expected: typography },
            Measurement::TouchTarget { component: component.clone(), width: side, height: side },
            Measurement::Contrast { component: component.clone(), ratio },
            Measurement::AccessibilityLabel { component: component.clone(), label: Some("Open card".to_string()) },
            Measurement::ScreenReader { component: component.clone(), supported: true },
        ] {
            monitor.record_measurement(measurement);
        }

        let report = monitor.run_full_validation(None);
        prop_assert_eq!(report.total_checks(), 8);
        prop_assert_eq!(report.overall_score, 100.0);
        prop_assert!(report.recommendations.is_empty());
    }
}
