use crate::commands::ensure_score;
use crate::error::{CliError, Result};
use crate::output::{report_value, OutputFormat, OutputManager};
use anyhow::Context;
use clap::Args;
use futures::future::join_all;
use perf_monitor::{AnimationProfile, MonitorConfig, PerformanceBenchmark, PerformanceMonitor, Platform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Session length in seconds
    #[arg(long, default_value = "5")]
    pub seconds: u64,

    /// Nominal frame duration in milliseconds
    #[arg(long, default_value = "16.7")]
    pub frame_ms: f64,

    /// Random spread applied to each frame, in milliseconds
    #[arg(long, default_value = "2.0")]
    pub jitter_ms: f64,

    /// Make every Nth frame slow (0 disables)
    #[arg(long, default_value = "0")]
    pub slow_every: u64,

    /// Duration of an injected slow frame in milliseconds
    #[arg(long, default_value = "50.0")]
    pub slow_frame_ms: f64,

    /// Animations registered for the whole session
    #[arg(long, default_value = "0")]
    pub animations: usize,

    /// Platform to score against (overrides the configuration)
    #[arg(long)]
    pub platform: Option<Platform>,

    /// Mean latency of simulated taps in milliseconds
    #[arg(long, default_value = "60.0")]
    pub interaction_ms: f64,

    /// Number of simulated network requests
    #[arg(long, default_value = "5")]
    pub requests: usize,

    /// Mean latency of simulated requests in milliseconds
    #[arg(long, default_value = "150.0")]
    pub request_ms: f64,

    /// Fraction of requests that fail, from 0 to 1
    #[arg(long, default_value = "0.0")]
    pub failure_rate: f64,

    /// Seed for the workload generator
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Compare against a report previously written with --save
    #[arg(long)]
    pub baseline: Option<PathBuf>,

    /// Write the full report as JSON
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Exit with an error when the score is below this value
    #[arg(long)]
    pub fail_under: Option<f64>,

    /// Also print the metrics in Prometheus text format
    #[arg(long)]
    pub prometheus: bool,

    /// Include raw samples in JSON output
    #[arg(long)]
    pub include_samples: bool,
}

pub async fn run(args: SimulateArgs, mut config: MonitorConfig, output: OutputManager) -> Result<()> {
    check_args(&args)?;

    if let Some(platform) = args.platform {
        config.platform = platform;
    }
    // Frames come from the workload below, not from the monitor's own timer
    config.sampling.host_frame_callbacks = true;

    let baseline = args.baseline.as_deref().map(load_baseline).transpose()?;
    let monitor = PerformanceMonitor::new(config)?;

    let raised = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&raised);
    let _subscription = monitor.on_alert(move |alert| {
        counter.fetch_add(1, Ordering::Relaxed);
        debug!(alert_type = %alert.alert_type, "{}", alert.message);
    });

    monitor.start();
    for i in 0..args.animations {
        monitor.register_animation(
            AnimationProfile::new(format!("simulated-{}", i))
                .with_kind("timing")
                .with_duration(300.0),
        );
    }

    let mut rng = StdRng::seed_from_u64(args.seed);
    let session = Duration::from_secs(args.seconds);
    let total_frames = ((session.as_secs_f64() * 1000.0) / args.frame_ms).round().max(1.0) as u64;
    info!(
        frames = total_frames,
        requests = args.requests,
        seed = args.seed,
        "Starting simulated session"
    );

    let instrument = monitor.network_instrument();
    let requests: Vec<_> = (0..args.requests)
        .map(|i| {
            let instrument = instrument.clone();
            let start_after = session.mul_f64(i as f64 / args.requests as f64);
            let latency = Duration::from_secs_f64(jittered(&mut rng, args.request_ms, args.request_ms * 0.2) / 1000.0);
            let fails = rng.gen_bool(args.failure_rate);
            let url = format!("https://api.example.test/items/{}", i);
            tokio::spawn(async move {
                tokio::time::sleep(start_after).await;
                let _ = instrument
                    .instrument("GET", &url, async move {
                        tokio::time::sleep(latency).await;
                        if fails {
                            Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset by peer"))
                        } else {
                            Ok(vec![0u8; 2048])
                        }
                    })
                    .await;
            })
        })
        .collect();

    // Four taps per second
    let interaction_every = ((250.0 / args.frame_ms).round() as u64).max(1);
    let pb = output.progress_bar(total_frames, "simulating frames");
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(args.frame_ms / 1000.0));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for frame in 0..total_frames {
        ticker.tick().await;
        let frame_time = if args.slow_every > 0 && (frame + 1) % args.slow_every == 0 {
            args.slow_frame_ms
        } else {
            jittered(&mut rng, args.frame_ms, args.jitter_ms)
        };
        monitor.record_frame_time(frame_time);

        if frame % interaction_every == 0 {
            let latency = jittered(&mut rng, args.interaction_ms, args.interaction_ms * 0.25);
            monitor.record_interaction("tap", latency, Some("SimulatedButton"), true);
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    for joined in join_all(requests).await {
        joined.context("simulated request task failed")?;
    }

    monitor.sample_resources_now();
    let report = monitor.generate_performance_report();
    let comparison = baseline.as_ref().and_then(|b| monitor.compare_with_baseline(b));
    monitor.stop();

    if let Some(path) = &args.save {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        info!("Report saved to: {}", path.display());
    }

    let alerts = monitor.recent_alerts(10);
    match output.format() {
        OutputFormat::Json => {
            let mut value = report_value(&report, args.include_samples)?;
            if let Some(object) = value.as_object_mut() {
                object.insert("recent_alerts".to_string(), serde_json::to_value(&alerts)?);
                if let Some(comparison) = &comparison {
                    object.insert("baseline_comparison".to_string(), serde_json::to_value(comparison)?);
                }
                if args.prometheus {
                    object.insert("prometheus".to_string(), monitor.export_prometheus()?.into());
                }
            }
            output.print_json(&value)?;
        }
        OutputFormat::Text => {
            output.print_performance_report(&report, args.include_samples)?;
            output.print_alerts(&alerts)?;
            if let Some(comparison) = &comparison {
                output.print_baseline_comparison(comparison)?;
            }
            if args.prometheus {
                println!();
                output.print_raw(&monitor.export_prometheus()?);
            }
        }
    }

    output.print_success(&format!(
        "Simulated {} frames, {} alerts raised",
        total_frames,
        raised.load(Ordering::Relaxed)
    ));
    ensure_score(report.overall_score, args.fail_under)
}

fn check_args(args: &SimulateArgs) -> Result<()> {
    if args.seconds == 0 {
        return Err(CliError::InvalidArgument("--seconds must be at least 1".to_string()));
    }
    let finite = [
        ("--frame-ms", args.frame_ms),
        ("--slow-frame-ms", args.slow_frame_ms),
        ("--jitter-ms", args.jitter_ms),
        ("--interaction-ms", args.interaction_ms),
        ("--request-ms", args.request_ms),
        ("--failure-rate", args.failure_rate),
    ];
    if let Some((flag, value)) = finite.iter().find(|(_, value)| !value.is_finite()) {
        return Err(CliError::InvalidArgument(format!("{} must be a finite number, got {}", flag, value)));
    }
    if let Some(score) = args.fail_under.filter(|s| !s.is_finite()) {
        return Err(CliError::InvalidArgument(format!(
            "--fail-under must be a finite number, got {}",
            score
        )));
    }
    if args.frame_ms <= 0.0 || args.slow_frame_ms <= 0.0 {
        return Err(CliError::InvalidArgument("frame durations must be positive".to_string()));
    }
    if args.jitter_ms < 0.0 || args.interaction_ms < 0.0 || args.request_ms < 0.0 {
        return Err(CliError::InvalidArgument("latencies and jitter must not be negative".to_string()));
    }
    if !(0.0..=1.0).contains(&args.failure_rate) {
        return Err(CliError::InvalidArgument(format!(
            "--failure-rate must be between 0 and 1, got {}",
            args.failure_rate
        )));
    }
    Ok(())
}

fn jittered(rng: &mut StdRng, base: f64, spread: f64) -> f64 {
    if spread <= 0.0 {
        return base;
    }
    (base + rng.gen_range(-spread..=spread)).max(0.1)
}

fn load_baseline(path: &Path) -> Result<PerformanceBenchmark> {
    if !path.exists() {
        return Err(CliError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
