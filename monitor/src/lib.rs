//! Runtime performance monitoring and cross-platform consistency scoring
//!
//! The crate samples frame timing, memory pressure, interaction latency and
//! network latency, raises threshold alerts, and turns the samples into
//! bounded 0-100 scores, recommendations and comparable reports.
//!
//! ```no_run
//! use perf_monitor::{MonitorConfig, PerformanceMonitor};
//!
//! # fn main() -> perf_monitor::Result<()> {
//! let monitor = PerformanceMonitor::new(MonitorConfig::default())?;
//! let _subscription = monitor.on_alert(|alert| eprintln!("{}: {}", alert.alert_type, alert.message));
//! monitor.start();
//! monitor.record_interaction("tap", 42.0, Some("SubmitButton"), true);
//! println!("{}", monitor.get_performance_report());
//! monitor.stop();
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod animations;
pub mod buffer;
pub mod collectors;
pub mod config;
pub mod error;
pub mod history;
pub mod metrics;
pub mod monitor;
pub mod report;
pub mod scheduler;
pub mod scoring;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use alerts::{AlertEngine, Subscription};
pub use animations::{AnimationId, AnimationProfile, RegisteredAnimation};
pub use buffer::RingBuffer;
pub use collectors::{MemoryProbe, NetworkInstrument, NoopProbe, ResponseSize, SysinfoProbe};
pub use config::MonitorConfig;
pub use error::{ConfigError, MonitorError, Result};
pub use history::{BaselineComparison, BenchmarkComparator, HistoryStore, ScoreTrend, ScoredReport};
pub use monitor::{MonitorState, PerformanceMonitor, PerformanceMonitorBuilder};
pub use report::{BenchmarkSummary, PerformanceBenchmark};
pub use scoring::{Deduction, DeductionCategory, ScoreBreakdown, ScoringEngine, ScoringInput};
pub use types::*;
pub use validation::{
    ConsistencyReport, DeviceInfo, DeviceInfoProvider, Measurement, StaticDeviceInfo, TypographySpec,
    ValidationResult, ValidationSeverity,
};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a fmt subscriber filtered by `RUST_LOG`, or `default_filter` when
/// it is unset. Does nothing if a global subscriber already exists.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}
