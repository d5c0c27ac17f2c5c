use crate::commands::ensure_score;
use crate::error::{CliError, Result};
use crate::output::OutputManager;
use clap::Args;
use perf_monitor::{
    DeviceInfo, Measurement, MonitorConfig, NoopProbe, PerformanceMonitor, Platform, StaticDeviceInfo,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// JSON file with recorded measurements
    pub file: PathBuf,

    /// Only validate measurements recorded for this component
    #[arg(long)]
    pub component: Option<String>,

    /// Platform whose rules apply (overrides the file and the configuration)
    #[arg(long)]
    pub platform: Option<Platform>,

    /// Exit with an error when the score is below this value
    #[arg(long)]
    pub fail_under: Option<f64>,
}

/// Display description stored next to the measurements
#[derive(Debug, Deserialize)]
struct DisplaySize {
    width: f64,
    height: f64,
    #[serde(default = "unit")]
    pixel_density: f64,
    #[serde(default = "unit")]
    font_scale: f64,
}

fn unit() -> f64 {
    1.0
}

/// Either a bare list of measurements or a session object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MeasurementFile {
    Bare(Vec<Measurement>),
    Session {
        #[serde(default)]
        platform: Option<Platform>,
        #[serde(default)]
        device: Option<DisplaySize>,
        measurements: Vec<Measurement>,
    },
}

impl MeasurementFile {
    fn into_parts(self) -> (Option<Platform>, Option<DisplaySize>, Vec<Measurement>) {
        match self {
            MeasurementFile::Bare(measurements) => (None, None, measurements),
            MeasurementFile::Session {
                platform,
                device,
                measurements,
            } => (platform, device, measurements),
        }
    }
}

fn read_measurements(path: &Path) -> Result<MeasurementFile> {
    if !path.exists() {
        return Err(CliError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn run(args: ValidateArgs, mut config: MonitorConfig, output: OutputManager) -> Result<()> {
    let (platform, device, measurements) = read_measurements(&args.file)?.into_parts();
    if let Some(platform) = args.platform.or(platform) {
        config.platform = platform;
    }

    if let Some(component) = &args.component {
        if !measurements.iter().any(|m| m.component() == component) {
            output.print_warning(&format!("No measurements recorded for component: {}", component));
        }
    }

    let platform = config.platform;
    let mut builder = PerformanceMonitor::builder()
        .config(config)
        .memory_probe(Box::new(NoopProbe));
    if let Some(size) = device {
        builder = builder.device_info(Box::new(StaticDeviceInfo(DeviceInfo::new(
            platform,
            size.width,
            size.height,
            size.pixel_density,
            size.font_scale,
        ))));
    }
    let monitor = builder.build()?;

    let count = measurements.len();
    for measurement in measurements {
        monitor.record_measurement(measurement);
    }
    info!(measurements = count, platform = %platform, "Validating measurements");

    let report = monitor.run_full_validation(args.component.as_deref());
    output.print_consistency_report(&report)?;
    output.print_success(&format!(
        "{} of {} checks passed",
        report.total_checks() - report.failing().len(),
        report.total_checks()
    ));
    ensure_score(report.overall_score, args.fail_under)
}
