use crate::error::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use perf_monitor::utils::format::signed_pct;
use perf_monitor::{Alert, AlertSeverity, BaselineComparison, ConsistencyReport, MonitorConfig, PerformanceBenchmark};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

pub struct OutputManager {
    format: OutputFormat,
    colored: bool,
    quiet: bool,
}

impl OutputManager {
    pub fn new(format: OutputFormat, colored: bool, quiet: bool) -> Self {
        Self { format, colored, quiet }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn score_line(&self, label: &str, score: f64) -> String {
        let text = format!("{}: {:.1}/100", label, score);
        if !self.colored {
            return text;
        }
        if score >= 90.0 {
            style(text).green().bold().to_string()
        } else if score >= 70.0 {
            style(text).yellow().bold().to_string()
        } else {
            style(text).red().bold().to_string()
        }
    }

    pub fn print_performance_report(&self, report: &PerformanceBenchmark, include_samples: bool) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.print_json(&report_value(report, include_samples)?)?,
            OutputFormat::Text => {
                println!("{}", self.score_line("Performance score", report.overall_score));
                println!();
                print!("{}", report.to_text());
            }
        }
        Ok(())
    }

    pub fn print_consistency_report(&self, report: &ConsistencyReport) -> Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
            OutputFormat::Text => {
                println!("{}", self.score_line("Consistency score", report.overall_score));
                println!();
                print!("{}", report.to_text());
            }
        }
        Ok(())
    }

    pub fn print_alerts(&self, alerts: &[Alert]) -> Result<()> {
        if alerts.is_empty() {
            return Ok(());
        }
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(alerts)?),
            OutputFormat::Text => {
                println!("\nRecent alerts");
                for alert in alerts {
                    let severity = format!("{:?}", alert.severity).to_uppercase();
                    let severity = if self.colored {
                        match alert.severity {
                            AlertSeverity::High => style(severity).red().to_string(),
                            AlertSeverity::Medium => style(severity).yellow().to_string(),
                            AlertSeverity::Low => style(severity).dim().to_string(),
                        }
                    } else {
                        severity
                    };
                    println!(
                        "  {} {:<7} {:<15} {}",
                        alert.timestamp.format("%H:%M:%S%.3f"),
                        severity,
                        alert.alert_type,
                        alert.message
                    );
                }
            }
        }
        Ok(())
    }

    pub fn print_baseline_comparison(&self, comparison: &BaselineComparison) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.print_json(comparison)?,
            OutputFormat::Text => {
                println!(
                    "\nAgainst baseline from {}",
                    comparison.baseline_timestamp.format("%Y-%m-%d %H:%M:%S")
                );
                for delta in &comparison.categories {
                    let change = if delta.comparable {
                        signed_pct(delta.improvement_pct)
                    } else {
                        "n/a".to_string()
                    };
                    let change = match (self.colored, delta.comparable) {
                        (true, true) if delta.improvement_pct > 0.0 => style(change).green().to_string(),
                        (true, true) if delta.improvement_pct < 0.0 => style(change).red().to_string(),
                        _ => change,
                    };
                    println!("  {:<20} {}", delta.category, change);
                }
            }
        }
        Ok(())
    }

    pub fn print_config(&self, config: &MonitorConfig) -> Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
            OutputFormat::Text => print!("{}", config.to_toml_string()?),
        }
        Ok(())
    }

    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn print_raw(&self, text: &str) {
        print!("{}", text);
    }

    pub fn print_success(&self, message: &str) {
        if self.quiet || self.format == OutputFormat::Json {
            return;
        }
        if self.colored {
            println!("{} {}", style("✓").green().bold(), message);
        } else {
            println!("OK: {}", message);
        }
    }

    pub fn print_warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        if self.colored {
            eprintln!("{} {}", style("!").yellow().bold(), message);
        } else {
            eprintln!("Warning: {}", message);
        }
    }

    /// Progress bar for long-running commands; hidden in quiet or JSON mode
    pub fn progress_bar(&self, len: u64, message: &str) -> ProgressBar {
        if self.quiet || self.format == OutputFormat::Json {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

/// JSON view of a report, without the raw sample arrays unless asked for
pub fn report_value(report: &PerformanceBenchmark, include_samples: bool) -> Result<serde_json::Value> {
    let mut value = serde_json::to_value(report)?;
    if !include_samples {
        if let Some(object) = value.as_object_mut() {
            for key in ["frame_samples", "resource_samples", "interaction_samples", "network_samples"] {
                object.remove(key);
            }
        }
    }
    Ok(value)
}
