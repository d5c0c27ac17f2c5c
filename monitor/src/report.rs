//! Performance benchmark reports

use crate::history::ScoredReport;
use crate::scoring::Deduction;
use crate::types::{FrameSample, InteractionSample, NetworkSample, Platform, ResourceSample};
use crate::utils::format;
use crate::utils::stats::{mean_of, percentile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Aggregates derived from the raw samples of a benchmark
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    pub average_fps: Option<f64>,
    pub frame_drops: u64,
    pub average_frame_time_ms: Option<f64>,
    pub p95_frame_time_ms: Option<f64>,
    pub latest_resource_estimate: Option<f64>,
    pub latest_process_memory_mb: Option<f64>,
    pub average_interaction_ms: Option<f64>,
    pub p95_interaction_ms: Option<f64>,
    pub failed_interactions: usize,
    pub average_network_ms: Option<f64>,
    pub p95_network_ms: Option<f64>,
    pub failed_requests: usize,
    pub network_bytes: u64,
    pub active_animations: usize,
}

fn or_dash(value: Option<f64>, render: fn(f64) -> String) -> String {
    value.map(render).unwrap_or_else(|| "-".to_string())
}

fn p95(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(percentile(values, 95.0))
    }
}

impl BenchmarkSummary {
    pub fn from_samples(
        frames: &[FrameSample],
        resources: &[ResourceSample],
        interactions: &[InteractionSample],
        network: &[NetworkSample],
        frame_drops: u64,
        active_animations: usize,
    ) -> Self {
        let frame_times: Vec<f64> = frames.iter().map(|s| s.frame_time_ms).collect();
        let interaction_times: Vec<f64> = interactions.iter().map(|s| s.response_time_ms).collect();
        let network_times: Vec<f64> = network.iter().map(|s| s.response_time_ms).collect();
        let latest_resource = resources.last();

        Self {
            average_fps: mean_of(frames.iter().map(|s| s.fps)),
            frame_drops,
            average_frame_time_ms: mean_of(frame_times.iter().copied()),
            p95_frame_time_ms: p95(&frame_times),
            latest_resource_estimate: latest_resource.map(|s| s.used_memory_estimate),
            latest_process_memory_mb: latest_resource.and_then(|s| s.process_memory_mb),
            average_interaction_ms: mean_of(interaction_times.iter().copied()),
            p95_interaction_ms: p95(&interaction_times),
            failed_interactions: interactions.iter().filter(|s| !s.succeeded).count(),
            average_network_ms: mean_of(network_times.iter().copied()),
            p95_network_ms: p95(&network_times),
            failed_requests: network.iter().filter(|s| !s.succeeded).count(),
            network_bytes: network.iter().map(|s| s.byte_size).sum(),
            active_animations,
        }
    }
}

/// Snapshot of every sample type plus the derived score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceBenchmark {
    pub id: String,
    pub platform: Platform,
    pub timestamp: DateTime<Utc>,
    pub frame_samples: Vec<FrameSample>,
    pub resource_samples: Vec<ResourceSample>,
    pub interaction_samples: Vec<InteractionSample>,
    pub network_samples: Vec<NetworkSample>,
    pub overall_score: f64,
    pub deductions: Vec<Deduction>,
    pub recommendations: Vec<String>,
    pub summary: BenchmarkSummary,
    /// Retained alerts per type at report time
    pub alert_counts: BTreeMap<String, usize>,
}

impl PerformanceBenchmark {
    pub fn average_frame_time_ms(&self) -> Option<f64> {
        mean_of(self.frame_samples.iter().map(|s| s.frame_time_ms))
    }

    pub fn average_resource_estimate(&self) -> Option<f64> {
        mean_of(self.resource_samples.iter().map(|s| s.used_memory_estimate))
    }

    pub fn average_interaction_ms(&self) -> Option<f64> {
        mean_of(self.interaction_samples.iter().map(|s| s.response_time_ms))
    }

    pub fn average_network_ms(&self) -> Option<f64> {
        mean_of(self.network_samples.iter().map(|s| s.response_time_ms))
    }

    pub fn to_text(&self) -> String {
        let s = &self.summary;

        let mut out = String::new();
        let _ = writeln!(out, "Performance report ({})", self.platform);
        let _ = writeln!(out, "Generated: {}", self.timestamp.to_rfc3339());
        let _ = writeln!(out, "Score: {:.1}/100", self.overall_score);

        let _ = writeln!(out, "\nFrames ({} samples)", self.frame_samples.len());
        let _ = writeln!(out, "  Average FPS:     {}", or_dash(s.average_fps, |v| format!("{:.1}", v)));
        let _ = writeln!(out, "  Frame drops:     {}", s.frame_drops);
        let _ = writeln!(out, "  Avg frame time:  {}", or_dash(s.average_frame_time_ms, format::ms));
        let _ = writeln!(out, "  p95 frame time:  {}", or_dash(s.p95_frame_time_ms, format::ms));

        let _ = writeln!(out, "\nResources ({} samples)", self.resource_samples.len());
        let _ = writeln!(
            out,
            "  Estimate:        {}",
            or_dash(s.latest_resource_estimate, |v| format!("{:.2}", v))
        );
        if let Some(mb) = s.latest_process_memory_mb {
            let _ = writeln!(out, "  Process memory:  {:.1} MB", mb);
        }
        let _ = writeln!(out, "  Animations:      {}", s.active_animations);

        let _ = writeln!(out, "\nInteractions ({} samples)", self.interaction_samples.len());
        let _ = writeln!(out, "  Average:         {}", or_dash(s.average_interaction_ms, format::ms));
        let _ = writeln!(out, "  p95:             {}", or_dash(s.p95_interaction_ms, format::ms));
        let _ = writeln!(out, "  Failed:          {}", s.failed_interactions);

        let _ = writeln!(out, "\nNetwork ({} samples)", self.network_samples.len());
        let _ = writeln!(out, "  Average:         {}", or_dash(s.average_network_ms, format::ms));
        let _ = writeln!(out, "  p95:             {}", or_dash(s.p95_network_ms, format::ms));
        let _ = writeln!(out, "  Failed:          {}", s.failed_requests);
        let _ = writeln!(out, "  Transferred:     {}", format::bytes_human(s.network_bytes));

        if !self.alert_counts.is_empty() {
            let _ = writeln!(out, "\nAlerts");
            for (alert_type, count) in &self.alert_counts {
                let _ = writeln!(out, "  {:<16} {}", alert_type, count);
            }
        }

        if !self.deductions.is_empty() {
            let _ = writeln!(out, "\nDeductions");
            for d in &self.deductions {
                let _ = writeln!(
                    out,
                    "  -{:<5} {} (observed {:.2}, target {:.2})",
                    d.points, d.category, d.observed, d.target
                );
            }
        }

        if !self.recommendations.is_empty() {
            let _ = writeln!(out, "\nRecommendations");
            for rec in &self.recommendations {
                let _ = writeln!(out, "  - {}", rec);
            }
        }
        out
    }
}

impl ScoredReport for PerformanceBenchmark {
    fn overall_score(&self) -> f64 {
        self.overall_score
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PressureLevel;

    fn frame(ms: f64) -> FrameSample {
        FrameSample {
            timestamp: Utc::now(),
            frame_time_ms: ms,
            fps: 1000.0 / ms,
            dropped_frame_count: 0,
        }
    }

    #[test]
    fn test_summary_from_samples() {
        let frames: Vec<_> = (1..=20).map(|i| frame(10.0 + i as f64)).collect();
        let resources = vec![ResourceSample {
            timestamp: Utc::now(),
            used_memory_estimate: 2.5,
            pressure_level: PressureLevel::Low,
            active_animations: 3,
            process_memory_mb: Some(120.0),
        }];
        let summary = BenchmarkSummary::from_samples(&frames, &resources, &[], &[], 2, 3);

        assert_eq!(summary.average_frame_time_ms, Some(20.5));
        assert_eq!(summary.p95_frame_time_ms, Some(29.0));
        assert_eq!(summary.latest_resource_estimate, Some(2.5));
        assert_eq!(summary.latest_process_memory_mb, Some(120.0));
        assert_eq!(summary.average_interaction_ms, None);
        assert_eq!(summary.p95_network_ms, None);
        assert_eq!(summary.frame_drops, 2);
    }

    #[test]
    fn test_text_report_sections() {
        let frames = vec![frame(16.0); 4];
        let benchmark = PerformanceBenchmark {
            id: "r1".to_string(),
            platform: Platform::Android,
            timestamp: Utc::now(),
            summary: BenchmarkSummary::from_samples(&frames, &[], &[], &[], 0, 0),
            frame_samples: frames,
            resource_samples: Vec::new(),
            interaction_samples: Vec::new(),
            network_samples: Vec::new(),
            overall_score: 100.0,
            deductions: Vec::new(),
            recommendations: vec!["Keep it up".to_string()],
            alert_counts: BTreeMap::from([("fps_drop".to_string(), 2)]),
        };

        let text = benchmark.to_text();
        assert!(text.contains("Performance report (android)"));
        assert!(text.contains("Score: 100.0/100"));
        assert!(text.contains("Average FPS:     62.5"));
        assert!(text.contains("fps_drop"));
        assert!(text.contains("- Keep it up"));
        assert_eq!(benchmark.average_network_ms(), None);
    }
}
