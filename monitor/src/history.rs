//! Report history and comparisons
//!
//! Every generated report is appended to a bounded [`HistoryStore`]; once
//! the store is full the oldest report is evicted. [`BenchmarkComparator`]
//! diffs two performance reports category by category.

use crate::buffer::RingBuffer;
use crate::report::PerformanceBenchmark;
use crate::utils::stats::improvement_pct;
use crate::utils::sync::{read, write};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Scores below this absolute difference count as unchanged
pub const SCORE_EPSILON: f64 = 0.01;

/// A report that carries an overall 0-100 score
pub trait ScoredReport {
    fn overall_score(&self) -> f64;
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Append-only, bounded report log
pub struct HistoryStore<R> {
    entries: RwLock<RingBuffer<R>>,
}

impl<R: Clone> HistoryStore<R> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(RingBuffer::new(capacity)),
        }
    }

    pub fn append(&self, report: R) {
        write(&self.entries).push(report);
    }

    pub fn get_latest(&self) -> Option<R> {
        read(&self.entries).latest().cloned()
    }

    /// All retained reports, oldest first
    pub fn get_all(&self) -> Vec<R> {
        read(&self.entries).to_vec()
    }

    pub fn len(&self) -> usize {
        read(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        read(&self.entries).is_empty()
    }

    pub fn capacity(&self) -> usize {
        read(&self.entries).capacity()
    }
}

impl<R: Clone + ScoredReport> HistoryStore<R> {
    /// Compare the last two reports. `None` until two reports exist.
    pub fn compare_with_previous(&self) -> Option<ScoreTrend> {
        let entries = read(&self.entries);
        let mut recent = entries.iter().rev();
        let current = recent.next()?;
        let previous = recent.next()?;
        Some(ScoreTrend::between(previous, current))
    }
}

/// Direction of the overall score between two consecutive reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTrend {
    pub previous_timestamp: DateTime<Utc>,
    pub current_timestamp: DateTime<Utc>,
    pub previous_score: f64,
    pub current_score: f64,
    pub delta: f64,
    pub improvements: Vec<String>,
    pub regressions: Vec<String>,
    pub unchanged: Vec<String>,
}

impl ScoreTrend {
    pub fn between<R: ScoredReport>(previous: &R, current: &R) -> Self {
        let delta = current.overall_score() - previous.overall_score();
        let mut trend = Self {
            previous_timestamp: previous.timestamp(),
            current_timestamp: current.timestamp(),
            previous_score: previous.overall_score(),
            current_score: current.overall_score(),
            delta,
            improvements: Vec::new(),
            regressions: Vec::new(),
            unchanged: Vec::new(),
        };
        let entry = format!(
            "overall_score: {:.1} -> {:.1}",
            trend.previous_score, trend.current_score
        );
        if delta.abs() < SCORE_EPSILON {
            trend.unchanged.push(entry);
        } else if delta > 0.0 {
            trend.improvements.push(entry);
        } else {
            trend.regressions.push(entry);
        }
        trend
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDelta {
    pub category: String,
    pub baseline_avg: Option<f64>,
    pub current_avg: Option<f64>,
    /// Positive means the current report is better
    pub improvement_pct: f64,
    /// `false` when either side has no data or the baseline is zero
    pub comparable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineComparison {
    pub baseline_timestamp: DateTime<Utc>,
    pub current_timestamp: DateTime<Utc>,
    pub categories: Vec<CategoryDelta>,
}

impl BaselineComparison {
    pub fn improvements(&self) -> impl Iterator<Item = &CategoryDelta> + '_ {
        self.categories
            .iter()
            .filter(|c| c.comparable && c.improvement_pct >= SCORE_EPSILON)
    }

    pub fn regressions(&self) -> impl Iterator<Item = &CategoryDelta> + '_ {
        self.categories
            .iter()
            .filter(|c| c.comparable && c.improvement_pct <= -SCORE_EPSILON)
    }
}

pub struct BenchmarkComparator;

impl BenchmarkComparator {
    /// Per-category percentage change from `baseline` to `current`. Latency,
    /// frame time and resource categories improve when they drop; the overall
    /// score improves when it rises.
    pub fn compare_with_baseline(current: &PerformanceBenchmark, baseline: &PerformanceBenchmark) -> BaselineComparison {
        let lower_is_better = [
            ("frame_time", baseline.average_frame_time_ms(), current.average_frame_time_ms()),
            (
                "resource_estimate",
                baseline.average_resource_estimate(),
                current.average_resource_estimate(),
            ),
            (
                "interaction_latency",
                baseline.average_interaction_ms(),
                current.average_interaction_ms(),
            ),
            ("network_latency", baseline.average_network_ms(), current.average_network_ms()),
        ];

        let mut categories: Vec<CategoryDelta> = lower_is_better
            .into_iter()
            .map(|(category, base, cur)| Self::delta(category, base, cur, improvement_pct))
            .collect();

        categories.push(Self::delta(
            "overall_score",
            Some(baseline.overall_score),
            Some(current.overall_score),
            |base, cur| improvement_pct(base, cur).map(|pct| -pct),
        ));

        BaselineComparison {
            baseline_timestamp: baseline.timestamp,
            current_timestamp: current.timestamp,
            categories,
        }
    }

    fn delta(
        category: &str,
        baseline_avg: Option<f64>,
        current_avg: Option<f64>,
        pct: impl Fn(f64, f64) -> Option<f64>,
    ) -> CategoryDelta {
        let change = match (baseline_avg, current_avg) {
            (Some(base), Some(cur)) => pct(base, cur),
            _ => None,
        };
        CategoryDelta {
            category: category.to_string(),
            baseline_avg,
            current_avg,
            improvement_pct: change.unwrap_or(0.0),
            comparable: change.is_some(),
        }
    }
}
