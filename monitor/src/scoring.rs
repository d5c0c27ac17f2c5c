//! Score computation over the collectors' recent samples
//!
//! The score starts at 100 and each category that misses its platform target
//! deducts a fixed number of points. Deductions are independent and additive;
//! the result is clamped to `[0, 100]`. A category with no samples deducts
//! nothing.

use crate::config::{PlatformTargets, ScoringWeights};
use crate::types::{FrameSample, InteractionSample, NetworkSample, ResourceSample};
use crate::utils::stats::{clamp_score, mean_of};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Borrowed view over the four sample buffers
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringInput<'a> {
    pub frames: &'a [FrameSample],
    pub resources: &'a [ResourceSample],
    pub interactions: &'a [InteractionSample],
    pub network: &'a [NetworkSample],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionCategory {
    FrameTime,
    Memory,
    InteractionLatency,
    NetworkLatency,
    InteractionFailure,
    NetworkFailure,
}

impl DeductionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeductionCategory::FrameTime => "frame_time",
            DeductionCategory::Memory => "memory",
            DeductionCategory::InteractionLatency => "interaction_latency",
            DeductionCategory::NetworkLatency => "network_latency",
            DeductionCategory::InteractionFailure => "interaction_failure",
            DeductionCategory::NetworkFailure => "network_failure",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            DeductionCategory::FrameTime => {
                "Reduce work on the UI thread: memoize expensive renders and move animations to the native driver"
            }
            DeductionCategory::Memory => {
                "Lower memory pressure: limit concurrent animations and release offscreen resources"
            }
            DeductionCategory::InteractionLatency => {
                "Speed up interaction handlers: defer non-critical work until after the response is visible"
            }
            DeductionCategory::NetworkLatency => {
                "Reduce request latency: cache responses, batch calls and shrink payloads"
            }
            DeductionCategory::InteractionFailure | DeductionCategory::NetworkFailure => {
                "Investigate failing operations: add retries and surface error states to the user"
            }
        }
    }
}

impl fmt::Display for DeductionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One triggered deduction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deduction {
    pub category: DeductionCategory,
    pub points: f64,
    /// Observed value: an average, the latest estimate, or a failure count
    pub observed: f64,
    pub target: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub score: f64,
    pub deductions: Vec<Deduction>,
}

pub struct ScoringEngine {
    weights: ScoringWeights,
    targets: PlatformTargets,
    window: usize,
}

fn window<T>(samples: &[T], size: usize) -> &[T] {
    &samples[samples.len().saturating_sub(size)..]
}

impl ScoringEngine {
    pub fn new(weights: ScoringWeights, targets: PlatformTargets, window: usize) -> Self {
        Self {
            weights,
            targets,
            window: window.max(1),
        }
    }

    pub fn targets(&self) -> &PlatformTargets {
        &self.targets
    }

    pub fn compute_score(&self, input: &ScoringInput<'_>) -> ScoreBreakdown {
        let frames = window(input.frames, self.window);
        let interactions = window(input.interactions, self.window);
        let network = window(input.network, self.window);
        let mut deductions = Vec::new();

        if let Some(avg) = mean_of(frames.iter().map(|s| s.frame_time_ms)) {
            if avg > self.targets.frame_time_ms {
                deductions.push(Deduction {
                    category: DeductionCategory::FrameTime,
                    points: self.weights.frame_time,
                    observed: avg,
                    target: self.targets.frame_time_ms,
                });
            }
        }

        if let Some(latest) = input.resources.last() {
            if latest.used_memory_estimate > self.targets.memory_ceiling {
                deductions.push(Deduction {
                    category: DeductionCategory::Memory,
                    points: self.weights.memory,
                    observed: latest.used_memory_estimate,
                    target: self.targets.memory_ceiling,
                });
            }
        }

        if let Some(avg) = mean_of(interactions.iter().map(|s| s.response_time_ms)) {
            if avg > self.targets.interaction_ms {
                deductions.push(Deduction {
                    category: DeductionCategory::InteractionLatency,
                    points: self.weights.interaction,
                    observed: avg,
                    target: self.targets.interaction_ms,
                });
            }
        }

        if let Some(avg) = mean_of(network.iter().map(|s| s.response_time_ms)) {
            if avg > self.targets.network_ms {
                deductions.push(Deduction {
                    category: DeductionCategory::NetworkLatency,
                    points: self.weights.network,
                    observed: avg,
                    target: self.targets.network_ms,
                });
            }
        }

        let failed_interactions = interactions.iter().filter(|s| !s.succeeded).count();
        if failed_interactions > 0 {
            deductions.push(Deduction {
                category: DeductionCategory::InteractionFailure,
                points: self.weights.failure * failed_interactions as f64,
                observed: failed_interactions as f64,
                target: 0.0,
            });
        }

        let failed_requests = network.iter().filter(|s| !s.succeeded).count();
        if failed_requests > 0 {
            deductions.push(Deduction {
                category: DeductionCategory::NetworkFailure,
                points: self.weights.failure * failed_requests as f64,
                observed: failed_requests as f64,
                target: 0.0,
            });
        }

        let total: f64 = deductions.iter().map(|d| d.points).sum();
        ScoreBreakdown {
            score: clamp_score(100.0 - total),
            deductions,
        }
    }

    /// One remediation per triggered category, duplicates removed, in
    /// descending order of points deducted
    pub fn generate_recommendations(&self, deductions: &[Deduction]) -> Vec<String> {
        let mut ranked: Vec<&Deduction> = deductions.iter().collect();
        ranked.sort_by(|a, b| b.points.total_cmp(&a.points));

        let mut recommendations: Vec<String> = Vec::new();
        for deduction in ranked {
            let text = deduction.category.recommendation();
            if !recommendations.iter().any(|r| r == text) {
                recommendations.push(text.to_string());
            }
        }
        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformTargetTable;
    use crate::types::{Platform, PressureLevel};
    use chrono::Utc;
    use proptest::prelude::*;

    fn engine() -> ScoringEngine {
        ScoringEngine::new(
            ScoringWeights::default(),
            PlatformTargetTable::default().for_platform(Platform::Ios).clone(),
            60,
        )
    }

    fn frame(ms: f64) -> FrameSample {
        FrameSample {
            timestamp: Utc::now(),
            frame_time_ms: ms,
            fps: 1000.0 / ms,
            dropped_frame_count: 0,
        }
    }

    fn resource(estimate: f64) -> ResourceSample {
        ResourceSample {
            timestamp: Utc::now(),
            used_memory_estimate: estimate,
            pressure_level: PressureLevel::Low,
            active_animations: 0,
            process_memory_mb: None,
        }
    }

    fn interaction(ms: f64, succeeded: bool) -> InteractionSample {
        InteractionSample {
            timestamp: Utc::now(),
            event_type: "tap".to_string(),
            response_time_ms: ms,
            component_name: None,
            succeeded,
        }
    }

    fn request(ms: f64, succeeded: bool) -> NetworkSample {
        NetworkSample {
            timestamp: Utc::now(),
            url: "https://api.test".to_string(),
            method: "GET".to_string(),
            response_time_ms: ms,
            byte_size: 0,
            succeeded,
            error_message: None,
        }
    }

    #[test]
    fn test_empty_input_scores_100() {
        let breakdown = engine().compute_score(&ScoringInput::default());
        assert_eq!(breakdown.score, 100.0);
        assert!(breakdown.deductions.is_empty());
    }

    #[test]
    fn test_healthy_samples_keep_full_score() {
        let frames = vec![frame(16.0); 30];
        let interactions = vec![interaction(40.0, true); 5];
        let breakdown = engine().compute_score(&ScoringInput {
            frames: &frames,
            interactions: &interactions,
            ..Default::default()
        });
        assert_eq!(breakdown.score, 100.0);
    }

    #[test]
    fn test_independent_deductions() {
        let frames = vec![frame(25.0); 10];
        let resources = vec![resource(1.0), resource(7.5)];
        let interactions = vec![interaction(150.0, true), interaction(90.0, false)];
        let network = vec![request(3500.0, false), request(3100.0, true)];

        let engine = engine();
        let breakdown = engine.compute_score(&ScoringInput {
            frames: &frames,
            resources: &resources,
            interactions: &interactions,
            network: &network,
        });

        // 10 + 15 + 10 + 15 + 5 + 5
        assert_eq!(breakdown.score, 40.0);
        assert_eq!(breakdown.deductions.len(), 6);

        let recommendations = engine.generate_recommendations(&breakdown.deductions);
        // Both failure categories share one remediation
        assert_eq!(recommendations.len(), 5);
        assert!(recommendations[0].contains("memory") || recommendations[0].contains("latency"));
    }

    #[test]
    fn test_only_recent_window_is_scored() {
        let engine = ScoringEngine::new(
            ScoringWeights::default(),
            PlatformTargetTable::default().ios,
            5,
        );
        let mut frames = vec![frame(40.0); 20];
        frames.extend(vec![frame(16.0); 5]);
        let breakdown = engine.compute_score(&ScoringInput {
            frames: &frames,
            ..Default::default()
        });
        assert_eq!(breakdown.score, 100.0);
    }

    #[test]
    fn test_many_failures_clamp_at_zero() {
        let network = vec![request(10.0, false); 40];
        let breakdown = engine().compute_score(&ScoringInput {
            network: &network,
            ..Default::default()
        });
        assert_eq!(breakdown.score, 0.0);
    }

    proptest! {
        #[test]
        fn prop_score_always_bounded(
            frame_times in prop::collection::vec(0.1f64..500.0, 0..80),
            estimates in prop::collection::vec(0.0f64..50.0, 0..10),
            latencies in prop::collection::vec((0.0f64..10_000.0, any::<bool>()), 0..80),
        ) {
            let frames: Vec<_> = frame_times.iter().map(|ms| frame(*ms)).collect();
            let resources: Vec<_> = estimates.iter().map(|e| resource(*e)).collect();
            let interactions: Vec<_> = latencies.iter().map(|(ms, ok)| interaction(*ms, *ok)).collect();
            let network: Vec<_> = latencies.iter().map(|(ms, ok)| request(*ms, *ok)).collect();

            let score = engine()
                .compute_score(&ScoringInput {
                    frames: &frames,
                    resources: &resources,
                    interactions: &interactions,
                    network: &network,
                })
                .score;
            prop_assert!((0.0..=100.0).contains(&score));
        }
    }
}
