//! Registry of animations the host reports as running
//!
//! The host animation system calls `register` when a visual effect starts and
//! `unregister` when it ends. The active count feeds the resource estimate.

use crate::alerts::AlertEngine;
use crate::metrics::MetricsRegistry;
use crate::utils::sync::{read, write};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Identifier handed back by [`AnimationRegistry::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimationId(Uuid);

impl AnimationId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Description of a running animation, as reported by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationProfile {
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<f64>,
    /// Whether the animation runs off the UI thread
    #[serde(default)]
    pub uses_native_driver: bool,
}

impl AnimationProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            duration_ms: None,
            uses_native_driver: false,
        }
    }

    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn native(mut self) -> Self {
        self.uses_native_driver = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredAnimation {
    pub id: AnimationId,
    pub profile: AnimationProfile,
    pub started_at: DateTime<Utc>,
}

pub struct AnimationRegistry {
    alerts: Arc<AlertEngine>,
    metrics: Option<Arc<MetricsRegistry>>,
    active: RwLock<Vec<RegisteredAnimation>>,
}

impl AnimationRegistry {
    pub fn new(alerts: Arc<AlertEngine>) -> Self {
        Self {
            alerts,
            metrics: None,
            active: RwLock::new(Vec::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn register(&self, profile: AnimationProfile) -> AnimationId {
        let id = AnimationId::new();
        debug!(animation = %profile.name, %id, "Animation registered");

        let count = {
            let mut active = write(&self.active);
            active.push(RegisteredAnimation {
                id,
                profile,
                started_at: Utc::now(),
            });
            active.len()
        };

        if let Some(metrics) = &self.metrics {
            metrics.set_active_animations(count);
        }
        if let Some(alert) = self.alerts.check_animation_load(count) {
            self.alerts.emit(alert);
        }
        id
    }

    /// Returns `false` for an unknown or already removed id
    pub fn unregister(&self, id: AnimationId) -> bool {
        let (removed, count) = {
            let mut active = write(&self.active);
            let before = active.len();
            active.retain(|a| a.id != id);
            (active.len() != before, active.len())
        };
        if removed {
            if let Some(metrics) = &self.metrics {
                metrics.set_active_animations(count);
            }
        }
        removed
    }

    pub fn active_count(&self) -> usize {
        read(&self.active).len()
    }

    pub fn profiles(&self) -> Vec<RegisteredAnimation> {
        read(&self.active).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AlertThresholds;
    use crate::types::{AlertSeverity, AlertType};

    fn registry() -> (AnimationRegistry, Arc<AlertEngine>) {
        let alerts = Arc::new(AlertEngine::new(AlertThresholds::default(), 50));
        (AnimationRegistry::new(alerts.clone()), alerts)
    }

    #[test]
    fn test_register_and_unregister() {
        let (registry, _) = registry();
        let fade = registry.register(AnimationProfile::new("fade").with_duration(300.0));
        let slide = registry.register(AnimationProfile::new("slide").with_kind("spring").native());

        assert_eq!(registry.active_count(), 2);
        assert_ne!(fade, slide);

        assert!(registry.unregister(fade));
        assert!(!registry.unregister(fade));

        let profiles = registry.profiles();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].profile.name, "slide");
        assert!(profiles[0].profile.uses_native_driver);
    }

    #[test]
    fn test_too_many_animations_warns() {
        let (registry, alerts) = registry();
        for i in 0..10 {
            registry.register(AnimationProfile::new(format!("a{}", i)));
        }
        assert_eq!(alerts.total_emitted(), 0);

        registry.register(AnimationProfile::new("one-too-many"));
        let recent = alerts.recent_alerts(1);
        assert_eq!(recent[0].alert_type, AlertType::MemoryWarning);
        assert_eq!(recent[0].severity, AlertSeverity::Medium);
        assert_eq!(recent[0].metrics_snapshot.get("active_animations"), Some(&11.0));
    }
}
