//! Sample collectors
//!
//! Each collector exclusively owns its buffer. Readers (the scoring engine,
//! report builders) only receive copies.

pub mod frame;
pub mod interaction;
pub mod network;
pub mod resource;

pub use frame::FrameMetricsCollector;
pub use interaction::InteractionLatencyTracker;
pub use network::{NetworkInstrument, NetworkLatencyTracker, ResponseSize};
pub use resource::{MemoryProbe, NoopProbe, ResourceMetricsCollector, SysinfoProbe};

use crate::error::Result;
use std::collections::HashSet;
use tracing::debug;

/// Common surface the monitor uses to manage every collector
pub trait MonitoringComponent: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the collector is currently producing samples
    fn is_running(&self) -> bool;

    fn sample_count(&self) -> usize;

    /// Drop all retained samples and counters
    fn clear(&self);

    /// Current state as JSON for diagnostics output
    fn snapshot(&self) -> Result<serde_json::Value>;
}

/// Insert `key` into the per-period slow-note set, returning whether it is new.
/// The set holds at most `limit` keys; reaching the limit starts a fresh period.
pub(crate) fn note_slow(noted: &mut HashSet<String>, key: String, limit: usize) -> bool {
    if noted.contains(&key) {
        return false;
    }
    if noted.len() >= limit {
        debug!(limit, "Slow note set full, starting a new period");
        noted.clear();
    }
    noted.insert(key)
}
