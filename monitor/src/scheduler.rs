//! Cancellable periodic tasks driving the frame and resource collectors

use crate::error::{MonitorError, Result};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A repeating tick on the current tokio runtime.
///
/// `stop()` cancels cooperatively: a tick body that is already running
/// completes, and no further tick is armed afterwards.
pub struct PeriodicTask {
    name: &'static str,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn `tick` every `period`. Fails when called outside a tokio runtime.
    pub fn spawn<F>(name: &'static str, period: Duration, mut tick: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let runtime = Handle::try_current()
            .map_err(|e| MonitorError::Scheduling(format!("{}: {}", name, e)))?;

        let token = CancellationToken::new();
        let child = token.clone();
        let period = period.max(Duration::from_millis(1));

        let handle = runtime.spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately.
            interval.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = child.cancelled() => break,
                    _ = interval.tick() => {
                        if child.is_cancelled() {
                            break;
                        }
                        tick();
                    }
                }
            }
            debug!(task = name, "Periodic task exited");
        });

        Ok(Self { name, token, handle })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Request cancellation; the task exits at its next await point.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Cancel and wait for the task to exit.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        let _ = (&mut self.handle).await;
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_spawn_outside_runtime_fails() {
        let result = PeriodicTask::spawn("orphan", Duration::from_millis(10), || {});
        assert!(matches!(result, Err(MonitorError::Scheduling(_))));
    }

    #[tokio::test]
    async fn test_ticks_until_stopped() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let task = PeriodicTask::spawn("counter", Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        time::sleep(Duration::from_millis(60)).await;
        task.shutdown().await;

        let after_stop = ticks.load(Ordering::SeqCst);
        assert!(after_stop > 0);

        time::sleep(Duration::from_millis(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test]
    async fn test_stop_handle_finishes_task() {
        let task = PeriodicTask::spawn("idle", Duration::from_millis(5), || {}).unwrap();
        assert_eq!(task.name(), "idle");
        task.stop();
        time::sleep(Duration::from_millis(20)).await;
        assert!(task.is_finished());
    }
}
