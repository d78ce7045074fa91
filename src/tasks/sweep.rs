//! Expiration Sweep Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

// == Sweep Trait ==
/// Something the sweep task can purge expired entries from.
pub trait Sweep: Send + Sync + 'static {
    /// Removes every expired entry and returns how many were removed.
    fn sweep_expired(&self) -> usize;
}

/// Spawns a background task that sweeps `target` every `interval`.
///
/// The task only holds a weak reference, so it exits on its own once the
/// target is dropped. Notifying `shutdown` stops it at the next wake-up; a
/// notification sent before the task first waits is not lost.
///
/// `interval` must be non-zero.
///
/// # Example
/// ```ignore
/// let shutdown = Arc::new(Notify::new());
/// let handle = spawn_sweep_task(&Handle::current(), Arc::downgrade(&cache), Duration::from_secs(1), shutdown.clone());
/// // Later:
/// shutdown.notify_one();
/// handle.await?;
/// ```
pub fn spawn_sweep_task<S: Sweep>(
    runtime: &Handle,
    target: Weak<S>,
    interval: Duration,
    shutdown: Arc<Notify>,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        info!(
            "Starting expiration sweep task with interval of {} ms",
            interval.as_millis()
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.notified() => {
                    info!("Expiration sweep task stopped by shutdown request");
                    break;
                }
                _ = ticker.tick() => {
                    let Some(target) = target.upgrade() else {
                        info!("Expiration sweep task stopped: cache dropped");
                        break;
                    };
                    let removed = target.sweep_expired();

                    if removed > 0 {
                        info!("Expiration sweep: removed {} expired entries", removed);
                    } else {
                        debug!("Expiration sweep: no expired entries found");
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingTarget {
        passes: AtomicUsize,
    }

    impl Sweep for CountingTarget {
        fn sweep_expired(&self) -> usize {
            self.passes.fetch_add(1, Ordering::SeqCst);
            0
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_task_runs_every_interval() {
        let target = Arc::new(CountingTarget::default());
        let shutdown = Arc::new(Notify::new());
        let handle = spawn_sweep_task(
            &Handle::current(),
            Arc::downgrade(&target),
            Duration::from_secs(1),
            shutdown.clone(),
        );

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(target.passes.load(Ordering::SeqCst), 3);

        shutdown.notify_one();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_task_stops_on_shutdown() {
        let target = Arc::new(CountingTarget::default());
        let shutdown = Arc::new(Notify::new());

        // Signal before the task has even started waiting
        shutdown.notify_one();
        let handle = spawn_sweep_task(
            &Handle::current(),
            Arc::downgrade(&target),
            Duration::from_secs(1),
            shutdown,
        );

        handle.await.unwrap();
        assert_eq!(target.passes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_task_stops_when_target_dropped() {
        let target = Arc::new(CountingTarget::default());
        let handle = spawn_sweep_task(
            &Handle::current(),
            Arc::downgrade(&target),
            Duration::from_secs(1),
            Arc::new(Notify::new()),
        );

        drop(target);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(handle.is_finished(), "Task should exit once the cache is gone");
    }
}
