use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Handle to a background task that runs a sweep callback on a fixed interval.
///
/// The task runs until [`Sweeper::stop`] is called, the handle is dropped,
/// or the callback returns `false`.
pub(crate) struct Sweeper {
    /// Sender to signal shutdown to the sweep task
    shutdown_tx: watch::Sender<bool>,
    stopped: AtomicBool,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Spawns the sweep task on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context, or if `interval`
    /// is zero.
    pub(crate) fn spawn<F>(interval: Duration, sweep: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        // Give a clear message instead of the generic one from tokio::spawn.
        if tokio::runtime::Handle::try_current().is_err() {
            panic!(
                "ttlcache_core::Store with a sweep interval requires a Tokio runtime. \
                 Create the store from within a #[tokio::main] or #[tokio::test] context, \
                 or disable the sweeper with StoreConfig::without_sweeper()."
            );
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run(interval, sweep, shutdown_rx));

        Self {
            shutdown_tx,
            stopped: AtomicBool::new(false),
            handle,
        }
    }

    /// Signals the task to stop.
    ///
    /// Returns `true` for the call that delivered the signal and `false`
    /// for every later call.
    pub(crate) fn stop(&self) -> bool {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return false;
        }
        // The task may already be gone if the store was dropped.
        let _ = self.shutdown_tx.send(true);
        true
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run<F>(interval: Duration, mut sweep: F, mut shutdown_rx: watch::Receiver<bool>)
where
    F: FnMut() -> bool,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Skip the first immediate tick - we want to wait for the interval first
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !sweep() {
                    tracing::debug!("sweep target dropped, stopping sweeper");
                    break;
                }
            }
            changed = shutdown_rx.changed() => {
                // A closed channel means the handle is gone.
                if changed.is_err() || *shutdown_rx.borrow() {
                    tracing::debug!("sweeper stopped");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn counting_sweeper(interval: Duration) -> (Sweeper, Arc<AtomicUsize>) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let sweeper = Sweeper::spawn(interval, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });
        (sweeper, ticks)
    }

    #[tokio::test]
    async fn test_ticks_on_interval() {
        let (sweeper, ticks) = counting_sweeper(Duration::from_millis(20));

        tokio::time::sleep(Duration::from_millis(110)).await;

        assert!(ticks.load(Ordering::SeqCst) >= 2);
        assert!(sweeper.is_running());
    }

    #[tokio::test]
    async fn test_first_tick_waits_for_interval() {
        let (_sweeper, ticks) = counting_sweeper(Duration::from_secs(3600));

        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stop_is_reported_once() {
        let (sweeper, _ticks) = counting_sweeper(Duration::from_millis(10));

        assert!(sweeper.stop());
        assert!(!sweeper.stop());
        assert!(!sweeper.stop());
    }

    #[tokio::test]
    async fn test_stop_halts_ticks() {
        let (sweeper, ticks) = counting_sweeper(Duration::from_millis(10));

        sweeper.stop();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!sweeper.is_running());
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_callback_returning_false_ends_task() {
        let sweeper = Sweeper::spawn(Duration::from_millis(10), || false);

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!sweeper.is_running());
        // Stopping a finished task is still fine
        assert!(sweeper.stop());
    }

    #[test]
    #[should_panic(expected = "requires a Tokio runtime")]
    fn test_spawn_outside_runtime_panics() {
        let _ = Sweeper::spawn(Duration::from_secs(1), || true);
    }
}
