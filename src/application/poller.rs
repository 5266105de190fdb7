//! Owned, cancellable polling task.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Handle to a running poll loop.
///
/// The loop lives exactly as long as this handle: `shutdown` stops it
/// after the current tick, dropping the handle aborts it.
#[derive(Debug)]
pub struct PollHandle {
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
    interval: Duration,
}

impl PollHandle {
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    /// Stop the loop and wait for the tick in progress, if any
    pub async fn shutdown(mut self) {
        self.stop.send(true).ok();
        if let Some(task) = self.task.take() {
            task.await.ok();
        }
        tracing::debug!("Poller stopped");
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("Poller aborted on drop");
        }
    }
}

/// Run `tick` now and then every `interval` until the handle goes away
pub fn spawn_poller<F, Fut>(interval: Duration, tick: F) -> PollHandle
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (stop, mut stop_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => tick().await,
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }
    });

    tracing::debug!("Poller started, interval {:?}", interval);
    PollHandle { stop, task: Some(task), interval }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_poller(interval: Duration) -> (PollHandle, Arc<AtomicUsize>) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let handle = spawn_poller(interval, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (handle, ticks)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_immediately_then_on_interval() {
        let (handle, ticks) = counting_poller(Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(65)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert!(handle.is_running());
        assert_eq!(handle.interval(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_tears_down_loop() {
        let (handle, ticks) = counting_poller(Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        drop(handle);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_loop() {
        let (handle, ticks) = counting_poller(Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(15)).await;

        handle.shutdown().await;
        let after_shutdown = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), after_shutdown);
        assert_eq!(after_shutdown, 2);
    }
}
