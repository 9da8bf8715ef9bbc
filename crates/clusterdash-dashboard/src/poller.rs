use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::MIN_POLL_INTERVAL;

/// A running poll loop. Dropping the handle stops the loop.
pub struct PollHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel and wait for the loop task to exit.
    pub async fn join(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Run `refresh` now and then every `interval` until cancelled.
///
/// `interval` is raised to [`MIN_POLL_INTERVAL`] if shorter.
///
/// Refreshes never overlap: the next tick is only awaited once the previous
/// refresh finished, and late ticks are delayed rather than bunched. Once
/// `parent` or the returned handle is cancelled, `refresh` is not called
/// again and an in-flight refresh is dropped.
pub fn spawn_poll_loop<F, Fut>(
    name: &'static str,
    interval: Duration,
    parent: &CancellationToken,
    mut refresh: F,
) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let interval = interval.max(MIN_POLL_INTERVAL);
    let token = parent.child_token();
    let loop_token = token.clone();

    let task = tokio::spawn(async move {
        tracing::debug!(name, interval_ms = interval.as_millis() as u64, "poll loop started");
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = loop_token.cancelled() => break,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                biased;
                _ = loop_token.cancelled() => break,
                _ = refresh() => {}
            }
        }
        tracing::debug!(name, "poll loop stopped");
    });

    PollHandle {
        token,
        task: Some(task),
    }
}

/// Holds at most one poll loop for a state holder.
#[derive(Default)]
pub(crate) struct PollSlot {
    handle: Mutex<Option<PollHandle>>,
}

impl PollSlot {
    /// Install `handle`, stopping any loop it replaces.
    pub(crate) fn replace(&self, handle: PollHandle) {
        let previous = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        drop(previous);
    }

    /// Stop the current loop. Returns false if none was running.
    pub(crate) fn stop(&self) -> bool {
        let previous = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        previous.is_some()
    }

    pub(crate) fn is_running(&self) -> bool {
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_cancelled())
    }
}
