use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::core::throttle::{LoginThrottle, ThrottleStatus};

/// Throttle shared between request handlers and its unlock watcher
pub type SharedThrottle = Arc<Mutex<LoginThrottle>>;

pub const DEFAULT_UNLOCK_TICK: Duration = Duration::from_secs(1);

/// Background task that re-checks a locked throttle on a fixed period
///
/// Each tick publishes the current [`ThrottleStatus`] so a live countdown
/// can be rendered without user action. The task ends on its own once the
/// throttle is open again, and is aborted by [`UnlockWatcher::cancel`] or
/// when the watcher is dropped.
pub struct UnlockWatcher {
    handle: JoinHandle<()>,
    status: watch::Receiver<ThrottleStatus>,
}

impl UnlockWatcher {
    /// Start watching `throttle`; `initial` is the status observed at lock time
    pub fn spawn(throttle: SharedThrottle, tick: Duration, initial: ThrottleStatus) -> Self {
        let (tx, rx) = watch::channel(initial);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                let status = throttle.lock().await.status(Utc::now());
                let open = !status.is_locked();
                tx.send_replace(status);

                if open {
                    tracing::debug!("Unlock watcher observed open throttle, stopping");
                    break;
                }
            }
        });

        Self { handle, status: rx }
    }

    /// Receiver for the status published on every tick
    pub fn subscribe(&self) -> watch::Receiver<ThrottleStatus> {
        self.status.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for UnlockWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
