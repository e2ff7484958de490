//! # Debouncer
//!
//! Cancellation-on-supersede scheduling for the search input: each call
//! cancels the previously scheduled dispatch, and only the last one runs once
//! the quiet period has elapsed.

use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::SearchConfig;

/// Delays work until calls stop arriving for `delay`.
///
/// Must be used from within a tokio runtime.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.debounce())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `task`, cancelling any dispatch that has not fired yet.
    ///
    /// A dispatch that already fired runs to completion.
    pub fn call<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(task);
        });

        if let Some(previous) = self.pending.lock().replace(timer) {
            previous.abort();
        }
    }

    /// Cancel the scheduled dispatch, if any.
    pub fn cancel(&self) {
        if let Some(timer) = self.pending.lock().take() {
            timer.abort();
        }
    }

    /// Whether a dispatch is waiting for the quiet period to end.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
