//! Debounced autosuggest.
//!
//! Each keystroke cancels the pending timer and, when the input is long
//! enough, arms a new single-shot task. Every armed task gets a sequence
//! number; responses carrying anything but the latest one are stale and
//! dropped by the session.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Delay between the last keystroke and the suggestion request.
pub const SUGGEST_DELAY: Duration = Duration::from_millis(300);

/// Inputs shorter than this (after trimming) never reach the network.
pub const MIN_SUGGEST_CHARS: usize = 2;

/// Whether `input` is long enough to ask for suggestions.
pub fn wants_suggestions(input: &str) -> bool {
    input.trim().chars().count() >= MIN_SUGGEST_CHARS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    Pending { seq: u64 },
}

/// Hands out monotonically increasing sequence numbers and remembers the
/// most recent one.
#[derive(Debug, Default, Clone)]
pub struct SuggestTracker {
    latest: u64,
}

impl SuggestTracker {
    pub fn next_seq(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    /// Invalidate every ticket handed out so far.
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }

    pub fn is_latest(&self, seq: u64) -> bool {
        seq == self.latest
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }
}

/// A cancellable single-shot scheduled task. Arming always cancels the
/// previous timer first, so at most one timer is pending at a time.
///
/// Cancellation only covers the waiting phase: once the delay elapses the
/// action runs as its own task and is left to complete.
pub struct Debouncer {
    delay: Duration,
    pending: Option<(u64, JoinHandle<()>)>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Schedule `action` after the delay, replacing any pending timer.
    /// Must be called from within a tokio runtime.
    pub fn arm<F>(&mut self, seq: u64, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(action);
        });
        self.pending = Some((seq, handle));
    }

    /// Cancel the pending timer; returns whether one was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some((seq, handle)) if !handle.is_finished() => {
                handle.abort();
                tracing::debug!(seq, "suggest_timer_cancelled");
                true
            }
            _ => false,
        }
    }

    pub fn state(&self) -> DebounceState {
        match &self.pending {
            Some((seq, handle)) if !handle.is_finished() => DebounceState::Pending { seq: *seq },
            _ => DebounceState::Idle,
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
