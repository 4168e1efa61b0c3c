//! Cancellable phase deadlines.
//!
//! A [`PhaseTimer`] is a deferred "advance the phase" task. It does not run on
//! its own; the session polls it. The timer only reports due if its
//! [`CancelToken`] is still live at that moment, so a deadline scheduled before
//! a pause or cancel can never advance a later phase.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Shared cancellation flag.
///
/// Clones observe the same flag. A host that drives wake-ups from its own
/// event loop clones [`CaptureSession::pending_timer`](super::CaptureSession::pending_timer)
/// onto that loop; the clone stops reporting due as soon as the session
/// pauses or resets, from whichever thread checks it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, live token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the token and every clone of it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether the token was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A deadline paired with the token that can void it.
#[derive(Debug, Clone)]
pub struct PhaseTimer {
    /// `None` when the deadline lies beyond what [`Instant`] can represent.
    deadline: Option<Instant>,
    token: CancelToken,
}

impl PhaseTimer {
    /// Schedules a timer `after` the given instant.
    ///
    /// A budget too large to add to `now` yields a timer that never fires.
    #[must_use]
    pub fn schedule(now: Instant, after: Duration) -> Self {
        Self {
            deadline: now.checked_add(after),
            token: CancelToken::new(),
        }
    }

    /// When the timer fires, or `None` if it never does.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancels the timer.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the timer was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the deadline has passed and the timer is still live.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        !self.is_cancelled() && self.deadline.is_some_and(|d| now >= d)
    }
}
