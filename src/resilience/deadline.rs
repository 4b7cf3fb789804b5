//! Deadline windows for pipeline stages.
//!
//! # Responsibilities
//! - Derive a bounded window for one stage from a parent window
//! - Anchor a fresh window that ignores the request's signal tree
//! - Drive a future inside a window, dropping it the instant the window closes
//! - Release the window (and everything derived from it) on every exit path
//!
//! # Window Tree per Request
//! ```text
//! inbound (root, request_ms)
//!     └── fetch (child, min(fetch_ms, inbound remaining))
//! persist (detached, persist_ms)
//! ```
//!
//! A child window closes at the earlier of its parent's cancellation or its
//! own deadline. Releasing a window cancels its children, never its parent.

use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Pipeline stage a window is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Inbound,
    Fetch,
    Persist,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Inbound => "inbound",
            Stage::Fetch => "fetch",
            Stage::Persist => "persist",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a window stopped accepting work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WindowClosed {
    /// The window's own deadline (or an inherited, earlier one) passed.
    #[error("{stage} deadline of {budget:?} exceeded")]
    DeadlineExceeded { stage: Stage, budget: Duration },

    /// The window, or a window it was derived from, was cancelled.
    #[error("{stage} window cancelled")]
    Cancelled { stage: Stage },
}

/// A time-bounded cancellation scope for one pipeline stage.
///
/// Dropping the window releases it. `release` exists for call sites that
/// want the release to be visible.
pub struct DeadlineWindow {
    stage: Stage,
    budget: Duration,
    deadline: Instant,
    token: CancellationToken,
}

impl DeadlineWindow {
    /// A top-level window with no parent.
    pub fn root(stage: Stage, budget: Duration) -> Self {
        Self {
            stage,
            budget,
            deadline: Instant::now() + budget,
            token: CancellationToken::new(),
        }
    }

    /// A window that closes when `parent` closes or `budget` elapses,
    /// whichever comes first.
    pub fn child(parent: &DeadlineWindow, stage: Stage, budget: Duration) -> Self {
        let own = Instant::now() + budget;
        Self {
            stage,
            budget,
            deadline: own.min(parent.deadline),
            token: parent.token.child_token(),
        }
    }

    /// A window anchored fresh, outside any request's signal tree.
    pub fn detached(stage: Stage, budget: Duration) -> Self {
        Self::root(stage, budget)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The budget this window was created with.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline; zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The cancellation signal observed by work running in this window.
    pub fn signal(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancel this window and every window derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Release the window now instead of at end of scope.
    pub fn release(self) {
        drop(self);
    }

    /// Current state, or the reason the window is closed.
    pub fn check(&self) -> Result<(), WindowClosed> {
        if self.token.is_cancelled() {
            return Err(WindowClosed::Cancelled { stage: self.stage });
        }
        if self.is_expired() {
            return Err(self.exceeded());
        }
        Ok(())
    }

    /// Drive `fut` inside the window.
    ///
    /// The future is never polled if the window is already closed, and is
    /// dropped as soon as the window closes while it is pending.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, WindowClosed>
    where
        F: Future,
    {
        self.check()?;

        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(WindowClosed::Cancelled { stage: self.stage }),
            () = tokio::time::sleep_until(self.deadline) => {
                self.token.cancel();
                Err(self.exceeded())
            }
            out = fut => Ok(out),
        }
    }

    fn exceeded(&self) -> WindowClosed {
        WindowClosed::DeadlineExceeded {
            stage: self.stage,
            budget: self.budget,
        }
    }
}

impl Drop for DeadlineWindow {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl fmt::Debug for DeadlineWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeadlineWindow")
            .field("stage", &self.stage)
            .field("budget", &self.budget)
            .field("remaining", &self.remaining())
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}
