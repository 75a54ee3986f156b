//! Caller context carrying an optional deadline and a cancellation token.
//!
//! Every network step runs through [`Context::guard`], so an expired
//! deadline or a cancelled token aborts the step instead of blocking.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Deadline and cancellation carried through every device operation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl Context {
    /// A context with no deadline that is never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().deadline_at(Instant::now() + timeout)
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::background().deadline_at(deadline)
    }

    /// A context driven by an existing cancellation token.
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self {
            deadline: None,
            cancel,
        }
    }

    /// Derives a context cancelled together with `self`, keeping the
    /// earlier of the two deadlines.
    pub fn child(&self, timeout: Option<Duration>) -> Self {
        let own = timeout.map(|t| Instant::now() + t);
        let deadline = match (self.deadline, own) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self {
            deadline,
            cancel: self.cancel.child_token(),
        }
    }

    fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// The caller's deadline, if one was set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancels this context and every child derived from it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True once this context or its parent was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The caller's deadline, or `fallback` from now if there is none.
    pub fn deadline_or(&self, fallback: Duration) -> Instant {
        self.deadline.unwrap_or_else(|| Instant::now() + fallback)
    }

    /// Runs `fut` until it finishes, `deadline` passes, or the context is
    /// cancelled.
    ///
    /// Expiry maps to `TimedOut` and cancellation to `Interrupted`.
    pub async fn guard<T, F>(&self, deadline: Instant, fut: F) -> io::Result<T>
    where
        F: Future<Output = io::Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                Err(io::Error::new(io::ErrorKind::Interrupted, "operation cancelled"))
            }
            res = tokio::time::timeout_at(deadline, fut) => match res {
                Ok(res) => res,
                Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "deadline exceeded")),
            },
        }
    }
}
