//! Per-lookup cancellation and deadline.

use crate::error::{LookupError, Result};
use licensure_core::JurisdictionCode;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Carried through every step of one lookup.
///
/// Network waits and the CAPTCHA poll delay run under [`LookupContext::guard`],
/// so cancelling the token or passing the deadline aborts the step in flight
/// instead of letting it finish.
#[derive(Debug, Clone, Default)]
pub struct LookupContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl LookupContext {
    /// A context that is never cancelled and has no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A context driven by an existing cancellation token.
    #[must_use]
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Set an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set a deadline relative to now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The cancellation token, for handing to collaborators such as the solver.
    #[must_use]
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Check if cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run one lookup step, aborting it on cancellation or deadline.
    pub async fn guard<T, F>(
        &self,
        state: &JurisdictionCode,
        step: &'static str,
        fut: F,
    ) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                debug!(state = %state, step, "lookup cancelled");
                Err(LookupError::Cancelled { state: state.to_string(), step })
            }
            () = wait_until(self.deadline) => {
                debug!(state = %state, step, "lookup deadline exceeded");
                Err(LookupError::DeadlineExceeded { state: state.to_string(), step })
            }
            outcome = fut => outcome,
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
