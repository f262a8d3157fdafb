//! Collection Context
//!
//! Cancellation plus an optional deadline, handed down from the HTTP
//! request to every client call of a collection.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::ports::ClientError;

/// Request-scoped execution context.
#[derive(Debug, Clone)]
pub struct CollectContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CollectContext {
    /// Root context without a deadline.
    #[must_use]
    pub const fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Derive a child context. A zero timeout keeps the parent's deadline.
    #[must_use]
    pub fn child(&self, timeout: Duration) -> Self {
        let deadline = if timeout.is_zero() {
            self.deadline
        } else {
            let own = Instant::now() + timeout;
            Some(self.deadline.map_or(own, |parent| parent.min(own)))
        };
        Self {
            cancel: self.cancel.child_token(),
            deadline,
        }
    }

    /// Token observed by client calls.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Guard that cancels this context when dropped.
    #[must_use]
    pub fn cancel_on_drop(&self) -> DropGuard {
        self.cancel.clone().drop_guard()
    }

    /// Drive `fut` until it completes, the context is cancelled or the
    /// deadline passes. On deadline the token is cancelled as well so the
    /// client sees it.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(ClientError::Cancelled),
            () = expired => {
                self.cancel.cancel();
                Err(ClientError::DeadlineExceeded)
            }
            result = fut => result,
        }
    }
}
