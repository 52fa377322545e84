//! Per-request execution context
//!
//! Every store call made on behalf of a request runs through
//! [`RequestContext::run`], which races it against the request's
//! cancellation token and deadline.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::errors::StoreError;

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share an existing token, e.g. one owned by the transport layer
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Apply `timeout` only when no deadline was set by the caller
    pub fn with_timeout_if_unset(self, timeout: Option<Duration>) -> Self {
        match (self.deadline, timeout) {
            (None, Some(timeout)) => self.with_timeout(timeout),
            _ => self,
        }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Time left before the deadline, if there is one
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Drive `operation` unless the request is cancelled or runs out of time first
    pub async fn run<F, T>(&self, operation: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        if self.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let guarded = async {
            tokio::select! {
                biased;
                () = self.cancellation.cancelled() => Err(StoreError::Cancelled),
                result = operation => result,
            }
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, guarded)
                .await
                .unwrap_or(Err(StoreError::DeadlineExceeded)),
            None => guarded.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_passes_result_through() {
        let ctx = RequestContext::new();
        let value = ctx.run(async { Ok::<_, StoreError>(42) }).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_already_cancelled_short_circuits() {
        let ctx = RequestContext::new();
        ctx.cancel();
        let result = ctx.run(async { Ok::<_, StoreError>(1) }).await;
        assert_eq!(result, Err(StoreError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_while_pending() {
        let ctx = RequestContext::new();
        let token = ctx.cancellation_token().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, StoreError>(())
            })
            .await;
        assert_eq!(result, Err(StoreError::Cancelled));
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(20));
        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, StoreError>(())
            })
            .await;
        assert_eq!(result, Err(StoreError::DeadlineExceeded));
    }

    #[test]
    fn test_timeout_if_unset_keeps_caller_deadline() {
        let ctx = RequestContext::new().with_timeout(Duration::from_secs(1));
        let deadline = ctx.deadline();
        let ctx = ctx.with_timeout_if_unset(Some(Duration::from_secs(60)));
        assert_eq!(ctx.deadline(), deadline);

        let ctx = RequestContext::new().with_timeout_if_unset(None);
        assert!(ctx.deadline().is_none());
    }
}
