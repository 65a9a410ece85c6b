//! Caller context for quote requests.
//!
//! A [`FetchContext`] carries the caller's deadline and an optional
//! cancellation signal down through the service, the orchestrator and every
//! provider call. Dropping the request future also aborts in-flight work;
//! the context exists for callers that need to abort from elsewhere.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::errors::MarketDataError;

/// Deadline and cancellation signal for one request.
#[derive(Clone, Debug, Default)]
pub struct FetchContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Handle that cancels every context cloned from its pair.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // Receivers may all be gone already; nothing left to cancel then.
        let _ = self.sender.send(true);
    }
}

impl FetchContext {
    /// Context without deadline or cancellation.
    pub fn background() -> Self {
        Self::default()
    }

    /// Context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Attach a cancellation signal and return the handle that fires it.
    pub fn cancellable(mut self) -> (Self, CancelHandle) {
        let (sender, receiver) = watch::channel(false);
        self.cancel = Some(receiver);
        (self, CancelHandle { sender })
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail fast when the context is already done.
    pub fn check(&self) -> Result<(), MarketDataError> {
        if let Some(cancel) = &self.cancel {
            if *cancel.borrow() {
                return Err(MarketDataError::Cancelled);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(MarketDataError::DeadlineExceeded);
            }
        }
        Ok(())
    }

    /// Run `future` until it completes or the context is done.
    ///
    /// When the context fires first, the future is dropped, which aborts any
    /// in-flight HTTP request it owns.
    pub async fn run<F>(&self, future: F) -> Result<F::Output, MarketDataError>
    where
        F: Future,
    {
        self.check()?;

        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            output = future => Ok(output),
            _ = wait_cancelled(self.cancel.clone()) => Err(MarketDataError::Cancelled),
            _ = expired => Err(MarketDataError::DeadlineExceeded),
        }
    }
}

/// Resolves once the signal turns true; never resolves without a signal.
async fn wait_cancelled(cancel: Option<watch::Receiver<bool>>) {
    let Some(mut receiver) = cancel else {
        return std::future::pending().await;
    };

    loop {
        if *receiver.borrow_and_update() {
            return;
        }
        if receiver.changed().await.is_err() {
            // Handle dropped without cancelling
            return std::future::pending().await;
        }
    }
}
