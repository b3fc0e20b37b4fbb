//! Deadlines passed explicitly into every store call.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use super::store::StoreError;

/// A point in time after which a store call must give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// A deadline `budget` from now.
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    /// The earlier of this deadline and `limit` from now.
    #[must_use]
    pub fn clamp(self, limit: Duration) -> Self {
        Self {
            at: self.at.min(Instant::now() + limit),
        }
    }

    /// Time left before expiry (zero once expired).
    #[must_use]
    pub fn remaining(self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// Returns true once the deadline has passed.
    #[must_use]
    pub fn is_expired(self) -> bool {
        Instant::now() >= self.at
    }

    /// Awaits `fut`, failing with [`StoreError::Timeout`] at the deadline.
    ///
    /// On expiry `fut` is dropped, which cancels whatever it was waiting on.
    pub async fn run<T, F>(self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout_at(self.at, fut)
            .await
            .unwrap_or(Err(StoreError::Timeout))
    }
}
