//! Errors that mean "try later" rather than "failed".
//!
//! They travel inside `anyhow::Error`; callers branch with
//! `err.downcast_ref::<LimitError>()`.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitError {
    /// Daily call budget used up for the subject. Not retried.
    #[error("Daily quota of {limit} calls exhausted for {subject}")]
    QuotaExhausted { subject: String, limit: u32 },

    /// Too many requests in the sliding window for a scope.
    #[error("Rate limit exceeded for {scope}, retry after {}ms", .retry_after.as_millis())]
    RateLimited { scope: String, retry_after: Duration },
}

/// Whether `err` is a quota or rate-limit denial.
pub fn is_limit_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<LimitError>().is_some()
}
