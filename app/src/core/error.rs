use std::{future::Future, time::Duration};

use sea_orm::DbErr;
use thiserror::Error;

/// Failures of a single user action against the review core.
///
/// None of these are fatal to the process. `Unauthorized`, `InvalidState` and
/// `NotFound` state facts and are never retried; `WriteError` and `LoadError`
/// are transient and the caller may retry the whole operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("no access")]
    Unauthorized,

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("write failed: {0}")]
    WriteError(String),

    #[error("load failed: {0}")]
    LoadError(String),
}

impl CoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::WriteError(_) | Self::LoadError(_))
    }

    /// Classify a store error raised by a read.
    pub fn from_load(err: DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(what) => Self::NotFound(what),
            other => Self::LoadError(other.to_string()),
        }
    }

    /// Classify a store error raised by a mutating call.
    pub fn from_write(err: DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(what) => Self::NotFound(what),
            other => Self::WriteError(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreCall {
    Read,
    Write,
}

/// Bound an external store call so a stuck connection fails the in-flight
/// action instead of hanging it.
pub async fn bounded<T, F>(limit: Duration, call: StoreCall, fut: F) -> Result<T, CoreError>
where
    F: Future<Output = Result<T, CoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            let message = format!("store call timed out after {}ms", limit.as_millis());
            Err(match call {
                StoreCall::Read => CoreError::LoadError(message),
                StoreCall::Write => CoreError::WriteError(message),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_errors_are_retryable() {
        assert!(CoreError::WriteError("x".into()).is_retryable());
        assert!(CoreError::LoadError("x".into()).is_retryable());
        assert!(!CoreError::Unauthorized.is_retryable());
        assert!(!CoreError::InvalidState("x".into()).is_retryable());
        assert!(!CoreError::NotFound("x".into()).is_retryable());
    }

    #[test]
    fn test_record_not_found_maps_to_not_found() {
        let err = CoreError::from_write(DbErr::RecordNotFound("post".into()));
        assert_eq!(err, CoreError::NotFound("post".into()));

        let err = CoreError::from_load(DbErr::Custom("boom".into()));
        assert!(matches!(err, CoreError::LoadError(_)));
    }

    #[tokio::test]
    async fn test_bounded_call_times_out() {
        let result: Result<(), CoreError> = bounded(
            Duration::from_millis(10),
            StoreCall::Write,
            std::future::pending(),
        )
        .await;

        assert!(matches!(result, Err(CoreError::WriteError(_))));
    }
}
