//! Stream error types and error categorization
//!
//! Errors are categorized to determine retry behavior:
//! - **Transient**: temporary failure, the job is re-enqueued until its attempts run out
//! - **Permanent**: unrecoverable, the job is dropped immediately

use thiserror::Error;

/// Category of error for determining retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transient,
    Permanent,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Transient => "transient",
            ErrorCategory::Permanent => "permanent",
        }
    }
}

/// Stream processing errors
#[derive(Error, Debug)]
pub enum StreamError {
    /// Redis connection or command error
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Job processing failed
    #[error("Processing error: {message}")]
    Processing {
        message: String,
        category: ErrorCategory,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Shutdown requested")]
    Shutdown,
}

impl StreamError {
    /// Create a transient processing error
    pub fn transient(message: impl Into<String>) -> Self {
        StreamError::Processing {
            message: message.into(),
            category: ErrorCategory::Transient,
        }
    }

    /// Create a permanent processing error
    pub fn permanent(message: impl Into<String>) -> Self {
        StreamError::Processing {
            message: message.into(),
            category: ErrorCategory::Permanent,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            StreamError::Redis(_) => ErrorCategory::Transient,
            StreamError::Serialization(_) => ErrorCategory::Permanent,
            StreamError::Processing { category, .. } => *category,
            StreamError::Config(_) => ErrorCategory::Permanent,
            StreamError::Shutdown => ErrorCategory::Transient,
        }
    }

    /// Whether a job that failed on attempt `retry_count` (zero based) gets
    /// another attempt under a cap of `max_retries` total attempts.
    pub fn should_retry(&self, retry_count: u32, max_retries: u32) -> bool {
        self.category() == ErrorCategory::Transient && retry_count.saturating_add(1) < max_retries
    }

    /// True for timeouts, including an expired XREADGROUP BLOCK.
    pub fn is_timeout(&self) -> bool {
        matches!(self, StreamError::Redis(e) if e.is_timeout())
    }

    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            StreamError::Redis(e) if e.is_connection_dropped() || e.is_connection_refusal() || e.is_io_error()
        )
    }

    /// The consumer group was deleted underneath a running worker.
    pub fn is_nogroup_error(&self) -> bool {
        matches!(self, StreamError::Redis(e) if e.to_string().contains("NOGROUP"))
    }
}

impl From<serde_json::Error> for StreamError {
    fn from(err: serde_json::Error) -> Self {
        StreamError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(
            StreamError::transient("smtp down").category(),
            ErrorCategory::Transient
        );
        assert_eq!(
            StreamError::permanent("no address").category(),
            ErrorCategory::Permanent
        );
        assert_eq!(
            StreamError::Serialization("bad json".into()).category(),
            ErrorCategory::Permanent
        );
    }

    #[test]
    fn test_should_retry_respects_attempt_cap() {
        let transient = StreamError::transient("test");
        assert!(transient.should_retry(0, 3));
        assert!(transient.should_retry(1, 3));
        assert!(!transient.should_retry(2, 3));
        assert!(!transient.should_retry(0, 1));
        assert!(!transient.should_retry(u32::MAX, 3));
    }

    #[test]
    fn test_permanent_never_retries() {
        let permanent = StreamError::permanent("test");
        assert!(!permanent.should_retry(0, 3));
    }
}
