//! Error types for reminder delivery.

use stream_worker::StreamError;
use thiserror::Error;

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

#[derive(Debug, Error)]
pub enum NotificationError {
    /// The identity provider knows no address for this principal.
    #[error("No contact address for user {0}")]
    NoContact(String),

    #[error("Contact lookup failed: {0}")]
    Lookup(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Delivery provider error (SMTP and the like)
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl NotificationError {
    /// Whether another attempt could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Lookup(_) | Self::Provider(_))
    }
}

impl From<NotificationError> for StreamError {
    fn from(err: NotificationError) -> Self {
        if err.is_transient() {
            StreamError::transient(err.to_string())
        } else {
            StreamError::permanent(err.to_string())
        }
    }
}

impl From<reqwest::Error> for NotificationError {
    fn from(err: reqwest::Error) -> Self {
        Self::Lookup(err.to_string())
    }
}

impl From<handlebars::RenderError> for NotificationError {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Template(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stream_worker::ErrorCategory;

    #[test]
    fn test_lookup_and_provider_errors_are_retried() {
        let err: StreamError = NotificationError::Provider("451 try later".into()).into();
        assert_eq!(err.category(), ErrorCategory::Transient);

        let err: StreamError = NotificationError::Lookup("timeout".into()).into();
        assert_eq!(err.category(), ErrorCategory::Transient);
    }

    #[test]
    fn test_missing_contact_is_permanent() {
        let err: StreamError = NotificationError::NoContact("alice".into()).into();
        assert_eq!(err.category(), ErrorCategory::Permanent);

        let err: StreamError = NotificationError::Template("missing field".into()).into();
        assert_eq!(err.category(), ErrorCategory::Permanent);
    }
}
