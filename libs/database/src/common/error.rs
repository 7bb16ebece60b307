use std::fmt::Display;

/// A backing store failed its readiness probe.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("{store} health check failed: {reason}")]
    Unhealthy { store: &'static str, reason: String },
}

impl DatabaseError {
    pub fn unhealthy(store: &'static str, reason: impl Display) -> Self {
        Self::Unhealthy {
            store,
            reason: reason.to_string(),
        }
    }
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unhealthy_message_names_store() {
        let err = DatabaseError::unhealthy("redis", "connection refused");
        assert_eq!(err.to_string(), "redis health check failed: connection refused");
    }
}
