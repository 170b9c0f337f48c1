//! Discovery error types.

use thiserror::Error;

/// Errors that can occur while talking to collaborators or running the
/// discovery pipeline.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// An HTTP request to an external source failed.
    #[error("HTTP error from {source_name}: {message}")]
    Http {
        source_name: String,
        message: String,
    },

    /// The external source returned a rate-limit response.
    #[error("rate limited by {source_name}")]
    RateLimited { source_name: String },

    /// The requested entity was not found at the external source.
    #[error("not found: {entity} at {source_name}")]
    NotFound { entity: String, source_name: String },

    /// A response from an external source could not be parsed.
    #[error("parse error from {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// A collaborator needs a credential that is not configured.
    #[error("{source_name} is not configured: missing {setting}")]
    MissingCredential {
        source_name: String,
        setting: &'static str,
    },

    /// A discovery trigger is missing a required field.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// An error propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// An error propagated from the persistence layer.
    #[error("database error: {0}")]
    Database(#[from] repertoire_core::Error),
}

impl DiscoveryError {
    /// Returns `true` when the error is transient and the operation may
    /// succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } | Self::RateLimited { .. } => true,
            Self::Request(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Returns `true` when the error indicates the entity was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn http(source_name: &str, message: impl ToString) -> Self {
        Self::Http {
            source_name: source_name.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn parse(source_name: &str, message: impl ToString) -> Self {
        Self::Parse {
            source_name: source_name.to_string(),
            message: message.to_string(),
        }
    }
}

/// Convenience alias for discovery results.
pub type DiscoveryResult<T> = std::result::Result<T, DiscoveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(DiscoveryError::http("MusicBrainz", "503").is_transient());
        assert!(DiscoveryError::RateLimited {
            source_name: "MusicBrainz".to_string()
        }
        .is_transient());
        assert!(!DiscoveryError::parse("ASCAP", "bad json").is_transient());
        assert!(!DiscoveryError::MissingField("user_id").is_transient());
    }

    #[test]
    fn test_not_found() {
        let err = DiscoveryError::NotFound {
            entity: "work w1".to_string(),
            source_name: "MusicBrainz".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "not found: work w1 at MusicBrainz");
    }
}
