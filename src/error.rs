//! Error taxonomy for the credential and usage pipeline

use thiserror::Error;

/// Everything that can end a fetch cycle early.
///
/// None of these are fatal to the process; each applies to the current cycle
/// only and the user re-triggers to retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// No token in any credential file or the system keychain. This is the
    /// normal state before the user has authenticated.
    #[error("no auth token found; run the `claude` CLI to authenticate")]
    CredentialNotFound,

    /// The usage endpoint answered with a non-200 status.
    #[error("API error: {0}")]
    HttpStatus(u16),

    /// DNS, TLS, connection, or timeout failure before a response arrived.
    #[error("{0}")]
    Transport(String),

    /// Body was not JSON, or the JSON matched no known response shape.
    #[error("parse error: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_message_contains_code() {
        let err = UsageError::HttpStatus(401);
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn test_decode_is_surfaced_as_parse_error() {
        let err = UsageError::Decode("unexpected token".to_string());
        assert!(err.to_string().starts_with("parse error"));
    }

    #[test]
    fn test_transport_message_is_verbatim() {
        let err = UsageError::Transport("connection reset by peer".to_string());
        assert_eq!(err.to_string(), "connection reset by peer");
    }
}
