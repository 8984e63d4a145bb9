//! Error taxonomy shared by the client and challenge layers.
//!
//! Every failure surfaced by this crate maps to exactly one of these kinds so
//! callers can branch on the failure class without inspecting messages.

use std::time::Duration;

use thiserror::Error;

use crate::challenge::ChallengeError;

/// Result alias used across the crate.
pub type PayPayResult<T> = Result<T, PayPayError>;

/// Failure kinds surfaced by [`crate::PayPay`].
#[derive(Debug, Error)]
pub enum PayPayError {
    /// The login handshake failed. Wraps the underlying cause when one exists.
    #[error("login failed: {message}")]
    Login {
        message: String,
        #[source]
        source: Option<Box<PayPayError>>,
    },
    /// Authentication-level failure outside the login handshake, including
    /// challenge extraction and submission failures.
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// The server rejected the access token (HTTP 401).
    #[error("access token expired")]
    TokenExpired,
    /// A payment-link operation could not be carried out.
    #[error("link operation failed: {0}")]
    Link(String),
    /// A payment operation was rejected by the service.
    #[error("payment operation failed: {0}")]
    Payment(String),
    /// Transport-level failure or an unexpected HTTP status.
    #[error("network request failed: {0}")]
    Network(String),
    /// HTTP 429. Carries the parsed `Retry-After` hint when the server sent
    /// one; this layer reports the window, it does not wait it out.
    #[error("rate limit exceeded")]
    RateLimit { retry_after: Option<Duration> },
    /// Input or response data failed a local validity check.
    #[error("validation failed: {0}")]
    Validation(String),
}

impl PayPayError {
    /// Build a [`PayPayError::Login`] wrapping `source` as the cause.
    pub(crate) fn login(message: impl Into<String>, source: Option<PayPayError>) -> Self {
        PayPayError::Login {
            message: message.into(),
            source: source.map(Box::new),
        }
    }
}

impl From<reqwest::Error> for PayPayError {
    fn from(err: reqwest::Error) -> Self {
        PayPayError::Network(err.to_string())
    }
}

impl From<ChallengeError> for PayPayError {
    fn from(err: ChallengeError) -> Self {
        match err {
            ChallengeError::Transport(message) => PayPayError::Network(message),
            other => PayPayError::Authentication(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_error_preserves_cause() {
        let err = PayPayError::login("login failed", Some(PayPayError::TokenExpired));
        match err {
            PayPayError::Login { source, .. } => {
                assert!(matches!(source.as_deref(), Some(PayPayError::TokenExpired)));
            }
            other => panic!("unexpected error kind: {other:?}"),
        }
    }

    #[test]
    fn challenge_transport_maps_to_network() {
        let err = PayPayError::from(ChallengeError::Transport("connection reset".into()));
        assert!(matches!(err, PayPayError::Network(_)));
    }

    #[test]
    fn challenge_missing_token_maps_to_authentication() {
        let err = PayPayError::from(ChallengeError::MissingToken);
        assert!(matches!(err, PayPayError::Authentication(_)));
    }
}
