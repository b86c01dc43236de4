//! Error types for SIP authentication operations
//!
//! Every failure in the challenge/forbidden flows is classified into one of a
//! small set of codes the caller can act on (show a dialog, give up on the
//! registration, retry later). Failures coming from the protocol stack are
//! carried through unchanged as [`AuthError::Transport`].

use std::fmt;
use thiserror::Error;

/// Caller-visible classification of an [`AuthError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The user declined a prompt or the mediasec gate rejected the exchange
    AuthenticationCanceled,
    /// Credentials are known to be wrong and no usable replacement exists
    AuthenticationFailed,
    /// A challenge could not be used (missing fields, unsupported algorithm)
    GeneralError,
    /// The protocol stack failed to create or mutate a transaction
    TransportError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::AuthenticationCanceled => write!(f, "AUTHENTICATION_CANCELED"),
            ErrorCode::AuthenticationFailed => write!(f, "AUTHENTICATION_FAILED"),
            ErrorCode::GeneralError => write!(f, "GENERAL_ERROR"),
            ErrorCode::TransportError => write!(f, "TRANSPORT_ERROR"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication canceled: {0}")]
    AuthenticationCanceled(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("General error: {0}")]
    GeneralError(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Create an authentication-canceled error
    pub fn canceled(message: impl Into<String>) -> Self {
        Self::AuthenticationCanceled(message.into())
    }

    /// Create an authentication-failed error
    pub fn failed(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed(message.into())
    }

    /// Create a general error
    pub fn general(message: impl Into<String>) -> Self {
        Self::GeneralError(message.into())
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// The code surfaced to callers for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AuthError::AuthenticationCanceled(_) => ErrorCode::AuthenticationCanceled,
            AuthError::AuthenticationFailed(_) => ErrorCode::AuthenticationFailed,
            AuthError::GeneralError(_) | AuthError::Config(_) => ErrorCode::GeneralError,
            AuthError::Transport(_) => ErrorCode::TransportError,
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AuthError::canceled("user").code(), ErrorCode::AuthenticationCanceled);
        assert_eq!(AuthError::failed("bad pw").code(), ErrorCode::AuthenticationFailed);
        assert_eq!(AuthError::general("no realm").code(), ErrorCode::GeneralError);
        assert_eq!(AuthError::config("empty").code(), ErrorCode::GeneralError);
        assert_eq!(AuthError::transport("down").code(), ErrorCode::TransportError);
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::AuthenticationCanceled.to_string(), "AUTHENTICATION_CANCELED");
        assert_eq!(ErrorCode::AuthenticationFailed.to_string(), "AUTHENTICATION_FAILED");
        assert_eq!(ErrorCode::GeneralError.to_string(), "GENERAL_ERROR");
    }
}
