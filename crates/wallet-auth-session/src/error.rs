//! Session error types.

use thiserror::Error;

/// Error reported by a wallet provider implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider refused the request (bad identity, unknown wallet, ...)
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The user dismissed the passkey prompt
    #[error("Passkey prompt was cancelled")]
    UserCancelled,

    /// No account or wallet matched the request
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network unavailable (transient error, can retry)
    #[error("Network unavailable: {0}")]
    Network(String),

    /// The provider did not answer in time
    #[error("Provider timed out")]
    Timeout,

    /// Anything else the provider could not complete
    #[error("Provider error: {0}")]
    Internal(String),
}

impl ProviderError {
    /// Returns true if the call may succeed when repeated.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Network(_) | ProviderError::Timeout)
    }
}

/// Result type alias for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Error reported by a browser launcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrowserError {
    #[error("Failed to open browser: {0}")]
    Open(String),

    #[error("Failed to close browser: {0}")]
    Close(String),
}

/// Session controller error type.
///
/// These never leave the controller: each one is turned into a user-facing
/// message on the session snapshot.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Another provider call is in flight
    #[error("Another operation is in progress")]
    Busy,

    /// Input rejected before any provider call
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The provider returned an empty verification token
    #[error("Verification code is incorrect")]
    IncorrectCode,

    /// No wallet satisfied the target network
    #[error("No usable wallet: {0}")]
    WalletNotFound(String),

    /// The browser-mediated ceremony did not complete in time
    #[error("Login timed out after {0} seconds")]
    LoginTimedOut(u64),

    /// The browser-mediated ceremony was cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),

    /// Browser ceremony requested without a launcher
    #[error("No browser launcher configured")]
    BrowserUnavailable,

    /// Browser launcher failure
    #[error(transparent)]
    Browser(#[from] BrowserError),

    /// Provider failure
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// URL parsed but cannot be opened in a browser
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedUrlScheme(String),
}

impl SessionError {
    /// Returns true if this error is transient and the operation can be retried.
    ///
    /// Transient errors include:
    /// - Browser ceremony timeouts
    /// - Provider network failures and timeouts
    pub fn is_transient(&self) -> bool {
        match self {
            SessionError::LoginTimedOut(_) => true,
            SessionError::Provider(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Result type alias using SessionError.
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient_timeout() {
        assert!(SessionError::LoginTimedOut(120).is_transient());
    }

    #[test]
    fn test_is_transient_provider_network() {
        let err = SessionError::from(ProviderError::Network("offline".to_string()));
        assert!(err.is_transient());
        assert!(SessionError::from(ProviderError::Timeout).is_transient());
    }

    #[test]
    fn test_is_not_transient_rejection() {
        let err = SessionError::from(ProviderError::Rejected("no".to_string()));
        assert!(!err.is_transient());
        assert!(!SessionError::from(ProviderError::UserCancelled).is_transient());
    }

    #[test]
    fn test_is_not_transient_local_errors() {
        assert!(!SessionError::Busy.is_transient());
        assert!(!SessionError::Cancelled.is_transient());
        assert!(!SessionError::IncorrectCode.is_transient());
        assert!(!SessionError::Validation("empty".to_string()).is_transient());
    }

    #[test]
    fn test_url_error_conversion() {
        let err: SessionError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, SessionError::InvalidUrl(_)));
    }
}
