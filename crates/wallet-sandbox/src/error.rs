//! Sandbox error types.

use thiserror::Error;
use wallet_auth_session::ProviderError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SandboxError {
    #[error("Provider not initialized")]
    NotInitialized,

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Account already has a passkey: {0}")]
    AlreadyRegistered(String),

    #[error("No passkey registered")]
    NoPasskey,

    #[error("Verification token is invalid or already used")]
    InvalidToken,

    #[error("Verification code is incorrect")]
    IncorrectCode,

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Unknown wallet: {0}")]
    UnknownWallet(String),

    #[error("Payload is not valid base64")]
    InvalidPayload,

    #[error("No hosted ceremony is pending")]
    NoPendingCeremony,

    /// Failure queued through `SandboxProvider::fail_next`
    #[error(transparent)]
    Injected(ProviderError),
}

impl From<SandboxError> for ProviderError {
    fn from(err: SandboxError) -> Self {
        match err {
            SandboxError::Injected(inner) => inner,
            SandboxError::UnknownAccount(_) | SandboxError::UnknownWallet(_) => {
                ProviderError::NotFound(err.to_string())
            }
            SandboxError::NotInitialized | SandboxError::NoPendingCeremony => {
                ProviderError::Internal(err.to_string())
            }
            _ => ProviderError::Rejected(err.to_string()),
        }
    }
}

/// Result type alias using SandboxError.
pub type SandboxResult<T> = Result<T, SandboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injected_error_passes_through() {
        let err: ProviderError = SandboxError::Injected(ProviderError::Timeout).into();
        assert_eq!(err, ProviderError::Timeout);
    }

    #[test]
    fn test_lookup_failures_map_to_not_found() {
        let err: ProviderError = SandboxError::UnknownWallet("w9".to_string()).into();
        assert_eq!(err, ProviderError::NotFound("Unknown wallet: w9".to_string()));
    }

    #[test]
    fn test_policy_failures_map_to_rejected() {
        let err: ProviderError = SandboxError::NoPasskey.into();
        assert!(matches!(err, ProviderError::Rejected(_)));
        assert!(!err.is_transient());
    }
}
