//! Session snapshot exposed to the presentation layer.

use crate::session_fsm::Stage;
use crate::wallet_selection::SelectedWallet;
use serde::Serialize;
use std::fmt;

/// Recovery secret handed out once after a new wallet is created.
///
/// Never serialized; `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct RecoverySecret(String);

impl RecoverySecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for RecoverySecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RecoverySecret(<redacted>)")
    }
}

/// Point-in-time view of a session.
///
/// `stage` and `is_busy` are derived from the state machine when the
/// snapshot is taken; the remaining fields are the session's own data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub stage: Stage,
    pub identifier: String,
    /// Phone flows only, normalised to `+<digits>` once validated.
    pub country_code: String,
    pub verification_code: String,
    pub wallet_id: String,
    pub wallet_address: String,
    #[serde(skip)]
    pub recovery_secret: Option<RecoverySecret>,
    pub message_to_sign: String,
    pub signed_message: String,
    /// Empty when there is no error.
    pub error_message: String,
    pub is_busy: bool,
}

impl Session {
    pub fn has_error(&self) -> bool {
        !self.error_message.is_empty()
    }

    pub fn is_authenticated(&self) -> bool {
        self.stage == Stage::Authenticated
    }

    pub(crate) fn set_wallet(&mut self, wallet: &SelectedWallet) {
        self.wallet_id = wallet.id.clone();
        self.wallet_address = wallet.address.clone();
    }

    /// Back to a blank session.
    pub(crate) fn reset(&mut self) {
        *self = Session::default();
    }
}
