//! Wallet provider seam.
//!
//! The controller never talks to a wallet backend directly; everything goes
//! through [`WalletProvider`], injected as an `Arc<dyn WalletProvider>`.

use crate::error::ProviderResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who is authenticating.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    Email(String),
    Phone {
        number: String,
        /// Normalised calling code, e.g. `+44`.
        country_code: String,
    },
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Email(email) => f.write_str(email),
            Identity::Phone {
                number,
                country_code,
            } => write!(f, "{} {}", country_code, number),
        }
    }
}

/// Signature scheme of a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WalletScheme {
    /// EVM secp256k1.
    Dkls,
    Cggmp,
    /// Solana-compatible.
    Ed25519,
}

impl WalletScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletScheme::Dkls => "DKLS",
            WalletScheme::Cggmp => "CGGMP",
            WalletScheme::Ed25519 => "ED25519",
        }
    }
}

impl fmt::Display for WalletScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A wallet as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRef {
    pub id: String,
    #[serde(default)]
    pub address: Option<String>,
    pub scheme: WalletScheme,
}

/// Result of provisioning wallets for every missing scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionedWallets {
    pub wallets: Vec<WalletRef>,
    /// Present only when new key material was created.
    pub recovery_secret: Option<String>,
}

/// Outcome of a signing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignOutcome {
    Signed {
        signature: String,
    },
    /// Policy requires a human review before the signature is released.
    PendingReview {
        review_url: String,
        pending_transaction_id: String,
    },
}

/// What a hosted (browser) ceremony is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebAuthKind {
    Login,
    CreatePasskey,
}

/// Request for a hosted ceremony URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebAuthRequest {
    Login {
        identity: Identity,
    },
    /// Verifies the one-time code and returns the passkey creation page.
    CreatePasskey {
        identity: Identity,
        verification_code: String,
    },
}

impl WebAuthRequest {
    pub fn kind(&self) -> WebAuthKind {
        match self {
            WebAuthRequest::Login { .. } => WebAuthKind::Login,
            WebAuthRequest::CreatePasskey { .. } => WebAuthKind::CreatePasskey,
        }
    }
}

/// Completion signal of a hosted ceremony.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebCompletion {
    pub recovery_secret: Option<String>,
}

/// Identity and wallet provider.
///
/// Implementations must be cheap to share behind an `Arc` and safe to call
/// from any task. Every method is a suspension point for the controller.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Prepare the provider for use.
    async fn init(&self) -> ProviderResult<()>;

    /// Whether a previous session is still usable.
    async fn is_fully_logged_in(&self) -> ProviderResult<bool>;

    /// Wallets of the current session.
    async fn wallets(&self) -> ProviderResult<Vec<WalletRef>>;

    async fn user_exists(&self, identity: &Identity) -> ProviderResult<bool>;

    /// Create an account and send a one-time code to it.
    async fn create_user(&self, identity: &Identity) -> ProviderResult<()>;

    /// Exchange a one-time code for a credential token. An empty token
    /// means the code was wrong.
    async fn verify_code(&self, identity: &Identity, code: &str) -> ProviderResult<String>;

    /// Register a passkey bound to a verified token.
    async fn register_credential(&self, identity: &Identity, token: &str) -> ProviderResult<()>;

    /// Passkey login. `None` lets the platform pick a credential.
    async fn login(&self, identity: Option<&Identity>) -> ProviderResult<Vec<WalletRef>>;

    /// Create a wallet for each supported scheme not yet present.
    async fn provision_missing_wallets(
        &self,
        skip_distribute: bool,
    ) -> ProviderResult<ProvisionedWallets>;

    /// Sign a base64 payload.
    async fn sign_message(&self, wallet_id: &str, payload_b64: &str)
        -> ProviderResult<SignOutcome>;

    /// Sign a base64 serialized transaction.
    async fn sign_transaction(
        &self,
        wallet_id: &str,
        tx_b64: &str,
        chain_id: Option<&str>,
    ) -> ProviderResult<SignOutcome>;

    async fn logout(&self) -> ProviderResult<()>;

    /// URL of a hosted ceremony page.
    async fn web_auth_url(&self, request: &WebAuthRequest) -> ProviderResult<String>;

    /// Resolves once the hosted ceremony of `kind` has finished.
    async fn await_web_completion(&self, kind: WebAuthKind) -> ProviderResult<WebCompletion>;
}
