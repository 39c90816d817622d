//! In-memory `WalletProvider` implementation.

use crate::error::{SandboxError, SandboxResult};
use crate::keys::{derive_address, sign_digest};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use parking_lot::Mutex;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;
use wallet_auth_session::{
    Identity, ProviderError, ProviderResult, ProvisionedWallets, SignOutcome, WalletProvider,
    WalletRef, WalletScheme, WebAuthKind, WebAuthRequest, WebCompletion,
};

/// Base URL of hosted ceremony and review pages.
pub const SANDBOX_BASE_URL: &str = "https://sandbox.wallet.invalid";

/// Provider calls that can have a failure queued with
/// [`SandboxProvider::fail_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Init,
    IsFullyLoggedIn,
    Wallets,
    UserExists,
    CreateUser,
    VerifyCode,
    RegisterCredential,
    Login,
    ProvisionMissingWallets,
    SignMessage,
    SignTransaction,
    Logout,
    WebAuthUrl,
    AwaitWebCompletion,
}

/// Sandbox behaviour knobs.
#[derive(Debug, Clone)]
pub struct SandboxOptions {
    /// Issue this code instead of a random one.
    pub fixed_code: Option<String>,
    /// One wallet per scheme is provisioned.
    pub supported_schemes: Vec<WalletScheme>,
    /// Hold every signature for review instead of signing.
    pub review_required: bool,
    /// How long a hosted ceremony takes to complete.
    pub web_completion_delay: Duration,
}

impl Default for SandboxOptions {
    fn default() -> Self {
        Self {
            fixed_code: None,
            supported_schemes: vec![WalletScheme::Dkls, WalletScheme::Ed25519],
            review_required: false,
            web_completion_delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Default)]
struct Account {
    pending_code: Option<String>,
    tokens: HashSet<String>,
    has_passkey: bool,
    wallets: Vec<WalletRef>,
    secret_issued: bool,
}

#[derive(Debug)]
struct PendingCeremony {
    kind: WebAuthKind,
    account: String,
}

#[derive(Debug, Default)]
struct SandboxState {
    initialized: bool,
    accounts: HashMap<String, Account>,
    /// Account of the logged-in session.
    current: Option<String>,
    /// Stands in for the platform credential picker.
    last_registered: Option<String>,
    pending: Option<PendingCeremony>,
    failures: HashMap<Operation, ProviderError>,
}

impl SandboxState {
    fn begin(&mut self, operation: Operation) -> SandboxResult<()> {
        if let Some(error) = self.failures.remove(&operation) {
            debug!(operation = ?operation, "Returning injected failure");
            return Err(SandboxError::Injected(error));
        }
        if operation != Operation::Init && !self.initialized {
            return Err(SandboxError::NotInitialized);
        }
        Ok(())
    }

    fn account(&mut self, key: &str) -> SandboxResult<&mut Account> {
        self.accounts
            .get_mut(key)
            .ok_or_else(|| SandboxError::UnknownAccount(key.to_string()))
    }

    fn current_account(&mut self) -> SandboxResult<&mut Account> {
        let key = self.current.clone().ok_or(SandboxError::NotLoggedIn)?;
        self.account(&key)
    }

    fn current_wallet(&mut self, wallet_id: &str) -> SandboxResult<()> {
        let account = self.current_account()?;
        if account.wallets.iter().any(|wallet| wallet.id == wallet_id) {
            Ok(())
        } else {
            Err(SandboxError::UnknownWallet(wallet_id.to_string()))
        }
    }

    fn complete_registration(&mut self, key: &str) -> SandboxResult<()> {
        self.account(key)?.has_passkey = true;
        self.current = Some(key.to_string());
        self.last_registered = Some(key.to_string());
        Ok(())
    }
}

/// Canonical account key: lowercased email, or `+cc digits` for phones.
fn account_key(identity: &Identity) -> String {
    match identity {
        Identity::Email(email) => email.trim().to_lowercase(),
        Identity::Phone {
            number,
            country_code,
        } => {
            let digits: String = number.chars().filter(char::is_ascii_digit).collect();
            format!("{} {}", country_code.trim(), digits)
        }
    }
}

fn random_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

fn random_secret() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// In-memory wallet provider for demos and tests.
#[derive(Default)]
pub struct SandboxProvider {
    options: SandboxOptions,
    state: Mutex<SandboxState>,
}

impl SandboxProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SandboxOptions) -> Self {
        Self {
            options,
            state: Mutex::new(SandboxState::default()),
        }
    }

    pub fn options(&self) -> &SandboxOptions {
        &self.options
    }

    /// Make the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: Operation, error: ProviderError) {
        self.state.lock().failures.insert(operation, error);
    }

    /// Code most recently sent to `identity`, if still unused.
    pub fn issued_code(&self, identity: &Identity) -> Option<String> {
        self.state
            .lock()
            .accounts
            .get(&account_key(identity))
            .and_then(|account| account.pending_code.clone())
    }

    /// Wallets held by `identity`'s account.
    pub fn account_wallets(&self, identity: &Identity) -> Vec<WalletRef> {
        self.state
            .lock()
            .accounts
            .get(&account_key(identity))
            .map(|account| account.wallets.clone())
            .unwrap_or_default()
    }

    /// Create a wallet for each supported scheme the current account lacks.
    fn provision(&self, state: &mut SandboxState) -> SandboxResult<ProvisionedWallets> {
        let schemes = self.options.supported_schemes.clone();
        let account = state.current_account()?;

        let mut created = 0;
        for scheme in schemes {
            if account.wallets.iter().any(|wallet| wallet.scheme == scheme) {
                continue;
            }
            let id = Uuid::new_v4().to_string();
            let address = derive_address(&id, scheme);
            info!(wallet_id = %id, scheme = %scheme, "Provisioned sandbox wallet");
            account.wallets.push(WalletRef {
                id,
                address: Some(address),
                scheme,
            });
            created += 1;
        }

        let recovery_secret = if created > 0 && !account.secret_issued {
            account.secret_issued = true;
            Some(random_secret())
        } else {
            None
        };

        Ok(ProvisionedWallets {
            wallets: account.wallets.clone(),
            recovery_secret,
        })
    }

    fn sign(&self, wallet_id: &str, payload_b64: &str, extra: &[u8]) -> SandboxResult<SignOutcome> {
        let payload = BASE64
            .decode(payload_b64)
            .map_err(|_| SandboxError::InvalidPayload)?;

        if self.options.review_required {
            let pending_transaction_id = Uuid::new_v4().to_string();
            info!(wallet_id, pending_transaction_id = %pending_transaction_id, "Holding signature for review");
            return Ok(SignOutcome::PendingReview {
                review_url: format!("{}/review/{}", SANDBOX_BASE_URL, pending_transaction_id),
                pending_transaction_id,
            });
        }

        Ok(SignOutcome::Signed {
            signature: sign_digest(wallet_id, &[payload.as_slice(), extra]),
        })
    }
}

#[async_trait]
impl WalletProvider for SandboxProvider {
    async fn init(&self) -> ProviderResult<()> {
        let mut state = self.state.lock();
        state.begin(Operation::Init)?;
        state.initialized = true;
        Ok(())
    }

    async fn is_fully_logged_in(&self) -> ProviderResult<bool> {
        let mut state = self.state.lock();
        state.begin(Operation::IsFullyLoggedIn)?;
        Ok(state.current.is_some())
    }

    async fn wallets(&self) -> ProviderResult<Vec<WalletRef>> {
        let mut state = self.state.lock();
        state.begin(Operation::Wallets)?;
        match state.current_account() {
            Ok(account) => Ok(account.wallets.clone()),
            Err(SandboxError::NotLoggedIn) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn user_exists(&self, identity: &Identity) -> ProviderResult<bool> {
        let mut state = self.state.lock();
        state.begin(Operation::UserExists)?;
        Ok(state
            .accounts
            .get(&account_key(identity))
            .is_some_and(|account| account.has_passkey))
    }

    async fn create_user(&self, identity: &Identity) -> ProviderResult<()> {
        let mut state = self.state.lock();
        state.begin(Operation::CreateUser)?;

        let key = account_key(identity);
        let account = state.accounts.entry(key.clone()).or_default();
        if account.has_passkey {
            return Err(SandboxError::AlreadyRegistered(key).into());
        }

        account.pending_code = Some(
            self.options
                .fixed_code
                .clone()
                .unwrap_or_else(random_code),
        );
        info!("Issued sandbox verification code");
        Ok(())
    }

    async fn verify_code(&self, identity: &Identity, code: &str) -> ProviderResult<String> {
        let mut state = self.state.lock();
        state.begin(Operation::VerifyCode)?;

        let account = state.account(&account_key(identity))?;
        if account.pending_code.as_deref() != Some(code.trim()) {
            debug!("Sandbox verification code mismatch");
            return Ok(String::new());
        }

        account.pending_code = None;
        let token = Uuid::new_v4().to_string();
        account.tokens.insert(token.clone());
        Ok(token)
    }

    async fn register_credential(&self, identity: &Identity, token: &str) -> ProviderResult<()> {
        let mut state = self.state.lock();
        state.begin(Operation::RegisterCredential)?;

        let key = account_key(identity);
        if !state.account(&key)?.tokens.remove(token) {
            return Err(SandboxError::InvalidToken.into());
        }
        state.complete_registration(&key)?;
        info!("Registered sandbox passkey");
        Ok(())
    }

    async fn login(&self, identity: Option<&Identity>) -> ProviderResult<Vec<WalletRef>> {
        let mut state = self.state.lock();
        state.begin(Operation::Login)?;

        let key = match identity {
            Some(identity) => account_key(identity),
            None => state.last_registered.clone().ok_or(SandboxError::NoPasskey)?,
        };
        let account = state.account(&key)?;
        if !account.has_passkey {
            return Err(SandboxError::NoPasskey.into());
        }
        let wallets = account.wallets.clone();
        state.current = Some(key);
        Ok(wallets)
    }

    async fn provision_missing_wallets(
        &self,
        skip_distribute: bool,
    ) -> ProviderResult<ProvisionedWallets> {
        let mut state = self.state.lock();
        state.begin(Operation::ProvisionMissingWallets)?;
        debug!(skip_distribute, "Provisioning missing sandbox wallets");
        Ok(self.provision(&mut state)?)
    }

    async fn sign_message(
        &self,
        wallet_id: &str,
        payload_b64: &str,
    ) -> ProviderResult<SignOutcome> {
        let mut state = self.state.lock();
        state.begin(Operation::SignMessage)?;
        state.current_wallet(wallet_id)?;
        Ok(self.sign(wallet_id, payload_b64, &[])?)
    }

    async fn sign_transaction(
        &self,
        wallet_id: &str,
        tx_b64: &str,
        chain_id: Option<&str>,
    ) -> ProviderResult<SignOutcome> {
        let mut state = self.state.lock();
        state.begin(Operation::SignTransaction)?;
        state.current_wallet(wallet_id)?;
        Ok(self.sign(wallet_id, tx_b64, chain_id.unwrap_or_default().as_bytes())?)
    }

    async fn logout(&self) -> ProviderResult<()> {
        let mut state = self.state.lock();
        state.begin(Operation::Logout)?;
        state.current = None;
        state.pending = None;
        Ok(())
    }

    async fn web_auth_url(&self, request: &WebAuthRequest) -> ProviderResult<String> {
        let mut state = self.state.lock();
        state.begin(Operation::WebAuthUrl)?;

        let account = match request {
            WebAuthRequest::Login { identity } => {
                let key = account_key(identity);
                if !state.account(&key)?.has_passkey {
                    return Err(SandboxError::NoPasskey.into());
                }
                key
            }
            WebAuthRequest::CreatePasskey {
                identity,
                verification_code,
            } => {
                let key = account_key(identity);
                let account = state.account(&key)?;
                if account.pending_code.as_deref() != Some(verification_code.trim()) {
                    return Err(SandboxError::IncorrectCode.into());
                }
                account.pending_code = None;
                key
            }
        };

        state.pending = Some(PendingCeremony {
            kind: request.kind(),
            account,
        });
        Ok(format!("{}/web-auth/{}", SANDBOX_BASE_URL, Uuid::new_v4()))
    }

    async fn await_web_completion(&self, kind: WebAuthKind) -> ProviderResult<WebCompletion> {
        let account = {
            let mut state = self.state.lock();
            state.begin(Operation::AwaitWebCompletion)?;
            match state.pending.take() {
                Some(pending) if pending.kind == kind => pending.account,
                _ => return Err(SandboxError::NoPendingCeremony.into()),
            }
        };

        tokio::time::sleep(self.options.web_completion_delay).await;

        let mut state = self.state.lock();
        match kind {
            WebAuthKind::Login => {
                state.account(&account)?;
                state.current = Some(account);
                Ok(WebCompletion::default())
            }
            WebAuthKind::CreatePasskey => {
                state.complete_registration(&account)?;
                let provisioned = self.provision(&mut state)?;
                Ok(WebCompletion {
                    recovery_secret: provisioned.recovery_secret,
                })
            }
        }
    }
}
