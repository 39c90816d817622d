//! Session controller driving the authentication state machine.
//!
//! The controller owns the FSM and the session data. Every public action
//! first claims a transition out of an idle state; while a provider call is
//! in flight the machine sits in a transient state, so a concurrent action
//! has no transition to take and is rejected without touching the session.
//!
//! Provider errors never leave the controller. Each one is logged and turned
//! into the `error_message` of the returned snapshot.

use crate::browser::BrowserLauncher;
use crate::ceremony::BrowserCeremony;
use crate::error::{SessionError, SessionResult};
use crate::input::{build_identity, require_code};
use crate::provider::{Identity, SignOutcome, WalletProvider, WalletRef, WebAuthRequest};
use crate::session::{RecoverySecret, Session};
use crate::session_fsm::{
    is_transient, SessionMachine, SessionMachineInput, SessionMachineState, SessionStateChanged,
    Stage,
};
use crate::wallet_selection::{find_wallet, select_wallet, SelectedWallet};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};
use wallet_config_and_utils::{
    CeremonyMedium, Config, TargetNetwork, VerificationMedium,
    DEFAULT_WEB_COMPLETION_TIMEOUT_SECS,
};

pub(crate) const MSG_INIT_FAILED: &str = "Failed to initialize the wallet provider. Please try again.";
pub(crate) const MSG_CHECK_AUTH_FAILED: &str = "Failed to check authentication state.";
pub(crate) const MSG_USER_CHECK_FAILED: &str = "Unable to verify user status. Please try again later.";
pub(crate) const MSG_CREATE_FAILED: &str =
    "Failed to create user. Please try again or contact support.";
pub(crate) const MSG_LOGIN_FAILED: &str = "Login failed. Please check your credentials and try again.";
pub(crate) const MSG_INCORRECT_CODE: &str = "Verification code is incorrect. Please try again.";
pub(crate) const MSG_VERIFY_FAILED: &str =
    "Verification failed. Please check your code and try again.";
pub(crate) const MSG_ENTER_MESSAGE: &str = "Please enter a message to sign.";
pub(crate) const MSG_ENTER_TRANSACTION: &str = "Please provide a transaction to sign.";
pub(crate) const MSG_SIGNATURE_DENIED: &str =
    "Signature request was denied. Please review the transaction.";
pub(crate) const MSG_SIGN_FAILED: &str = "Failed to sign message. Please try again.";
pub(crate) const MSG_SIGN_TX_FAILED: &str = "Failed to sign transaction. Please try again.";
pub(crate) const MSG_LOGOUT_FAILED: &str = "Failed to logout. Please try again.";
pub(crate) const MSG_TIMED_OUT: &str = "The passkey page did not finish in time. Please try again.";
pub(crate) const MSG_CANCELLED: &str = "The passkey page was closed before finishing.";

/// Flow selection and limits for one controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerOptions {
    pub verification_medium: VerificationMedium,
    pub ceremony_medium: CeremonyMedium,
    pub target_network: TargetNetwork,
    /// Bound on waiting for a hosted ceremony to complete.
    pub web_completion_timeout: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            verification_medium: VerificationMedium::default(),
            ceremony_medium: CeremonyMedium::default(),
            target_network: TargetNetwork::default(),
            web_completion_timeout: Duration::from_secs(DEFAULT_WEB_COMPLETION_TIMEOUT_SECS),
        }
    }
}

impl From<&Config> for ControllerOptions {
    fn from(config: &Config) -> Self {
        Self {
            verification_medium: config.verification_medium,
            ceremony_medium: config.ceremony_medium,
            target_network: config.target_network,
            web_completion_timeout: config.web_completion_timeout(),
        }
    }
}

/// Where the presentation layer should go after [`SessionController::back`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    /// Leave the flow.
    Exit,
    /// A provider call is in flight; nothing changed.
    Stay,
}

/// Callback type for session state change notifications.
pub type SessionStateCallback = Box<dyn Fn(SessionStateChanged) + Send + Sync>;

type SharedStateCallback = Arc<dyn Fn(SessionStateChanged) + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// User-facing text for `error`, falling back to the step's generic message.
fn user_message(error: &SessionError, fallback: &str) -> String {
    match error {
        SessionError::Validation(message) => message.clone(),
        SessionError::IncorrectCode => MSG_INCORRECT_CODE.to_string(),
        SessionError::LoginTimedOut(_) => MSG_TIMED_OUT.to_string(),
        SessionError::Cancelled => MSG_CANCELLED.to_string(),
        _ => fallback.to_string(),
    }
}

/// Authentication session controller.
///
/// Cheap to share behind an `Arc`; no lock is held across an `.await`.
pub struct SessionController {
    provider: Arc<dyn WalletProvider>,
    browser: Option<Arc<dyn BrowserLauncher>>,
    options: ControllerOptions,
    /// Lock order: `fsm` before `session`.
    fsm: Mutex<SessionMachine>,
    session: Mutex<Session>,
    cancel: Notify,
    state_callback: Mutex<Option<SharedStateCallback>>,
}

impl SessionController {
    /// Create a controller over `provider`.
    pub fn new(provider: Arc<dyn WalletProvider>, options: ControllerOptions) -> Self {
        Self {
            provider,
            browser: None,
            options,
            fsm: Mutex::new(SessionMachine::new()),
            session: Mutex::new(Session::default()),
            cancel: Notify::new(),
            state_callback: Mutex::new(None),
        }
    }

    /// Attach the launcher used by browser-mediated ceremonies.
    pub fn with_browser(mut self, browser: Arc<dyn BrowserLauncher>) -> Self {
        self.browser = Some(browser);
        self
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    /// Set a callback to be notified of session state changes.
    ///
    /// The callback runs without any controller lock held and may replace
    /// itself.
    pub fn set_state_callback(&self, callback: SessionStateCallback) {
        *lock(&self.state_callback) = Some(Arc::from(callback));
    }

    /// Current session, with stage and busy flag taken from the FSM.
    ///
    /// Never carries the recovery secret; see [`Self::take_recovery_secret`].
    pub fn snapshot(&self) -> Session {
        let fsm = lock(&self.fsm);
        let mut session = lock(&self.session).clone();
        session.stage = Stage::from(fsm.state());
        session.is_busy = is_transient(fsm.state());
        session.recovery_secret = None;
        session
    }

    pub fn stage(&self) -> Stage {
        Stage::from(lock(&self.fsm).state())
    }

    pub fn is_busy(&self) -> bool {
        is_transient(lock(&self.fsm).state())
    }

    /// Hand out the recovery secret of a freshly created wallet, once.
    pub fn take_recovery_secret(&self) -> Option<RecoverySecret> {
        lock(&self.session).recovery_secret.take()
    }

    /// Abort a running browser-mediated ceremony, at whatever step it is.
    /// No effect when no ceremony is running.
    pub fn cancel_pending(&self) {
        debug!("Cancelling pending hosted ceremony");
        self.cancel.notify_waiters();
    }

    pub fn set_identifier(&self, value: impl Into<String>) -> Session {
        let value = value.into();
        self.edit(Stage::Initial, "identifier", |session| {
            session.identifier = value
        })
    }

    pub fn set_country_code(&self, value: impl Into<String>) -> Session {
        let value = value.into();
        self.edit(Stage::Initial, "country_code", |session| {
            session.country_code = value
        })
    }

    pub fn set_verification_code(&self, value: impl Into<String>) -> Session {
        let value = value.into();
        self.edit(Stage::Verification, "verification_code", |session| {
            session.verification_code = value
        })
    }

    pub fn set_message_to_sign(&self, value: impl Into<String>) -> Session {
        let value = value.into();
        self.edit(Stage::Authenticated, "message_to_sign", |session| {
            session.message_to_sign = value
        })
    }

    /// Initialise the provider and resume a previous session if one exists.
    pub async fn start(&self) -> Session {
        if let Err(e) = self.transition(&SessionMachineInput::Restore) {
            return self.rejected("start", e);
        }
        self.clear_error();

        if let Err(e) = self.provider.init().await {
            return self.fail(
                &SessionMachineInput::NothingToRestore,
                e.into(),
                MSG_INIT_FAILED,
            );
        }

        match self.restorable_wallet().await {
            Ok(Some(wallet)) => {
                info!(wallet_id = %wallet.id, "Restored existing session");
                self.settle(&SessionMachineInput::Restored, |session| {
                    session.set_wallet(&wallet)
                })
            }
            Ok(None) => {
                debug!("No session to restore");
                self.settle(&SessionMachineInput::NothingToRestore, |_| {})
            }
            Err(e) => self.fail(
                &SessionMachineInput::NothingToRestore,
                e,
                MSG_CHECK_AUTH_FAILED,
            ),
        }
    }

    /// Entry point: log in an existing user or create a new one.
    pub async fn authenticate(&self) -> Session {
        if let Err(e) = self.transition(&SessionMachineInput::CheckUser) {
            return self.rejected("authenticate", e);
        }
        self.clear_error();

        let identity = match self.identity() {
            Ok(identity) => identity,
            Err(e) => {
                return self.fail(&SessionMachineInput::CheckFailed, e, MSG_USER_CHECK_FAILED)
            }
        };

        if let Identity::Phone { country_code, .. } = &identity {
            let country_code = country_code.clone();
            lock(&self.session).country_code = country_code;
        }

        let medium = self.options.verification_medium;
        match self.provider.user_exists(&identity).await {
            Ok(true) => {
                info!(medium = %medium, "Existing user, starting passkey login");
                if self.step(&SessionMachineInput::UserFound).is_err() {
                    return self.snapshot();
                }
                self.login(&identity).await
            }
            Ok(false) => {
                info!(medium = %medium, "New user, creating account");
                if self.step(&SessionMachineInput::UserMissing).is_err() {
                    return self.snapshot();
                }
                self.create(&identity).await
            }
            Err(e) => self.fail(
                &SessionMachineInput::CheckFailed,
                e.into(),
                MSG_USER_CHECK_FAILED,
            ),
        }
    }

    /// Submit the one-time code, register a passkey and provision wallets.
    pub async fn verify(&self) -> Session {
        if let Err(e) = self.transition(&SessionMachineInput::SubmitCode) {
            return self.rejected("verify", e);
        }
        self.clear_error();

        match self.run_verification().await {
            Ok((wallet, recovery_secret)) => {
                info!(
                    wallet_id = %wallet.id,
                    scheme = %wallet.scheme,
                    new_wallet = recovery_secret.is_some(),
                    "Verification complete"
                );
                let recovery_secret = recovery_secret.map(RecoverySecret::new);
                let mut session = self.settle(&SessionMachineInput::VerifySucceeded, |session| {
                    session.set_wallet(&wallet);
                    session.recovery_secret = recovery_secret.clone();
                });
                // The transition result is the one snapshot that shows the secret.
                session.recovery_secret = recovery_secret;
                session
            }
            Err(e) => self.fail(&SessionMachineInput::VerifyFailed, e, MSG_VERIFY_FAILED),
        }
    }

    /// Sign `message_to_sign` with the session wallet.
    pub async fn sign_message(&self) -> Session {
        if let Err(e) = self.transition(&SessionMachineInput::SignRequested) {
            return self.rejected("sign_message", e);
        }

        let (wallet_id, message) = {
            let mut session = lock(&self.session);
            session.error_message.clear();
            session.signed_message.clear();
            (session.wallet_id.clone(), session.message_to_sign.clone())
        };

        if wallet_id.is_empty() || message.trim().is_empty() {
            return self.fail(
                &SessionMachineInput::SignFinished,
                SessionError::Validation(MSG_ENTER_MESSAGE.to_string()),
                MSG_ENTER_MESSAGE,
            );
        }

        let payload = BASE64.encode(message.as_bytes());
        let outcome = self.provider.sign_message(&wallet_id, &payload).await;
        self.finish_signing(&wallet_id, outcome.map_err(Into::into), MSG_SIGN_FAILED)
    }

    /// Sign a serialized transaction with the session wallet.
    pub async fn sign_transaction(&self, transaction: &[u8], chain_id: Option<&str>) -> Session {
        if let Err(e) = self.transition(&SessionMachineInput::SignRequested) {
            return self.rejected("sign_transaction", e);
        }

        let wallet_id = {
            let mut session = lock(&self.session);
            session.error_message.clear();
            session.signed_message.clear();
            session.wallet_id.clone()
        };

        if wallet_id.is_empty() || transaction.is_empty() {
            return self.fail(
                &SessionMachineInput::SignFinished,
                SessionError::Validation(MSG_ENTER_TRANSACTION.to_string()),
                MSG_ENTER_TRANSACTION,
            );
        }

        let payload = BASE64.encode(transaction);
        let outcome = self
            .provider
            .sign_transaction(&wallet_id, &payload, chain_id)
            .await;
        self.finish_signing(&wallet_id, outcome.map_err(Into::into), MSG_SIGN_TX_FAILED)
    }

    /// Log out through the provider. The session is reset whatever the
    /// provider answers; a failure is reported on the fresh session.
    pub async fn logout(&self) -> Session {
        match self.try_logout().await {
            Ok(()) => self.snapshot(),
            Err(e) => self.rejected("logout", e),
        }
    }

    /// Leave the flow: log out when authenticated, otherwise just reset.
    pub async fn back(&self) -> BackOutcome {
        let stage = {
            let fsm = lock(&self.fsm);
            if is_transient(fsm.state()) {
                debug!(state = ?fsm.state(), "Back rejected while busy");
                return BackOutcome::Stay;
            }
            Stage::from(fsm.state())
        };

        let result = match stage {
            Stage::Authenticated => self.try_logout().await,
            Stage::Initial | Stage::Verification => self
                .transition_with(&SessionMachineInput::Reset, Session::reset)
                .map(|_| ()),
        };

        match result {
            Err(SessionError::Busy) => BackOutcome::Stay,
            Err(e) => {
                warn!(error = %e, "Back navigation could not reset the session");
                BackOutcome::Stay
            }
            Ok(()) => BackOutcome::Exit,
        }
    }

    async fn try_logout(&self) -> SessionResult<()> {
        self.transition(&SessionMachineInput::LogoutRequested)?;

        let result = self.provider.logout().await;
        if let Err(e) = &result {
            warn!(error = %e, "Provider logout failed, resetting session anyway");
        } else {
            info!("Logged out");
        }

        self.step_with(&SessionMachineInput::LogoutFinished, |session| {
            session.reset();
            if result.is_err() {
                session.error_message = MSG_LOGOUT_FAILED.to_string();
            }
        })?;
        Ok(())
    }

    async fn create(&self, identity: &Identity) -> Session {
        match self.provider.create_user(identity).await {
            Ok(()) => self.settle(&SessionMachineInput::CreateSucceeded, |session| {
                session.verification_code.clear()
            }),
            Err(e) => self.fail(
                &SessionMachineInput::CreateFailed,
                e.into(),
                MSG_CREATE_FAILED,
            ),
        }
    }

    async fn login(&self, identity: &Identity) -> Session {
        let result = match self.options.ceremony_medium {
            CeremonyMedium::Native => self.native_login(identity).await,
            CeremonyMedium::Browser => self.browser_login(identity).await,
        };

        match result {
            Ok(wallet) => {
                info!(wallet_id = %wallet.id, scheme = %wallet.scheme, "Login complete");
                self.settle(&SessionMachineInput::LoginSucceeded, |session| {
                    session.set_wallet(&wallet)
                })
            }
            Err(e) => self.fail(&SessionMachineInput::LoginFailed, e, MSG_LOGIN_FAILED),
        }
    }

    async fn native_login(&self, identity: &Identity) -> SessionResult<SelectedWallet> {
        let wallets = self.provider.login(Some(identity)).await?;
        let (wallet, _) = self.resolve_wallet(wallets).await?;
        Ok(wallet)
    }

    async fn browser_login(&self, identity: &Identity) -> SessionResult<SelectedWallet> {
        let request = WebAuthRequest::Login {
            identity: identity.clone(),
        };
        self.ceremony()?.run(&request).await?;

        let wallets = self.provider.wallets().await?;
        let (wallet, _) = self.resolve_wallet(wallets).await?;
        Ok(wallet)
    }

    async fn run_verification(&self) -> SessionResult<(SelectedWallet, Option<String>)> {
        let (identity, code) = {
            let session = lock(&self.session);
            let identity = build_identity(
                self.options.verification_medium,
                &session.identifier,
                &session.country_code,
            )?;
            (identity, require_code(&session.verification_code)?)
        };

        match self.options.ceremony_medium {
            CeremonyMedium::Native => {
                let token = self.provider.verify_code(&identity, &code).await?;
                if token.is_empty() {
                    return Err(SessionError::IncorrectCode);
                }

                self.provider.register_credential(&identity, &token).await?;
                let provisioned = self.provider.provision_missing_wallets(false).await?;
                let (wallet, extra_secret) = self.resolve_wallet(provisioned.wallets).await?;
                Ok((wallet, provisioned.recovery_secret.or(extra_secret)))
            }
            CeremonyMedium::Browser => {
                let request = WebAuthRequest::CreatePasskey {
                    identity,
                    verification_code: code,
                };
                let completion = self.ceremony()?.run(&request).await?;

                let wallets = self.provider.wallets().await?;
                let (wallet, extra_secret) = self.resolve_wallet(wallets).await?;
                Ok((wallet, completion.recovery_secret.or(extra_secret)))
            }
        }
    }

    /// Select the session wallet, provisioning once more for Solana when no
    /// `ED25519` wallet is present.
    async fn resolve_wallet(
        &self,
        wallets: Vec<WalletRef>,
    ) -> SessionResult<(SelectedWallet, Option<String>)> {
        let network = self.options.target_network;

        if network == TargetNetwork::Solana && find_wallet(&wallets, network).is_none() {
            debug!("No ED25519 wallet yet, provisioning missing wallets");
            let provisioned = self.provider.provision_missing_wallets(false).await?;
            let wallet = select_wallet(&provisioned.wallets, network)?;
            return Ok((wallet, provisioned.recovery_secret));
        }

        Ok((select_wallet(&wallets, network)?, None))
    }

    async fn restorable_wallet(&self) -> SessionResult<Option<SelectedWallet>> {
        if !self.provider.is_fully_logged_in().await? {
            return Ok(None);
        }

        let wallets = self.provider.wallets().await?;
        match select_wallet(&wallets, self.options.target_network) {
            Ok(wallet) => Ok(Some(wallet)),
            Err(e) => {
                debug!(error = %e, "Logged in but no usable wallet to restore");
                Ok(None)
            }
        }
    }

    fn finish_signing(
        &self,
        wallet_id: &str,
        outcome: SessionResult<SignOutcome>,
        failure: &str,
    ) -> Session {
        match outcome {
            Ok(SignOutcome::Signed { signature }) => {
                info!(wallet_id = %wallet_id, "Signature produced");
                self.settle(&SessionMachineInput::SignFinished, |session| {
                    session.signed_message = format!("0x{}", signature)
                })
            }
            Ok(SignOutcome::PendingReview {
                review_url,
                pending_transaction_id,
            }) => {
                warn!(
                    wallet_id = %wallet_id,
                    review_url = %review_url,
                    pending_transaction_id = %pending_transaction_id,
                    "Signature held for review"
                );
                self.settle(&SessionMachineInput::SignFinished, |session| {
                    session.error_message = MSG_SIGNATURE_DENIED.to_string()
                })
            }
            Err(e) => self.fail(&SessionMachineInput::SignFinished, e, failure),
        }
    }

    fn ceremony(&self) -> SessionResult<BrowserCeremony<'_>> {
        let browser = self
            .browser
            .as_deref()
            .ok_or(SessionError::BrowserUnavailable)?;

        Ok(BrowserCeremony {
            provider: self.provider.as_ref(),
            browser,
            timeout: self.options.web_completion_timeout,
            cancel: &self.cancel,
        })
    }

    fn identity(&self) -> SessionResult<Identity> {
        let session = lock(&self.session);
        build_identity(
            self.options.verification_medium,
            &session.identifier,
            &session.country_code,
        )
    }

    fn clear_error(&self) {
        lock(&self.session).error_message.clear();
    }

    /// Apply an input edit when the session is idle in `stage`.
    fn edit(&self, stage: Stage, field: &'static str, apply: impl FnOnce(&mut Session)) -> Session {
        {
            let fsm = lock(&self.fsm);
            let state = fsm.state();
            if is_transient(state) || Stage::from(state) != stage {
                debug!(field, state = ?state, "Ignoring input edit");
            } else {
                apply(&mut *lock(&self.session));
            }
        }
        self.snapshot()
    }

    /// Record a failed step: log it, set the message, leave the busy state.
    fn fail(&self, input: &SessionMachineInput, error: SessionError, fallback: &str) -> Session {
        let message = user_message(&error, fallback);
        match &error {
            SessionError::Validation(_) | SessionError::IncorrectCode => {
                debug!(error = %error, "Rejected input")
            }
            _ => warn!(
                error = %error,
                transient = error.is_transient(),
                "Session step failed"
            ),
        }
        self.settle(input, |session| session.error_message = message)
    }

    /// Leave the busy state with `update` applied atomically.
    fn settle(&self, input: &SessionMachineInput, update: impl FnOnce(&mut Session)) -> Session {
        let _ = self.step_with(input, update);
        self.snapshot()
    }

    fn rejected(&self, action: &'static str, error: SessionError) -> Session {
        debug!(action, error = %error, "Action rejected");
        self.snapshot()
    }

    fn step(&self, input: &SessionMachineInput) -> SessionResult<SessionMachineState> {
        self.step_with(input, |_| {})
    }

    /// A transition the controller itself drives from a busy state; failure
    /// means the flow lost track of the machine.
    fn step_with(
        &self,
        input: &SessionMachineInput,
        update: impl FnOnce(&mut Session),
    ) -> SessionResult<SessionMachineState> {
        self.transition_with(input, update).map_err(|e| {
            error!(error = %e, "Unexpected session state");
            e
        })
    }

    fn transition(&self, input: &SessionMachineInput) -> SessionResult<SessionMachineState> {
        self.transition_with(input, |_| {})
    }

    /// Transition the FSM, apply `update` under the same lock, and notify
    /// the callback if the state changed.
    fn transition_with(
        &self,
        input: &SessionMachineInput,
        update: impl FnOnce(&mut Session),
    ) -> SessionResult<SessionMachineState> {
        let mut fsm = lock(&self.fsm);
        let old_state = fsm.state().clone();

        fsm.consume(input).map_err(|_| {
            if is_transient(&old_state) {
                SessionError::Busy
            } else {
                SessionError::InvalidStateTransition(format!(
                    "Cannot apply {:?} in state {:?}",
                    input, old_state
                ))
            }
        })?;

        let new_state = fsm.state().clone();
        update(&mut *lock(&self.session));
        drop(fsm);

        if old_state != new_state {
            debug!(
                old_state = ?old_state,
                new_state = ?new_state,
                "Session state transition"
            );
            self.notify_state_change(&new_state);
        }

        Ok(new_state)
    }

    fn notify_state_change(&self, state: &SessionMachineState) {
        let callback = lock(&self.state_callback).clone();
        if let Some(callback) = callback {
            let stage = Stage::from(state);
            let wallet_id = if stage == Stage::Authenticated {
                Some(lock(&self.session).wallet_id.clone()).filter(|id| !id.is_empty())
            } else {
                None
            };

            callback(SessionStateChanged {
                stage,
                busy: is_transient(state),
                wallet_id,
            });
        }
    }
}
