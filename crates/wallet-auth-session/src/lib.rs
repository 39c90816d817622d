//! Passkey wallet authentication session.
//!
//! This crate provides:
//! - An explicit FSM-based session controller (identity check, account
//!   creation, one-time-code verification, passkey login, signing, logout)
//! - The `WalletProvider` and `BrowserLauncher` seams the controller drives
//! - Wallet selection per target network
//! - Browser-mediated ceremonies with timeout and cancellation
//! - Stage copy for presentation layers

mod browser;
mod ceremony;
mod controller;
mod copy;
mod error;
mod input;
mod provider;
mod session;
mod session_fsm;
mod wallet_selection;

pub use browser::BrowserLauncher;
pub use ceremony::parse_ceremony_url;
pub use controller::{BackOutcome, ControllerOptions, SessionController, SessionStateCallback};
pub use copy::{stage_copy, StageCopy};
pub use error::{BrowserError, ProviderError, ProviderResult, SessionError, SessionResult};
pub use input::normalize_country_code;
pub use provider::{
    Identity, ProvisionedWallets, SignOutcome, WalletProvider, WalletRef, WalletScheme,
    WebAuthKind, WebAuthRequest, WebCompletion,
};
pub use session::{RecoverySecret, Session};
pub use session_fsm::session_machine;
pub use session_fsm::{
    SessionMachine, SessionMachineInput, SessionMachineState, SessionStateChanged, Stage,
};
pub use wallet_selection::{find_wallet, select_wallet, SelectedWallet};

pub use wallet_config_and_utils::{CeremonyMedium, TargetNetwork, VerificationMedium};
