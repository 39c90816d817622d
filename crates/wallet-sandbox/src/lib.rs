//! In-memory wallet provider.
//!
//! `SandboxProvider` implements `WalletProvider` without any network or
//! threshold cryptography. Accounts, codes, passkeys and wallets live in
//! memory; addresses and signatures are deterministic digests so demos and
//! tests can assert on them.

mod error;
mod keys;
mod provider;

pub use error::{SandboxError, SandboxResult};
pub use keys::{derive_address, sign_digest};
pub use provider::{Operation, SandboxOptions, SandboxProvider, SANDBOX_BASE_URL};
