//! Deterministic stand-ins for wallet addresses and signatures.

use sha2::{Digest, Sha256};
use wallet_auth_session::WalletScheme;

/// Address for `wallet_id`: `0x` plus 40 hex chars of SHA-256 for the EVM
/// schemes, base58 of SHA-256 for `ED25519`.
pub fn derive_address(wallet_id: &str, scheme: WalletScheme) -> String {
    let digest = Sha256::digest(wallet_id.as_bytes());
    match scheme {
        WalletScheme::Dkls | WalletScheme::Cggmp => format!("0x{}", &hex::encode(digest)[..40]),
        WalletScheme::Ed25519 => bs58::encode(digest).into_string(),
    }
}

/// Hex SHA-256 over the wallet id and every part, each length-prefixed.
pub fn sign_digest(wallet_id: &str, parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in std::iter::once(wallet_id.as_bytes()).chain(parts.iter().copied()) {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}
