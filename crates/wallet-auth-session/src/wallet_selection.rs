//! Picking the session wallet for a target network.

use crate::error::{SessionError, SessionResult};
use crate::provider::{WalletRef, WalletScheme};
use wallet_config_and_utils::TargetNetwork;

/// Wallet chosen for the session, with a known address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedWallet {
    pub id: String,
    pub address: String,
    pub scheme: WalletScheme,
}

/// First wallet matching `network`: any wallet for the default network,
/// the first `ED25519` wallet for Solana.
pub fn find_wallet(wallets: &[WalletRef], network: TargetNetwork) -> Option<&WalletRef> {
    match network {
        TargetNetwork::Default => wallets.first(),
        TargetNetwork::Solana => wallets
            .iter()
            .find(|wallet| wallet.scheme == WalletScheme::Ed25519),
    }
}

/// Like [`find_wallet`], but a match without an address is a failure.
pub fn select_wallet(wallets: &[WalletRef], network: TargetNetwork) -> SessionResult<SelectedWallet> {
    let wallet = find_wallet(wallets, network).ok_or_else(|| {
        SessionError::WalletNotFound(format!(
            "no {} wallet among {} returned",
            network,
            wallets.len()
        ))
    })?;

    match wallet.address.as_deref().map(str::trim) {
        Some(address) if !address.is_empty() => Ok(SelectedWallet {
            id: wallet.id.clone(),
            address: address.to_string(),
            scheme: wallet.scheme,
        }),
        _ => Err(SessionError::WalletNotFound(format!(
            "wallet {} has no address",
            wallet.id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(id: &str, address: Option<&str>, scheme: WalletScheme) -> WalletRef {
        WalletRef {
            id: id.to_string(),
            address: address.map(str::to_string),
            scheme,
        }
    }

    #[test]
    fn test_default_network_takes_first() {
        let wallets = vec![
            wallet("w1", Some("0xabc"), WalletScheme::Dkls),
            wallet("w2", Some("So1"), WalletScheme::Ed25519),
        ];
        let selected = select_wallet(&wallets, TargetNetwork::Default).unwrap();
        assert_eq!(selected.id, "w1");
        assert_eq!(selected.address, "0xabc");
    }

    #[test]
    fn test_solana_takes_first_ed25519() {
        let wallets = vec![
            wallet("w1", Some("0xabc"), WalletScheme::Dkls),
            wallet("w2", Some("So1"), WalletScheme::Ed25519),
            wallet("w3", Some("So2"), WalletScheme::Ed25519),
        ];
        let selected = select_wallet(&wallets, TargetNetwork::Solana).unwrap();
        assert_eq!(selected.id, "w2");
        assert_eq!(selected.scheme, WalletScheme::Ed25519);
    }

    #[test]
    fn test_solana_without_ed25519_is_not_found() {
        let wallets = vec![wallet("w1", Some("0xabc"), WalletScheme::Dkls)];
        assert!(find_wallet(&wallets, TargetNetwork::Solana).is_none());
        assert!(matches!(
            select_wallet(&wallets, TargetNetwork::Solana),
            Err(SessionError::WalletNotFound(_))
        ));
    }

    #[test]
    fn test_empty_list_is_not_found() {
        assert!(select_wallet(&[], TargetNetwork::Default).is_err());
    }

    #[test]
    fn test_missing_address_is_a_failure() {
        let wallets = vec![wallet("w1", None, WalletScheme::Dkls)];
        assert!(matches!(
            select_wallet(&wallets, TargetNetwork::Default),
            Err(SessionError::WalletNotFound(msg)) if msg.contains("w1")
        ));

        let wallets = vec![wallet("w1", Some("  "), WalletScheme::Dkls)];
        assert!(select_wallet(&wallets, TargetNetwork::Default).is_err());
    }
}
