//! Flow selectors that parametrise the session controller.
//!
//! The three axes are independent: any verification medium can be combined
//! with any ceremony medium and target network.

use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the user's identity is verified before a passkey is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMedium {
    /// One-time code delivered by email.
    #[default]
    Email,
    /// One-time code delivered by SMS to a phone number with country code.
    Phone,
}

/// Where the passkey ceremony runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CeremonyMedium {
    /// Platform authenticator API, driven by the provider SDK.
    #[default]
    Native,
    /// Hosted web page opened in a browser; completion is signalled out of band.
    Browser,
}

/// Which wallet the session binds to after login or provisioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetNetwork {
    /// First wallet the provider returns.
    #[default]
    Default,
    /// First ED25519 wallet, provisioning one when absent.
    Solana,
}

impl VerificationMedium {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
        }
    }
}

impl CeremonyMedium {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Browser => "browser",
        }
    }
}

impl TargetNetwork {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Solana => "solana",
        }
    }
}

impl fmt::Display for VerificationMedium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CeremonyMedium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TargetNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationMedium {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "phone" | "sms" => Ok(Self::Phone),
            other => Err(CoreError::Config(format!(
                "Unknown verification medium: {}",
                other
            ))),
        }
    }
}

impl FromStr for CeremonyMedium {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(Self::Native),
            "browser" | "webview" | "web" => Ok(Self::Browser),
            other => Err(CoreError::Config(format!(
                "Unknown ceremony medium: {}",
                other
            ))),
        }
    }
}

impl FromStr for TargetNetwork {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" | "evm" => Ok(Self::Default),
            "solana" => Ok(Self::Solana),
            other => Err(CoreError::Config(format!(
                "Unknown target network: {}",
                other
            ))),
        }
    }
}
