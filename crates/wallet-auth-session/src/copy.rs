//! Titles and descriptions shown for each stage.

use crate::session_fsm::Stage;
use wallet_config_and_utils::{CeremonyMedium, TargetNetwork, VerificationMedium};

/// Header text and primary action label for a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCopy {
    pub title: String,
    pub description: String,
    /// Label of the primary action, if the stage has one.
    pub action: Option<&'static str>,
}

pub fn stage_copy(
    stage: Stage,
    medium: VerificationMedium,
    ceremony: CeremonyMedium,
    network: TargetNetwork,
) -> StageCopy {
    let (contact, verify_title) = match medium {
        VerificationMedium::Email => ("email", "Email Verification"),
        VerificationMedium::Phone => ("phone number", "Phone Verification"),
    };
    let ceremony_name = match ceremony {
        CeremonyMedium::Native => "native",
        CeremonyMedium::Browser => "browser",
    };

    match stage {
        Stage::Initial => {
            let flow = match (medium, ceremony) {
                (VerificationMedium::Phone, _) => "Phone-based".to_string(),
                (_, CeremonyMedium::Native) => "Native".to_string(),
                (_, CeremonyMedium::Browser) => "Browser".to_string(),
            };
            let title = match network {
                TargetNetwork::Default => format!("{} Passkeys Authentication", flow),
                TargetNetwork::Solana => format!("Solana {} Passkeys Authentication", flow),
            };
            StageCopy {
                title,
                description: format!(
                    "Enter your {} to authenticate using {} passkeys. \
                     If you're a new user, you'll be asked to verify your {}.",
                    contact, ceremony_name, contact
                ),
                action: Some("Authenticate"),
            }
        }
        Stage::Verification => {
            let inbox = match medium {
                VerificationMedium::Email => "email",
                VerificationMedium::Phone => "phone",
            };
            StageCopy {
                title: verify_title.to_string(),
                description: format!(
                    "A verification code has been sent to your {}. \
                     Please enter it below to complete the authentication process.",
                    inbox
                ),
                action: Some("Verify Code"),
            }
        }
        Stage::Authenticated => StageCopy {
            title: match network {
                TargetNetwork::Default => "Sign Message".to_string(),
                TargetNetwork::Solana => "Sign Solana Transaction".to_string(),
            },
            description: "Enter a message below to sign it using your authenticated passkey."
                .to_string(),
            action: Some("Sign"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_email_copy() {
        let copy = stage_copy(
            Stage::Initial,
            VerificationMedium::Email,
            CeremonyMedium::Native,
            TargetNetwork::Default,
        );
        assert_eq!(copy.title, "Native Passkeys Authentication");
        assert_eq!(
            copy.description,
            "Enter your email to authenticate using native passkeys. \
             If you're a new user, you'll be asked to verify your email."
        );
        assert_eq!(copy.action, Some("Authenticate"));
    }

    #[test]
    fn test_phone_verification_copy() {
        let copy = stage_copy(
            Stage::Verification,
            VerificationMedium::Phone,
            CeremonyMedium::Native,
            TargetNetwork::Default,
        );
        assert_eq!(copy.title, "Phone Verification");
        assert!(copy.description.contains("sent to your phone."));
    }

    #[test]
    fn test_phone_initial_title() {
        let copy = stage_copy(
            Stage::Initial,
            VerificationMedium::Phone,
            CeremonyMedium::Native,
            TargetNetwork::Default,
        );
        assert_eq!(copy.title, "Phone-based Passkeys Authentication");
        assert!(copy.description.starts_with("Enter your phone number"));
    }

    #[test]
    fn test_browser_and_solana_titles() {
        let browser = stage_copy(
            Stage::Initial,
            VerificationMedium::Email,
            CeremonyMedium::Browser,
            TargetNetwork::Default,
        );
        assert_eq!(browser.title, "Browser Passkeys Authentication");
        assert!(browser.description.contains("browser passkeys"));

        let solana = stage_copy(
            Stage::Initial,
            VerificationMedium::Email,
            CeremonyMedium::Native,
            TargetNetwork::Solana,
        );
        assert_eq!(solana.title, "Solana Native Passkeys Authentication");

        let signing = stage_copy(
            Stage::Authenticated,
            VerificationMedium::Email,
            CeremonyMedium::Native,
            TargetNetwork::Solana,
        );
        assert_eq!(signing.title, "Sign Solana Transaction");
    }
}
