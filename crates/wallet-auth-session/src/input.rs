//! Input validation performed before any provider call.

use crate::error::{SessionError, SessionResult};
use crate::provider::Identity;
use wallet_config_and_utils::VerificationMedium;

pub(crate) const MSG_ENTER_EMAIL: &str = "Please enter your email address.";
pub(crate) const MSG_ENTER_PHONE: &str = "Please enter your phone number.";
pub(crate) const MSG_ENTER_COUNTRY_CODE: &str =
    "Please enter a valid country code (1-3 digits, e.g. +1).";
pub(crate) const MSG_ENTER_CODE: &str = "Please enter the verification code.";

/// Normalise a calling code such as `1`, `+1` or ` +44 ` to `+<digits>`.
pub fn normalize_country_code(raw: &str) -> SessionResult<String> {
    let digits = raw.trim();
    let digits = digits.strip_prefix('+').unwrap_or(digits);

    if digits.is_empty() || digits.len() > 3 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(SessionError::Validation(MSG_ENTER_COUNTRY_CODE.to_string()));
    }

    Ok(format!("+{}", digits))
}

/// Build the identity for `medium` from raw session input.
pub(crate) fn build_identity(
    medium: VerificationMedium,
    identifier: &str,
    country_code: &str,
) -> SessionResult<Identity> {
    let identifier = identifier.trim();

    match medium {
        VerificationMedium::Email => {
            if identifier.is_empty() {
                return Err(SessionError::Validation(MSG_ENTER_EMAIL.to_string()));
            }
            Ok(Identity::Email(identifier.to_string()))
        }
        VerificationMedium::Phone => {
            if identifier.is_empty() {
                return Err(SessionError::Validation(MSG_ENTER_PHONE.to_string()));
            }
            Ok(Identity::Phone {
                number: identifier.to_string(),
                country_code: normalize_country_code(country_code)?,
            })
        }
    }
}

/// Trimmed one-time code, rejecting blanks.
pub(crate) fn require_code(code: &str) -> SessionResult<String> {
    let code = code.trim();
    if code.is_empty() {
        return Err(SessionError::Validation(MSG_ENTER_CODE.to_string()));
    }
    Ok(code.to_string())
}
