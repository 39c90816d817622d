//! Session state machine using rust-fsm.
//!
//! The three user-visible stages (initial, verification, authenticated) are
//! refined into explicit transient states, one per in-flight provider call.
//! A second action while a transient state is active has no transition and
//! is rejected by the machine itself.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐  CheckUser   ┌─────────────────┐  UserFound    ┌─────────────────┐
//! │     Initial     │ ───────────► │  CheckingUser   │ ────────────► │    LoggingIn    │
//! └─────────────────┘              └────────┬────────┘               └────────┬────────┘
//!   │   ▲        ▲                          │ UserMissing                     │ LoginSucceeded
//!   │   │        │ CreateFailed             ▼                                 │
//!   │   │        │                 ┌─────────────────┐                        │
//!   │   │        └──────────────── │  CreatingUser   │                        │
//!   │   │                          └────────┬────────┘                        │
//!   │   │ Reset                             │ CreateSucceeded                 │
//!   │   │                                   ▼                                 │
//!   │   │                          ┌─────────────────┐  SubmitCode  ┌─────────┴───────┐
//!   │   └───────────────────────── │  Verification   │ ───────────► │    Verifying    │
//!   │                              └─────────────────┘ ◄─────────── └────────┬────────┘
//!   │ Restore                                          VerifyFailed          │ VerifySucceeded
//!   ▼                                                                        ▼
//! ┌─────────────────┐  Restored                                    ┌─────────────────┐
//! │    Restoring    │ ───────────────────────────────────────────► │  Authenticated  │
//! └─────────────────┘                                              └────────┬────────┘
//!                                                   SignRequested/SignFinished │ LogoutRequested
//!                                                       (Signing)              ▼
//!                                                                   ┌─────────────────┐
//!                                                                   │   LoggingOut    │ ─► Initial
//!                                                                   └─────────────────┘
//! ```

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Initial)

    Initial => {
        CheckUser => CheckingUser,
        Restore => Restoring,
        Reset => Initial
    },
    CheckingUser => {
        UserFound => LoggingIn,
        UserMissing => CreatingUser,
        CheckFailed => Initial
    },
    Restoring => {
        Restored => Authenticated,
        NothingToRestore => Initial
    },
    CreatingUser => {
        CreateSucceeded => Verification,
        CreateFailed => Initial
    },
    LoggingIn => {
        LoginSucceeded => Authenticated,
        LoginFailed => Initial
    },
    Verification => {
        SubmitCode => Verifying,
        Reset => Initial
    },
    Verifying => {
        VerifySucceeded => Authenticated,
        VerifyFailed => Verification
    },
    Authenticated => {
        SignRequested => Signing,
        LogoutRequested => LoggingOut
    },
    Signing => {
        SignFinished => Authenticated
    },
    LoggingOut => {
        LogoutFinished => Initial
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// User-visible stage of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Collecting the identifier.
    #[default]
    Initial,
    /// Waiting for the one-time code.
    Verification,
    /// A wallet is selected.
    Authenticated,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Initial => "initial",
            Stage::Verification => "verification",
            Stage::Authenticated => "authenticated",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&SessionMachineState> for Stage {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Initial
            | SessionMachineState::CheckingUser
            | SessionMachineState::CreatingUser
            | SessionMachineState::LoggingIn
            | SessionMachineState::Restoring => Stage::Initial,
            SessionMachineState::Verification | SessionMachineState::Verifying => {
                Stage::Verification
            }
            SessionMachineState::Authenticated
            | SessionMachineState::Signing
            | SessionMachineState::LoggingOut => Stage::Authenticated,
        }
    }
}

/// Returns true while a provider call is in flight.
pub fn is_transient(state: &SessionMachineState) -> bool {
    matches!(
        state,
        SessionMachineState::CheckingUser
            | SessionMachineState::CreatingUser
            | SessionMachineState::LoggingIn
            | SessionMachineState::Restoring
            | SessionMachineState::Verifying
            | SessionMachineState::Signing
            | SessionMachineState::LoggingOut
    )
}

/// Payload for session state change events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStateChanged {
    /// Current stage.
    pub stage: Stage,
    /// Whether a provider call is in flight.
    pub busy: bool,
    /// Selected wallet, once authenticated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_in(inputs: &[SessionMachineInput]) -> SessionMachine {
        let mut machine = SessionMachine::new();
        for input in inputs {
            machine.consume(input).unwrap();
        }
        machine
    }

    #[test]
    fn test_initial_state() {
        let machine = SessionMachine::new();
        assert_eq!(*machine.state(), SessionMachineState::Initial);
        assert!(!is_transient(machine.state()));
    }

    #[test]
    fn test_existing_user_goes_to_login() {
        let machine = machine_in(&[SessionMachineInput::CheckUser, SessionMachineInput::UserFound]);
        assert_eq!(*machine.state(), SessionMachineState::LoggingIn);

        let machine = machine_in(&[
            SessionMachineInput::CheckUser,
            SessionMachineInput::UserFound,
            SessionMachineInput::LoginSucceeded,
        ]);
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_new_user_requires_verification() {
        let mut machine = machine_in(&[
            SessionMachineInput::CheckUser,
            SessionMachineInput::UserMissing,
            SessionMachineInput::CreateSucceeded,
        ]);
        assert_eq!(*machine.state(), SessionMachineState::Verification);

        // No shortcut from verification into authenticated
        assert!(machine
            .consume(&SessionMachineInput::VerifySucceeded)
            .is_err());
        assert!(machine.consume(&SessionMachineInput::LoginSucceeded).is_err());

        machine.consume(&SessionMachineInput::SubmitCode).unwrap();
        machine.consume(&SessionMachineInput::VerifySucceeded).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_verify_failure_stays_in_verification() {
        let mut machine = machine_in(&[
            SessionMachineInput::CheckUser,
            SessionMachineInput::UserMissing,
            SessionMachineInput::CreateSucceeded,
            SessionMachineInput::SubmitCode,
        ]);
        machine.consume(&SessionMachineInput::VerifyFailed).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Verification);
    }

    #[test]
    fn test_failures_return_to_initial() {
        for failure in [
            vec![SessionMachineInput::CheckUser, SessionMachineInput::CheckFailed],
            vec![
                SessionMachineInput::CheckUser,
                SessionMachineInput::UserMissing,
                SessionMachineInput::CreateFailed,
            ],
            vec![
                SessionMachineInput::CheckUser,
                SessionMachineInput::UserFound,
                SessionMachineInput::LoginFailed,
            ],
            vec![SessionMachineInput::Restore, SessionMachineInput::NothingToRestore],
        ] {
            let machine = machine_in(&failure);
            assert_eq!(*machine.state(), SessionMachineState::Initial);
        }
    }

    #[test]
    fn test_restore_flow() {
        let machine = machine_in(&[SessionMachineInput::Restore, SessionMachineInput::Restored]);
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_signing_round_trip_stays_authenticated() {
        let mut machine = machine_in(&[SessionMachineInput::Restore, SessionMachineInput::Restored]);

        machine.consume(&SessionMachineInput::SignRequested).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Signing);
        assert!(is_transient(machine.state()));

        // A second request while signing is rejected
        assert!(machine.consume(&SessionMachineInput::SignRequested).is_err());
        assert!(machine
            .consume(&SessionMachineInput::LogoutRequested)
            .is_err());

        machine.consume(&SessionMachineInput::SignFinished).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_logout_flow() {
        let mut machine = machine_in(&[SessionMachineInput::Restore, SessionMachineInput::Restored]);

        machine.consume(&SessionMachineInput::LogoutRequested).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::LoggingOut);

        machine.consume(&SessionMachineInput::LogoutFinished).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Initial);
    }

    #[test]
    fn test_reset_only_from_idle_pre_auth_states() {
        let mut machine = machine_in(&[
            SessionMachineInput::CheckUser,
            SessionMachineInput::UserMissing,
            SessionMachineInput::CreateSucceeded,
        ]);
        machine.consume(&SessionMachineInput::Reset).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Initial);

        let mut machine = machine_in(&[SessionMachineInput::CheckUser]);
        assert!(machine.consume(&SessionMachineInput::Reset).is_err());

        let mut machine = machine_in(&[SessionMachineInput::Restore, SessionMachineInput::Restored]);
        assert!(machine.consume(&SessionMachineInput::Reset).is_err());
    }

    #[test]
    fn test_busy_states_reject_new_entries() {
        let mut machine = machine_in(&[SessionMachineInput::CheckUser]);
        assert!(machine.consume(&SessionMachineInput::CheckUser).is_err());
        assert!(machine.consume(&SessionMachineInput::Restore).is_err());
    }

    #[test]
    fn test_stage_mapping() {
        use SessionMachineState::*;

        for state in [Initial, CheckingUser, CreatingUser, LoggingIn, Restoring] {
            assert_eq!(Stage::from(&state), Stage::Initial);
        }
        for state in [Verification, Verifying] {
            assert_eq!(Stage::from(&state), Stage::Verification);
        }
        for state in [Authenticated, Signing, LoggingOut] {
            assert_eq!(Stage::from(&state), Stage::Authenticated);
        }
    }

    #[test]
    fn test_is_transient() {
        use SessionMachineState::*;

        assert!(!is_transient(&Initial));
        assert!(!is_transient(&Verification));
        assert!(!is_transient(&Authenticated));
        for state in [
            CheckingUser,
            CreatingUser,
            LoggingIn,
            Restoring,
            Verifying,
            Signing,
            LoggingOut,
        ] {
            assert!(is_transient(&state));
        }
    }

    #[test]
    fn test_state_changed_serialization() {
        let payload = SessionStateChanged {
            stage: Stage::Authenticated,
            busy: false,
            wallet_id: Some("w1".to_string()),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["stage"], "authenticated");
        assert_eq!(json["busy"], false);
        assert_eq!(json["wallet_id"], "w1");

        let idle = SessionStateChanged {
            stage: Stage::Initial,
            busy: true,
            wallet_id: None,
        };
        let json = serde_json::to_value(&idle).unwrap();
        assert!(json.get("wallet_id").is_none());
    }
}
