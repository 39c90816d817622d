//! Interactive authentication session against the sandbox provider.

use crate::browser::{PrintBrowser, SystemBrowser};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::{Args, ValueEnum};
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::{debug, info, warn};
use wallet_auth_session::{
    stage_copy, BackOutcome, BrowserLauncher, CeremonyMedium, ControllerOptions, Identity,
    Session, SessionController, Stage, TargetNetwork, VerificationMedium,
};
use wallet_config_and_utils::Config;
use wallet_sandbox::{SandboxOptions, SandboxProvider};

/// How hosted ceremony pages are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum BrowserKind {
    /// Launch the system's default browser.
    #[default]
    System,
    /// Print the page URL only.
    Print,
}

#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Verification medium (email or phone)
    #[arg(long)]
    pub medium: Option<VerificationMedium>,

    /// Where the passkey ceremony runs (native or browser)
    #[arg(long)]
    pub ceremony: Option<CeremonyMedium>,

    /// Wallet selection (default or solana)
    #[arg(long)]
    pub network: Option<TargetNetwork>,

    /// How browser ceremonies are opened
    #[arg(long, value_enum, default_value = "system")]
    pub browser: BrowserKind,

    /// Fixed one-time code for the sandbox provider
    #[arg(long, env = "WALLET_DEMO_SANDBOX_CODE")]
    pub sandbox_code: Option<String>,
}

impl RunArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(medium) = self.medium {
            config.verification_medium = medium;
        }
        if let Some(ceremony) = self.ceremony {
            config.ceremony_medium = ceremony;
        }
        if let Some(network) = self.network {
            config.target_network = network;
        }
    }
}

/// One line of user input, interpreted for the current stage.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Quit,
    Back,
    Sign(&'a str),
    Input(&'a str),
}

fn parse_command(stage: Stage, line: &str) -> Command<'_> {
    let line = line.trim();
    match line {
        "quit" | "exit" | ":q" => Command::Quit,
        "back" => Command::Back,
        "logout" if stage == Stage::Authenticated => Command::Back,
        _ if stage == Stage::Authenticated => {
            Command::Sign(line.strip_prefix("sign").map(str::trim).unwrap_or(line))
        }
        _ => Command::Input(line),
    }
}

/// Split `+1 555 1234` into country code and number.
fn split_phone(input: &str) -> (&str, &str) {
    match input.trim().split_once(char::is_whitespace) {
        Some((code, number)) => (code, number.trim()),
        None => ("", input.trim()),
    }
}

fn prompt_for(stage: Stage, medium: VerificationMedium) -> &'static str {
    match (stage, medium) {
        (Stage::Initial, VerificationMedium::Email) => "Email",
        (Stage::Initial, VerificationMedium::Phone) => "Country code and phone (e.g. +1 5551234)",
        (Stage::Verification, _) => "Verification code",
        (Stage::Authenticated, _) => "Message to sign (or 'logout')",
    }
}

/// Run an interactive session on stdin.
pub async fn run(mut config: Config, args: RunArgs, format: OutputFormat) -> Result<()> {
    args.apply(&mut config);
    config.validate()?;

    let provider = Arc::new(SandboxProvider::with_options(SandboxOptions {
        fixed_code: args.sandbox_code.clone(),
        ..SandboxOptions::default()
    }));
    let browser: Arc<dyn BrowserLauncher> = match args.browser {
        BrowserKind::System => Arc::new(SystemBrowser),
        BrowserKind::Print => Arc::new(PrintBrowser),
    };

    let controller = SessionController::new(provider.clone(), ControllerOptions::from(&config))
        .with_browser(browser);
    controller.set_state_callback(Box::new(|event| {
        debug!(
            stage = %event.stage,
            busy = event.busy,
            wallet_id = ?event.wallet_id,
            "Session state changed"
        );
    }));

    info!(
        medium = %config.verification_medium,
        ceremony = %config.ceremony_medium,
        network = %config.target_network,
        "Starting interactive session"
    );

    let lines = BufReader::new(tokio::io::stdin()).lines();
    drive(&controller, &provider, lines, format).await
}

/// Drive `controller` from `lines` until the user quits or input ends.
pub(crate) async fn drive<R>(
    controller: &SessionController,
    provider: &SandboxProvider,
    mut lines: Lines<R>,
    format: OutputFormat,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let options = controller.options().clone();
    let session = interruptible(controller, controller.start()).await;
    if session.has_error() {
        output::print_session(&session, format);
    }

    let mut shown = None;
    loop {
        let stage = controller.stage();
        if shown != Some(stage) {
            let copy = stage_copy(
                stage,
                options.verification_medium,
                options.ceremony_medium,
                options.target_network,
            );
            output::print_stage(&copy, format);
            if stage == Stage::Authenticated {
                if let Some(secret) = controller.take_recovery_secret() {
                    output::print_recovery_secret(secret.expose(), format);
                }
                output::print_session(&controller.snapshot(), format);
            }
            shown = Some(stage);
        }

        if format == OutputFormat::Text {
            print!("{}> ", prompt_for(stage, options.verification_medium));
            std::io::stdout().flush()?;
        }

        let Some(line) = lines.next_line().await? else {
            debug!("Input closed");
            break;
        };

        match parse_command(stage, &line) {
            Command::Quit => break,
            Command::Back => {
                if controller.back().await == BackOutcome::Exit && stage == Stage::Initial {
                    break;
                }
            }
            Command::Sign(message) => {
                controller.set_message_to_sign(message);
                let session = match options.target_network {
                    TargetNetwork::Default => {
                        interruptible(controller, controller.sign_message()).await
                    }
                    TargetNetwork::Solana => {
                        interruptible(
                            controller,
                            controller.sign_transaction(message.as_bytes(), None),
                        )
                        .await
                    }
                };
                output::print_session(&session, format);
            }
            Command::Input(text) => {
                let session = match stage {
                    Stage::Initial => {
                        match options.verification_medium {
                            VerificationMedium::Email => {
                                controller.set_identifier(text);
                            }
                            VerificationMedium::Phone => {
                                let (country_code, number) = split_phone(text);
                                controller.set_country_code(country_code);
                                controller.set_identifier(number);
                            }
                        }
                        interruptible(controller, controller.authenticate()).await
                    }
                    Stage::Verification => {
                        controller.set_verification_code(text);
                        interruptible(controller, controller.verify()).await
                    }
                    Stage::Authenticated => controller.snapshot(),
                };

                if session.has_error() {
                    output::print_session(&session, format);
                } else if session.stage == Stage::Verification && stage == Stage::Initial {
                    show_sandbox_code(provider, &session, options.verification_medium, format);
                }
            }
        }
    }

    Ok(())
}

/// Await a controller action, cancelling a pending browser ceremony on Ctrl-C.
async fn interruptible<F>(controller: &SessionController, action: F) -> Session
where
    F: Future<Output = Session>,
{
    tokio::pin!(action);
    loop {
        tokio::select! {
            session = &mut action => return session,
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => {
                    warn!("Interrupted, cancelling pending ceremony");
                    controller.cancel_pending();
                }
                Err(e) => {
                    warn!(error = %e, "Cannot listen for Ctrl-C");
                    return action.await;
                }
            },
        }
    }
}

/// The sandbox has no mail or SMS delivery, so the issued code is shown here.
fn show_sandbox_code(
    provider: &SandboxProvider,
    session: &Session,
    medium: VerificationMedium,
    format: OutputFormat,
) {
    let identity = match medium {
        VerificationMedium::Email => Identity::Email(session.identifier.clone()),
        VerificationMedium::Phone => Identity::Phone {
            number: session.identifier.clone(),
            country_code: session.country_code.clone(),
        },
    };

    if let Some(code) = provider.issued_code(&identity) {
        match format {
            OutputFormat::Text => println!("(sandbox) Code sent to {}: {}", identity, code),
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({
                    "event": "sandbox_code",
                    "identity": identity.to_string(),
                    "code": code,
                })
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sandbox() -> Arc<SandboxProvider> {
        Arc::new(SandboxProvider::with_options(SandboxOptions {
            fixed_code: Some("246810".to_string()),
            web_completion_delay: Duration::from_millis(10),
            ..SandboxOptions::default()
        }))
    }

    fn script(input: &'static str) -> Lines<BufReader<&'static [u8]>> {
        BufReader::new(input.as_bytes()).lines()
    }

    #[test]
    fn test_parse_command_by_stage() {
        assert_eq!(parse_command(Stage::Initial, " quit "), Command::Quit);
        assert_eq!(parse_command(Stage::Verification, "back"), Command::Back);
        assert_eq!(
            parse_command(Stage::Initial, "a@b.co"),
            Command::Input("a@b.co")
        );
        assert_eq!(parse_command(Stage::Authenticated, "logout"), Command::Back);
        assert_eq!(
            parse_command(Stage::Authenticated, "sign hello there"),
            Command::Sign("hello there")
        );
        assert_eq!(
            parse_command(Stage::Authenticated, "hello"),
            Command::Sign("hello")
        );
        assert_eq!(
            parse_command(Stage::Initial, "logout"),
            Command::Input("logout")
        );
    }

    #[test]
    fn test_split_phone() {
        assert_eq!(split_phone("+1 555 1234"), ("+1", "555 1234"));
        assert_eq!(split_phone(" 44  7700900 "), ("44", "7700900"));
        assert_eq!(split_phone("5551234"), ("", "5551234"));
    }

    #[test]
    fn test_run_args_override_config() {
        let mut config = Config::default();
        let args = RunArgs {
            medium: Some(VerificationMedium::Phone),
            network: Some(TargetNetwork::Solana),
            ..RunArgs::default()
        };

        args.apply(&mut config);

        assert_eq!(config.verification_medium, VerificationMedium::Phone);
        assert_eq!(config.ceremony_medium, CeremonyMedium::Native);
        assert_eq!(config.target_network, TargetNetwork::Solana);
    }

    #[tokio::test]
    async fn test_drive_registers_and_signs() {
        let provider = sandbox();
        let controller = SessionController::new(provider.clone(), ControllerOptions::default());

        drive(
            &controller,
            &provider,
            script("new@example.com\n246810\nsign hello\nquit\n"),
            OutputFormat::Json,
        )
        .await
        .unwrap();

        let session = controller.snapshot();
        assert_eq!(session.stage, Stage::Authenticated);
        assert!(session.signed_message.starts_with("0x"));
        assert!(controller.take_recovery_secret().is_none());
    }

    #[tokio::test]
    async fn test_drive_back_from_verification_returns_to_entry() {
        let provider = sandbox();
        let controller = SessionController::new(provider.clone(), ControllerOptions::default());

        drive(
            &controller,
            &provider,
            script("new@example.com\nback\n"),
            OutputFormat::Json,
        )
        .await
        .unwrap();

        let session = controller.snapshot();
        assert_eq!(session.stage, Stage::Initial);
        assert!(session.identifier.is_empty());
    }

    #[tokio::test]
    async fn test_drive_phone_flow() {
        let provider = sandbox();
        let controller = SessionController::new(
            provider.clone(),
            ControllerOptions {
                verification_medium: VerificationMedium::Phone,
                ..ControllerOptions::default()
            },
        );

        drive(
            &controller,
            &provider,
            script("+44 7700 900123\n246810\n"),
            OutputFormat::Json,
        )
        .await
        .unwrap();

        let session = controller.snapshot();
        assert_eq!(session.stage, Stage::Authenticated);
        assert_eq!(session.country_code, "+44");
    }

    #[tokio::test]
    async fn test_drive_stops_on_back_at_entry() {
        let provider = sandbox();
        let controller = SessionController::new(provider.clone(), ControllerOptions::default());

        drive(
            &controller,
            &provider,
            script("back\nnew@example.com\n"),
            OutputFormat::Json,
        )
        .await
        .unwrap();

        assert_eq!(controller.stage(), Stage::Initial);
        assert!(provider
            .issued_code(&Identity::Email("new@example.com".to_string()))
            .is_none());
    }
}
