//! Output formatting for the CLI.

use clap::ValueEnum;
use serde::Serialize;
use wallet_auth_session::{Session, StageCopy};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a serialisable value; text mode uses `text` to render it.
pub fn print<T: Serialize>(value: &T, format: OutputFormat, text: impl FnOnce(&T)) {
    match format {
        OutputFormat::Text => text(value),
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error: failed to encode output: {}", e),
        },
    }
}

/// Print a success message.
pub fn print_success(message: &str, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", message),
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "status": "success", "message": message }));
        }
    }
}

/// Print an error message.
pub fn print_error(message: &str, format: OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Error: {}", message),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "status": "error", "message": message }));
        }
    }
}

/// Print a table row.
pub fn print_row(label: &str, value: &str) {
    println!("  {:<16} {}", format!("{}:", label), value);
}

pub fn print_divider() {
    println!("{}", "-".repeat(50));
}

pub fn print_heading(text: &str) {
    println!("\n{}", text);
    print_divider();
}

/// Render the header for a stage the user just entered.
pub fn print_stage(copy: &StageCopy, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            print_heading(&copy.title);
            println!("{}", copy.description);
        }
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "event": "stage",
                "title": copy.title,
                "description": copy.description,
                "action": copy.action,
            })
        ),
    }
}

/// Render the outcome of a controller action.
pub fn print_session(session: &Session, format: OutputFormat) {
    print(session, format, |session| {
        if session.is_authenticated() {
            print_row("Wallet ID", &session.wallet_id);
            print_row("Address", &session.wallet_address);
            if !session.signed_message.is_empty() {
                print_row("Signature", &session.signed_message);
            }
        }
        if session.has_error() {
            eprintln!("Error: {}", session.error_message);
        }
    });
}

/// Show a recovery secret; it is handed out once per new wallet.
pub fn print_recovery_secret(secret: &str, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            print_heading("Recovery secret");
            println!("{}", secret);
            println!("Store this somewhere safe. It will not be shown again.");
        }
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "event": "recovery_secret", "recovery_secret": secret })
        ),
    }
}
