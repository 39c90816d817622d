//! Configuration, file-system paths and logging setup shared by the wallet
//! session crates and the demo CLI.

mod config;
mod error;
mod flow;
mod logging;
mod paths;

pub use config::{Config, DEFAULT_LOG_LEVEL, DEFAULT_WEB_COMPLETION_TIMEOUT_SECS};
pub use error::{CoreError, CoreResult};
pub use flow::{CeremonyMedium, TargetNetwork, VerificationMedium};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
