//! Configuration commands.

use crate::output::{self, OutputFormat};
use anyhow::Result;
use wallet_config_and_utils::{Config, Paths};

/// Print the effective configuration.
pub fn config_show(paths: &Paths, config: &Config, format: OutputFormat) -> Result<()> {
    output::print(config, format, |config| {
        output::print_heading("Configuration");
        output::print_row("File", &paths.config_file().display().to_string());
        output::print_row("Log file", &paths.log_file().display().to_string());
        output::print_row("Log level", &config.log_level);
        output::print_row("Medium", config.verification_medium.as_str());
        output::print_row("Ceremony", config.ceremony_medium.as_str());
        output::print_row("Network", config.target_network.as_str());
        output::print_row(
            "Web timeout",
            &format!("{}s", config.web_completion_timeout_secs),
        );
    });
    Ok(())
}

/// Write the effective configuration to the config file.
pub fn config_init(
    paths: &Paths,
    config: &Config,
    force: bool,
    format: OutputFormat,
) -> Result<()> {
    let path = paths.config_file();
    if path.exists() && !force {
        output::print_error(
            &format!(
                "{} already exists. Use --force to overwrite it.",
                path.display()
            ),
            format,
        );
        return Ok(());
    }

    config.save(paths)?;
    output::print_success(&format!("Wrote {}", path.display()), format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_init_writes_file() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        let config = Config {
            web_completion_timeout_secs: 30,
            ..Config::default()
        };

        config_init(&paths, &config, false, OutputFormat::Json).unwrap();

        let written = Config::load_from_file(&paths.config_file()).unwrap();
        assert_eq!(written, config);
    }

    #[test]
    fn test_config_init_keeps_existing_file_without_force() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        Config::default().save(&paths).unwrap();

        let changed = Config {
            log_level: "debug".to_string(),
            ..Config::default()
        };
        config_init(&paths, &changed, false, OutputFormat::Json).unwrap();
        assert_eq!(
            Config::load_from_file(&paths.config_file()).unwrap(),
            Config::default()
        );

        config_init(&paths, &changed, true, OutputFormat::Json).unwrap();
        assert_eq!(
            Config::load_from_file(&paths.config_file()).unwrap(),
            changed
        );
    }
}
