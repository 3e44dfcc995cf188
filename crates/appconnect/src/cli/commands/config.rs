//! Config command - Create, inspect and validate the configuration

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use tracing::info;

use appconnect_client::{Client, Session};
use appconnect_core::config::{
    resolve_config, session_file, DEFAULT_CONFIG_TEMPLATE, ENV_FASTLANE_SESSION, ENV_SESSION,
};
use appconnect_core::ConnectConfig;

use crate::cli::output::{self, or_dash};
use crate::cli::{Cli, OutputFormat};

/// Configuration management
#[derive(Debug, Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub subcommand: ConfigSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Write a starter configuration file
    Init {
        /// Where to write the file
        #[arg(long, default_value = "appconnect.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration (file, .env and environment)
    Show,

    /// Check that credentials are complete and the key can be loaded
    Validate,

    /// Cache a web session for Resolution Center commands
    Session {
        /// Session string (cookie header or YAML cookie list); read from
        /// APP_STORE_CONNECT_SESSION / FASTLANE_SESSION when omitted
        value: Option<String>,

        /// Delete the cached session instead
        #[arg(long, conflicts_with = "value")]
        clear: bool,
    },
}

impl ConfigCommand {
    /// Execute the config command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing config command");
        match &self.subcommand {
            ConfigSubcommand::Init { path, force } => init(cli, path, *force),
            ConfigSubcommand::Show => show(cli),
            ConfigSubcommand::Validate => validate(cli),
            ConfigSubcommand::Session { value, clear } => {
                let path = session_file()
                    .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
                if *clear {
                    clear_session(cli, &path)
                } else {
                    store_session(cli, &path, value.as_deref())
                }
            }
        }
    }
}

fn init(cli: &Cli, path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        );
    }

    std::fs::write(path, DEFAULT_CONFIG_TEMPLATE)?;
    info!(path = %path.display(), "wrote configuration template");

    if cli.format == OutputFormat::Json {
        output::json(&serde_json::json!({ "path": path }))?;
    } else if !cli.quiet {
        println!(
            "{} Created {}",
            style("✓").green().bold(),
            output::path_style().apply_to(path.display())
        );
        output::info("Fill in key_id, issuer_id and private_key_path");
        output::info(&format!(
            "Run {} to check them",
            style("appconnect config validate").cyan()
        ));
    }
    Ok(())
}

fn show(cli: &Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let (mut config, source) = resolve_config(&cwd)?;
    let has_session = config.session.is_some();
    redact(&mut config);

    if cli.format == OutputFormat::Json {
        return output::json(&serde_json::json!({
            "source": source,
            "config": config,
        }));
    }
    if cli.quiet {
        return Ok(());
    }

    let creds = &config.credentials;
    println!("{}", output::header("Configuration"));
    println!(
        "{}",
        output::key_value(
            "Source",
            &source
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "environment only".to_string())
        )
    );
    println!("{}", output::key_value("Key ID", or_dash(non_empty(&creds.key_id))));
    println!("{}", output::key_value("Issuer ID", or_dash(non_empty(&creds.issuer_id))));
    println!(
        "{}",
        output::key_value("Private key", &creds.private_key_path.display().to_string())
    );
    println!("{}", output::key_value("App ID", or_dash(creds.app_id.as_deref())));
    println!("{}", output::key_value("Bundle ID", or_dash(creds.bundle_id.as_deref())));
    println!(
        "{}",
        output::key_value(
            "TLS",
            if config.tls.verifies() { "verify" } else { "accept invalid certificates" }
        )
    );
    if let Some(timeout) = config.timeout_secs {
        println!("{}", output::key_value("Timeout", &format!("{}s", timeout)));
    }
    println!(
        "{}",
        output::key_value(
            "Upload retries",
            &format!("{} attempts, {}s apart", config.upload.attempts, config.upload.sleep_secs)
        )
    );
    let session = if has_session {
        "set".to_string()
    } else {
        match session_file() {
            Some(path) if path.is_file() => format!("from {}", path.display()),
            _ => "none".to_string(),
        }
    };
    println!("{}", output::key_value("Web session", &session));
    println!("{}", output::key_value("API", &config.api_base_url));
    Ok(())
}

fn validate(cli: &Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let (config, source) = resolve_config(&cwd)?;
    let client = Client::new(config)?;
    // Signing proves the key parses as P-256
    client.bearer_token()?;

    if cli.format == OutputFormat::Json {
        output::json(&serde_json::json!({
            "valid": true,
            "source": source,
            "keyId": client.config().credentials.key_id,
        }))?;
    } else if !cli.quiet {
        output::success("Configuration is valid");
        if client.config().credentials.app_id.is_none() {
            output::warning("No app ID configured; app-scoped commands will fail");
        }
    }
    Ok(())
}

fn store_session(cli: &Cli, path: &Path, value: Option<&str>) -> anyhow::Result<()> {
    let raw = match value {
        Some(value) => value.to_string(),
        None => std::env::var(ENV_SESSION)
            .or_else(|_| std::env::var(ENV_FASTLANE_SESSION))
            .map_err(|_| {
                anyhow::anyhow!(
                    "No session given. Pass it as an argument or set {} or {}",
                    ENV_SESSION,
                    ENV_FASTLANE_SESSION
                )
            })?,
    };

    let session = Session::parse(&raw)
        .ok_or_else(|| anyhow::anyhow!("Session string contains no cookies"))?;
    session.save(path)?;

    if cli.format == OutputFormat::Json {
        output::json(&serde_json::json!({
            "path": path,
            "cookies": session.cookies().len(),
        }))?;
    } else if !cli.quiet {
        println!(
            "{} Cached {} cookie(s) in {}",
            style("✓").green().bold(),
            session.cookies().len(),
            output::path_style().apply_to(path.display())
        );
    }
    Ok(())
}

fn clear_session(cli: &Cli, path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
        if cli.text() {
            output::success("Removed cached web session");
        }
    } else if cli.text() {
        println!("No cached web session");
    }
    Ok(())
}

fn redact(config: &mut ConnectConfig) {
    if config.session.is_some() {
        config.session = Some("<redacted>".to_string());
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}
