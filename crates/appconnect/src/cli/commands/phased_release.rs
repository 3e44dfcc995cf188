//! Phased release command - Control the 7-day phased rollout of a version

use clap::{Args, Subcommand};
use console::style;
use tracing::info;

use appconnect_client::resources::{PhasedRelease, PhasedReleaseState};
use appconnect_client::Client;

use crate::cli::output::{self, or_dash};
use crate::cli::{connect, runtime, Cli, OutputFormat};

/// Phased release management
#[derive(Debug, Args)]
pub struct PhasedReleaseCommand {
    #[command(subcommand)]
    pub subcommand: PhasedReleaseSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum PhasedReleaseSubcommand {
    /// Show the phased release of a version
    Status {
        /// Version ID
        version_id: String,
    },

    /// Set up a phased release for a version
    Enable {
        /// Version ID
        version_id: String,
    },

    /// Pause an active phased release
    Pause {
        /// Version ID
        version_id: String,
    },

    /// Resume a paused phased release
    Resume {
        /// Version ID
        version_id: String,
    },

    /// Release to all users immediately
    Complete {
        /// Version ID
        version_id: String,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

impl PhasedReleaseCommand {
    /// Execute the phased release command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing phased-release command");
        let rt = runtime()?;
        rt.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.subcommand {
            PhasedReleaseSubcommand::Status { version_id } => {
                let client = connect()?;
                let phased = client.get_phased_release(version_id).await?;
                if cli.format == OutputFormat::Json {
                    match &phased {
                        Some(phased) => output::resource_json(phased)?,
                        None => output::json(&serde_json::Value::Null)?,
                    }
                } else if !cli.quiet {
                    match &phased {
                        Some(phased) => print_phased(phased),
                        None => println!("Version {} has no phased release", version_id),
                    }
                }
                Ok(())
            }
            PhasedReleaseSubcommand::Enable { version_id } => {
                let client = connect()?;
                let phased = client.create_phased_release(version_id).await?;
                if cli.format == OutputFormat::Json {
                    output::resource_json(&phased)?;
                } else if !cli.quiet {
                    println!(
                        "{} Phased release enabled for version {}",
                        style("✓").green().bold(),
                        style(version_id).cyan()
                    );
                }
                Ok(())
            }
            PhasedReleaseSubcommand::Pause { version_id } => {
                transition(cli, version_id, PhasedReleaseState::Paused).await
            }
            PhasedReleaseSubcommand::Resume { version_id } => {
                transition(cli, version_id, PhasedReleaseState::Active).await
            }
            PhasedReleaseSubcommand::Complete { version_id, yes } => {
                if !yes
                    && cli.format == OutputFormat::Text
                    && !output::confirm("Release this version to all users now?")?
                {
                    println!("Cancelled");
                    return Ok(());
                }
                transition(cli, version_id, PhasedReleaseState::Complete).await
            }
        }
    }
}

async fn require_phased(client: &Client, version_id: &str) -> anyhow::Result<PhasedRelease> {
    client
        .get_phased_release(version_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Version {} has no phased release", version_id))
}

async fn transition(cli: &Cli, version_id: &str, state: PhasedReleaseState) -> anyhow::Result<()> {
    let client = connect()?;
    let current = require_phased(&client, version_id).await?;
    let phased = client.set_phased_release_state(&current.id, state).await?;

    if cli.format == OutputFormat::Json {
        output::resource_json(&phased)?;
    } else if !cli.quiet {
        println!(
            "{} Phased release is now {}",
            style("✓").green().bold(),
            output::state_style().apply_to(state)
        );
    }
    Ok(())
}

fn print_phased(phased: &PhasedRelease) {
    let attrs = &phased.attributes;
    println!("{}", output::header("Phased Release"));
    println!("{}", output::key_value("ID", &phased.id));
    println!(
        "{}",
        output::key_value(
            "State",
            &attrs
                .phased_release_state
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string())
        )
    );
    println!("{}", output::key_value("Started", or_dash(attrs.start_date.as_deref())));
    if let Some(day) = attrs.current_day_number {
        println!("{}", output::key_value("Day", &format!("{} of 7", day)));
    }
    if let Some(paused) = attrs.total_pause_duration {
        println!("{}", output::key_value("Days paused", &paused.to_string()));
    }
}
