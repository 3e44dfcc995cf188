//! Release command - Release a version that is pending developer release

use clap::Args;
use console::style;
use tracing::info;

use crate::cli::output;
use crate::cli::{connect, runtime, Cli, OutputFormat};

/// Manually release an approved version
#[derive(Debug, Args)]
pub struct ReleaseCommand {
    /// Version ID
    pub version_id: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl ReleaseCommand {
    /// Execute the release command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(version_id = %self.version_id, "executing release command");

        if !self.yes
            && cli.format == OutputFormat::Text
            && !output::confirm(&format!("Release version {} to the App Store?", self.version_id))?
        {
            println!("Cancelled");
            return Ok(());
        }

        let rt = runtime()?;
        rt.block_on(async {
            let client = connect()?;
            client.release_version(&self.version_id).await?;
            Ok::<_, anyhow::Error>(())
        })?;

        if cli.format == OutputFormat::Json {
            output::json(&serde_json::json!({ "versionId": self.version_id, "released": true }))?;
        } else if !cli.quiet {
            println!(
                "{} Release requested for version {}",
                style("✓").green().bold(),
                style(&self.version_id).cyan()
            );
        }
        Ok(())
    }
}
