//! Submit command - Submit a version for App Review

use clap::Args;
use console::style;
use tracing::info;

use appconnect_client::resources::Platform;

use crate::cli::output::{self, or_dash};
use crate::cli::{connect, runtime, Cli, OutputFormat};

/// Submit a version for App Review
#[derive(Debug, Args)]
pub struct SubmitCommand {
    /// Version ID
    pub version_id: String,

    /// Platform
    #[arg(long, default_value = "ios")]
    pub platform: Platform,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl SubmitCommand {
    /// Execute the submit command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(version_id = %self.version_id, platform = %self.platform, "executing submit command");

        if !self.yes
            && cli.format == OutputFormat::Text
            && !output::confirm(&format!("Submit version {} for App Review?", self.version_id))?
        {
            println!("Cancelled");
            return Ok(());
        }

        let rt = runtime()?;
        let submission = rt.block_on(async {
            let client = connect()?;
            let submission = client
                .submit_for_review(&self.version_id, self.platform)
                .await?;
            Ok::<_, anyhow::Error>(submission)
        })?;

        if cli.format == OutputFormat::Json {
            output::resource_json(&submission)?;
        } else if !cli.quiet {
            println!(
                "{} Submitted version {} for review",
                style("✓").green().bold(),
                style(&self.version_id).cyan()
            );
            println!("{}", output::key_value("Submission", &submission.id));
            println!(
                "{}",
                output::key_value("State", or_dash(submission.attributes.state.as_deref()))
            );
        }
        Ok(())
    }
}
