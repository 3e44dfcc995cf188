//! Messages command - Read App Review messages from the Resolution Center

use clap::Args;
use console::style;
use tracing::info;

use appconnect_client::resources::Platform;

use crate::cli::output::{self, or_dash};
use crate::cli::{connect, runtime, Cli, OutputFormat};

/// Resolution Center messages (requires a web session)
#[derive(Debug, Args)]
pub struct MessagesCommand {
    /// Platform
    #[arg(long, default_value = "ios")]
    pub platform: Platform,

    /// Print message bodies as served, without stripping HTML
    #[arg(long)]
    pub html: bool,
}

impl MessagesCommand {
    /// Execute the messages command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(platform = %self.platform, "executing messages command");
        let rt = runtime()?;
        let messages = rt.block_on(async {
            let client = connect()?;
            let messages = client.review_messages(self.platform).await?;
            Ok::<_, anyhow::Error>(messages)
        })?;

        if cli.format == OutputFormat::Json {
            return output::json(&messages);
        }
        if cli.quiet {
            return Ok(());
        }

        if messages.is_empty() {
            println!("No App Review messages");
            return Ok(());
        }

        for message in &messages {
            let date = message
                .date
                .map(|d| d.format("%Y-%m-%d %H:%M UTC").to_string());
            println!(
                "{} {}",
                output::header(or_dash(message.from.as_deref())),
                style(or_dash(date.as_deref())).dim()
            );
            let body = if self.html {
                message.body.clone()
            } else {
                message.plain_text()
            };
            for line in body.lines() {
                println!("  {}", line);
            }
            println!();
        }

        Ok(())
    }
}
