//! Pre-order command - Make the configured app available for pre-order

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use console::style;
use tracing::info;

use appconnect_client::resources::PreOrder;
use appconnect_client::Client;

use crate::cli::output::{self, or_dash};
use crate::cli::{connect, runtime, Cli, OutputFormat};

/// Pre-order management
#[derive(Debug, Args)]
pub struct PreOrderCommand {
    #[command(subcommand)]
    pub subcommand: PreOrderSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum PreOrderSubcommand {
    /// Show the current pre-order
    Status,

    /// Enable pre-orders until the release date
    Enable {
        /// Release date (YYYY-MM-DD)
        #[arg(value_parser = parse_date)]
        release_date: NaiveDate,
    },

    /// Move the release date of an existing pre-order
    Update {
        /// Release date (YYYY-MM-DD)
        #[arg(value_parser = parse_date)]
        release_date: NaiveDate,
    },

    /// Cancel the pre-order
    Cancel {
        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

impl PreOrderCommand {
    /// Execute the pre-order command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing pre-order command");
        let rt = runtime()?;
        rt.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let client = connect()?;

        match &self.subcommand {
            PreOrderSubcommand::Status => {
                let pre_order = client.get_pre_order().await?;
                if cli.format == OutputFormat::Json {
                    match &pre_order {
                        Some(pre_order) => output::resource_json(pre_order)?,
                        None => output::json(&serde_json::Value::Null)?,
                    }
                } else if !cli.quiet {
                    match &pre_order {
                        Some(pre_order) => print_pre_order(pre_order),
                        None => println!("Pre-orders are not enabled"),
                    }
                }
            }

            PreOrderSubcommand::Enable { release_date } => {
                let date = release_date.format("%Y-%m-%d").to_string();
                let pre_order = client.enable_pre_order(&date).await?;
                if cli.format == OutputFormat::Json {
                    output::resource_json(&pre_order)?;
                } else if !cli.quiet {
                    println!(
                        "{} Pre-orders enabled, releasing on {}",
                        style("✓").green().bold(),
                        style(&date).cyan()
                    );
                }
            }

            PreOrderSubcommand::Update { release_date } => {
                let current = require_pre_order(&client).await?;
                let date = release_date.format("%Y-%m-%d").to_string();
                let pre_order = client.update_pre_order(&current.id, &date).await?;
                if cli.format == OutputFormat::Json {
                    output::resource_json(&pre_order)?;
                } else if !cli.quiet {
                    println!(
                        "{} Release date moved to {}",
                        style("✓").green().bold(),
                        style(&date).cyan()
                    );
                }
            }

            PreOrderSubcommand::Cancel { yes } => {
                let current = require_pre_order(&client).await?;
                if !yes
                    && cli.format == OutputFormat::Text
                    && !output::confirm("Cancel the pre-order?")?
                {
                    println!("Cancelled");
                    return Ok(());
                }

                client.cancel_pre_order(&current.id).await?;
                if cli.text() {
                    output::success("Pre-order cancelled");
                }
            }
        }

        Ok(())
    }
}

async fn require_pre_order(client: &Client) -> anyhow::Result<PreOrder> {
    client
        .get_pre_order()
        .await?
        .ok_or_else(|| anyhow::anyhow!("Pre-orders are not enabled for this app"))
}

fn print_pre_order(pre_order: &PreOrder) {
    let attrs = &pre_order.attributes;
    println!("{}", output::header("Pre-order"));
    println!("{}", output::key_value("ID", &pre_order.id));
    println!("{}", output::key_value("Release date", or_dash(attrs.app_release_date.as_deref())));
    println!(
        "{}",
        output::key_value("Available since", or_dash(attrs.pre_order_available_date.as_deref()))
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2026-12-01").unwrap(),
            NaiveDate::from_ymd_opt(2026, 12, 1).unwrap()
        );
        assert!(parse_date("12/01/2026").is_err());
        assert!(parse_date("2026-02-30").is_err());
    }
}
