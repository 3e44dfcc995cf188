//! Groups command - Manage TestFlight beta groups

use clap::{Args, Subcommand};
use console::style;
use tracing::info;

use appconnect_client::resources::BetaGroup;

use crate::cli::output::{self, or_dash};
use crate::cli::{connect, runtime, Cli, OutputFormat};

/// Beta group management
#[derive(Debug, Args)]
pub struct GroupsCommand {
    #[command(subcommand)]
    pub subcommand: GroupsSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum GroupsSubcommand {
    /// List beta groups of the configured app
    List,

    /// Create a new beta group
    Create {
        /// Group name
        name: String,

        /// Enable a public TestFlight link
        #[arg(long)]
        public_link: bool,
    },

    /// Delete a beta group
    Delete {
        /// Group ID
        id: String,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Make builds available to a group
    AddBuilds {
        /// Group ID
        id: String,

        /// Build IDs
        #[arg(required = true)]
        builds: Vec<String>,
    },
}

impl GroupsCommand {
    /// Execute the groups command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing groups command");
        let rt = runtime()?;
        rt.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.subcommand {
            GroupsSubcommand::List => {
                let client = connect()?;
                let groups = client.list_beta_groups().await?;
                if cli.format == OutputFormat::Json {
                    output::resources_json(&groups)?;
                } else if !cli.quiet {
                    if groups.is_empty() {
                        println!("No beta groups found");
                    } else {
                        println!("{}", output::header(&format!("Beta Groups ({})", groups.len())));
                        for group in &groups {
                            print_group(group);
                        }
                    }
                }
            }

            GroupsSubcommand::Create { name, public_link } => {
                let client = connect()?;
                let group = client.create_beta_group(name, *public_link).await?;
                if cli.format == OutputFormat::Json {
                    output::resource_json(&group)?;
                } else if !cli.quiet {
                    println!(
                        "{} Created group '{}' {}",
                        style("✓").green().bold(),
                        style(name).cyan(),
                        style(&group.id).dim()
                    );
                    if let Some(link) = &group.attributes.public_link {
                        println!("{}", output::key_value("Public link", link));
                    }
                }
            }

            GroupsSubcommand::Delete { id, yes } => {
                if !yes
                    && cli.format == OutputFormat::Text
                    && !output::confirm(&format!("Delete beta group {}?", id))?
                {
                    println!("Cancelled");
                    return Ok(());
                }

                let client = connect()?;
                client.delete_beta_group(id).await?;
                if cli.text() {
                    println!("{} Deleted group {}", style("✓").green().bold(), style(id).cyan());
                }
            }

            GroupsSubcommand::AddBuilds { id, builds } => {
                let client = connect()?;
                let build_ids: Vec<&str> = builds.iter().map(String::as_str).collect();
                client.add_builds_to_group(id, &build_ids).await?;
                if cli.text() {
                    println!(
                        "{} Added {} build(s) to group {}",
                        style("✓").green().bold(),
                        build_ids.len(),
                        style(id).cyan()
                    );
                }
            }
        }

        Ok(())
    }
}

fn print_group(group: &BetaGroup) {
    let attrs = &group.attributes;
    let kind = if attrs.is_internal_group == Some(true) {
        "internal"
    } else {
        "external"
    };

    println!(
        "  {} ({}) {}",
        style(or_dash(attrs.name.as_deref())).cyan(),
        kind,
        style(&group.id).dim()
    );
    if attrs.public_link_enabled == Some(true) {
        if let Some(link) = &attrs.public_link {
            println!("    {}", style(link).dim());
        }
    }
}
