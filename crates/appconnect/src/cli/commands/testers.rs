//! Testers command - Manage TestFlight beta testers

use clap::{Args, Subcommand};
use console::style;
use tracing::info;

use appconnect_client::resources::{BetaTester, TesterInviteType};
use appconnect_client::Client;

use crate::cli::output::{self, or_dash};
use crate::cli::{connect, runtime, Cli, OutputFormat};

/// Beta tester management
#[derive(Debug, Args)]
pub struct TestersCommand {
    #[command(subcommand)]
    pub subcommand: TestersSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum TestersSubcommand {
    /// List beta testers of the configured app
    List {
        /// Only testers in this group (group ID)
        #[arg(long)]
        group: Option<String>,
    },

    /// Invite a beta tester
    Invite {
        /// Tester email address
        email: String,

        /// Group to add the tester to (repeatable)
        #[arg(long = "group", required = true)]
        groups: Vec<String>,

        /// Tester first name
        #[arg(long)]
        first_name: Option<String>,

        /// Tester last name
        #[arg(long)]
        last_name: Option<String>,
    },

    /// Remove a beta tester from all groups
    Remove {
        /// Tester email address
        email: String,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Add an existing tester to more groups
    AddToGroups {
        /// Tester email address
        email: String,

        /// Group ID (repeatable)
        #[arg(long = "group", required = true)]
        groups: Vec<String>,
    },
}

impl TestersCommand {
    /// Execute the testers command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing testers command");
        let rt = runtime()?;
        rt.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.subcommand {
            TestersSubcommand::List { group } => {
                let client = connect()?;
                let testers = client.list_testers(group.as_deref()).await?;
                if cli.format == OutputFormat::Json {
                    output::resources_json(&testers)?;
                } else if !cli.quiet {
                    if testers.is_empty() {
                        println!("No testers found");
                    } else {
                        println!("{}", output::header(&format!("Beta Testers ({})", testers.len())));
                        for tester in &testers {
                            print_tester(tester);
                        }
                    }
                }
            }

            TestersSubcommand::Invite {
                email,
                groups,
                first_name,
                last_name,
            } => {
                let client = connect()?;
                let group_ids: Vec<&str> = groups.iter().map(String::as_str).collect();
                let tester = client
                    .invite_tester(email, first_name.as_deref(), last_name.as_deref(), &group_ids)
                    .await?;
                if cli.format == OutputFormat::Json {
                    output::resource_json(&tester)?;
                } else if !cli.quiet {
                    println!(
                        "{} Invited {} to {} group(s)",
                        style("✓").green().bold(),
                        style(email).cyan(),
                        group_ids.len()
                    );
                }
            }

            TestersSubcommand::Remove { email, yes } => {
                let client = connect()?;
                let tester = require_tester(&client, email).await?;

                if !yes
                    && cli.format == OutputFormat::Text
                    && !output::confirm(&format!("Remove tester {}?", email))?
                {
                    println!("Cancelled");
                    return Ok(());
                }

                client.remove_tester(&tester.id).await?;
                if cli.text() {
                    println!("{} Removed tester {}", style("✓").green().bold(), style(email).cyan());
                }
            }

            TestersSubcommand::AddToGroups { email, groups } => {
                let client = connect()?;
                let tester = require_tester(&client, email).await?;
                let group_ids: Vec<&str> = groups.iter().map(String::as_str).collect();
                client.add_tester_to_groups(&tester.id, &group_ids).await?;
                if cli.text() {
                    println!(
                        "{} Added {} to {} group(s)",
                        style("✓").green().bold(),
                        style(email).cyan(),
                        group_ids.len()
                    );
                }
            }
        }

        Ok(())
    }
}

async fn require_tester(client: &Client, email: &str) -> anyhow::Result<BetaTester> {
    client
        .find_tester(email)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Tester not found: {}", email))
}

fn print_tester(tester: &BetaTester) {
    let attrs = &tester.attributes;
    let name = match (&attrs.first_name, &attrs.last_name) {
        (Some(first), Some(last)) => format!("{} {}", first, last),
        (Some(first), None) => first.clone(),
        (None, Some(last)) => last.clone(),
        (None, None) => String::new(),
    };
    let invite = match attrs.invite() {
        TesterInviteType::Email => "email",
        TesterInviteType::PublicLink => "public link",
    };

    println!(
        "  {} {} {} {}",
        style(or_dash(attrs.email.as_deref())).cyan(),
        name,
        style(invite).dim(),
        output::state_style().apply_to(or_dash(attrs.state.as_deref()))
    );
}
