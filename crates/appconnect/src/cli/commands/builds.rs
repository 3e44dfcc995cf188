//! Builds command - Inspect and manage uploaded builds

use clap::{ArgAction, Args, Subcommand};
use console::style;
use tracing::info;

use appconnect_client::resources::builds::DEFAULT_BUILD_LIMIT;
use appconnect_client::resources::{Build, BuildProcessingState};

use crate::cli::output::{self, or_dash};
use crate::cli::{connect, runtime, Cli, OutputFormat};

/// Build management
#[derive(Debug, Args)]
pub struct BuildsCommand {
    #[command(subcommand)]
    pub subcommand: BuildsSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum BuildsSubcommand {
    /// List the most recent builds
    List {
        /// Maximum number of builds to list
        #[arg(long, default_value_t = DEFAULT_BUILD_LIMIT)]
        limit: usize,

        /// Show only processing builds
        #[arg(long)]
        processing: bool,
    },

    /// Show one build
    Show {
        /// Build ID
        id: String,
    },

    /// Show the most recently uploaded build
    Latest,

    /// Answer the export compliance question for a build
    Compliance {
        /// Build ID
        id: String,

        /// Whether the build uses non-exempt encryption
        #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
        uses_encryption: bool,
    },

    /// Expire a build so testers can no longer install it
    Expire {
        /// Build ID
        id: String,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Set the TestFlight "What to Test" text
    WhatsNew {
        /// Build ID
        id: String,

        /// Text shown to testers
        text: String,

        /// Locale
        #[arg(long, default_value = "en-US")]
        locale: String,
    },

    /// Submit a build for beta app review
    BetaReview {
        /// Build ID
        id: String,
    },
}

impl BuildsCommand {
    /// Execute the builds command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing builds command");
        let rt = runtime()?;
        rt.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.subcommand {
            BuildsSubcommand::List { limit, processing } => self.list(cli, *limit, *processing).await,
            BuildsSubcommand::Show { id } => {
                let client = connect()?;
                let build = client.get_build(id).await?;
                show_build(cli, &build)
            }
            BuildsSubcommand::Latest => {
                let client = connect()?;
                match client.latest_build().await? {
                    Some(build) => show_build(cli, &build),
                    None => {
                        if cli.format == OutputFormat::Json {
                            output::json(&serde_json::Value::Null)?;
                        } else if !cli.quiet {
                            println!("No builds found");
                        }
                        Ok(())
                    }
                }
            }
            BuildsSubcommand::Compliance { id, uses_encryption } => {
                let client = connect()?;
                let build = client.set_export_compliance(id, *uses_encryption).await?;
                if cli.format == OutputFormat::Json {
                    output::resource_json(&build)?;
                } else if !cli.quiet {
                    println!(
                        "{} Export compliance set for build {} (uses encryption: {})",
                        style("✓").green().bold(),
                        style(or_dash(build.attributes.version.as_deref())).cyan(),
                        uses_encryption
                    );
                }
                Ok(())
            }
            BuildsSubcommand::Expire { id, yes } => {
                if !yes
                    && cli.format == OutputFormat::Text
                    && !output::confirm(&format!("Expire build {}?", id))?
                {
                    println!("Cancelled");
                    return Ok(());
                }

                let client = connect()?;
                let build = client.expire_build(id).await?;
                if cli.format == OutputFormat::Json {
                    output::resource_json(&build)?;
                } else if !cli.quiet {
                    println!(
                        "{} Build {} has been expired",
                        style("✓").green().bold(),
                        style(or_dash(build.attributes.version.as_deref())).cyan()
                    );
                }
                Ok(())
            }
            BuildsSubcommand::WhatsNew { id, text, locale } => {
                let client = connect()?;
                client.set_whats_new(id, locale, text).await?;
                if cli.text() {
                    output::success(&format!("Updated What to Test ({}) for build {}", locale, id));
                }
                Ok(())
            }
            BuildsSubcommand::BetaReview { id } => {
                let client = connect()?;
                let submission = client.submit_for_beta_review(id).await?;
                if cli.format == OutputFormat::Json {
                    output::resource_json(&submission)?;
                } else if !cli.quiet {
                    println!(
                        "{} Build submitted for beta review",
                        style("✓").green().bold()
                    );
                    println!(
                        "{}",
                        output::key_value("State", &format!("{:?}", submission.attributes.state()))
                    );
                }
                Ok(())
            }
        }
    }

    async fn list(&self, cli: &Cli, limit: usize, processing: bool) -> anyhow::Result<()> {
        let client = connect()?;
        let mut builds = client.list_builds(Some(limit)).await?;
        if processing {
            builds.retain(|b| b.attributes.state() == BuildProcessingState::Processing);
        }

        if cli.format == OutputFormat::Json {
            output::resources_json(&builds)?;
        } else if !cli.quiet {
            if builds.is_empty() {
                println!("No builds found");
            } else {
                println!("{}", output::header(&format!("Builds ({})", builds.len())));
                for build in &builds {
                    print_build(build);
                }
            }
        }

        Ok(())
    }
}

fn show_build(cli: &Cli, build: &Build) -> anyhow::Result<()> {
    if cli.format == OutputFormat::Json {
        return output::resource_json(build);
    }
    if cli.quiet {
        return Ok(());
    }

    let attrs = &build.attributes;
    println!("{}", output::header(&format!("Build {}", or_dash(attrs.version.as_deref()))));
    println!("{}", output::key_value("ID", &build.id));
    println!("{}", output::key_value("State", &state_label(attrs.state())));
    println!("{}", output::key_value("Uploaded", or_dash(attrs.uploaded_date.as_deref())));
    println!("{}", output::key_value("Expires", or_dash(attrs.expiration_date.as_deref())));
    if let Some(version) = &attrs.min_os_version {
        println!("{}", output::key_value("Minimum OS", version));
    }
    if let Some(encryption) = attrs.uses_non_exempt_encryption {
        println!(
            "{}",
            output::key_value("Uses encryption", if encryption { "yes" } else { "no" })
        );
    }
    if attrs.expired == Some(true) {
        println!("  {}", style("expired").red());
    }
    Ok(())
}

fn print_build(build: &Build) {
    let attrs = &build.attributes;
    println!(
        "  {} {} {} {}",
        style(or_dash(attrs.version.as_deref())).cyan(),
        state_label(attrs.state()),
        style(or_dash(attrs.uploaded_date.as_deref())).dim(),
        style(&build.id).dim()
    );
}

fn state_label(state: BuildProcessingState) -> String {
    match state {
        BuildProcessingState::Processing => style("processing").yellow().to_string(),
        BuildProcessingState::Failed => style("failed").red().to_string(),
        BuildProcessingState::Invalid => style("invalid").red().to_string(),
        BuildProcessingState::Valid => style("valid").green().to_string(),
    }
}
