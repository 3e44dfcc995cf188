//! Versions command - Manage App Store versions and their localizations

use clap::{Args, Subcommand};
use console::style;
use serde_json::{Map, Value};
use tracing::info;

use appconnect_client::resources::{
    AppStoreVersion, LocalizationOutcome, LocalizationUpdate, Platform, VersionLocalization,
};

use crate::cli::output::{self, or_dash};
use crate::cli::{connect, runtime, Cli, OutputFormat};

/// App Store version management
#[derive(Debug, Args)]
pub struct VersionsCommand {
    #[command(subcommand)]
    pub subcommand: VersionsSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum VersionsSubcommand {
    /// List versions of the configured app
    List {
        /// Only versions for this platform (ios, macos, tvos, visionos)
        #[arg(long)]
        platform: Option<Platform>,

        /// Only versions in these states, e.g. READY_FOR_SALE
        #[arg(long = "state")]
        states: Vec<String>,
    },

    /// Show a version
    Show {
        /// Version ID
        id: String,
    },

    /// Create a new version
    Create {
        /// Version string, e.g. 1.2.0
        #[arg(value_name = "VERSION")]
        version_string: String,

        /// Platform
        #[arg(long, default_value = "ios")]
        platform: Platform,
    },

    /// Update version attributes
    Update {
        /// Version ID
        id: String,

        /// New version string
        #[arg(long)]
        version_string: Option<String>,

        /// Copyright line
        #[arg(long)]
        copyright: Option<String>,

        /// MANUAL, AFTER_APPROVAL or SCHEDULED
        #[arg(long)]
        release_type: Option<String>,

        /// Earliest release date (ISO 8601) for scheduled releases
        #[arg(long)]
        earliest_release_date: Option<String>,
    },

    /// Show the version that can still be edited
    Editable {
        /// Platform
        #[arg(long, default_value = "ios")]
        platform: Platform,
    },

    /// List localizations of a version
    Localizations {
        /// Version ID
        version_id: String,
    },

    /// Update one existing localization
    SetLocalization {
        /// Localization ID
        localization_id: String,

        #[command(flatten)]
        fields: LocalizationFields,
    },

    /// Add localizations to a version, continuing past failures
    AddLocalizations {
        /// Version ID
        version_id: String,

        /// Locale to add (repeatable), e.g. --locale de-DE --locale fr-FR
        #[arg(long = "locale", required = true)]
        locales: Vec<String>,

        #[command(flatten)]
        fields: LocalizationFields,
    },

    /// Attach a build to a version
    SelectBuild {
        /// Version ID
        version_id: String,

        /// Build ID
        build_id: String,
    },
}

/// Localized metadata fields
#[derive(Debug, Clone, Default, Args)]
pub struct LocalizationFields {
    /// App description
    #[arg(long)]
    pub description: Option<String>,

    /// Comma-separated keywords
    #[arg(long)]
    pub keywords: Option<String>,

    /// Release notes
    #[arg(long)]
    pub whats_new: Option<String>,

    /// Promotional text
    #[arg(long)]
    pub promotional_text: Option<String>,

    /// Marketing URL
    #[arg(long)]
    pub marketing_url: Option<String>,

    /// Support URL
    #[arg(long)]
    pub support_url: Option<String>,
}

impl LocalizationFields {
    fn to_update(&self) -> LocalizationUpdate {
        LocalizationUpdate {
            description: self.description.clone(),
            keywords: self.keywords.clone(),
            whats_new: self.whats_new.clone(),
            promotional_text: self.promotional_text.clone(),
            marketing_url: self.marketing_url.clone(),
            support_url: self.support_url.clone(),
        }
    }
}

impl VersionsCommand {
    /// Execute the versions command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing versions command");
        let rt = runtime()?;
        rt.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let client = connect()?;

        match &self.subcommand {
            VersionsSubcommand::List { platform, states } => {
                let states: Vec<&str> = states.iter().map(String::as_str).collect();
                let versions = client.list_versions(*platform, &states).await?;
                if cli.format == OutputFormat::Json {
                    output::resources_json(&versions)?;
                } else if !cli.quiet {
                    if versions.is_empty() {
                        println!("No versions found");
                    } else {
                        println!("{}", output::header(&format!("Versions ({})", versions.len())));
                        for version in &versions {
                            print_version(version);
                        }
                    }
                }
            }

            VersionsSubcommand::Show { id } => {
                let version = client.get_version(id).await?;
                show_version(cli, &version)?;
            }

            VersionsSubcommand::Create {
                version_string,
                platform,
            } => {
                let created = client.create_version(*platform, version_string).await?;
                if cli.format == OutputFormat::Json {
                    output::resource_json(&created)?;
                } else if !cli.quiet {
                    println!(
                        "{} Created version {} ({}) {}",
                        style("✓").green().bold(),
                        style(version_string).cyan(),
                        platform,
                        style(&created.id).dim()
                    );
                }
            }

            VersionsSubcommand::Update {
                id,
                version_string,
                copyright,
                release_type,
                earliest_release_date,
            } => {
                let mut attributes = Map::new();
                let fields = [
                    ("versionString", version_string),
                    ("copyright", copyright),
                    ("releaseType", release_type),
                    ("earliestReleaseDate", earliest_release_date),
                ];
                for (key, value) in fields {
                    if let Some(value) = value {
                        attributes.insert(key.to_string(), Value::String(value.clone()));
                    }
                }
                if attributes.is_empty() {
                    anyhow::bail!("Nothing to update; pass at least one attribute flag");
                }

                let updated = client.update_version(id, Value::Object(attributes)).await?;
                show_version(cli, &updated)?;
            }

            VersionsSubcommand::Editable { platform } => {
                let version = client.editable_version(*platform).await?;
                show_version(cli, &version)?;
            }

            VersionsSubcommand::Localizations { version_id } => {
                let localizations = client.list_version_localizations(version_id).await?;
                if cli.format == OutputFormat::Json {
                    output::resources_json(&localizations)?;
                } else if !cli.quiet {
                    for loc in &localizations {
                        print_localization(loc);
                    }
                }
            }

            VersionsSubcommand::SetLocalization {
                localization_id,
                fields,
            } => {
                let update = fields.to_update();
                if update == LocalizationUpdate::default() {
                    anyhow::bail!("Nothing to update; pass at least one field flag");
                }
                let loc = client
                    .update_version_localization(localization_id, &update)
                    .await?;
                if cli.format == OutputFormat::Json {
                    output::resource_json(&loc)?;
                } else if !cli.quiet {
                    output::success(&format!("Updated localization {}", loc.attributes.locale));
                }
            }

            VersionsSubcommand::AddLocalizations {
                version_id,
                locales,
                fields,
            } => {
                let update = fields.to_update();
                let requests: Vec<(String, LocalizationUpdate)> = locales
                    .iter()
                    .map(|locale| (locale.clone(), update.clone()))
                    .collect();

                let outcomes = client
                    .create_version_localizations(version_id, &requests)
                    .await;
                let failed = outcomes.iter().filter(|o| !o.is_created()).count();

                if cli.format == OutputFormat::Json {
                    let report: Vec<Value> = outcomes.iter().map(outcome_json).collect();
                    output::json(&report)?;
                } else if !cli.quiet {
                    for outcome in &outcomes {
                        print_outcome(outcome);
                    }
                }

                if failed > 0 {
                    anyhow::bail!("{} of {} localizations failed", failed, outcomes.len());
                }
            }

            VersionsSubcommand::SelectBuild {
                version_id,
                build_id,
            } => {
                client.select_build_for_version(version_id, build_id).await?;
                if cli.text() {
                    println!(
                        "{} Selected build {} for version {}",
                        style("✓").green().bold(),
                        style(build_id).cyan(),
                        style(version_id).dim()
                    );
                }
            }
        }

        Ok(())
    }
}

fn show_version(cli: &Cli, version: &AppStoreVersion) -> anyhow::Result<()> {
    if cli.format == OutputFormat::Json {
        return output::resource_json(version);
    }
    if cli.quiet {
        return Ok(());
    }

    let attrs = &version.attributes;
    println!("{}", output::header(or_dash(attrs.version_string.as_deref())));
    println!("{}", output::key_value("ID", &version.id));
    if let Some(platform) = attrs.platform {
        println!("{}", output::key_value("Platform", &platform.to_string()));
    }
    println!(
        "{}",
        output::key_value(
            "State",
            &output::state_style()
                .apply_to(or_dash(attrs.app_store_state.as_deref()))
                .to_string()
        )
    );
    println!("{}", output::key_value("Release type", or_dash(attrs.release_type.as_deref())));
    if let Some(date) = &attrs.earliest_release_date {
        println!("{}", output::key_value("Earliest release", date));
    }
    if let Some(copyright) = &attrs.copyright {
        println!("{}", output::key_value("Copyright", copyright));
    }
    Ok(())
}

fn print_version(version: &AppStoreVersion) {
    let attrs = &version.attributes;
    let editable = if attrs.is_editable() {
        format!(" {}", style("(editable)").green())
    } else {
        String::new()
    };
    println!(
        "  {} {} {}{} {}",
        style(or_dash(attrs.version_string.as_deref())).cyan(),
        attrs.platform.map(|p| p.to_string()).unwrap_or_default(),
        output::state_style().apply_to(or_dash(attrs.app_store_state.as_deref())),
        editable,
        style(&version.id).dim()
    );
}

fn print_localization(loc: &VersionLocalization) {
    let attrs = &loc.attributes;
    println!("{} {}", output::header(&attrs.locale), style(&loc.id).dim());
    if let Some(text) = &attrs.whats_new {
        println!("{}", output::key_value("What's new", text));
    }
    if let Some(text) = &attrs.promotional_text {
        println!("{}", output::key_value("Promotional text", text));
    }
    if let Some(text) = &attrs.keywords {
        println!("{}", output::key_value("Keywords", text));
    }
}

fn print_outcome(outcome: &LocalizationOutcome) {
    match outcome {
        LocalizationOutcome::Created(loc) => println!(
            "{} {} {}",
            style("✓").green().bold(),
            style(&loc.attributes.locale).cyan(),
            style(&loc.id).dim()
        ),
        LocalizationOutcome::Failed { locale, error } => println!(
            "{} {} {}",
            style("✗").red().bold(),
            style(locale).cyan(),
            error
        ),
    }
}

fn outcome_json(outcome: &LocalizationOutcome) -> Value {
    match outcome {
        LocalizationOutcome::Created(loc) => serde_json::json!({
            "locale": loc.attributes.locale,
            "id": loc.id,
            "created": true,
        }),
        LocalizationOutcome::Failed { locale, error } => serde_json::json!({
            "locale": locale,
            "created": false,
            "error": error.to_string(),
        }),
    }
}
