//! Subscriptions command - Manage auto-renewable subscriptions

use clap::{ArgAction, Args, Subcommand};
use console::style;
use serde_json::{Map, Value};
use tracing::info;

use appconnect_client::resources::{Subscription, SubscriptionLocalization};

use crate::cli::output::{self, or_dash};
use crate::cli::{connect, runtime, Cli, OutputFormat};

/// Subscription management
#[derive(Debug, Args)]
pub struct SubscriptionsCommand {
    #[command(subcommand)]
    pub subcommand: SubscriptionsSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum SubscriptionsSubcommand {
    /// List subscription groups of the configured app
    Groups,

    /// List subscriptions in a group
    List {
        /// Subscription group ID
        group_id: String,
    },

    /// Show one subscription
    Show {
        /// Subscription ID
        id: String,
    },

    /// Update subscription attributes
    Update {
        /// Subscription ID
        id: String,

        #[command(flatten)]
        fields: ProductFields,
    },

    /// List localizations of a subscription
    Localizations {
        /// Subscription ID
        id: String,
    },

    /// Add a localization to a subscription
    Localize {
        /// Subscription ID
        id: String,

        /// Locale, e.g. en-US
        #[arg(long)]
        locale: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },
}

/// Editable attributes shared by subscriptions and in-app purchases
#[derive(Debug, Clone, Default, Args)]
pub struct ProductFields {
    /// Reference name
    #[arg(long)]
    pub name: Option<String>,

    /// Note for App Review
    #[arg(long)]
    pub review_note: Option<String>,

    /// Whether Family Sharing is enabled
    #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
    pub family_sharable: Option<bool>,
}

impl ProductFields {
    /// API attributes for the fields that were given
    pub fn to_attributes(&self) -> anyhow::Result<Value> {
        let mut attributes = Map::new();
        if let Some(name) = &self.name {
            attributes.insert("name".to_string(), Value::String(name.clone()));
        }
        if let Some(note) = &self.review_note {
            attributes.insert("reviewNote".to_string(), Value::String(note.clone()));
        }
        if let Some(sharable) = self.family_sharable {
            attributes.insert("familySharable".to_string(), Value::Bool(sharable));
        }
        if attributes.is_empty() {
            anyhow::bail!("Nothing to update; pass at least one attribute flag");
        }
        Ok(Value::Object(attributes))
    }
}

impl SubscriptionsCommand {
    /// Execute the subscriptions command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing subscriptions command");
        let rt = runtime()?;
        rt.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.subcommand {
            SubscriptionsSubcommand::Groups => {
                let client = connect()?;
                let groups = client.list_subscription_groups().await?;
                if cli.format == OutputFormat::Json {
                    output::resources_json(&groups)?;
                } else if !cli.quiet {
                    if groups.is_empty() {
                        println!("No subscription groups found");
                    }
                    for group in &groups {
                        println!(
                            "  {} {}",
                            style(or_dash(group.attributes.reference_name.as_deref())).cyan(),
                            style(&group.id).dim()
                        );
                    }
                }
            }

            SubscriptionsSubcommand::List { group_id } => {
                let client = connect()?;
                let subscriptions = client.list_subscriptions(group_id).await?;
                if cli.format == OutputFormat::Json {
                    output::resources_json(&subscriptions)?;
                } else if !cli.quiet {
                    for subscription in &subscriptions {
                        print_subscription(subscription);
                    }
                }
            }

            SubscriptionsSubcommand::Show { id } => {
                let client = connect()?;
                let subscription = client.get_subscription(id).await?;
                show_subscription(cli, &subscription)?;
            }

            SubscriptionsSubcommand::Update { id, fields } => {
                let attributes = fields.to_attributes()?;
                let client = connect()?;
                let subscription = client.update_subscription(id, attributes).await?;
                show_subscription(cli, &subscription)?;
            }

            SubscriptionsSubcommand::Localizations { id } => {
                let client = connect()?;
                let localizations = client.list_subscription_localizations(id).await?;
                if cli.format == OutputFormat::Json {
                    output::resources_json(&localizations)?;
                } else if !cli.quiet {
                    for loc in &localizations {
                        print_localization(loc);
                    }
                }
            }

            SubscriptionsSubcommand::Localize {
                id,
                locale,
                name,
                description,
            } => {
                let client = connect()?;
                let loc = client
                    .create_subscription_localization(id, locale, name, description.as_deref())
                    .await?;
                if cli.format == OutputFormat::Json {
                    output::resource_json(&loc)?;
                } else if !cli.quiet {
                    println!(
                        "{} Added {} localization {}",
                        style("✓").green().bold(),
                        style(locale).cyan(),
                        style(&loc.id).dim()
                    );
                }
            }
        }

        Ok(())
    }
}

fn show_subscription(cli: &Cli, subscription: &Subscription) -> anyhow::Result<()> {
    if cli.format == OutputFormat::Json {
        return output::resource_json(subscription);
    }
    if cli.quiet {
        return Ok(());
    }

    let attrs = &subscription.attributes;
    println!("{}", output::header(or_dash(attrs.name.as_deref())));
    println!("{}", output::key_value("ID", &subscription.id));
    println!("{}", output::key_value("Product ID", or_dash(attrs.product_id.as_deref())));
    println!("{}", output::key_value("State", or_dash(attrs.state.as_deref())));
    println!("{}", output::key_value("Period", or_dash(attrs.subscription_period.as_deref())));
    if let Some(level) = attrs.group_level {
        println!("{}", output::key_value("Group level", &level.to_string()));
    }
    if let Some(sharable) = attrs.family_sharable {
        println!("{}", output::key_value("Family sharable", &sharable.to_string()));
    }
    Ok(())
}

fn print_subscription(subscription: &Subscription) {
    let attrs = &subscription.attributes;
    println!(
        "  {} {} {} {}",
        style(or_dash(attrs.name.as_deref())).cyan(),
        or_dash(attrs.product_id.as_deref()),
        output::state_style().apply_to(or_dash(attrs.state.as_deref())),
        style(&subscription.id).dim()
    );
}

fn print_localization(loc: &SubscriptionLocalization) {
    let attrs = &loc.attributes;
    println!(
        "  {} {} {}",
        style(or_dash(attrs.locale.as_deref())).cyan(),
        or_dash(attrs.name.as_deref()),
        style(or_dash(attrs.state.as_deref())).dim()
    );
    if let Some(description) = &attrs.description {
        println!("    {}", description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_fields_to_attributes() {
        let fields = ProductFields {
            name: Some("Pro Monthly".to_string()),
            review_note: None,
            family_sharable: Some(false),
        };
        let attributes = fields.to_attributes().unwrap();
        assert_eq!(attributes["name"], "Pro Monthly");
        assert_eq!(attributes["familySharable"], false);
        assert!(attributes.get("reviewNote").is_none());
    }

    #[test]
    fn test_empty_product_fields_rejected() {
        assert!(ProductFields::default().to_attributes().is_err());
    }
}
