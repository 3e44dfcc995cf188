//! IAP command - Manage in-app purchases

use clap::{Args, Subcommand};
use console::style;
use tracing::info;

use appconnect_client::resources::{InAppPurchase, InAppPurchaseType};

use super::subscriptions::ProductFields;
use crate::cli::output::{self, or_dash};
use crate::cli::{connect, runtime, Cli, OutputFormat};

/// In-app purchase management
#[derive(Debug, Args)]
pub struct IapCommand {
    #[command(subcommand)]
    pub subcommand: IapSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum IapSubcommand {
    /// List in-app purchases of the configured app
    List,

    /// Show one in-app purchase
    Show {
        /// In-app purchase ID
        id: String,
    },

    /// Create an in-app purchase
    Create {
        /// Reference name
        #[arg(long)]
        name: String,

        /// Product identifier
        #[arg(long)]
        product_id: String,

        /// consumable, non-consumable or non-renewing-subscription
        #[arg(long = "type")]
        kind: InAppPurchaseType,
    },

    /// Update in-app purchase attributes
    Update {
        /// In-app purchase ID
        id: String,

        #[command(flatten)]
        fields: ProductFields,
    },

    /// Delete an in-app purchase
    Delete {
        /// In-app purchase ID
        id: String,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

impl IapCommand {
    /// Execute the iap command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing iap command");
        let rt = runtime()?;
        rt.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.subcommand {
            IapSubcommand::List => {
                let client = connect()?;
                let iaps = client.list_in_app_purchases().await?;
                if cli.format == OutputFormat::Json {
                    output::resources_json(&iaps)?;
                } else if !cli.quiet {
                    if iaps.is_empty() {
                        println!("No in-app purchases found");
                    } else {
                        println!("{}", output::header(&format!("In-App Purchases ({})", iaps.len())));
                        for iap in &iaps {
                            print_iap(iap);
                        }
                    }
                }
            }

            IapSubcommand::Show { id } => {
                let client = connect()?;
                let iap = client.get_in_app_purchase(id).await?;
                show_iap(cli, &iap)?;
            }

            IapSubcommand::Create {
                name,
                product_id,
                kind,
            } => {
                let client = connect()?;
                let iap = client.create_in_app_purchase(name, product_id, *kind).await?;
                if cli.format == OutputFormat::Json {
                    output::resource_json(&iap)?;
                } else if !cli.quiet {
                    println!(
                        "{} Created {} '{}' {}",
                        style("✓").green().bold(),
                        kind,
                        style(product_id).cyan(),
                        style(&iap.id).dim()
                    );
                }
            }

            IapSubcommand::Update { id, fields } => {
                let attributes = fields.to_attributes()?;
                let client = connect()?;
                let iap = client.update_in_app_purchase(id, attributes).await?;
                show_iap(cli, &iap)?;
            }

            IapSubcommand::Delete { id, yes } => {
                if !yes
                    && cli.format == OutputFormat::Text
                    && !output::confirm(&format!("Delete in-app purchase {}?", id))?
                {
                    println!("Cancelled");
                    return Ok(());
                }

                let client = connect()?;
                client.delete_in_app_purchase(id).await?;
                if cli.text() {
                    println!("{} Deleted in-app purchase {}", style("✓").green().bold(), style(id).cyan());
                }
            }
        }

        Ok(())
    }
}

fn show_iap(cli: &Cli, iap: &InAppPurchase) -> anyhow::Result<()> {
    if cli.format == OutputFormat::Json {
        return output::resource_json(iap);
    }
    if cli.quiet {
        return Ok(());
    }

    let attrs = &iap.attributes;
    println!("{}", output::header(or_dash(attrs.name.as_deref())));
    println!("{}", output::key_value("ID", &iap.id));
    println!("{}", output::key_value("Product ID", or_dash(attrs.product_id.as_deref())));
    println!("{}", output::key_value("Type", or_dash(attrs.in_app_purchase_type.as_deref())));
    println!("{}", output::key_value("State", or_dash(attrs.state.as_deref())));
    if let Some(note) = &attrs.review_note {
        println!("{}", output::key_value("Review note", note));
    }
    Ok(())
}

fn print_iap(iap: &InAppPurchase) {
    let attrs = &iap.attributes;
    println!(
        "  {} {} {} {}",
        style(or_dash(attrs.product_id.as_deref())).cyan(),
        or_dash(attrs.name.as_deref()),
        output::state_style().apply_to(or_dash(attrs.state.as_deref())),
        style(&iap.id).dim()
    );
}
