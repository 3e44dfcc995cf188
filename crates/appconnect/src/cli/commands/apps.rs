//! Apps command - Look up apps visible to the API key

use clap::{Args, Subcommand};
use console::style;
use tracing::info;

use appconnect_client::resources::{App, AppInfo};
use appconnect_client::Client;

use crate::cli::output::{self, or_dash};
use crate::cli::{connect, runtime, Cli, OutputFormat};

/// App lookup
#[derive(Debug, Args)]
pub struct AppsCommand {
    #[command(subcommand)]
    pub subcommand: AppsSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum AppsSubcommand {
    /// List every app the key can see
    List,

    /// Show one app (defaults to the configured app)
    Show {
        /// App ID
        #[arg(long)]
        id: Option<String>,
    },

    /// Find an app by bundle identifier
    Find {
        /// Bundle identifier (defaults to the configured bundle ID)
        bundle_id: Option<String>,
    },

    /// Show app info records (age rating, store state)
    Info,
}

impl AppsCommand {
    /// Execute the apps command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing apps command");
        let rt = runtime()?;
        rt.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let client = connect()?;

        match &self.subcommand {
            AppsSubcommand::List => {
                let apps = client.list_apps().await?;
                if cli.format == OutputFormat::Json {
                    output::resources_json(&apps)?;
                } else if !cli.quiet {
                    if apps.is_empty() {
                        println!("No apps found");
                    } else {
                        println!("{}", output::header(&format!("Apps ({})", apps.len())));
                        for app in &apps {
                            print_app(app);
                        }
                    }
                }
            }
            AppsSubcommand::Show { id } => {
                let app = client.get_app(id.as_deref()).await?;
                show(cli, &app)?;
            }
            AppsSubcommand::Find { bundle_id } => {
                let app = find(&client, bundle_id.as_deref()).await?;
                show(cli, &app)?;
            }
            AppsSubcommand::Info => {
                let infos = client.app_infos().await?;
                if cli.format == OutputFormat::Json {
                    output::resources_json(&infos)?;
                } else if !cli.quiet {
                    for info in &infos {
                        print_app_info(info);
                    }
                }
            }
        }

        Ok(())
    }
}

async fn find(client: &Client, bundle_id: Option<&str>) -> anyhow::Result<App> {
    let bundle_id = match bundle_id {
        Some(id) => id,
        None => client.bundle_id()?,
    };
    Ok(client.find_app_by_bundle_id(bundle_id).await?)
}

fn show(cli: &Cli, app: &App) -> anyhow::Result<()> {
    if cli.format == OutputFormat::Json {
        output::resource_json(app)?;
    } else if !cli.quiet {
        let attrs = &app.attributes;
        println!("{}", output::header(or_dash(attrs.name.as_deref())));
        println!("{}", output::key_value("ID", &app.id));
        println!("{}", output::key_value("Bundle ID", or_dash(attrs.bundle_id.as_deref())));
        println!("{}", output::key_value("SKU", or_dash(attrs.sku.as_deref())));
        println!(
            "{}",
            output::key_value("Primary locale", or_dash(attrs.primary_locale.as_deref()))
        );
    }
    Ok(())
}

fn print_app(app: &App) {
    println!(
        "  {} {} {}",
        style(or_dash(app.attributes.name.as_deref())).cyan(),
        style(or_dash(app.attributes.bundle_id.as_deref())).dim(),
        output::id_style().apply_to(&app.id)
    );
}

fn print_app_info(info: &AppInfo) {
    let attrs = &info.attributes;
    println!("{}", output::header(&info.id));
    println!(
        "{}",
        output::key_value(
            "State",
            &output::state_style()
                .apply_to(or_dash(attrs.app_store_state.as_deref()))
                .to_string()
        )
    );
    println!(
        "{}",
        output::key_value("Age rating", or_dash(attrs.app_store_age_rating.as_deref()))
    );
    if let Some(band) = &attrs.kids_age_band {
        println!("{}", output::key_value("Kids age band", band));
    }
}
