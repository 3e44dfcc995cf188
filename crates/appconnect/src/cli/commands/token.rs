//! Token command - Print a bearer token for scripting

use clap::Args;
use tracing::info;

use appconnect_client::token::TOKEN_LIFETIME_SECS;

use crate::cli::output;
use crate::cli::{connect, Cli, OutputFormat};

/// Print a signed bearer token for the configured API key
#[derive(Debug, Args)]
pub struct TokenCommand {
    /// Print an `Authorization` header line instead of the bare token
    #[arg(long)]
    pub header: bool,
}

impl TokenCommand {
    /// Execute the token command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing token command");
        let client = connect()?;
        let token = client.bearer_token()?;

        if cli.format == OutputFormat::Json {
            output::json(&serde_json::json!({
                "token": token,
                "expiresIn": TOKEN_LIFETIME_SECS,
            }))?;
        } else if self.header {
            println!("Authorization: Bearer {}", token);
        } else {
            println!("{}", token);
        }
        Ok(())
    }
}
