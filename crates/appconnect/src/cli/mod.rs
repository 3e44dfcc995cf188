//! CLI definition and command handling

pub mod commands;
pub mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;

use appconnect_client::Client;
use appconnect_core::config::resolve_config;

use commands::{
    AppsCommand, BuildsCommand, CompletionsCommand, ConfigCommand, GroupsCommand, IapCommand,
    MessagesCommand, PhasedReleaseCommand, PreOrderCommand, ReleaseCommand, ReviewsCommand,
    ScreenshotsCommand, SubmitCommand, SubscriptionsCommand, TestersCommand, TokenCommand,
    VersionsCommand,
};

/// appconnect - App Store Connect from the command line
#[derive(Debug, Parser)]
#[command(name = "appconnect")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apps visible to the API key
    Apps(AppsCommand),

    /// App Store versions and their localizations
    Versions(VersionsCommand),

    /// Uploaded builds
    Builds(BuildsCommand),

    /// TestFlight beta testers
    Testers(TestersCommand),

    /// TestFlight beta groups
    Groups(GroupsCommand),

    /// Customer reviews and developer responses
    Reviews(ReviewsCommand),

    /// Auto-renewable subscriptions
    Subscriptions(SubscriptionsCommand),

    /// In-app purchases
    Iap(IapCommand),

    /// Phased release of a version
    PhasedRelease(PhasedReleaseCommand),

    /// App pre-orders
    PreOrder(PreOrderCommand),

    /// Release a version pending developer release
    Release(ReleaseCommand),

    /// Submit a version for App Review
    Submit(SubmitCommand),

    /// App screenshots
    Screenshots(ScreenshotsCommand),

    /// App Review messages from the Resolution Center
    Messages(MessagesCommand),

    /// Print a bearer token for the configured key
    Token(TokenCommand),

    /// Manage the configuration file
    Config(ConfigCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)
                .with_context(|| format!("cannot change directory to {}", dir.display()))?;
        }

        match self.command {
            Commands::Apps(ref cmd) => cmd.execute(&self),
            Commands::Versions(ref cmd) => cmd.execute(&self),
            Commands::Builds(ref cmd) => cmd.execute(&self),
            Commands::Testers(ref cmd) => cmd.execute(&self),
            Commands::Groups(ref cmd) => cmd.execute(&self),
            Commands::Reviews(ref cmd) => cmd.execute(&self),
            Commands::Subscriptions(ref cmd) => cmd.execute(&self),
            Commands::Iap(ref cmd) => cmd.execute(&self),
            Commands::PhasedRelease(ref cmd) => cmd.execute(&self),
            Commands::PreOrder(ref cmd) => cmd.execute(&self),
            Commands::Release(ref cmd) => cmd.execute(&self),
            Commands::Submit(ref cmd) => cmd.execute(&self),
            Commands::Screenshots(ref cmd) => cmd.execute(&self),
            Commands::Messages(ref cmd) => cmd.execute(&self),
            Commands::Token(ref cmd) => cmd.execute(&self),
            Commands::Config(ref cmd) => cmd.execute(&self),
            Commands::Completions(ref cmd) => cmd.execute(&self),
        }
    }

    /// Whether human-readable output should be printed
    pub fn text(&self) -> bool {
        self.format == OutputFormat::Text && !self.quiet
    }
}

/// Build a client from the configuration visible in the working directory
pub fn connect() -> anyhow::Result<Client> {
    let cwd = std::env::current_dir()?;
    let (config, source) = resolve_config(&cwd)?;
    match &source {
        Some(path) => debug!(path = %path.display(), "loaded configuration file"),
        None => debug!("no configuration file, using environment only"),
    }
    Ok(Client::new(config)?)
}

/// Runtime for driving async client calls to completion
pub fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Runtime::new()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["appconnect", "apps", "list", "--format", "json", "-q"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.quiet);
        assert!(!cli.text());
    }

    #[test]
    fn test_kebab_case_command_names() {
        assert!(Cli::try_parse_from(["appconnect", "phased-release", "status", "v1"]).is_ok());
        assert!(Cli::try_parse_from(["appconnect", "pre-order", "status"]).is_ok());
        assert!(Cli::try_parse_from(["appconnect", "nope"]).is_err());
    }
}
