//! Shell completion scripts

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, CommandFactory};
use clap_complete::{generate, generate_to, Shell};
use serde_json::json;
use tracing::info;

use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Print or install shell completions
#[derive(Debug, Args)]
pub struct CompletionsCommand {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script into this directory under the shell's conventional
    /// file name (`_appconnect`, `appconnect.bash`, ...) instead of stdout
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

impl CompletionsCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(shell = %self.shell, "generating completions");
        let mut cmd = Cli::command();
        let bin_name = cmd.get_name().to_string();

        let Some(dir) = &self.dir else {
            generate(self.shell, &mut cmd, bin_name, &mut io::stdout());
            return Ok(());
        };

        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let path = generate_to(self.shell, &mut cmd, bin_name, dir)
            .with_context(|| format!("failed to write completions into {}", dir.display()))?;

        if cli.format == OutputFormat::Json {
            output::json(&json!({ "shell": self.shell.to_string(), "path": path }))?;
        } else if !cli.quiet {
            output::success(&format!("Wrote {} completions to {}", self.shell, path.display()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_shell_argument_parses() {
        let cli = Cli::try_parse_from(["appconnect", "completions", "powershell"]).unwrap();
        match cli.command {
            crate::cli::Commands::Completions(cmd) => {
                assert_eq!(cmd.shell, Shell::PowerShell);
                assert!(cmd.dir.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(Cli::try_parse_from(["appconnect", "completions", "tcsh"]).is_err());
    }

    #[test]
    fn test_bash_script_mentions_subcommands() {
        let mut cmd = Cli::command();
        let mut buf = Vec::new();
        generate(Shell::Bash, &mut cmd, "appconnect", &mut buf);
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("phased-release"));
        assert!(script.contains("screenshots"));
    }

    #[test]
    fn test_dir_uses_conventional_file_name() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("zsh");
        let cli = Cli::try_parse_from([
            "appconnect",
            "--quiet",
            "completions",
            "zsh",
            "--dir",
            dir.to_str().unwrap(),
        ])
        .unwrap();

        match &cli.command {
            crate::cli::Commands::Completions(cmd) => cmd.execute(&cli).unwrap(),
            other => panic!("unexpected {:?}", other),
        }
        let script = std::fs::read_to_string(dir.join("_appconnect")).unwrap();
        assert!(script.contains("#compdef appconnect"));
    }
}
