//! Screenshots command - Manage screenshot sets and upload screenshots

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use appconnect_client::resources::{Screenshot, ScreenshotSet};

use crate::cli::output::{self, or_dash};
use crate::cli::{connect, runtime, Cli, OutputFormat};

/// Screenshot management
#[derive(Debug, Args)]
pub struct ScreenshotsCommand {
    #[command(subcommand)]
    pub subcommand: ScreenshotsSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ScreenshotsSubcommand {
    /// List screenshot sets of a version localization
    Sets {
        /// Version localization ID
        localization_id: String,
    },

    /// Create a screenshot set for a display type
    CreateSet {
        /// Version localization ID
        localization_id: String,

        /// Display type, e.g. APP_IPHONE_67
        display_type: String,
    },

    /// List screenshots in a set
    List {
        /// Screenshot set ID
        set_id: String,
    },

    /// Upload image files into a set
    Upload {
        /// Screenshot set ID
        set_id: String,

        /// Image files, uploaded in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Delete a screenshot
    Delete {
        /// Screenshot ID
        id: String,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

impl ScreenshotsCommand {
    /// Execute the screenshots command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing screenshots command");
        let rt = runtime()?;
        rt.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.subcommand {
            ScreenshotsSubcommand::Sets { localization_id } => {
                let client = connect()?;
                let sets = client.list_screenshot_sets(localization_id).await?;
                if cli.format == OutputFormat::Json {
                    output::resources_json(&sets)?;
                } else if !cli.quiet {
                    if sets.is_empty() {
                        println!("No screenshot sets found");
                    }
                    for set in &sets {
                        print_set(set);
                    }
                }
            }

            ScreenshotsSubcommand::CreateSet {
                localization_id,
                display_type,
            } => {
                let client = connect()?;
                let set = client
                    .create_screenshot_set(localization_id, display_type)
                    .await?;
                if cli.format == OutputFormat::Json {
                    output::resource_json(&set)?;
                } else if !cli.quiet {
                    println!(
                        "{} Created screenshot set {} {}",
                        style("✓").green().bold(),
                        style(display_type).cyan(),
                        style(&set.id).dim()
                    );
                }
            }

            ScreenshotsSubcommand::List { set_id } => {
                let client = connect()?;
                let shots = client.list_screenshots(set_id).await?;
                if cli.format == OutputFormat::Json {
                    output::resources_json(&shots)?;
                } else if !cli.quiet {
                    for shot in &shots {
                        print_screenshot(shot);
                    }
                }
            }

            ScreenshotsSubcommand::Upload { set_id, files } => {
                self.upload(cli, set_id, files).await?;
            }

            ScreenshotsSubcommand::Delete { id, yes } => {
                if !yes
                    && cli.format == OutputFormat::Text
                    && !output::confirm(&format!("Delete screenshot {}?", id))?
                {
                    println!("Cancelled");
                    return Ok(());
                }

                let client = connect()?;
                client.delete_screenshot(id).await?;
                if cli.text() {
                    println!("{} Deleted screenshot {}", style("✓").green().bold(), style(id).cyan());
                }
            }
        }

        Ok(())
    }

    async fn upload(&self, cli: &Cli, set_id: &str, files: &[PathBuf]) -> anyhow::Result<()> {
        let client = connect()?;
        let progress = UploadProgress::new(files.len(), cli.text());

        let mut uploaded = Vec::new();
        let mut failed = 0usize;
        for (index, path) in files.iter().enumerate() {
            progress.start(index, path);
            match client.upload_screenshot(set_id, path).await {
                Ok(shot) => uploaded.push(shot),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "screenshot upload failed");
                    progress.println(&format!(
                        "{} {}: {}",
                        style("✗").red().bold(),
                        path.display(),
                        e
                    ));
                    failed += 1;
                }
            }
            progress.advance();
        }
        progress.finish();

        if cli.format == OutputFormat::Json {
            output::resources_json(&uploaded)?;
        } else if !cli.quiet {
            println!(
                "{} Uploaded {} of {} screenshot(s)",
                style("✓").green().bold(),
                uploaded.len(),
                files.len()
            );
        }

        if failed > 0 {
            anyhow::bail!("{} of {} screenshot uploads failed", failed, files.len());
        }
        Ok(())
    }
}

/// Progress display that falls back to plain lines when not attended
struct UploadProgress {
    total: usize,
    visible: bool,
    bar: Option<ProgressBar>,
}

impl UploadProgress {
    fn new(total: usize, visible: bool) -> Self {
        let bar = if visible && console::user_attended() {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{bar:30.cyan/blue} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        Self { total, visible, bar }
    }

    fn start(&self, index: usize, path: &Path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match &self.bar {
            Some(pb) => pb.set_message(name),
            None if self.visible => {
                eprintln!("[{}/{}] Uploading {}...", index + 1, self.total, name)
            }
            None => {}
        }
    }

    fn advance(&self) {
        if let Some(pb) = &self.bar {
            pb.inc(1);
        }
    }

    fn println(&self, line: &str) {
        match &self.bar {
            Some(pb) => pb.println(line),
            None => eprintln!("{}", line),
        }
    }

    fn finish(&self) {
        if let Some(pb) = &self.bar {
            pb.finish_and_clear();
        }
    }
}

fn print_set(set: &ScreenshotSet) {
    println!(
        "  {} {}",
        style(or_dash(set.attributes.screenshot_display_type.as_deref())).cyan(),
        style(&set.id).dim()
    );
}

fn print_screenshot(shot: &Screenshot) {
    let attrs = &shot.attributes;
    println!(
        "  {} {} {}",
        style(or_dash(attrs.file_name.as_deref())).cyan(),
        output::state_style().apply_to(or_dash(attrs.delivery_state())),
        style(&shot.id).dim()
    );
}
