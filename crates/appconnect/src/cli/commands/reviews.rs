//! Reviews command - Read customer reviews and manage responses

use clap::{Args, Subcommand};
use console::style;
use tracing::info;

use appconnect_client::resources::{CustomerReview, ReviewSort};

use crate::cli::output::{self, or_dash};
use crate::cli::{connect, runtime, Cli, OutputFormat};

/// Customer review management
#[derive(Debug, Args)]
pub struct ReviewsCommand {
    #[command(subcommand)]
    pub subcommand: ReviewsSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ReviewsSubcommand {
    /// List customer reviews of the configured app
    List {
        /// Only reviews with this star rating (1-5)
        #[arg(long)]
        rating: Option<u8>,

        /// newest, oldest, highest or lowest
        #[arg(long, default_value = "newest")]
        sort: ReviewSort,

        /// Fetch a single page of at most this many reviews
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the developer response to a review
    Response {
        /// Review ID
        review_id: String,
    },

    /// Respond to a review, replacing any earlier response
    Respond {
        /// Review ID
        review_id: String,

        /// Response text
        text: String,
    },

    /// Delete the developer response to a review
    DeleteResponse {
        /// Review ID
        review_id: String,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

impl ReviewsCommand {
    /// Execute the reviews command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing reviews command");
        let rt = runtime()?;
        rt.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let client = connect()?;

        match &self.subcommand {
            ReviewsSubcommand::List { rating, sort, limit } => {
                let reviews = client.list_customer_reviews(*rating, *sort, *limit).await?;
                if cli.format == OutputFormat::Json {
                    output::resources_json(&reviews)?;
                } else if !cli.quiet {
                    if reviews.is_empty() {
                        println!("No reviews found");
                    } else {
                        for review in &reviews {
                            print_review(review);
                        }
                    }
                }
            }

            ReviewsSubcommand::Response { review_id } => {
                let response = client.get_review_response(review_id).await?;
                if cli.format == OutputFormat::Json {
                    match &response {
                        Some(response) => output::resource_json(response)?,
                        None => output::json(&serde_json::Value::Null)?,
                    }
                } else if !cli.quiet {
                    match response {
                        Some(response) => {
                            let attrs = &response.attributes;
                            println!("{}", output::header("Response"));
                            println!("{}", output::key_value("ID", &response.id));
                            println!("{}", output::key_value("State", or_dash(attrs.state.as_deref())));
                            println!(
                                "{}",
                                output::key_value("Modified", or_dash(attrs.last_modified_date.as_deref()))
                            );
                            println!();
                            println!("{}", or_dash(attrs.response_body.as_deref()));
                        }
                        None => println!("No response to review {}", review_id),
                    }
                }
            }

            ReviewsSubcommand::Respond { review_id, text } => {
                let response = client.respond_to_review(review_id, text).await?;
                if cli.format == OutputFormat::Json {
                    output::resource_json(&response)?;
                } else if !cli.quiet {
                    println!(
                        "{} Responded to review {}",
                        style("✓").green().bold(),
                        style(review_id).cyan()
                    );
                }
            }

            ReviewsSubcommand::DeleteResponse { review_id, yes } => {
                let Some(response) = client.get_review_response(review_id).await? else {
                    anyhow::bail!("Review {} has no response", review_id);
                };

                if !yes
                    && cli.format == OutputFormat::Text
                    && !output::confirm(&format!("Delete the response to review {}?", review_id))?
                {
                    println!("Cancelled");
                    return Ok(());
                }

                client.delete_review_response(&response.id).await?;
                if cli.text() {
                    println!(
                        "{} Deleted response to review {}",
                        style("✓").green().bold(),
                        style(review_id).cyan()
                    );
                }
            }
        }

        Ok(())
    }
}

fn print_review(review: &CustomerReview) {
    let attrs = &review.attributes;
    let rating = attrs.rating.unwrap_or(0).min(5) as usize;
    println!(
        "{}{} {} {}",
        style("★".repeat(rating)).yellow(),
        style("☆".repeat(5 - rating)).dim(),
        output::header(or_dash(attrs.title.as_deref())),
        style(&review.id).dim()
    );
    println!(
        "  {} {} {}",
        or_dash(attrs.reviewer_nickname.as_deref()),
        style(or_dash(attrs.territory.as_deref())).dim(),
        style(or_dash(attrs.created_date.as_deref())).dim()
    );
    if let Some(body) = &attrs.body {
        println!("  {}", body);
    }
    println!();
}
