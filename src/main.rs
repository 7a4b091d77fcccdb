mod analytics;
mod chart;
mod cli;
mod client;
mod config;
mod error;
mod jql;
mod logging;
mod mattermost;
mod normalize;
mod output;
mod pipeline;
mod report;
mod responses;
mod schedule;
mod types;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::{CommandFactory, Parser};
use clap_complete::generate;

use cli::{Cli, Commands};
use config::Config;
use error::{DigestError, Result};
use mattermost::MattermostClient;
use output::NextRun;
use pipeline::{Digest, TRAILING_MONTHS};
use schedule::Schedule;
use std::error::Error;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");

        if e.is_configuration() {
            if let Ok(path) = Config::config_path() {
                eprintln!("Set it in the environment, a .env file, or {}", path.display());
            }
        }

        // Show error chain if verbose flag was passed
        if std::env::args().any(|arg| arg == "--verbose" || arg == "-v") {
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("Caused by: {cause}");
                source = std::error::Error::source(cause);
            }
        }

        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    output::set_json_output(cli.json);
    logging::init_tracing(if cli.verbose { "debug" } else { "info" }, cli.log_json);

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "jira-digest", &mut io::stdout());
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;
    let digest = Digest::new(config)?;

    match cli.command {
        Commands::Serve => {
            let schedule = Schedule::from_settings(&digest.config().schedule, digest.timezone())?;
            schedule::serve(Arc::new(digest), Arc::new(schedule)).await?;
        }
        Commands::Daily { dry_run: true } => {
            let text = digest.daily_report(digest.today()).await?;
            output::print_message(&text);
        }
        Commands::Daily { dry_run: false } => {
            digest.run_daily(digest.today()).await?;
            output::print_message("Daily report posted");
        }
        Commands::Monthly { dry_run: true } => {
            let today = digest.today();
            let data = digest.collect_monthly(today, TRAILING_MONTHS).await?;
            let [bar, line] = digest.chart_links(&data, today)?;

            if output::is_json_output() {
                output::print_item(
                    &serde_json::json!({
                        "snapshot": data.snapshot,
                        "months": data.months,
                        "charts": [bar, line],
                    }),
                    |_| {},
                );
            } else {
                output::print_snapshot(&data.snapshot);
                println!();
                output::print_metrics(&data.months);
                println!("\nSnapshot chart: {bar}\nTrend chart:    {line}");
            }
        }
        Commands::Monthly { dry_run: false } => {
            digest.run_monthly(digest.today()).await?;
            output::print_message("Monthly analytics posted");
        }
        Commands::Metrics { months } => {
            let data = digest.collect_monthly(digest.today(), months).await?;
            output::print_metrics(&data.months);
        }
        Commands::ClearChannel {
            channel_id,
            yes,
            pace_ms,
        } => {
            if !yes {
                return Err(DigestError::Unconfirmed("blank every post in the channel"));
            }
            let chat = MattermostClient::from_config(&digest.config().mattermost)?
                .with_pace(Duration::from_millis(pace_ms));
            let summary = chat.clear_channel(&channel_id).await?;
            output::print_message(&format!(
                "Cleared {} posts ({} failed)",
                summary.cleared, summary.failed
            ));
        }
        Commands::NextRuns => {
            let schedule = Schedule::from_settings(&digest.config().schedule, digest.timezone())?;
            let now = Utc::now();
            let runs = [
                NextRun {
                    pipeline: "daily",
                    at: schedule.next_daily(now)?.to_rfc3339(),
                },
                NextRun {
                    pipeline: "monthly",
                    at: schedule.next_monthly(now)?.to_rfc3339(),
                },
            ];
            output::print_next_runs(&runs);
        }
        Commands::Completions { .. } => {
            // Already handled above
        }
    }

    Ok(())
}
