use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::pipeline::TRAILING_MONTHS;

#[derive(Parser)]
#[command(name = "jira-digest")]
#[command(about = "Posts Jira activity reports and bug analytics to Mattermost", version)]
#[command(after_help = "EXAMPLES:
    jira-digest serve                 Run the daily and monthly schedules
    jira-digest daily --dry-run       Print today's report without posting
    jira-digest monthly               Post the bug charts now
    jira-digest metrics --months 6    Show the trailing bug counts
    jira-digest next-runs             Show upcoming fire times")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a config file (default: platform config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Show error causes and debug logs
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run both pipelines on their schedules until interrupted
    #[command(after_help = "EXAMPLES:
    jira-digest serve
    LOG_LEVEL=debug jira-digest serve --log-json")]
    Serve,
    /// Run the daily ticket report once
    #[command(after_help = "EXAMPLES:
    jira-digest daily
    jira-digest daily --dry-run")]
    Daily {
        /// Print the report instead of posting it
        #[arg(long)]
        dry_run: bool,
    },
    /// Run the monthly bug analytics once
    #[command(after_help = "EXAMPLES:
    jira-digest monthly
    jira-digest monthly --dry-run --json")]
    Monthly {
        /// Print the counts and chart links instead of posting
        #[arg(long)]
        dry_run: bool,
    },
    /// Show created and fixed bug counts per month
    #[command(after_help = "EXAMPLES:
    jira-digest metrics
    jira-digest metrics --months 12 --json")]
    Metrics {
        /// Number of months, ending with the current one
        #[arg(long, short, default_value_t = TRAILING_MONTHS,
              value_parser = clap::value_parser!(u32).range(1..=24))]
        months: u32,
    },
    /// Blank the text of every post in a channel
    #[command(after_help = "EXAMPLES:
    jira-digest clear-channel 4xp9fdt9jbnpmxbmk8x5gk6ycw --yes
    jira-digest clear-channel 4xp9fdt9jbnpmxbmk8x5gk6ycw --yes --pace-ms 250")]
    ClearChannel {
        /// Mattermost channel ID
        channel_id: String,

        /// Confirm the edit; nothing is changed without it
        #[arg(long)]
        yes: bool,

        /// Milliseconds to wait between edits
        #[arg(long, default_value_t = 100)]
        pace_ms: u64,
    },
    /// Print the next daily and monthly fire times
    #[command(after_help = "EXAMPLES:
    jira-digest next-runs
    jira-digest next-runs --json")]
    NextRuns,
    /// Generate shell completions
    #[command(after_help = "EXAMPLES:
    jira-digest completions bash > ~/.bash_completion.d/jira-digest
    jira-digest completions zsh > ~/.zfunc/_jira-digest
    jira-digest completions fish > ~/.config/fish/completions/jira-digest.fish")]
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}
