use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "rss-curator",
    version,
    about = "Fetch an RSS feed, score articles with an LLM, and report the best ones"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (default: <config dir>/rss-curator/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file path
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    /// RSS feed URL
    #[arg(long, global = true)]
    pub feed_url: Option<String>,

    /// Completion API key
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Model to score with
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Preference prompt (string or @filename)
    #[arg(long, global = true)]
    pub prompt: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch articles from the RSS feed and save new ones
    Fetch,

    /// Score unscored articles
    Score {
        /// Rescore articles matching a title wildcard (e.g. '*Retro*')
        #[arg(long)]
        refresh: Option<String>,

        /// Print the raw response from the model
        #[arg(long)]
        show_response: bool,
    },

    /// List recent articles and their scores
    List {
        #[arg(long, default_value_t = 1000)]
        limit: i64,

        /// Only show articles that have been reported
        #[arg(long)]
        reported: bool,
    },

    /// Dump full details of recent articles
    Dump {
        #[arg(long, default_value_t = 1000)]
        limit: i64,
    },

    /// Fetch, score, and report, once or on an interval
    Run {
        /// Seconds between cycles; 0 runs a single cycle
        #[arg(long, default_value_t = 0)]
        interval: u64,

        /// Don't fetch new articles
        #[arg(long)]
        no_fetch: bool,

        /// Don't score articles
        #[arg(long)]
        no_score: bool,

        /// Don't generate a report
        #[arg(long)]
        no_report: bool,

        /// Run the web interface alongside the loop
        #[arg(long)]
        serve: bool,

        /// Host interface to listen on
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,

        /// Age of articles in days to include in the report
        #[arg(long, default_value_t = 7)]
        age: i64,

        /// Score threshold for the report
        #[arg(long, default_value_t = 50)]
        threshold: i64,

        /// Output filename for the report
        #[arg(long)]
        out: Option<PathBuf>,

        /// Send the report via email
        #[arg(long)]
        send_email: bool,
    },

    /// Generate an HTML report of high-scoring articles
    Report {
        /// Age of articles in days to include in the report
        #[arg(long, default_value_t = 7)]
        age: i64,

        /// Score threshold for the report
        #[arg(long, default_value_t = 50)]
        threshold: i64,

        /// Output filename for the report (empty to skip the file)
        #[arg(long, default_value = "report.html")]
        out: PathBuf,

        /// Send the report via email
        #[arg(long)]
        send_email: bool,

        /// Include articles that have already been reported
        #[arg(long)]
        always: bool,
    },

    /// Reset the reported flag for articles matching a title wildcard
    ResetReported { pattern: String },

    /// Start the web interface
    Serve {
        /// Host interface to listen on
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },

    /// List models available from the completion API
    Models,
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Cli, Command};

    #[test]
    fn command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["rss-curator", "fetch", "--feed-url", "http://x/rss"])
            .expect("cli should parse");
        assert_eq!(cli.feed_url.as_deref(), Some("http://x/rss"));
        assert!(matches!(cli.command, Command::Fetch));
    }

    #[test]
    fn score_refresh_glob_parses() {
        let cli = Cli::try_parse_from(["rss-curator", "score", "--refresh", "*Retro*"])
            .expect("cli should parse");
        match cli.command {
            Command::Score { refresh, .. } => assert_eq!(refresh.as_deref(), Some("*Retro*")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn report_defaults() {
        let cli = Cli::try_parse_from(["rss-curator", "report"]).expect("cli should parse");
        match cli.command {
            Command::Report {
                age,
                threshold,
                out,
                send_email,
                always,
            } => {
                assert_eq!(age, 7);
                assert_eq!(threshold, 50);
                assert_eq!(out.to_str(), Some("report.html"));
                assert!(!send_email);
                assert!(!always);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
