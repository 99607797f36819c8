use std::time::Duration;

use tracing::info;

use crate::ai::{self, ChatClient, PromptTemplate};
use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::feed::{fetch_and_store, FeedFetcher};
use crate::report::{generate_report, ReportOptions};
use crate::server;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Zero means run one cycle and exit.
    pub interval: Duration,
    pub fetch: bool,
    pub score: bool,
    pub report: bool,
    /// Host/port for the web view, when requested alongside the loop.
    pub serve: Option<(String, u16)>,
    pub report_opts: ReportOptions,
}

/// Fetch, score, and report in sequence, once or on a fixed interval. Any
/// error inside a cycle is unrecoverable here and propagates to the caller;
/// an external supervisor is expected to restart the process.
pub async fn run_loop(db: &Repository, config: &Config, opts: &RunOptions) -> Result<()> {
    if let Some((host, port)) = &opts.serve {
        let host = host.clone();
        let port = *port;
        let server_db = db.clone();
        tokio::spawn(async move {
            if let Err(err) = server::serve(&host, port, server_db).await {
                tracing::error!("web interface failed: {err}");
            }
        });
    }

    println!("Starting rss-curator...");
    let fetcher = FeedFetcher::new();

    loop {
        info!("starting cycle");

        if opts.fetch {
            fetch_and_store(&fetcher, db, &config.feed_url).await?;
        }

        if opts.score {
            let client = ChatClient::from_config(config)?;
            let template = PromptTemplate::from_config(config)?;
            ai::score_articles(db, &client, &config.model, &template, None, false).await?;
        }

        if opts.report {
            generate_report(db, config, &opts.report_opts).await?;
        }

        if opts.interval.is_zero() {
            if opts.serve.is_some() {
                // One-shot cycle with a web view: keep serving forever.
                std::future::pending::<()>().await;
            }
            break;
        }

        info!("sleeping for {:?}", opts.interval);
        tokio::time::sleep(opts.interval).await;
    }

    println!("rss-curator finished");
    Ok(())
}
