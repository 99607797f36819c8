use std::time::Duration;

use clap::Parser;

use rss_curator::ai::{self, ChatClient, PromptTemplate};
use rss_curator::cli::{Cli, Command};
use rss_curator::config::Config;
use rss_curator::db::Repository;
use rss_curator::error::Result;
use rss_curator::feed::{fetch_and_store, FeedFetcher};
use rss_curator::pipeline::{run_loop, RunOptions};
use rss_curator::report::{generate_report, ReportOptions};
use rss_curator::server;

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_env();

    // Command-line flags win over environment and file values.
    if let Some(db_path) = cli.db_path {
        config.db_path = db_path;
    }
    if let Some(feed_url) = cli.feed_url {
        config.feed_url = feed_url;
    }
    if let Some(api_key) = cli.api_key {
        config.api_key = Some(api_key);
    }
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(prompt) = cli.prompt {
        config.prompt = Some(prompt);
    }

    let db = Repository::new(&config.db_path).await?;

    match cli.command {
        Command::Fetch => {
            let fetcher = FeedFetcher::new();
            fetch_and_store(&fetcher, &db, &config.feed_url).await?;
        }

        Command::Score {
            refresh,
            show_response,
        } => {
            let client = ChatClient::from_config(&config)?;
            let template = PromptTemplate::from_config(&config)?;
            ai::score_articles(
                &db,
                &client,
                &config.model,
                &template,
                refresh.as_deref(),
                show_response,
            )
            .await?;
        }

        Command::List { limit, reported } => {
            for article in db.recent_articles(limit, reported).await? {
                let score = if article.score.is_empty() {
                    "---"
                } else {
                    article.score.as_str()
                };
                println!(
                    "[{score:>3}] {} ({})",
                    article.title,
                    article.published_date.format("%Y-%m-%d")
                );
            }
        }

        Command::Dump { limit } => {
            for article in db.recent_articles(limit, false).await? {
                println!("{:-<80}", "");
                println!("Title:       {}", article.title);
                println!("GUID:        {}", article.guid);
                println!(
                    "Date:        {}",
                    article.published_date.format("%Y-%m-%d %H:%M:%S")
                );
                println!("Link:        {}", article.link);
                println!("Feed URL:    {}", article.feed_url);
                println!("Score:       {}", article.score);
                println!("Model:       {}", article.model);
                println!("Reported:    {}", if article.reported { "yes" } else { "no" });
                println!("Analysis:");
                println!("{}", article.analysis);
                println!("Description:");
                println!("{}", article.description);
                println!("Content:");
                println!("{}", article.content);
                println!();
            }
        }

        Command::Run {
            interval,
            no_fetch,
            no_score,
            no_report,
            serve,
            host,
            port,
            age,
            threshold,
            out,
            send_email,
        } => {
            let opts = RunOptions {
                interval: Duration::from_secs(interval),
                fetch: !no_fetch,
                score: !no_score,
                report: !no_report,
                serve: serve.then_some((host, port)),
                report_opts: ReportOptions {
                    age_days: age,
                    threshold,
                    out_file: out.filter(|p| !p.as_os_str().is_empty()),
                    send_email,
                    include_reported: false,
                },
            };
            run_loop(&db, &config, &opts).await?;
        }

        Command::Report {
            age,
            threshold,
            out,
            send_email,
            always,
        } => {
            let opts = ReportOptions {
                age_days: age,
                threshold,
                out_file: (!out.as_os_str().is_empty()).then_some(out),
                send_email,
                include_reported: always,
            };
            generate_report(&db, &config, &opts).await?;
        }

        Command::ResetReported { pattern } => {
            let affected = db.clear_reported_matching(&pattern).await?;
            println!("Reset reported flag for {affected} articles matching '{pattern}'");
        }

        Command::Serve { host, port } => {
            server::serve(&host, port, db.clone()).await?;
        }

        Command::Models => {
            let client = ChatClient::from_config(&config)?;
            let models = client.list_models().await?;
            println!("Found {} models:", models.len());
            for model in models {
                if model.owned_by.is_empty() {
                    println!("- {}", model.id);
                } else {
                    println!("- {} (Owner: {})", model.id, model.owned_by);
                }
            }
        }
    }

    Ok(())
}
