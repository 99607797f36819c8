use std::sync::Mutex;

use tempfile::TempDir;

use rss_curator::ai::{self, CompletionApi, PromptTemplate};
use rss_curator::config::Config;
use rss_curator::db::Repository;
use rss_curator::error::{AppError, Result};
use rss_curator::feed::{store_new_entries, FeedEntry};
use rss_curator::report::{generate_report, ReportOptions};

/// Completion stub returning a canned reply, with optional per-title failure.
struct StubCompletion {
    reply: String,
    fail_when_prompt_contains: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl StubCompletion {
    fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail_when_prompt_contains: None,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl CompletionApi for StubCompletion {
    async fn complete(&self, _model: &str, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(marker) = &self.fail_when_prompt_contains {
            if prompt.contains(marker.as_str()) {
                return Err(AppError::Api("stubbed outage".to_string()));
            }
        }
        Ok(self.reply.clone())
    }
}

async fn open_repo(dir: &TempDir) -> Repository {
    let path = dir.path().join("articles.db");
    Repository::new(path.to_str().unwrap()).await.unwrap()
}

fn entry(title: &str, link: &str) -> FeedEntry {
    FeedEntry {
        id: None,
        title: title.to_string(),
        link: link.to_string(),
        description: "A homebrew Z80 build".to_string(),
        content: None,
        published_at: None,
    }
}

fn report_options(dir: &TempDir, threshold: i64) -> ReportOptions {
    ReportOptions {
        age_days: 7,
        threshold,
        out_file: Some(dir.path().join("report.html")),
        send_email: false,
        include_reported: false,
    }
}

#[tokio::test]
async fn fetch_score_report_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_repo(&dir).await;

    // Fetch: one entry without a guid lands keyed by its link, unscored.
    let stats = store_new_entries(&db, "http://feed/rss", vec![entry("Z80 Project", "http://x/1")])
        .await
        .unwrap();
    assert_eq!(stats.received, 1);
    assert_eq!(stats.added, 1);

    let rows = db.recent_articles(10, false).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].guid, "http://x/1");
    assert_eq!(rows[0].score, "");

    // Score via the stubbed completion API.
    let stub = StubCompletion::replying("Score: 75 — great retro build");
    let template = PromptTemplate::parse("Rate: {title} / {description} / {content}").unwrap();
    let scored = ai::score_articles(&db, &stub, "stub-model", &template, None, false)
        .await
        .unwrap();
    assert_eq!(scored, 1);

    let prompts = stub.prompts.lock().unwrap();
    assert!(prompts[0].contains("Z80 Project"));
    drop(prompts);

    let rows = db.recent_articles(10, false).await.unwrap();
    assert_eq!(rows[0].score, "75");
    assert_eq!(rows[0].analysis, "Score: 75 — great retro build");
    assert_eq!(rows[0].model, "stub-model");

    // Report: the article clears the threshold, is rendered, and is marked.
    let config = Config::default();
    let opts = report_options(&dir, 50);
    let processed = generate_report(&db, &config, &opts).await.unwrap();
    assert_eq!(processed, 1);

    let html = std::fs::read_to_string(dir.path().join("report.html")).unwrap();
    assert!(html.contains("Z80 Project"));
    assert!(html.contains("Score: 75"));

    let rows = db.recent_articles(10, false).await.unwrap();
    assert!(rows[0].reported);

    // A second run over the same window selects nothing new.
    let processed = generate_report(&db, &config, &opts).await.unwrap();
    assert_eq!(processed, 0);
}

#[tokio::test]
async fn one_failing_article_does_not_abort_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_repo(&dir).await;

    store_new_entries(
        &db,
        "http://feed/rss",
        vec![
            entry("Good Article", "http://x/good"),
            entry("Bad Article", "http://x/bad"),
        ],
    )
    .await
    .unwrap();

    let stub = StubCompletion {
        reply: "Score: 60".to_string(),
        fail_when_prompt_contains: Some("Bad Article".to_string()),
        prompts: Mutex::new(Vec::new()),
    };
    let template = PromptTemplate::parse("{title}").unwrap();

    let scored = ai::score_articles(&db, &stub, "stub-model", &template, None, false)
        .await
        .unwrap();
    assert_eq!(scored, 1);

    // The failed article is still waiting for the next pass.
    let remaining = db.articles_to_score(None).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].title, "Bad Article");
}

#[tokio::test]
async fn unparseable_model_output_stores_the_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_repo(&dir).await;

    store_new_entries(&db, "http://feed/rss", vec![entry("Mystery", "http://x/1")])
        .await
        .unwrap();

    let stub = StubCompletion::replying("no numbers here");
    let template = PromptTemplate::parse("{title}").unwrap();
    ai::score_articles(&db, &stub, "stub-model", &template, None, false)
        .await
        .unwrap();

    let rows = db.recent_articles(10, false).await.unwrap();
    assert_eq!(rows[0].score, "N/A");

    // Sentinel scores compare as zero: excluded at a positive threshold,
    // included at zero.
    let config = Config::default();
    assert_eq!(
        generate_report(&db, &config, &report_options(&dir, 50)).await.unwrap(),
        0
    );
    assert_eq!(
        generate_report(&db, &config, &report_options(&dir, 0)).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn report_without_destination_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_repo(&dir).await;

    store_new_entries(&db, "http://feed/rss", vec![entry("Z80 Project", "http://x/1")])
        .await
        .unwrap();
    db.update_score("http://x/1", "90", "Score: 90", "stub-model")
        .await
        .unwrap();

    let config = Config::default();
    let opts = ReportOptions {
        age_days: 7,
        threshold: 50,
        out_file: None,
        send_email: false,
        include_reported: false,
    };

    let err = generate_report(&db, &config, &opts).await.unwrap_err();
    assert!(matches!(err, AppError::Config(_)));

    // Nothing was marked reported by the failed run.
    let rows = db.recent_articles(10, false).await.unwrap();
    assert!(!rows[0].reported);
}

#[tokio::test]
async fn always_flag_re_reports_previously_reported_articles() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_repo(&dir).await;

    store_new_entries(&db, "http://feed/rss", vec![entry("Z80 Project", "http://x/1")])
        .await
        .unwrap();
    db.update_score("http://x/1", "90", "Score: 90", "stub-model")
        .await
        .unwrap();

    let config = Config::default();
    let opts = report_options(&dir, 50);
    assert_eq!(generate_report(&db, &config, &opts).await.unwrap(), 1);
    assert_eq!(generate_report(&db, &config, &opts).await.unwrap(), 0);

    let mut always = report_options(&dir, 50);
    always.include_reported = true;
    assert_eq!(generate_report(&db, &config, &always).await.unwrap(), 1);
}
