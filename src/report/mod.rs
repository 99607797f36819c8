mod mailer;
mod render;

use std::path::PathBuf;

use chrono::{Duration, Utc};
use tracing::{error, info};

use crate::config::Config;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::Article;

pub use mailer::send_html;
pub use render::{escape_html, render_digest};

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub age_days: i64,
    pub threshold: i64,
    pub out_file: Option<PathBuf>,
    pub send_email: bool,
    /// Include articles that have already appeared in a previous report.
    pub include_reported: bool,
}

/// Keep only articles at or above the threshold. Unparseable scores count as
/// 0, so they are excluded unless the threshold is 0 or negative.
pub fn filter_by_threshold(articles: Vec<Article>, threshold: i64) -> Vec<Article> {
    articles
        .into_iter()
        .filter(|article| article.parsed_score() >= threshold)
        .collect()
}

/// Select high-scoring articles from the report window, render them, deliver
/// to the configured destinations, and mark them reported. Returns the number
/// of articles in the report.
pub async fn generate_report(
    db: &Repository,
    config: &Config,
    opts: &ReportOptions,
) -> Result<usize> {
    let since = Utc::now() - Duration::days(opts.age_days);
    let articles = db.articles_since(since, !opts.include_reported).await?;

    if articles.is_empty() {
        info!("no unreported articles in the last {} days", opts.age_days);
        return Ok(0);
    }

    let selected = filter_by_threshold(articles, opts.threshold);
    if selected.is_empty() {
        info!("no articles met the score threshold, skipping report");
        return Ok(0);
    }

    // A report with no destination is a usage error, not a silent no-op.
    if opts.out_file.is_none() && !opts.send_email {
        return Err(AppError::Config(
            "must specify an output file or email delivery for the report".to_string(),
        ));
    }

    let title = format!(
        "AI RSS Report ({} days, score >= {})",
        opts.age_days, opts.threshold
    );

    if let Some(path) = &opts.out_file {
        let html = render_digest(&title, &selected);
        std::fs::write(path, html)?;
        let shown = std::fs::canonicalize(path).unwrap_or_else(|_| path.clone());
        println!("Report generated at: {}", shown.display());
    }

    if opts.send_email {
        let subject = config.email.subject.clone().unwrap_or_else(|| title.clone());
        let html = render_digest(&subject, &selected);
        info!(
            "sending report to {} via {}",
            config.email.to, config.email.smarthost
        );
        // A failed send does not unwind the report: the articles still count
        // as reported, matching the file-write path.
        match send_html(&config.email, &subject, &html) {
            Ok(()) => info!("email sent"),
            Err(err) => error!("sending report email: {err}"),
        }
    }

    println!("Processed {} articles.", selected.len());

    let guids: Vec<String> = selected.iter().map(|a| a.guid.clone()).collect();
    db.mark_reported(guids).await?;
    info!("marked {} articles as reported", selected.len());

    Ok(selected.len())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::models::Article;

    use super::filter_by_threshold;

    fn article_with_score(guid: &str, score: &str) -> Article {
        Article {
            guid: guid.to_string(),
            title: guid.to_string(),
            link: String::new(),
            description: String::new(),
            content: String::new(),
            published_date: Utc::now(),
            score: score.to_string(),
            analysis: String::new(),
            feed_url: String::new(),
            model: String::new(),
            reported: false,
        }
    }

    fn sample_set() -> Vec<Article> {
        vec![
            article_with_score("a", "10"),
            article_with_score("b", "50"),
            article_with_score("c", "90"),
            article_with_score("d", "N/A"),
            article_with_score("e", ""),
        ]
    }

    #[test]
    fn unparseable_scores_are_excluded_above_zero() {
        let kept = filter_by_threshold(sample_set(), 1);
        let guids: Vec<_> = kept.iter().map(|a| a.guid.as_str()).collect();
        assert_eq!(guids, vec!["a", "b", "c"]);
    }

    #[test]
    fn threshold_zero_keeps_everything() {
        assert_eq!(filter_by_threshold(sample_set(), 0).len(), 5);
    }

    #[test]
    fn selection_is_monotonic_in_threshold() {
        for threshold in 0..=100 {
            let at_t: Vec<_> = filter_by_threshold(sample_set(), threshold)
                .into_iter()
                .map(|a| a.guid)
                .collect();
            let at_t1 = filter_by_threshold(sample_set(), threshold + 1);
            for article in &at_t1 {
                assert!(at_t.contains(&article.guid));
            }
        }
    }
}
