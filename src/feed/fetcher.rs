use std::time::Duration;

use chrono::{DateTime, Utc};
use feed_rs::parser;
use reqwest::Client;

use crate::db::Repository;
use crate::error::Result;
use crate::models::Article;
use crate::util::truncate_chars;

/// Maximum length of the content stored in the database. Keeps row size
/// bounded when articles ship their full body in the feed.
pub const MAX_STORED_CONTENT_LEN: usize = 4096;

/// One entry as delivered by the feed, before dedup and storage.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    /// Stable identifier from the feed; absent when the source provides none.
    pub id: Option<String>,
    pub title: String,
    pub link: String,
    pub description: String,
    pub content: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy)]
pub struct FetchStats {
    pub received: usize,
    pub existing: usize,
    pub added: usize,
}

pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("rss-curator/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    pub async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Failed to fetch feed: HTTP {}", response.status()).into());
        }

        let bytes = response.bytes().await?;
        let feed = parser::parse(&bytes[..])?;

        let entries: Vec<FeedEntry> = feed
            .entries
            .into_iter()
            .map(|entry| {
                let id = if entry.id.is_empty() {
                    None
                } else {
                    Some(entry.id)
                };

                FeedEntry {
                    id,
                    title: entry
                        .title
                        .map(|t| t.content)
                        .unwrap_or_else(|| "Untitled".to_string()),
                    link: entry
                        .links
                        .first()
                        .map(|l| l.href.clone())
                        .unwrap_or_default(),
                    description: entry.summary.map(|s| s.content).unwrap_or_default(),
                    content: entry.content.and_then(|c| c.body),
                    published_at: entry.published.or(entry.updated),
                }
            })
            .collect();

        Ok(entries)
    }
}

impl Default for FeedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch the feed and store whatever is new, printing a per-run summary.
pub async fn fetch_and_store(
    fetcher: &FeedFetcher,
    db: &Repository,
    url: &str,
) -> Result<FetchStats> {
    let entries = fetcher.fetch(url).await?;
    println!("Fetching latest items from {url}");

    let stats = store_new_entries(db, url, entries).await?;
    println!(
        "Fetch Complete: Received: {}, Existing: {}, Added: {}",
        stats.received, stats.existing, stats.added
    );
    Ok(stats)
}

/// Deduplicate entries against the store and insert the new ones with empty
/// scoring state. An entry without an id is keyed by its link. A failure on
/// one entry is logged and does not abort the batch.
pub async fn store_new_entries(
    db: &Repository,
    feed_url: &str,
    entries: Vec<FeedEntry>,
) -> Result<FetchStats> {
    let mut stats = FetchStats {
        received: entries.len(),
        existing: 0,
        added: 0,
    };

    for entry in entries {
        let FeedEntry {
            id,
            title,
            link,
            description,
            content,
            published_at,
        } = entry;

        let guid = id.unwrap_or_else(|| link.clone());

        match db.article_exists(&guid).await {
            Ok(true) => {
                stats.existing += 1;
                continue;
            }
            Ok(false) => {}
            Err(err) => {
                tracing::warn!("checking store for article {title}: {err}");
                continue;
            }
        }

        println!("- New: {title}");

        // Feeds without a separate content element repeat the description.
        let content = flatten_html(&content.unwrap_or_else(|| description.clone()));
        let description = flatten_html(&description);

        let article = Article {
            guid,
            title: title.clone(),
            link,
            description,
            content: truncate_chars(&content, MAX_STORED_CONTENT_LEN).to_string(),
            published_date: published_at.unwrap_or_else(Utc::now),
            score: String::new(),
            analysis: String::new(),
            feed_url: feed_url.to_string(),
            model: String::new(),
            reported: false,
        };

        match db.insert_article(article).await {
            Ok(()) => stats.added += 1,
            Err(err) => tracing::warn!("saving article {title}: {err}"),
        }
    }

    Ok(stats)
}

/// Reduce feed HTML to plain text before storage.
fn flatten_html(html: &str) -> String {
    html2text::from_read(html.as_bytes(), 80)
        .map(|text| text.trim().to_string())
        .unwrap_or_else(|_| html.to_string())
}

#[cfg(test)]
mod tests {
    use super::flatten_html;

    #[test]
    fn markup_is_stripped() {
        let text = flatten_html("<p>A <b>nixie</b> clock build</p>");
        assert!(text.contains("nixie"));
        assert!(!text.contains('<'));
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(flatten_html("just words"), "just words");
    }
}
