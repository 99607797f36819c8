use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::Article;

use super::pattern::glob_to_like;
use super::schema::{MIGRATE_ADD_REPORTED, SCHEMA};

const ARTICLE_COLUMNS: &str =
    "guid, title, link, description, content, published_date, score, analysis, feed_url, model, reported";

#[derive(Clone)]
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            // Older databases predate the reported column; a duplicate-column
            // error means the migration is already applied.
            if let Err(err) = conn.execute(MIGRATE_ADD_REPORTED, []) {
                if !err.to_string().contains("duplicate column name") {
                    return Err(err.into());
                }
            }
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    pub async fn article_exists(&self, guid: &str) -> Result<bool> {
        let guid = guid.to_string();
        let exists = self
            .conn
            .call(move |conn| {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM articles WHERE guid = ?1)",
                    params![guid],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await?;
        Ok(exists)
    }

    /// Insert a new article. Fails on a guid collision; callers are expected
    /// to check `article_exists` first and skip duplicates.
    pub async fn insert_article(&self, article: Article) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO articles (guid, title, link, description, content, published_date, score, analysis, feed_url, model)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
                    params![
                        article.guid,
                        article.title,
                        article.link,
                        article.description,
                        article.content,
                        article.published_date.to_rfc3339(),
                        article.score,
                        article.analysis,
                        article.feed_url,
                        article.model,
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Articles needing evaluation: never scored, or scored without a usable
    /// result. A refresh glob additionally pulls in title matches so specific
    /// articles can be forced through a rescore in the same pass.
    pub async fn articles_to_score(&self, refresh_glob: Option<&str>) -> Result<Vec<Article>> {
        let pattern = refresh_glob.map(glob_to_like);
        let articles = self
            .conn
            .call(move |conn| {
                let base = format!(
                    "SELECT {ARTICLE_COLUMNS} FROM articles \
                     WHERE score IS NULL OR score = '' OR score = 'N/A'"
                );
                let articles = match pattern {
                    Some(pattern) => {
                        let mut stmt = conn.prepare(&format!("{base} OR title LIKE ?1"))?;
                        let rows = stmt.query_map(params![pattern], |row| Ok(article_from_row(row)))?;
                        rows.collect::<std::result::Result<Vec<_>, _>>()?
                    }
                    None => {
                        let mut stmt = conn.prepare(&base)?;
                        let rows = stmt.query_map([], |row| Ok(article_from_row(row)))?;
                        rows.collect::<std::result::Result<Vec<_>, _>>()?
                    }
                };
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }

    /// Overwrite the scoring fields for one article.
    pub async fn update_score(
        &self,
        guid: &str,
        score: &str,
        analysis: &str,
        model: &str,
    ) -> Result<()> {
        let guid = guid.to_string();
        let score = score.to_string();
        let analysis = analysis.to_string();
        let model = model.to_string();
        self.conn
            .call(move |conn| {
                let affected = conn.execute(
                    "UPDATE articles SET score = ?1, analysis = ?2, model = ?3 WHERE guid = ?4",
                    params![score, analysis, model, guid],
                )?;
                if affected == 0 {
                    return Err(rusqlite::Error::QueryReturnedNoRows.into());
                }
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn recent_articles(&self, limit: i64, reported_only: bool) -> Result<Vec<Article>> {
        let articles = self
            .conn
            .call(move |conn| {
                let query = if reported_only {
                    format!(
                        "SELECT {ARTICLE_COLUMNS} FROM articles WHERE reported != 0 \
                         ORDER BY published_date DESC LIMIT ?1"
                    )
                } else {
                    format!(
                        "SELECT {ARTICLE_COLUMNS} FROM articles \
                         ORDER BY published_date DESC LIMIT ?1"
                    )
                };
                let mut stmt = conn.prepare(&query)?;
                let rows = stmt.query_map(params![limit], |row| Ok(article_from_row(row)))?;
                Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
            })
            .await?;
        Ok(articles)
    }

    pub async fn articles_since(
        &self,
        since: DateTime<Utc>,
        unreported_only: bool,
    ) -> Result<Vec<Article>> {
        let since = since.to_rfc3339();
        let articles = self
            .conn
            .call(move |conn| {
                let query = if unreported_only {
                    format!(
                        "SELECT {ARTICLE_COLUMNS} FROM articles \
                         WHERE published_date >= ?1 AND (reported = 0 OR reported IS NULL) \
                         ORDER BY published_date DESC"
                    )
                } else {
                    format!(
                        "SELECT {ARTICLE_COLUMNS} FROM articles WHERE published_date >= ?1 \
                         ORDER BY published_date DESC"
                    )
                };
                let mut stmt = conn.prepare(&query)?;
                let rows = stmt.query_map(params![since], |row| Ok(article_from_row(row)))?;
                Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
            })
            .await?;
        Ok(articles)
    }

    pub async fn mark_reported(&self, guids: Vec<String>) -> Result<()> {
        self.update_by_guids("UPDATE articles SET reported = 1", guids)
            .await
    }

    pub async fn clear_reported(&self, guids: Vec<String>) -> Result<()> {
        self.update_by_guids("UPDATE articles SET reported = 0", guids)
            .await
    }

    /// Clear the reported flag on previously-reported articles whose title
    /// matches the glob. Returns how many rows changed.
    pub async fn clear_reported_matching(&self, glob: &str) -> Result<usize> {
        let pattern = glob_to_like(glob);
        let affected = self
            .conn
            .call(move |conn| {
                let affected = conn.execute(
                    "UPDATE articles SET reported = 0 WHERE title LIKE ?1 AND reported != 0",
                    params![pattern],
                )?;
                Ok(affected)
            })
            .await?;
        Ok(affected)
    }

    /// Clear scoring state so the articles are picked up again by the next
    /// scoring pass.
    pub async fn clear_scores(&self, guids: Vec<String>) -> Result<()> {
        self.update_by_guids(
            "UPDATE articles SET score = '', analysis = '', model = ''",
            guids,
        )
        .await
    }

    /// Apply a bulk update to an explicit guid list in one statement.
    /// A no-op on an empty list.
    async fn update_by_guids(&self, set_clause: &str, guids: Vec<String>) -> Result<()> {
        if guids.is_empty() {
            return Ok(());
        }
        let set_clause = set_clause.to_string();
        self.conn
            .call(move |conn| {
                let placeholders = vec!["?"; guids.len()].join(",");
                let query = format!("{set_clause} WHERE guid IN ({placeholders})");
                conn.execute(&query, rusqlite::params_from_iter(guids.iter()))?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn article_from_row(row: &Row) -> Article {
    Article {
        guid: row.get(0).unwrap(),
        title: row.get(1).unwrap(),
        link: row.get(2).unwrap(),
        description: row.get(3).unwrap(),
        content: row.get(4).unwrap(),
        published_date: row
            .get::<_, String>(5)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        score: row.get(6).unwrap(),
        analysis: row.get(7).unwrap(),
        feed_url: row.get(8).unwrap(),
        model: row.get(9).unwrap(),
        reported: row.get::<_, i64>(10).unwrap() != 0,
    }
}
