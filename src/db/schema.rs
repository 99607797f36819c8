pub const SCHEMA: &str = r#"
-- articles table: one row per feed entry, keyed by guid
CREATE TABLE IF NOT EXISTS articles (
    guid TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    link TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    content TEXT NOT NULL DEFAULT '',
    published_date TEXT NOT NULL,
    score TEXT NOT NULL DEFAULT '',
    analysis TEXT NOT NULL DEFAULT '',
    feed_url TEXT NOT NULL DEFAULT '',
    model TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    reported INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_articles_published_date ON articles(published_date DESC);
CREATE INDEX IF NOT EXISTS idx_articles_score ON articles(score);
"#;

/// Additive migration for databases created before the reported flag existed.
/// Re-running against a migrated database raises a duplicate-column error,
/// which callers must treat as already-satisfied.
pub const MIGRATE_ADD_REPORTED: &str =
    "ALTER TABLE articles ADD COLUMN reported INTEGER NOT NULL DEFAULT 0";
