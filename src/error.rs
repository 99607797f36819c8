use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed parse error: {0}")]
    Feed(#[from] feed_rs::parser::ParseFeedError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("prompt template error: {0}")]
    Template(String),

    #[error("completion API error: {0}")]
    Api(String),

    #[error("email error: {0}")]
    Email(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
