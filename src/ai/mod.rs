mod client;
mod scorer;

pub use client::{ChatClient, CompletionApi, ModelInfo};
pub use scorer::{
    extract_score, score_articles, PromptTemplate, DEFAULT_PROMPT_TEMPLATE,
    MAX_PROMPT_CONTENT_LEN,
};
