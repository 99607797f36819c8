use std::sync::OnceLock;

use regex::Regex;

use crate::config::Config;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{Article, SCORE_UNPARSEABLE};
use crate::util::truncate_chars;

/// Maximum article content length substituted into the prompt. Applied
/// independently of the storage cap; stored content may predate a cap
/// change.
pub const MAX_PROMPT_CONTENT_LEN: usize = 4096;

/// Default preference prompt. Override with the `prompt` config value or the
/// `--prompt` flag, either inline or as `@filename`.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "You are rating articles for a reader who enjoys hands-on technology projects: \
retro computing, homebrew hardware, unusual display technologies like nixie tubes, \
and restorations of old or rare machines. Produce a numeric score between 0 and 100 \
for how much this reader will enjoy the article, formatted as 'Score: <number>', \
followed by exactly three bullet points explaining the rating.\n\n\
Title: {title}\nDescription: {description}\nContent: {content}";

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([a-zA-Z_]+)\}").expect("valid regex"))
}

fn score_label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(?:score|rating):\s*(\d+)").expect("valid regex"))
}

fn digits_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid regex"))
}

/// A prompt with `{title}`, `{description}` and `{content}` placeholders,
/// validated up front so a bad template aborts the scoring run before any
/// API calls are made.
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        for caps in placeholder_regex().captures_iter(template) {
            let name = &caps[1];
            if !matches!(name, "title" | "description" | "content") {
                return Err(AppError::Template(format!(
                    "unknown placeholder '{{{name}}}'"
                )));
            }
        }
        Ok(Self {
            template: template.to_string(),
        })
    }

    /// Build a template from an inline string, or from a file when the value
    /// starts with `@`.
    pub fn load(source: &str) -> Result<Self> {
        if let Some(path) = source.strip_prefix('@') {
            let contents = std::fs::read_to_string(path)
                .map_err(|err| AppError::Config(format!("reading prompt file {path}: {err}")))?;
            Self::parse(&contents)
        } else {
            Self::parse(source)
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::load(config.prompt.as_deref().unwrap_or(DEFAULT_PROMPT_TEMPLATE))
    }

    pub fn render(&self, article: &Article) -> String {
        placeholder_regex()
            .replace_all(&self.template, |caps: &regex::Captures| match &caps[1] {
                "title" => article.title.clone(),
                "description" => article.description.clone(),
                "content" => {
                    truncate_chars(&article.content, MAX_PROMPT_CONTENT_LEN).to_string()
                }
                _ => caps[0].to_string(),
            })
            .into_owned()
    }
}

/// Pull a numeric score out of free-text model output. A labelled
/// `score:`/`rating:` value wins; otherwise the first run of digits anywhere
/// in the text is taken, since models do not reliably follow the requested
/// format. Total: yields the sentinel when no digits exist at all.
pub fn extract_score(text: &str) -> String {
    if let Some(caps) = score_label_regex().captures(text) {
        return caps[1].to_string();
    }
    if let Some(m) = digits_regex().find(text) {
        return m.as_str().to_string();
    }
    SCORE_UNPARSEABLE.to_string()
}

/// Score every candidate article, one completion call at a time. A failure on
/// one article is logged and skipped so the rest of the batch still makes
/// progress. Returns the number of articles scored.
pub async fn score_articles<C: super::CompletionApi>(
    db: &Repository,
    api: &C,
    model: &str,
    template: &PromptTemplate,
    refresh_glob: Option<&str>,
    show_response: bool,
) -> Result<usize> {
    let articles = db.articles_to_score(refresh_glob).await?;

    if articles.is_empty() {
        println!("No unscored articles found.");
        return Ok(0);
    }

    println!("found {} unscored articles", articles.len());

    let mut scored = 0;
    for article in articles {
        println!("Scoring: {}", article.title);

        let prompt = template.render(&article);

        let analysis = match api.complete(model, &prompt).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!("completion failed for {}: {err}", article.title);
                continue;
            }
        };

        if show_response {
            println!("{:-<80}", "");
            println!("{analysis}");
            println!("{:-<80}", "");
        }

        let score = extract_score(&analysis);
        println!("  Score: {score}");

        if let Err(err) = db.update_score(&article.guid, &score, &analysis, model).await {
            tracing::warn!("updating score for {}: {err}", article.title);
            continue;
        }
        scored += 1;
    }

    Ok(scored)
}
