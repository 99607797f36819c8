use crate::models::Article;

const DIGEST_STYLES: &str = r#"
        body { font-family: sans-serif; max-width: 900px; margin: 2em auto; padding: 0 1em; background: #f4f4f4; color: #333; }
        h1 { text-align: center; color: #444; }
        .article { background: #fff; padding: 1.5em; margin-bottom: 1.5em; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        .header { display: flex; justify-content: space-between; align-items: baseline; border-bottom: 2px solid #eee; padding-bottom: 0.5em; margin-bottom: 1em; }
        .title { font-size: 1.4em; font-weight: bold; }
        .title a { text-decoration: none; color: #2c3e50; }
        .title a:hover { color: #3498db; }
        .link { font-size: 0.85em; color: #3498db; margin-top: 0.2em; }
        .link a { text-decoration: none; color: #3498db; }
        .meta { font-size: 0.85em; color: #888; text-align: right; }
        .score { font-weight: bold; color: #e67e22; font-size: 1.1em; }
        .analysis { font-style: italic; background: #f9f9f9; padding: 1em; border-left: 4px solid #3498db; margin: 1em 0; white-space: pre-wrap; }
        .description { line-height: 1.6; }
        .content { display: none; margin-top: 1em; padding-top: 1em; border-top: 1px dashed #ccc; font-size: 0.9em; color: #555; white-space: pre-wrap; }
        .toggle-content { cursor: pointer; color: #3498db; font-size: 0.9em; user-select: none; }
        .toggle-content:hover { text-decoration: underline; }
"#;

const DIGEST_SCRIPT: &str = r#"
        function toggleContent(id) {
            var el = document.getElementById('content-' + id);
            el.style.display = el.style.display === 'block' ? 'none' : 'block';
        }
"#;

/// Render the digest document for a set of selected articles.
pub fn render_digest(title: &str, articles: &[Article]) -> String {
    let mut body = String::new();

    for (idx, article) in articles.iter().enumerate() {
        let analysis_block = if article.analysis.is_empty() {
            String::new()
        } else {
            format!(
                "<div class=\"analysis\"><strong>Analysis:</strong><br>{}</div>\n",
                escape_html(&article.analysis)
            )
        };

        let content_block = if article.content.is_empty() {
            String::new()
        } else {
            format!(
                "<div class=\"toggle-content\" onclick=\"toggleContent({idx})\">Show/Hide Full Content</div>\n\
                 <div id=\"content-{idx}\" class=\"content\">{}</div>\n",
                escape_html(&article.content)
            )
        };

        body.push_str(&format!(
            r#"<div class="article">
    <div class="header">
        <div>
            <div class="title"><a href="{link}" target="_blank">{title}</a></div>
            <div class="link"><a href="{link}" target="_blank">{link}</a></div>
        </div>
        <div class="meta">
            <span class="score">Score: {score}</span><br>
            {date}<br>
            <span style="font-size:0.8em">{model}</span>
        </div>
    </div>
    {analysis_block}<div class="description">{description}</div>
    {content_block}</div>
"#,
            link = escape_html(&article.link),
            title = escape_html(&article.title),
            score = escape_html(&article.score),
            date = article.published_date.format("%Y-%m-%d %H:%M"),
            model = escape_html(&article.model),
            description = escape_html(&article.description),
        ));
    }

    if articles.is_empty() {
        body.push_str("<p style=\"text-align:center\">No articles found.</p>\n");
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>{styles}</style>
    <script>{script}</script>
</head>
<body>
    <h1>{title}</h1>
{body}</body>
</html>
"#,
        title = escape_html(title),
        styles = DIGEST_STYLES,
        script = DIGEST_SCRIPT,
        body = body,
    )
}

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::models::Article;

    use super::{escape_html, render_digest};

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<b>"retro" & 'rare'</b>"#),
            "&lt;b&gt;&quot;retro&quot; &amp; &#39;rare&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn digest_contains_articles_and_escapes_titles() {
        let article = Article {
            guid: "g".to_string(),
            title: "Z80 <Project>".to_string(),
            link: "http://x/1".to_string(),
            description: "desc".to_string(),
            content: "full content".to_string(),
            published_date: Utc::now(),
            score: "75".to_string(),
            analysis: "Score: 75".to_string(),
            feed_url: String::new(),
            model: "stub".to_string(),
            reported: false,
        };

        let html = render_digest("Weekly Digest", &[article]);
        assert!(html.contains("Weekly Digest"));
        assert!(html.contains("Z80 &lt;Project&gt;"));
        assert!(html.contains("Score: 75"));
        assert!(!html.contains("Z80 <Project>"));
    }

    #[test]
    fn empty_digest_says_so() {
        let html = render_digest("Empty", &[]);
        assert!(html.contains("No articles found."));
    }
}
