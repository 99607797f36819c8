use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use axum_extra::extract::Form;
use serde::Deserialize;
use tracing::info;

use crate::db::Repository;
use crate::error::Result;
use crate::models::Article;
use crate::report::escape_html;

// Keep the live view snappy regardless of history size.
const LIST_LIMIT: i64 = 100;

#[derive(Clone)]
struct ServerState {
    db: Repository,
}

/// Serve the read/administrate view until the process exits.
pub async fn serve(host: &str, port: u16, db: Repository) -> Result<()> {
    let app = Router::new()
        .route("/", get(list_articles))
        .route("/action", post(handle_action))
        .with_state(ServerState { db });

    let addr = format!("{host}:{port}");
    info!("starting web interface at http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    reported: bool,
}

async fn list_articles(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> Response {
    match state.db.recent_articles(LIST_LIMIT, query.reported).await {
        Ok(articles) => Html(render_list_page(&articles, query.reported)).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("error fetching articles: {err}"),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct ActionForm {
    action: String,
    #[serde(default)]
    guids: Vec<String>,
}

async fn handle_action(State(state): State<ServerState>, Form(form): Form<ActionForm>) -> Response {
    if form.guids.is_empty() {
        return Redirect::to("/").into_response();
    }

    let result = match form.action.as_str() {
        "rescore" => state.db.clear_scores(form.guids).await,
        "reset-reported" => state.db.clear_reported(form.guids).await,
        _ => return (StatusCode::BAD_REQUEST, "unknown action").into_response(),
    };

    match result {
        Ok(()) => Redirect::to("/").into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("error performing action: {err}"),
        )
            .into_response(),
    }
}

const LIST_STYLES: &str = r#"
        body { font-family: sans-serif; margin: 2em; }
        table { width: 100%; border-collapse: collapse; }
        th, td { text-align: left; padding: 8px; border-bottom: 1px solid #ddd; }
        th { background-color: #f2f2f2; }
        .actions { margin-bottom: 1em; padding: 1em; background: #eee; border-radius: 4px; display: flex; justify-content: space-between; align-items: center; }
        button { padding: 0.5em 1em; cursor: pointer; margin-right: 0.5em; }
        .score-high { color: green; font-weight: bold; }
        .score-low { color: #888; }
        .filter { font-size: 0.9em; }
"#;

const LIST_SCRIPT: &str = r#"
        function toggleAll(source) {
            var checkboxes = document.getElementsByName('guids');
            for (var i = 0; i < checkboxes.length; i++) {
                checkboxes[i].checked = source.checked;
            }
        }
        function updateFilter() {
            var reported = document.getElementById('reportedOnly').checked;
            window.location.href = "/?reported=" + reported;
        }
"#;

fn render_list_page(articles: &[Article], reported_only: bool) -> String {
    let mut rows = String::new();
    for article in articles {
        let score_cell = if article.score.is_empty() {
            "-".to_string()
        } else {
            let class = if article.parsed_score() >= 50 {
                "score-high"
            } else {
                "score-low"
            };
            format!(
                "<span class=\"{class}\">{}</span>",
                escape_html(&article.score)
            )
        };

        rows.push_str(&format!(
            r#"<tr>
    <td><input type="checkbox" name="guids" value="{guid}"></td>
    <td>{score_cell}</td>
    <td><a href="{link}" target="_blank">{title}</a></td>
    <td>{date}</td>
    <td>{reported}</td>
</tr>
"#,
            guid = escape_html(&article.guid),
            link = escape_html(&article.link),
            title = escape_html(&article.title),
            date = article.published_date.format("%Y-%m-%d %H:%M"),
            reported = if article.reported { "Yes" } else { "No" },
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>rss-curator - Articles</title>
    <style>{styles}</style>
    <script>{script}</script>
</head>
<body>
    <h1>Articles</h1>
    <form action="/action" method="POST">
        <div class="actions">
            <div>
                <button type="submit" name="action" value="rescore">Rescore Selected</button>
                <button type="submit" name="action" value="reset-reported">Reset Reported Status</button>
            </div>
            <div class="filter">
                <input type="checkbox" id="reportedOnly" onclick="updateFilter()"{checked}>
                <label for="reportedOnly">Show Reported Only</label>
            </div>
        </div>
        <table>
            <thead>
                <tr>
                    <th><input type="checkbox" onclick="toggleAll(this)"></th>
                    <th>Score</th>
                    <th>Title</th>
                    <th>Date</th>
                    <th>Reported</th>
                </tr>
            </thead>
            <tbody>
{rows}            </tbody>
        </table>
    </form>
</body>
</html>
"#,
        styles = LIST_STYLES,
        script = LIST_SCRIPT,
        checked = if reported_only { " checked" } else { "" },
        rows = rows,
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::models::Article;

    use super::render_list_page;

    fn article(title: &str, score: &str, reported: bool) -> Article {
        Article {
            guid: format!("guid-{title}"),
            title: title.to_string(),
            link: "http://x/1".to_string(),
            description: String::new(),
            content: String::new(),
            published_date: Utc::now(),
            score: score.to_string(),
            analysis: String::new(),
            feed_url: String::new(),
            model: String::new(),
            reported,
        }
    }

    #[test]
    fn high_and_low_scores_get_classes() {
        let html = render_list_page(
            &[article("High", "80", false), article("Low", "10", true)],
            false,
        );
        assert!(html.contains("score-high"));
        assert!(html.contains("score-low"));
        assert!(html.contains("High"));
        assert!(html.contains("<td>Yes</td>"));
    }

    #[test]
    fn filter_checkbox_reflects_state() {
        assert!(render_list_page(&[], true).contains("checked"));
    }
}
