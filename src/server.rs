use crate::core::Config;
use crate::errors::{Result, ScrapeError};
use crate::export::XLSX_CONTENT_TYPE;
use crate::pipeline::{export_tournament, require_tournament, RosterExport};
use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Produces the spreadsheet for one tournament.
#[async_trait]
pub trait RosterRunner: Send + Sync {
    async fn export(&self, tournament: &str) -> Result<RosterExport>;
}

/// Runs the real Chrome-driven pipeline.
pub struct ChromeRunner {
    config: Config,
}

impl ChromeRunner {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RosterRunner for ChromeRunner {
    async fn export(&self, tournament: &str) -> Result<RosterExport> {
        export_tournament(&self.config, tournament).await
    }
}

pub struct AppState {
    runner: Arc<dyn RosterRunner>,
    // One operator, one browser: runs never overlap
    run_lock: Mutex<()>,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub tournament: Option<String>,
}

impl IntoResponse for ScrapeError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn create_router(runner: Arc<dyn RosterRunner>) -> Router {
    let state = Arc::new(AppState {
        runner,
        run_lock: Mutex::new(()),
    });

    Router::new()
        .route("/", get(index))
        .route("/api/scrape", post(scrape))
        .with_state(state)
}

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = config.server.addr.clone();
    let app = create_router(Arc::new(ChromeRunner::new(config)));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Backend listening at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn scrape(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<ScrapeRequest>, JsonRejection>,
) -> Response {
    let requested = body.ok().and_then(|Json(request)| request.tournament);
    let tournament = match require_tournament(requested.as_deref()) {
        Ok(tournament) => tournament,
        Err(e) => return e.into_response(),
    };

    let _running = state.run_lock.lock().await;
    match state.runner.export(&tournament).await {
        Ok(export) => {
            info!("Sending {} ({} rows)", export.file_name, export.rows);
            (
                [
                    (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", export.file_name),
                    ),
                ],
                export.bytes,
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Bracket Roster Scraper</title>
<style>
  body { font-family: sans-serif; max-width: 36rem; margin: 3rem auto; padding: 0 1rem; }
  input { width: 100%; padding: .5rem; margin-bottom: .5rem; box-sizing: border-box; }
  button { padding: .5rem 1rem; }
  .error { color: #c00; margin-top: 1rem; }
</style>
</head>
<body>
<h1>Bracket Roster Scraper</h1>
<input id="tournament" placeholder="Tournament Name">
<button id="go">Download Excel</button>
<p id="error" class="error"></p>
<script>
const button = document.getElementById('go');
button.addEventListener('click', async () => {
  const tournament = document.getElementById('tournament').value;
  const error = document.getElementById('error');
  error.textContent = '';
  button.disabled = true;
  button.textContent = 'Scraping...';
  try {
    const res = await fetch('/api/scrape', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ tournament }),
    });
    if (!res.ok) {
      const body = await res.json().catch(() => ({}));
      throw new Error(body.error || 'Scrape failed');
    }
    const blob = await res.blob();
    const link = document.createElement('a');
    link.href = URL.createObjectURL(blob);
    link.download = `wrestlers_${tournament}.xlsx`;
    link.click();
  } catch (err) {
    error.textContent = err.message || 'Something went wrong';
  }
  button.disabled = false;
  button.textContent = 'Download Excel';
});
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    struct StubRunner {
        outcome: fn(&str) -> Result<RosterExport>,
    }

    #[async_trait]
    impl RosterRunner for StubRunner {
        async fn export(&self, tournament: &str) -> Result<RosterExport> {
            (self.outcome)(tournament)
        }
    }

    fn router(outcome: fn(&str) -> Result<RosterExport>) -> Router {
        create_router(Arc::new(StubRunner { outcome }))
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/scrape")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_tournament_is_bad_request() {
        let app = router(|_| panic!("runner must not be called"));

        let response = app.oneshot(post_json("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "Missing tournament name" }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = router(|_| panic!("runner must not be called"));

        let response = app.oneshot(post_json("not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_success_returns_attachment() {
        let app = router(|tournament| {
            Ok(RosterExport {
                file_name: crate::export::export_file_name(tournament),
                bytes: b"PK-fake".to_vec(),
                rows: 1,
            })
        });

        let response = app.oneshot(post_json(r#"{"tournament":"State"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], XLSX_CONTENT_TYPE);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"wrestlers_State.xlsx\""
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"PK-fake");
    }

    #[tokio::test]
    async fn test_run_failure_is_server_error() {
        let app = router(|_| Err(ScrapeError::ControlNotFound("#weightBox".to_string())));

        let response = app.oneshot(post_json(r#"{"tournament":"State"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "#weightBox not found in any frame" })
        );
    }

    #[tokio::test]
    async fn test_index_page_is_served() {
        let app = router(|_| panic!("runner must not be called"));
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
