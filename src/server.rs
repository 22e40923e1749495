//! HTTP surface: routing, query validation, and the mapping from pipeline
//! errors to response shapes. Handlers validate before any browser work,
//! then run the blocking render pipeline on the blocking pool with a
//! semaphore bounding concurrent browser sessions.

use crate::browser::SessionProvider;
use crate::error::{RenderError, Result};
use crate::extract::ExtractedContent;
use crate::nav::NavigationOptions;
use crate::render::{self, RenderMode, RenderOutcome, RenderRequest};
use crate::upload::{UploadResponse, Uploader};
use axum::{
    Json, Router,
    body::Body,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use url::Url;

/// Default bound on concurrently live browser sessions
pub const DEFAULT_MAX_SESSIONS: usize = 4;

/// Shared server state. The only process-wide state besides the logger.
#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn SessionProvider>,
    nav: NavigationOptions,
    uploader: Uploader,
    /// Guards against unbounded concurrent Chrome processes under load
    sessions: Arc<Semaphore>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn SessionProvider>,
        nav: NavigationOptions,
        uploader: Uploader,
        max_sessions: usize,
    ) -> Self {
        Self {
            provider,
            nav,
            uploader,
            sessions: Arc::new(Semaphore::new(max_sessions.max(1))),
        }
    }
}

/// Scrape response envelope: the requested URL plus everything extracted
#[derive(Debug, Serialize)]
pub struct ScrapeEnvelope {
    pub url: String,
    pub data: ExtractedContent,
}

#[derive(Debug, Deserialize)]
pub struct RenderQuery {
    pub url: Option<String>,
}

/// Build the service router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/screenshot", get(screenshot_handler))
        .route("/scrape", get(scrape_handler))
        .route("/healthz", get(healthz_handler))
        .with_state(state)
}

/// Resolve the `url` query parameter: required, `https://` prepended when
/// the scheme is missing, and the result must parse as an absolute
/// http/https URL.
pub fn resolve_url(raw: Option<&str>) -> Result<Url> {
    let trimmed = raw.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        return Err(RenderError::MissingUrl);
    }

    // Only scheme-less values get the https:// prefix; anything that
    // already names a scheme must survive validation on its own.
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).map_err(|_| RenderError::InvalidUrl)?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(RenderError::InvalidUrl);
    }

    Ok(url)
}

async fn healthz_handler() -> Response {
    Json(serde_json::json!({ "status": "ok" })).into_response()
}

async fn scrape_handler(
    State(state): State<AppState>,
    Query(query): Query<RenderQuery>,
) -> Response {
    let url = match resolve_url(query.url.as_deref()) {
        Ok(url) => url,
        Err(err) => return validation_response(&err),
    };
    log::info!("scrape request for {}", url);

    match run_pipeline(&state, url.clone(), RenderMode::Scrape).await {
        Ok(RenderOutcome::Content(data)) => (
            StatusCode::OK,
            Json(ScrapeEnvelope {
                url: url.to_string(),
                data,
            }),
        )
            .into_response(),
        Ok(RenderOutcome::Screenshot(_)) => scrape_error_response(
            &RenderError::Task("pipeline returned the wrong outcome".to_string()),
            &url,
        ),
        Err(err) => scrape_error_response(&err, &url),
    }
}

async fn screenshot_handler(
    State(state): State<AppState>,
    Query(query): Query<RenderQuery>,
) -> Response {
    let url = match resolve_url(query.url.as_deref()) {
        Ok(url) => url,
        Err(err) => return validation_response(&err),
    };
    log::info!("screenshot request for {}", url);

    let png = match run_pipeline(&state, url.clone(), RenderMode::Screenshot).await {
        Ok(RenderOutcome::Screenshot(png)) => png,
        Ok(RenderOutcome::Content(_)) => {
            return plain_error_response(&RenderError::Task(
                "pipeline returned the wrong outcome".to_string(),
            ));
        }
        Err(err) => return plain_error_response(&err),
    };

    match state.uploader.upload_png(png).await {
        Ok(upstream) => passthrough_response(upstream),
        Err(err) => {
            log::error!("screenshot upload for {} failed: {}", url, err);
            plain_error_response(&err)
        }
    }
}

/// Acquire a session permit and run the blocking pipeline off the async
/// runtime. The permit is held for the pipeline's whole lifetime.
async fn run_pipeline(state: &AppState, url: Url, mode: RenderMode) -> Result<RenderOutcome> {
    let _permit = state
        .sessions
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| RenderError::Task("session limiter closed".to_string()))?;

    let provider = state.provider.clone();
    let nav = state.nav.clone();
    let request = RenderRequest { url, mode };

    tokio::task::spawn_blocking(move || render::render(provider.as_ref(), &nav, &request))
        .await
        .map_err(|e| RenderError::Task(e.to_string()))?
}

/// 400 with the bare validation message
fn validation_response(err: &RenderError) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": err.to_string() })),
    )
        .into_response()
}

/// Scrape failure shape: `{error, code?, url}` with status 500
fn scrape_error_response(err: &RenderError, url: &Url) -> Response {
    let mut body = serde_json::json!({
        "error": err.to_string(),
        "url": url.to_string(),
    });
    if let Some(code) = err.code() {
        body["code"] = code.into();
    }
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

/// Screenshot failure shape when no upstream response exists: `{error}` 500
fn plain_error_response(err: &RenderError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": err.to_string() })),
    )
        .into_response()
}

/// Forward the upload endpoint's status and body verbatim
fn passthrough_response(upstream: UploadResponse) -> Response {
    let status =
        StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut builder = Response::builder().status(status);
    if let Some(content_type) = upstream.content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }

    builder
        .body(Body::from(upstream.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url_complete() {
        assert_eq!(
            resolve_url(Some("https://example.com")).unwrap().as_str(),
            "https://example.com/"
        );
        assert_eq!(
            resolve_url(Some("http://example.com/path?q=1")).unwrap().as_str(),
            "http://example.com/path?q=1"
        );
    }

    #[test]
    fn test_resolve_url_prepends_https_when_scheme_missing() {
        assert_eq!(
            resolve_url(Some("example.com")).unwrap().as_str(),
            "https://example.com/"
        );
        assert_eq!(
            resolve_url(Some("sub.example.com/page")).unwrap().as_str(),
            "https://sub.example.com/page"
        );
    }

    #[test]
    fn test_resolve_url_missing() {
        assert!(matches!(resolve_url(None), Err(RenderError::MissingUrl)));
        assert!(matches!(resolve_url(Some("")), Err(RenderError::MissingUrl)));
        assert!(matches!(
            resolve_url(Some("   ")),
            Err(RenderError::MissingUrl)
        ));
    }

    #[test]
    fn test_resolve_url_rejects_malformed() {
        assert!(matches!(
            resolve_url(Some("http://")),
            Err(RenderError::InvalidUrl)
        ));
        assert!(matches!(
            resolve_url(Some("ftp://example.com")),
            Err(RenderError::InvalidUrl)
        ));
        assert!(matches!(
            resolve_url(Some("https://exa mple.com")),
            Err(RenderError::InvalidUrl)
        ));
    }

    #[test]
    fn test_resolve_url_trims_whitespace() {
        assert_eq!(
            resolve_url(Some("  example.com  ")).unwrap().as_str(),
            "https://example.com/"
        );
    }
}
