//! The request pipeline shared by both endpoints: acquire a session,
//! install the resource filter (scrape only), navigate, probe readiness,
//! settle, then capture or extract. Both modes run the exact same waits and
//! timeouts; only the final step differs.

use crate::browser::{BrowserSession, SessionProvider, is_disconnect_error};
use crate::error::Result;
use crate::extract::{self, ExtractedContent};
use crate::filter;
use crate::nav::{self, NavigationOptions};
use url::Url;

/// What the caller wants out of the rendered page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Screenshot,
    Scrape,
}

/// One validated render request. Immutable once created; the viewport is
/// fixed service-wide in [`crate::browser::BrowserConfig`].
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub url: Url,
    pub mode: RenderMode,
}

/// Result of a successful pipeline run
#[derive(Debug)]
pub enum RenderOutcome {
    /// Full-page PNG bytes, alive only until the upload dispatch
    Screenshot(Vec<u8>),
    Content(ExtractedContent),
}

/// Run the full pipeline for one request. The session is owned by this
/// call and torn down on every path, success or failure; a crash or
/// disconnect mid-flight abandons the stage's work and unwinds here.
pub fn render(
    provider: &dyn SessionProvider,
    opts: &NavigationOptions,
    request: &RenderRequest,
) -> Result<RenderOutcome> {
    let session = provider.acquire()?;
    let outcome = drive(&session, opts, request);

    if let Err(err) = &outcome {
        let message = err.to_string();
        if is_disconnect_error(&message) {
            log::error!(
                "browser crashed or disconnected while rendering {}: {}",
                request.url,
                message
            );
        } else {
            log::error!("render failed for {}: {}", request.url, message);
        }
    }

    drop(session);
    outcome
}

fn drive(
    session: &BrowserSession,
    opts: &NavigationOptions,
    request: &RenderRequest,
) -> Result<RenderOutcome> {
    let url = request.url.as_str();
    let driver = session.driver();

    // Interception has to be live before the first request leaves the page
    let filter_stats = match request.mode {
        RenderMode::Scrape => Some(filter::install(session.tab())?),
        RenderMode::Screenshot => None,
    };

    nav::navigate(&driver, url, opts)?;
    nav::await_app_ready(&driver, opts);
    nav::settle(&driver, opts);

    let outcome = match request.mode {
        RenderMode::Screenshot => RenderOutcome::Screenshot(session.capture_full_page()?),
        RenderMode::Scrape => RenderOutcome::Content(extract::extract(&driver)?),
    };

    if let Some(stats) = filter_stats {
        log::debug!(
            "resource filter for {}: {} aborted, {} allowed",
            url,
            stats.aborted(),
            stats.allowed()
        );
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;

    struct FailingProvider;

    impl SessionProvider for FailingProvider {
        fn acquire(&self) -> Result<BrowserSession> {
            Err(RenderError::Launch {
                attempts: 3,
                message: "chrome binary not found".to_string(),
            })
        }
    }

    #[test]
    fn test_acquire_failure_propagates() {
        let request = RenderRequest {
            url: Url::parse("https://example.com").unwrap(),
            mode: RenderMode::Scrape,
        };

        let err = render(&FailingProvider, &NavigationOptions::default(), &request).unwrap_err();
        match err {
            RenderError::Launch { attempts, message } => {
                assert_eq!(attempts, 3);
                assert!(message.contains("chrome binary not found"));
            }
            _ => panic!("expected launch error"),
        }
    }
}
