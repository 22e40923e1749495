use crate::{
    browser::config::BrowserConfig,
    error::{RenderError, Result},
    page::TabDriver,
};
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, Tab};
use serde::Deserialize;
use std::{ffi::OsStr, sync::Arc, time::Duration};

/// Browser session owning one Chrome process and the single tab used to
/// render one request. Never pooled and never shared: a session is created
/// per request and torn down unconditionally when it goes out of scope.
pub struct BrowserSession {
    /// The underlying headless_chrome Browser instance. Dropping it kills
    /// the Chrome process.
    browser: Browser,

    /// The navigation target for this request
    tab: Arc<Tab>,
}

/// Session acquisition strategy. The service launches a fresh process per
/// request ([`DirectLaunch`]); a pooled checkout can be slotted in behind
/// the same contract.
pub trait SessionProvider: Send + Sync {
    fn acquire(&self) -> Result<BrowserSession>;
}

/// Acquisition strategy that launches a new browser process per request,
/// retrying with linear backoff
pub struct DirectLaunch {
    config: BrowserConfig,
}

impl DirectLaunch {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }
}

impl SessionProvider for DirectLaunch {
    fn acquire(&self) -> Result<BrowserSession> {
        launch_with_retry(
            self.config.launch_attempts,
            self.config.backoff_base,
            |_| BrowserSession::launch_once(&self.config),
            std::thread::sleep,
        )
    }
}

/// Retry a launch operation up to `attempts` times, sleeping
/// `backoff_base * attempt_number` after each failure (linear backoff).
/// The last underlying error is propagated on exhaustion.
///
/// The sleep function is injected so tests can record delays instead of
/// waiting them out.
pub(crate) fn launch_with_retry<T, F, S>(
    attempts: u32,
    backoff_base: Duration,
    mut launch: F,
    mut sleep: S,
) -> Result<T>
where
    F: FnMut(u32) -> std::result::Result<T, String>,
    S: FnMut(Duration),
{
    let mut last_error = String::from("no launch attempts were made");

    for attempt in 1..=attempts {
        match launch(attempt) {
            Ok(session) => {
                if attempt > 1 {
                    log::info!("browser launched on attempt {}/{}", attempt, attempts);
                }
                return Ok(session);
            }
            Err(message) => {
                log::warn!(
                    "browser launch attempt {}/{} failed: {}",
                    attempt,
                    attempts,
                    message
                );
                last_error = message;

                if attempt < attempts {
                    sleep(backoff_base * attempt);
                }
            }
        }
    }

    Err(RenderError::Launch {
        attempts,
        message: last_error,
    })
}

/// Content dimensions reported by the page, used to size full-page clips
#[derive(Debug, Deserialize)]
struct ContentSize {
    width: f64,
    height: f64,
}

const CONTENT_SIZE_JS: &str = r#"
    JSON.stringify({
        width: Math.max(
            document.documentElement.scrollWidth,
            document.body ? document.body.scrollWidth : 0
        ),
        height: Math.max(
            document.documentElement.scrollHeight,
            document.body ? document.body.scrollHeight : 0
        )
    })
"#;

impl BrowserSession {
    /// Launch a browser with the configured retry policy
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        launch_with_retry(
            config.launch_attempts,
            config.backoff_base,
            |_| Self::launch_once(config),
            std::thread::sleep,
        )
    }

    /// Single launch attempt. Fixed flags: headless, sandboxing/GPU/site
    /// isolation disabled, shared-memory and zygote flags for constrained
    /// containers.
    fn launch_once(config: &BrowserConfig) -> std::result::Result<Self, String> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        launch_opts.headless = true;
        launch_opts.sandbox = false;
        launch_opts.window_size = Some((config.viewport_width, config.viewport_height));
        launch_opts.idle_browser_timeout = config.idle_browser_timeout;

        launch_opts.args = vec![
            OsStr::new("--disable-gpu"),
            OsStr::new("--disable-features=IsolateOrigins,site-per-process"),
            OsStr::new("--disable-site-isolation-trials"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-setuid-sandbox"),
            OsStr::new("--no-zygote"),
            OsStr::new("--no-first-run"),
            OsStr::new("--force-device-scale-factor=1"),
        ];

        if let Some(path) = &config.chrome_path {
            launch_opts.path = Some(path.clone());
        }

        let browser = Browser::new(launch_opts).map_err(|e| e.to_string())?;
        let tab = browser
            .new_tab()
            .map_err(|e| format!("failed to create tab: {}", e))?;

        log::debug!(
            "browser launched (pid {:?}), viewport {}x{}",
            browser.get_process_id(),
            config.viewport_width,
            config.viewport_height
        );

        Ok(Self { browser, tab })
    }

    /// The tab bound to this request
    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    /// Page driver over this session's tab
    pub fn driver(&self) -> TabDriver {
        TabDriver::new(self.tab.clone())
    }

    /// OS process id of the Chrome instance, if still known
    pub fn process_id(&self) -> Option<u32> {
        self.browser.get_process_id()
    }

    /// Capture a full-page PNG: the clip is sized to the document's scroll
    /// extent rather than the viewport.
    pub fn capture_full_page(&self) -> Result<Vec<u8>> {
        let size = self
            .tab
            .evaluate(CONTENT_SIZE_JS, false)
            .map_err(|e| RenderError::Screenshot(format!("failed to measure page: {}", e)))?
            .value
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| {
                RenderError::Screenshot("page did not report its content size".to_string())
            })?;

        let size: ContentSize = serde_json::from_str(&size)
            .map_err(|e| RenderError::Screenshot(format!("bad content size: {}", e)))?;

        // A blank or unrendered document reports zero extent; fall back to
        // capturing the viewport as-is.
        let clip = if size.width > 0.0 && size.height > 0.0 {
            Some(Page::Viewport {
                x: 0.0,
                y: 0.0,
                width: size.width,
                height: size.height,
                scale: 1.0,
            })
        } else {
            None
        };

        self.tab
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, clip, true)
            .map_err(|e| RenderError::Screenshot(e.to_string()))
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        log::debug!(
            "tearing down browser session (pid {:?})",
            self.browser.get_process_id()
        );
        // Best effort; a crashed browser has no tab left to close. The
        // process itself is killed when `browser` drops.
        let _ = self.tab.close(false);
    }
}

/// Classify CDP errors that indicate the browser process crashed or its
/// control channel disconnected mid-session. Such failures abandon any
/// in-flight work and force immediate teardown.
pub fn is_disconnect_error(message: &str) -> bool {
    message.contains("connection is closed")
        || message.contains("No session with given id")
        || message.contains("channel is closed")
        || message.contains("process exited")
}
