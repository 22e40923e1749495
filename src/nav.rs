//! Navigation control: the two-stage load strategy, the application
//! readiness probe, and the pre-capture settle pass.

use crate::error::{RenderError, Result};
use crate::page::PageDriver;
use std::time::{Duration, Instant};

/// Timeout for the strict (network-idle) navigation strategy
pub const DEFAULT_STRICT_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for the fallback (parsed-document) navigation strategy
pub const DEFAULT_FALLBACK_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for the application readiness probe
pub const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(20);

/// Pause after the settle scroll, before capture/extraction
pub const DEFAULT_SETTLE_PAUSE: Duration = Duration::from_secs(1);

/// The network is judged idle when no more than this many requests are
/// still in flight
const IDLE_MAX_INFLIGHT: u32 = 2;

/// How many consecutive polls the idle predicate must hold for (the
/// sustained interval)
const IDLE_CONSECUTIVE_POLLS: u32 = 2;

/// Predicate for the strict strategy: document fully loaded and the number
/// of resource-timing entries without a response end (still in flight) is
/// small. Entries with `responseEnd === 0` have not completed yet.
const NETWORK_IDLE_JS: &str = r#"
(() => {
    if (document.readyState !== "complete") return false;
    const pending = performance
        .getEntriesByType("resource")
        .filter((entry) => entry.responseEnd === 0)
        .length;
    return pending <= 2;
})()
"#;

/// Predicate for the fallback strategy: the initial HTML document has parsed
const DOM_PARSED_JS: &str = r#"document.readyState !== "loading""#;

/// Readiness probe: document loaded and no recognized application root is
/// marked busy. Recognized roots: the React root marker attribute and the
/// two conventional container ids.
const APP_READY_JS: &str = r#"
(() => {
    if (document.readyState !== "complete") return false;
    const root = document.querySelector("[data-reactroot], #root, #app");
    if (!root) return true;
    return root.getAttribute("aria-busy") !== "true";
})()
"#;

/// Timeouts and pacing for a navigation. Stage-level waits are the only
/// bound on a hung page; there is no client-cancellation propagation.
#[derive(Debug, Clone)]
pub struct NavigationOptions {
    /// Bound on the strict (network-idle) strategy
    pub strict_timeout: Duration,
    /// Bound on the fallback (parsed-document) strategy
    pub fallback_timeout: Duration,
    /// Bound on the readiness probe; expiry is non-fatal
    pub readiness_timeout: Duration,
    /// Interval between predicate polls
    pub poll_interval: Duration,
    /// Pause after the settle scroll
    pub settle_pause: Duration,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self {
            strict_timeout: DEFAULT_STRICT_TIMEOUT,
            fallback_timeout: DEFAULT_FALLBACK_TIMEOUT,
            readiness_timeout: DEFAULT_READINESS_TIMEOUT,
            poll_interval: Duration::from_millis(250),
            settle_pause: DEFAULT_SETTLE_PAUSE,
        }
    }
}

/// Drive the page to `url` with the two-stage strategy: wait for the network
/// to go idle, and if that fails or times out, retry waiting only for the
/// initial document to parse. Fails only when both strategies fail.
pub fn navigate<P: PageDriver>(page: &P, url: &str, opts: &NavigationOptions) -> Result<()> {
    if let Err(strict_err) = navigate_strict(page, url, opts) {
        log::warn!(
            "strict navigation to {} failed ({}); retrying with parsed-document wait",
            url,
            strict_err
        );
        navigate_fallback(page, url, opts).map_err(|fallback_err| {
            RenderError::Navigation(format!(
                "both strategies failed for {}: strict: {}; fallback: {}",
                url, strict_err, fallback_err
            ))
        })?;
    }
    Ok(())
}

fn navigate_strict<P: PageDriver>(
    page: &P,
    url: &str,
    opts: &NavigationOptions,
) -> std::result::Result<(), String> {
    page.goto(url).map_err(|e| e.to_string())?;

    if poll_until(
        page,
        NETWORK_IDLE_JS,
        opts.strict_timeout,
        opts.poll_interval,
        IDLE_CONSECUTIVE_POLLS,
    ) {
        Ok(())
    } else {
        Err(format!(
            "network did not go idle (<= {} in-flight) within {:?}",
            IDLE_MAX_INFLIGHT, opts.strict_timeout
        ))
    }
}

fn navigate_fallback<P: PageDriver>(
    page: &P,
    url: &str,
    opts: &NavigationOptions,
) -> std::result::Result<(), String> {
    page.goto(url).map_err(|e| e.to_string())?;

    if poll_until(page, DOM_PARSED_JS, opts.fallback_timeout, opts.poll_interval, 1) {
        Ok(())
    } else {
        Err(format!(
            "document did not parse within {:?}",
            opts.fallback_timeout
        ))
    }
}

/// Poll the readiness probe until the application root settles or the
/// timeout expires. Expiry is deliberately non-fatal: capture/extraction
/// proceed against whatever DOM state exists.
pub fn await_app_ready<P: PageDriver>(page: &P, opts: &NavigationOptions) {
    if poll_until(page, APP_READY_JS, opts.readiness_timeout, opts.poll_interval, 1) {
        log::debug!("application root settled");
    } else {
        log::warn!(
            "readiness probe timed out after {:?}; continuing with current DOM state",
            opts.readiness_timeout
        );
    }
}

/// Scroll to the document bottom and back to the top, then pause. Triggers
/// lazy-loaded and animation-gated content before capture/extraction.
/// Best effort: a page that rejects the scroll still gets captured.
pub fn settle<P: PageDriver>(page: &P, opts: &NavigationOptions) {
    if let Err(e) = page.evaluate("window.scrollTo(0, document.body.scrollHeight)") {
        log::debug!("settle scroll (bottom) failed: {}", e);
    }
    std::thread::sleep(opts.poll_interval);

    if let Err(e) = page.evaluate("window.scrollTo(0, 0)") {
        log::debug!("settle scroll (top) failed: {}", e);
    }
    std::thread::sleep(opts.settle_pause);
}

/// Poll `js` until it evaluates to `true` on `consecutive` successive polls
/// before the timeout expires. Evaluation errors (e.g. a context destroyed
/// mid-navigation) count as the predicate not holding.
fn poll_until<P: PageDriver>(
    page: &P,
    js: &str,
    timeout: Duration,
    poll_interval: Duration,
    consecutive: u32,
) -> bool {
    let deadline = Instant::now() + timeout;
    let mut held = 0u32;

    loop {
        let satisfied = match page.evaluate(js) {
            Ok(serde_json::Value::Bool(true)) => true,
            Ok(_) => false,
            Err(err) => {
                let message = err.to_string();
                if crate::browser::is_disconnect_error(&message) {
                    // No point waiting out the deadline against a dead browser
                    log::warn!("browser disconnected while polling: {}", message);
                    return false;
                }
                false
            }
        };

        if satisfied {
            held += 1;
            if held >= consecutive {
                return true;
            }
        } else {
            held = 0;
        }

        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(poll_interval);
    }
}
