//! # pagelens
//!
//! A page-rendering service built on Chrome DevTools Protocol (CDP): per-request
//! headless Chrome sessions produce full-page screenshots or structured content
//! from JavaScript-heavy pages.
//!
//! ## HTTP surface
//!
//! The [`server`] module exposes two endpoints behind an axum router:
//!
//! - `GET /screenshot?url=...` — render, capture a full-page PNG, and forward
//!   it to the configured media-upload endpoint; the upstream's status and
//!   body are passed through verbatim.
//! - `GET /scrape?url=...` — render with image/font/media requests blocked
//!   and return `{url, data}` where `data` holds headings, links, images,
//!   meta tags, and main-content blocks.
//!
//! ```bash
//! RUST_LOG=info cargo run --bin pagelens-server -- --port 3000
//! ```
//!
//! ## Library usage
//!
//! The rendering core is usable directly; sessions are blocking CDP work,
//! so drive them off the async runtime:
//!
//! ```rust,no_run
//! use pagelens::browser::{BrowserConfig, DirectLaunch};
//! use pagelens::nav::NavigationOptions;
//! use pagelens::render::{render, RenderMode, RenderRequest};
//!
//! # fn main() -> pagelens::Result<()> {
//! let provider = DirectLaunch::new(BrowserConfig::default());
//! let request = RenderRequest {
//!     url: url::Url::parse("https://example.com").unwrap(),
//!     mode: RenderMode::Scrape,
//! };
//! let outcome = render(&provider, &NavigationOptions::default(), &request)?;
//! # let _ = outcome;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module overview
//!
//! - [`browser`]: launch configuration, per-request sessions, acquisition strategy
//! - [`nav`]: two-stage navigation waits, readiness probe, settle pass
//! - [`filter`]: resource-type blocking for the scrape path
//! - [`extract`]: in-page content extraction
//! - [`render`]: the mode-parameterized pipeline shared by both endpoints
//! - [`upload`]: screenshot dispatch to the media-upload endpoint
//! - [`server`]: axum routing, validation, and response mapping
//! - [`error`]: error types and result alias

pub mod browser;
pub mod error;
pub mod extract;
pub mod filter;
pub mod nav;
pub mod page;
pub mod render;
pub mod server;
pub mod upload;

pub use browser::{BrowserConfig, BrowserSession, DirectLaunch, SessionProvider};
pub use error::{RenderError, Result};
pub use extract::ExtractedContent;
pub use nav::NavigationOptions;
pub use page::{PageDriver, TabDriver};
pub use render::{RenderMode, RenderOutcome, RenderRequest};
