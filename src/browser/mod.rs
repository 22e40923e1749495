//! Browser process management: launch configuration, per-request sessions,
//! and the pluggable acquisition strategy.

pub mod config;
pub mod session;

pub use config::BrowserConfig;
pub use session::{is_disconnect_error, BrowserSession, DirectLaunch, SessionProvider};
