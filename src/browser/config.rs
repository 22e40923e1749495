use std::path::PathBuf;
use std::time::Duration;

/// Default number of launch attempts before giving up
pub const DEFAULT_LAUNCH_ATTEMPTS: u32 = 3;

/// Default base for the linear launch backoff (`backoff_base * attempt`)
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Configuration for launching browser processes
///
/// The viewport is fixed service-wide; every session renders at the same
/// dimensions regardless of the request.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Path to the Chrome/Chromium binary (auto-detected when None)
    pub chrome_path: Option<PathBuf>,

    /// Viewport width in pixels
    pub viewport_width: u32,

    /// Viewport height in pixels
    pub viewport_height: u32,

    /// Maximum launch attempts before the last error is propagated
    pub launch_attempts: u32,

    /// Base delay for the linear backoff between launch attempts
    pub backoff_base: Duration,

    /// How long the browser may sit idle before headless_chrome closes it.
    /// Must comfortably exceed the slowest navigation path (strict wait +
    /// fallback + readiness probe).
    pub idle_browser_timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            viewport_width: 1920,
            viewport_height: 1080,
            launch_attempts: DEFAULT_LAUNCH_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
            idle_browser_timeout: Duration::from_secs(300),
        }
    }
}

impl BrowserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the Chrome binary path
    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    /// Builder method: set the viewport dimensions
    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Builder method: set the launch retry policy
    pub fn launch_attempts(mut self, attempts: u32) -> Self {
        self.launch_attempts = attempts.max(1);
        self
    }

    /// Builder method: set the backoff base
    pub fn backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = BrowserConfig::default();
        assert!(config.chrome_path.is_none());
        assert_eq!(config.viewport_width, 1920);
        assert_eq!(config.viewport_height, 1080);
        assert_eq!(config.launch_attempts, 3);
        assert_eq!(config.backoff_base, Duration::from_millis(500));
    }

    #[test]
    fn test_config_builder() {
        let config = BrowserConfig::new()
            .viewport(1280, 800)
            .launch_attempts(5)
            .backoff_base(Duration::from_millis(100))
            .chrome_path("/usr/bin/chromium");

        assert_eq!(config.viewport_width, 1280);
        assert_eq!(config.viewport_height, 800);
        assert_eq!(config.launch_attempts, 5);
        assert_eq!(config.backoff_base, Duration::from_millis(100));
        assert_eq!(
            config.chrome_path,
            Some(PathBuf::from("/usr/bin/chromium"))
        );
    }

    #[test]
    fn test_launch_attempts_never_zero() {
        let config = BrowserConfig::new().launch_attempts(0);
        assert_eq!(config.launch_attempts, 1);
    }
}
