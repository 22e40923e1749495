use crate::error::{RenderError, Result};
use headless_chrome::Tab;
use std::sync::Arc;

/// Capability surface of a rendered page: navigation and script evaluation.
///
/// Navigation waits and content extraction are written against this trait so
/// their logic can be exercised with a scripted driver instead of a live
/// Chrome tab.
pub trait PageDriver {
    /// Start navigating the page to the given URL
    fn goto(&self, url: &str) -> Result<()>;

    /// Evaluate a JavaScript expression and return its value (Null when the
    /// expression produced no value)
    fn evaluate(&self, js: &str) -> Result<serde_json::Value>;
}

/// `PageDriver` binding over a live `headless_chrome` tab
pub struct TabDriver {
    tab: Arc<Tab>,
}

impl TabDriver {
    pub fn new(tab: Arc<Tab>) -> Self {
        Self { tab }
    }

    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }
}

impl PageDriver for TabDriver {
    fn goto(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| RenderError::Navigation(format!("failed to navigate to {}: {}", url, e)))?;
        Ok(())
    }

    fn evaluate(&self, js: &str) -> Result<serde_json::Value> {
        let result = self
            .tab
            .evaluate(js, false)
            .map_err(|e| RenderError::Extraction(format!("evaluation failed: {}", e)))?;
        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }
}
