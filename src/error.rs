use thiserror::Error;

/// Errors produced while validating, rendering, or dispatching a request
#[derive(Debug, Error)]
pub enum RenderError {
    /// The `url` query parameter was not supplied
    #[error("URL parameter is required")]
    MissingUrl,

    /// The supplied value does not parse as an absolute http/https URL
    #[error("Invalid URL format")]
    InvalidUrl,

    /// Browser process failed to start after exhausting all launch attempts
    #[error("browser launch failed after {attempts} attempts: {message}")]
    Launch { attempts: u32, message: String },

    /// Both navigation strategies (network-idle and parsed-document) failed
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// The in-page extraction evaluation threw or returned malformed data
    #[error("content extraction failed: {0}")]
    Extraction(String),

    /// Full-page capture failed
    #[error("screenshot capture failed: {0}")]
    Screenshot(String),

    /// The upload endpoint was unreachable at the transport level
    #[error("upload failed: {0}")]
    Upload(#[from] reqwest::Error),

    /// The blocking render task could not be joined
    #[error("render task failed: {0}")]
    Task(String),
}

impl RenderError {
    /// Stable machine-readable code carried in scrape error responses.
    /// Validation errors have no code; their body is just the message.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            RenderError::MissingUrl | RenderError::InvalidUrl => None,
            RenderError::Launch { .. } => Some("LAUNCH_FAILED"),
            RenderError::Navigation(_) => Some("NAVIGATION_FAILED"),
            RenderError::Extraction(_) => Some("EXTRACTION_FAILED"),
            RenderError::Screenshot(_) => Some("SCREENSHOT_FAILED"),
            RenderError::Upload(_) => Some("UPLOAD_FAILED"),
            RenderError::Task(_) => Some("RENDER_FAILED"),
        }
    }

    /// Whether this error is the client's fault (HTTP 400) rather than ours
    pub fn is_validation(&self) -> bool {
        matches!(self, RenderError::MissingUrl | RenderError::InvalidUrl)
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
