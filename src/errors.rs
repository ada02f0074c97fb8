use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("{0}")]
    MissingInput(String),

    #[error("{0} not found in any frame")]
    ControlNotFound(String),

    #[error("Scraper failed: {0}")]
    InteractionFailure(String),

    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Frame inaccessible: {0}")]
    FrameInaccessible(String),

    #[error("JavaScript execution failed: {0}")]
    JavaScriptFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Spreadsheet export failed: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Anyhow error: {0}")]
    AnyhowError(String),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

// headless_chrome reports everything as anyhow::Error
impl From<anyhow::Error> for ScrapeError {
    fn from(err: anyhow::Error) -> Self {
        ScrapeError::AnyhowError(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ScrapeError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ScrapeError::Export(err.to_string())
    }
}

impl ScrapeError {
    /// Wraps any failure raised while driving the bracket page.
    pub fn interaction<E: std::fmt::Display>(err: E) -> Self {
        ScrapeError::InteractionFailure(err.to_string())
    }

    /// Reclassifies a browser-side failure as an interaction failure,
    /// keeping its description.
    pub fn into_interaction(self) -> Self {
        match self {
            ScrapeError::InteractionFailure(_) => self,
            other => ScrapeError::InteractionFailure(other.to_string()),
        }
    }

    /// HTTP status the server reports for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            ScrapeError::MissingInput(_) | ScrapeError::Config(_) => 400,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ScrapeError::MissingInput("tournament".into()).status_code(), 400);
        assert_eq!(ScrapeError::ControlNotFound("#weightBox".into()).status_code(), 500);
        assert_eq!(ScrapeError::interaction("stale frame").status_code(), 500);
    }

    #[test]
    fn test_into_interaction_does_not_nest() {
        let err = ScrapeError::interaction("stale frame").into_interaction();
        assert_eq!(err.to_string(), "Scraper failed: stale frame");

        let err = ScrapeError::JavaScriptFailed("boom".into()).into_interaction();
        assert_eq!(
            err.to_string(),
            "Scraper failed: JavaScript execution failed: boom"
        );
    }

    #[test]
    fn test_control_not_found_message() {
        let err = ScrapeError::ControlNotFound("#weightBox".to_string());
        assert_eq!(err.to_string(), "#weightBox not found in any frame");
    }

    #[test]
    fn test_anyhow_conversion_keeps_message() {
        let err: ScrapeError = anyhow::anyhow!("websocket closed").into();
        assert!(matches!(err, ScrapeError::AnyhowError(ref m) if m == "websocket closed"));
    }
}
