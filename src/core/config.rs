use crate::errors::{Result, ScrapeError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserConfig,
    pub bracket: BracketConfig,
    pub timing: TimingConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// The operator drives the browser by hand, so this is normally off.
    pub headless: bool,
    pub viewport: Option<Viewport>,
    pub user_agent: Option<String>,
    pub args: Vec<String>,
    pub start_url: String,
    pub idle_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Selectors and markers tied to the bracket viewer's markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BracketConfig {
    pub popup_url_marker: String,
    pub control_selector: String,
    pub cell_selector: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub popup_wait_ms: u64,
    pub popup_poll_ms: u64,
    pub manual_navigation_ms: u64,
    pub control_wait_ms: u64,
    pub settle_max_ms: u64,
    pub settle_poll_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Config {
    /// Reads a JSON config file; keys left out keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.browser.start_url).map_err(|e| {
            ScrapeError::Config(format!("invalid start_url '{}': {}", self.browser.start_url, e))
        })?;

        if self.bracket.control_selector.trim().is_empty() {
            return Err(ScrapeError::Config("control_selector is empty".to_string()));
        }
        if self.bracket.cell_selector.trim().is_empty() {
            return Err(ScrapeError::Config("cell_selector is empty".to_string()));
        }
        if self.timing.settle_poll_ms == 0 || self.timing.popup_poll_ms == 0 {
            return Err(ScrapeError::Config("poll intervals must be non-zero".to_string()));
        }

        Ok(())
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            viewport: None,
            user_agent: None,
            args: vec!["--start-maximized".to_string()],
            start_url: "https://www.trackwrestling.com/".to_string(),
            idle_timeout_ms: 600_000,
        }
    }
}

impl Default for BracketConfig {
    fn default() -> Self {
        Self {
            popup_url_marker: "BracketViewer.jsp".to_string(),
            control_selector: "#weightBox".to_string(),
            cell_selector: ".bracket-cell, .full-line".to_string(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            popup_wait_ms: 60_000,
            popup_poll_ms: 250,
            manual_navigation_ms: 45_000,
            control_wait_ms: 10_000,
            settle_max_ms: 1_500,
            settle_poll_ms: 250,
        }
    }
}

impl TimingConfig {
    pub fn popup_wait(&self) -> Duration {
        Duration::from_millis(self.popup_wait_ms)
    }

    pub fn popup_poll(&self) -> Duration {
        Duration::from_millis(self.popup_poll_ms)
    }

    pub fn manual_navigation(&self) -> Duration {
        Duration::from_millis(self.manual_navigation_ms)
    }

    pub fn control_wait(&self) -> Duration {
        Duration::from_millis(self.control_wait_ms)
    }

    pub fn settle_max(&self) -> Duration {
        Duration::from_millis(self.settle_max_ms)
    }

    pub fn settle_poll(&self) -> Duration {
        Duration::from_millis(self.settle_poll_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
        }
    }
}
