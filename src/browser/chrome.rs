use crate::browser::scripts;
use crate::core::config::BrowserConfig;
use crate::core::{BracketPage, BrowserControl, FrameInfo, FramePath, PageWatch};
use crate::errors::{Result, ScrapeError};
use crate::types::WeightOption;
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Chrome browser implementation
pub struct ChromeBrowser {
    browser: Mutex<Option<Browser>>,
    tab_poll: Duration,
}

impl ChromeBrowser {
    pub fn launch(config: &BrowserConfig, tab_poll: Duration) -> Result<Self> {
        let window_size_arg = config
            .viewport
            .as_ref()
            .map(|v| format!("--window-size={},{}", v.width, v.height));

        let user_agent_arg = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
        ];

        if let Some(ref size_arg) = window_size_arg {
            args.push(OsStr::new(size_arg));
        }

        if let Some(ref ua_arg) = user_agent_arg {
            args.push(OsStr::new(ua_arg));
        }

        for arg in &config.args {
            args.push(OsStr::new(arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .idle_browser_timeout(Duration::from_millis(config.idle_timeout_ms))
            .args(args)
            .build()
            .map_err(|e| ScrapeError::LaunchFailed(e.to_string()))?;

        let browser =
            Browser::new(launch_options).map_err(|e| ScrapeError::LaunchFailed(e.to_string()))?;

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            tab_poll,
        })
    }

    fn with_browser<T>(&self, f: impl FnOnce(&Browser) -> Result<T>) -> Result<T> {
        let guard = self
            .browser
            .lock()
            .map_err(|_| ScrapeError::interaction("browser lock poisoned"))?;
        let browser = guard
            .as_ref()
            .ok_or_else(|| ScrapeError::interaction("browser already closed"))?;
        f(browser)
    }
}

#[async_trait]
impl BrowserControl for ChromeBrowser {
    type Page = ChromePage;

    async fn open(&self, url: &str) -> Result<Self::Page> {
        let tab = self.with_browser(|browser| {
            browser
                .new_tab()
                .map_err(|e| ScrapeError::LaunchFailed(e.to_string()))
        })?;

        tab.navigate_to(url)
            .map_err(|e| ScrapeError::interaction(format!("navigation to {} failed: {}", url, e)))?;
        tab.wait_until_navigated()
            .map_err(|e| ScrapeError::interaction(format!("navigation to {} failed: {}", url, e)))?;

        Ok(ChromePage { tab })
    }

    fn watch_pages(&self) -> PageWatch<Self::Page> {
        let (sender, receiver) = mpsc::unbounded_channel();

        let tabs = match self.with_browser(|browser| Ok(browser.get_tabs().clone())) {
            Ok(tabs) => tabs,
            Err(e) => {
                warn!("Cannot watch for new pages: {}", e);
                return PageWatch::new(receiver, None);
            }
        };

        let target_ids = |tabs: &Arc<Mutex<Vec<Arc<Tab>>>>| -> Vec<(String, Arc<Tab>)> {
            snapshot_tabs(tabs)
                .into_iter()
                .map(|tab| (tab.get_target_id().to_string(), tab))
                .collect()
        };

        let mut known: HashSet<String> = target_ids(&tabs).into_iter().map(|(id, _)| id).collect();
        let poll = self.tab_poll;

        let task = tokio::spawn(async move {
            loop {
                tokio::time::sleep(poll).await;
                for (id, tab) in target_ids(&tabs) {
                    if known.insert(id.clone()) {
                        debug!("New page target {}", id);
                        if sender.send(ChromePage { tab }).is_err() {
                            return;
                        }
                    }
                }
            }
        });

        PageWatch::new(receiver, Some(task.abort_handle()))
    }

    async fn close(&self) -> Result<()> {
        let mut guard = self
            .browser
            .lock()
            .map_err(|_| ScrapeError::interaction("browser lock poisoned"))?;
        // Dropping the handle shuts the Chrome process down
        guard.take();
        Ok(())
    }
}

/// Copies the browser's tab list. A poisoned lock still holds a usable list.
fn snapshot_tabs<T: Clone>(tabs: &Mutex<Vec<T>>) -> Vec<T> {
    match tabs.lock() {
        Ok(list) => list.clone(),
        Err(poisoned) => {
            warn!("Tab list lock poisoned, reading it anyway");
            poisoned.into_inner().clone()
        }
    }
}

/// A Chrome tab or popup window
#[derive(Clone)]
pub struct ChromePage {
    tab: Arc<Tab>,
}

impl ChromePage {
    fn evaluate_raw(&self, script: &str) -> Result<Option<Value>> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| ScrapeError::JavaScriptFailed(e.to_string()))?;

        Ok(result.value)
    }

    /// Runs a read-only `(document) => value` function in the frame.
    fn evaluate_in_frame(&self, frame: &FramePath, function: &str) -> Result<Value> {
        let raw = self.evaluate_raw(&scripts::in_frame(frame, function))?;
        scripts::parse_frame_reply(frame, raw)
    }
}

#[async_trait]
impl BracketPage for ChromePage {
    async fn url(&self) -> Result<String> {
        Ok(self.tab.get_url())
    }

    async fn bring_to_front(&self) -> Result<()> {
        self.tab
            .bring_to_front()
            .map_err(|e| ScrapeError::interaction(e.to_string()))?;
        Ok(())
    }

    async fn frames(&self) -> Result<Vec<FrameInfo>> {
        let raw = self.evaluate_raw(scripts::FRAME_TREE)?;
        let json = raw
            .as_ref()
            .and_then(|v| v.as_str())
            .ok_or_else(|| ScrapeError::JavaScriptFailed("frame listing returned no value".to_string()))?;

        Ok(serde_json::from_str(json)?)
    }

    async fn has_element(&self, frame: &FramePath, selector: &str) -> Result<bool> {
        let value = self.evaluate_in_frame(frame, &scripts::has_element(selector))?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn select_options(&self, frame: &FramePath, selector: &str) -> Result<Vec<WeightOption>> {
        let value = self.evaluate_in_frame(frame, &scripts::select_options(selector))?;
        Ok(serde_json::from_value(value)?)
    }

    async fn select_option(&self, frame: &FramePath, selector: &str, value: &str) -> Result<()> {
        self.evaluate_in_frame(frame, &scripts::select_option(selector, value))?;
        Ok(())
    }

    async fn element_texts(&self, frame: &FramePath, selector: &str) -> Result<Vec<String>> {
        let value = self.evaluate_in_frame(frame, &scripts::element_texts(selector))?;
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_survives_poisoned_lock() {
        let tabs = Arc::new(Mutex::new(vec!["home", "popup"]));

        let holder = tabs.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.lock().unwrap();
            panic!("poison the tab list");
        })
        .join();

        assert!(tabs.is_poisoned());
        assert_eq!(snapshot_tabs(&tabs), vec!["home", "popup"]);
    }
}
