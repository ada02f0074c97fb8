use crate::bracket::find_control;
use crate::core::config::{BracketConfig, Config, TimingConfig};
use crate::core::{BracketPage, BrowserControl, PageWatch};
use crate::errors::{Result, ScrapeError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Which page ended up hosting the bracket view.
#[derive(Debug, Clone)]
pub enum BracketTarget<P> {
    /// A new window whose URL carries the bracket viewer marker
    Popup(P),
    /// The operator's original tab, used when no popup showed up in time
    CurrentTab(P),
}

/// Opens the operator's page and waits for them to reach the bracket view.
pub struct SessionBootstrapper<'a, B: BrowserControl> {
    browser: &'a B,
    start_url: &'a str,
    bracket: &'a BracketConfig,
    timing: &'a TimingConfig,
}

impl<'a, B: BrowserControl> SessionBootstrapper<'a, B> {
    pub fn new(browser: &'a B, config: &'a Config) -> Self {
        Self {
            browser,
            start_url: &config.browser.start_url,
            bracket: &config.bracket,
            timing: &config.timing,
        }
    }

    /// Returns the page showing the bracket view, brought to the front.
    pub async fn acquire(&self) -> Result<B::Page> {
        let home = self.browser.open(self.start_url).await?;

        info!("Please manually navigate to the bracket viewer.");
        info!(
            "Waiting up to {} seconds for bracket popup...",
            self.timing.popup_wait().as_secs()
        );

        let page = match self.race_for_popup(home).await {
            BracketTarget::Popup(page) => page,
            BracketTarget::CurrentTab(page) => {
                warn!("No popup detected. Using current tab instead...");
                self.wait_for_manual_navigation(&page).await;
                page
            }
        };

        page.bring_to_front()
            .await
            .map_err(ScrapeError::into_interaction)?;
        self.log_frames(&page).await;

        Ok(page)
    }

    /// Races popup detection against the popup window. The page
    /// subscription is released whichever side wins.
    pub async fn race_for_popup(&self, home: B::Page) -> BracketTarget<B::Page> {
        let mut watch = self.browser.watch_pages();

        let popup = tokio::select! {
            page = wait_for_popup(&mut watch, &self.bracket.popup_url_marker, self.timing.popup_poll()) => Some(page),
            _ = tokio::time::sleep(self.timing.popup_wait()) => None,
        };
        watch.unsubscribe();

        match popup {
            Some(page) => BracketTarget::Popup(page),
            None => BracketTarget::CurrentTab(home),
        }
    }

    /// Gives the operator up to the manual navigation window to bring the
    /// weight control up in `page`, returning as soon as it appears.
    pub async fn wait_for_manual_navigation(&self, page: &B::Page) -> bool {
        let window = self.timing.manual_navigation();
        info!("Please manually navigate to the bracket view (with the weight dropdown).");
        info!("You have {} seconds to do this...", window.as_secs());

        let start_time = Instant::now();
        loop {
            match find_control(page, &self.bracket.control_selector).await {
                Ok(Some(frame)) => {
                    info!("Weight control is up in frame {}", frame.display_url());
                    return true;
                }
                Ok(None) => {}
                // Pages mid-navigation refuse script evaluation
                Err(e) => debug!("Control check failed: {}", e),
            }

            if start_time.elapsed() >= window {
                warn!("Manual navigation window elapsed");
                return false;
            }

            tokio::time::sleep(self.timing.popup_poll()).await;
        }
    }

    async fn log_frames(&self, page: &B::Page) {
        info!("Scanning all frames for {}...", self.bracket.control_selector);
        match page.frames().await {
            Ok(frames) => {
                for (i, frame) in frames.iter().enumerate() {
                    info!("  Frame {}: {}", i, frame.display_url());
                }
            }
            Err(e) => warn!("Could not list frames: {}", e),
        }
    }
}

/// Collects pages from `watch` until one reports a URL containing `marker`.
/// URLs are re-checked every `poll` since popups often start at about:blank.
async fn wait_for_popup<P: BracketPage + Clone>(
    watch: &mut PageWatch<P>,
    marker: &str,
    poll: Duration,
) -> P {
    let mut candidates: Vec<P> = Vec::new();
    let mut watching = true;

    loop {
        tokio::select! {
            page = watch.next(), if watching => match page {
                Some(page) => candidates.push(page),
                None => watching = false,
            },
            _ = tokio::time::sleep(poll) => {}
        }

        for candidate in &candidates {
            if let Ok(url) = candidate.url().await {
                if url.contains(marker) {
                    info!("Detected bracket popup: {}", url);
                    return candidate.clone();
                }
            }
        }
    }
}
