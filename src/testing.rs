//! Scripted in-memory stand-ins for the browser seams.
//!
//! `FakePage` models one page as a flat list of frames: the first frame is
//! the main frame (path `[]`), frame `k` after it sits at path `[k - 1]`.

use crate::core::{BracketPage, BrowserControl, FrameInfo, FramePath, PageWatch};
use crate::errors::{Result, ScrapeError};
use crate::types::WeightOption;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const CONTROL_SELECTOR: &str = "#weightBox";

#[derive(Debug, Clone, Default)]
pub struct FakeFrame {
    pub url: Option<String>,
    pub accessible: bool,
    /// Options of the weight control; `None` when the frame has no control
    pub options: Option<Vec<WeightOption>>,
    /// Bracket cell texts shown after selecting each option value
    pub cells: HashMap<String, Vec<String>>,
    /// Bracket cell texts shown before any selection
    pub initial_cells: Vec<String>,
}

impl FakeFrame {
    pub fn plain(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            accessible: true,
            ..Default::default()
        }
    }

    pub fn inaccessible() -> Self {
        Self {
            url: None,
            accessible: false,
            ..Default::default()
        }
    }

    pub fn with_control(url: &str, options: Vec<WeightOption>) -> Self {
        Self {
            url: Some(url.to_string()),
            accessible: true,
            options: Some(options),
            ..Default::default()
        }
    }

    pub fn cells_for(mut self, value: &str, cells: &[&str]) -> Self {
        self.cells.insert(
            value.to_string(),
            cells.iter().map(|c| c.to_string()).collect(),
        );
        self
    }
}

#[derive(Debug)]
struct PageState {
    url: String,
    frames: Vec<FakeFrame>,
    selected: Mutex<HashMap<usize, String>>,
    actions: Mutex<Vec<String>>,
    fail_select: Mutex<Option<String>>,
    hidden_control_polls: AtomicUsize,
    blank_reads: AtomicUsize,
    front_calls: AtomicUsize,
}

/// A page whose frames are scripted up front.
#[derive(Debug, Clone)]
pub struct FakePage {
    state: Arc<PageState>,
}

impl FakePage {
    pub fn new(frames: Vec<FakeFrame>) -> Self {
        Self::with_url("https://www.trackwrestling.com/", frames)
    }

    pub fn with_url(url: &str, frames: Vec<FakeFrame>) -> Self {
        Self {
            state: Arc::new(PageState {
                url: url.to_string(),
                frames,
                selected: Mutex::new(HashMap::new()),
                actions: Mutex::new(Vec::new()),
                fail_select: Mutex::new(None),
                hidden_control_polls: AtomicUsize::new(0),
                blank_reads: AtomicUsize::new(0),
                front_calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Make selecting `value` fail as a detached frame would.
    pub fn fail_on_select(&self, value: &str) {
        *self.state.fail_select.lock().unwrap() = Some(value.to_string());
    }

    /// Hide the control from the next `polls` control lookups.
    pub fn hide_control_for(&self, polls: usize) {
        self.state.hidden_control_polls.store(polls, Ordering::SeqCst);
    }

    /// Render no cells for the next `reads` reads, as a reloading frame would.
    pub fn blank_for_reads(&self, reads: usize) {
        self.state.blank_reads.store(reads, Ordering::SeqCst);
    }

    /// Selections made so far, in order.
    pub fn actions(&self) -> Vec<String> {
        self.state.actions.lock().unwrap().clone()
    }

    pub fn front_calls(&self) -> usize {
        self.state.front_calls.load(Ordering::SeqCst)
    }

    pub fn same_page(&self, other: &FakePage) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    fn frame_index(path: &FramePath) -> usize {
        path.first().map(|i| i + 1).unwrap_or(0)
    }

    fn frame(&self, path: &FramePath) -> Result<(usize, &FakeFrame)> {
        let index = Self::frame_index(path);
        let frame = self
            .state
            .frames
            .get(index)
            .ok_or_else(|| ScrapeError::FrameInaccessible(format!("frame {:?} detached", path)))?;

        if !frame.accessible {
            return Err(ScrapeError::FrameInaccessible(format!(
                "frame {:?}: SecurityError",
                path
            )));
        }
        Ok((index, frame))
    }
}

#[async_trait]
impl BracketPage for FakePage {
    async fn url(&self) -> Result<String> {
        Ok(self.state.url.clone())
    }

    async fn bring_to_front(&self) -> Result<()> {
        self.state.front_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn frames(&self) -> Result<Vec<FrameInfo>> {
        Ok(self
            .state
            .frames
            .iter()
            .enumerate()
            .map(|(i, frame)| FrameInfo {
                path: if i == 0 { Vec::new() } else { vec![i - 1] },
                url: frame.url.clone(),
            })
            .collect())
    }

    async fn has_element(&self, frame: &FramePath, selector: &str) -> Result<bool> {
        let (_, frame) = self.frame(frame)?;
        if selector != CONTROL_SELECTOR {
            return Ok(!frame.initial_cells.is_empty() || !frame.cells.is_empty());
        }

        let hidden = self
            .state
            .hidden_control_polls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        Ok(frame.options.is_some() && !hidden)
    }

    async fn select_options(&self, frame: &FramePath, selector: &str) -> Result<Vec<WeightOption>> {
        let (_, frame) = self.frame(frame)?;
        match (&frame.options, selector == CONTROL_SELECTOR) {
            (Some(options), true) => Ok(options.clone()),
            _ => Err(ScrapeError::JavaScriptFailed(format!("control not found: {}", selector))),
        }
    }

    async fn select_option(&self, frame: &FramePath, selector: &str, value: &str) -> Result<()> {
        let (index, fake) = self.frame(frame)?;

        if self.state.fail_select.lock().unwrap().as_deref() == Some(value) {
            return Err(ScrapeError::JavaScriptFailed(
                "Execution context was destroyed".to_string(),
            ));
        }

        let known = fake
            .options
            .as_ref()
            .map(|options| options.iter().any(|o| o.value == value))
            .unwrap_or(false);
        if selector != CONTROL_SELECTOR || !known {
            return Err(ScrapeError::JavaScriptFailed(format!("no option with value {}", value)));
        }

        self.state.selected.lock().unwrap().insert(index, value.to_string());
        self.state.actions.lock().unwrap().push(format!("select:{}", value));
        Ok(())
    }

    async fn element_texts(&self, frame: &FramePath, _selector: &str) -> Result<Vec<String>> {
        let (index, fake) = self.frame(frame)?;
        let blank = self
            .state
            .blank_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if blank {
            return Ok(Vec::new());
        }

        let selected = self.state.selected.lock().unwrap().get(&index).cloned();

        Ok(match selected {
            Some(value) => fake.cells.get(&value).cloned().unwrap_or_default(),
            None => fake.initial_cells.clone(),
        })
    }
}

/// A browser holding one home page and, optionally, a popup that opens
/// after a delay.
pub struct FakeBrowser {
    home: FakePage,
    popup: Option<(Duration, FakePage)>,
    fail_open: bool,
    closes: AtomicUsize,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<FakePage>>>,
}

impl FakeBrowser {
    pub fn new(home: FakePage) -> Self {
        Self {
            home,
            popup: None,
            fail_open: false,
            closes: AtomicUsize::new(0),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn with_popup(mut self, after: Duration, popup: FakePage) -> Self {
        self.popup = Some((after, popup));
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Subscriptions whose receiving side is still alive.
    pub fn open_subscriptions(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap()
            .iter()
            .filter(|s| !s.is_closed())
            .count()
    }
}

#[async_trait]
impl BrowserControl for FakeBrowser {
    type Page = FakePage;

    async fn open(&self, _url: &str) -> Result<Self::Page> {
        if self.fail_open {
            return Err(ScrapeError::interaction("navigation failed: net::ERR_NAME_NOT_RESOLVED"));
        }
        Ok(self.home.clone())
    }

    fn watch_pages(&self) -> PageWatch<Self::Page> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(sender.clone());

        let poller = self.popup.clone().map(|(after, popup)| {
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                let _ = sender.send(popup);
            })
            .abort_handle()
        });

        PageWatch::new(receiver, poller)
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
