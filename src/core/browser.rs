use crate::errors::Result;
use crate::types::WeightOption;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// Position of a frame in the page's frame tree, as child indices from the
/// top-level window. The empty path is the main frame.
pub type FramePath = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub path: FramePath,
    /// `None` when the frame's location cannot be read (cross-origin).
    pub url: Option<String>,
}

impl FrameInfo {
    pub fn display_url(&self) -> &str {
        self.url.as_deref().unwrap_or("<inaccessible>")
    }
}

/// A controllable browser instance.
#[async_trait]
pub trait BrowserControl: Send + Sync {
    type Page: BracketPage + Clone + 'static;

    /// Open the operator's starting page
    async fn open(&self, url: &str) -> Result<Self::Page>;

    /// Subscribe to pages created after this call. Dropping the watch unsubscribes.
    fn watch_pages(&self) -> PageWatch<Self::Page>;

    /// Release the browser process
    async fn close(&self) -> Result<()>;
}

/// One page (tab or popup) and the frames nested inside it.
#[async_trait]
pub trait BracketPage: Send + Sync {
    async fn url(&self) -> Result<String>;

    async fn bring_to_front(&self) -> Result<()>;

    /// All frames in enumeration order, main frame first
    async fn frames(&self) -> Result<Vec<FrameInfo>>;

    /// Whether `selector` matches an element in the frame's document.
    /// Fails when the frame's document cannot be reached.
    async fn has_element(&self, frame: &FramePath, selector: &str) -> Result<bool>;

    /// `value`/`label` of every `<option>` under the control matched by `selector`
    async fn select_options(&self, frame: &FramePath, selector: &str) -> Result<Vec<WeightOption>>;

    /// Select `value` on the control and fire its change events
    async fn select_option(&self, frame: &FramePath, selector: &str, value: &str) -> Result<()>;

    /// Rendered text of every element matching `selector`, in document order
    async fn element_texts(&self, frame: &FramePath, selector: &str) -> Result<Vec<String>>;
}

/// Receiver side of a page subscription.
pub struct PageWatch<P> {
    receiver: mpsc::UnboundedReceiver<P>,
    poller: Option<AbortHandle>,
}

impl<P> PageWatch<P> {
    pub fn new(receiver: mpsc::UnboundedReceiver<P>, poller: Option<AbortHandle>) -> Self {
        Self { receiver, poller }
    }

    /// Next newly created page, or `None` once the source has gone away.
    pub async fn next(&mut self) -> Option<P> {
        self.receiver.recv().await
    }

    /// Stop the subscription now instead of at drop.
    pub fn unsubscribe(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
        self.receiver.close();
    }
}

impl<P> Drop for PageWatch<P> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
