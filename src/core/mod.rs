pub mod browser;
pub mod config;

pub use browser::{BracketPage, BrowserControl, FrameInfo, FramePath, PageWatch};
pub use config::Config;
