pub mod bracket;
pub mod browser;
pub mod core;
pub mod errors;
pub mod export;
pub mod parser;
pub mod pipeline;
pub mod roster;
pub mod server;
pub mod testing;
pub mod types;

pub use browser::{ChromeBrowser, SessionBootstrapper};
pub use crate::core::{BracketPage, BrowserControl, Config};
pub use errors::{Result, ScrapeError};
pub use roster::Roster;
pub use types::*;
