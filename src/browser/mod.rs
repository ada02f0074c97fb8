pub mod chrome;
pub mod scripts;
pub mod session;

pub use chrome::{ChromeBrowser, ChromePage};
pub use session::{BracketTarget, SessionBootstrapper};
