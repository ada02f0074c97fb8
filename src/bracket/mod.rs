//! Everything coupled to the bracket viewer's markup: where the weight
//! control lives, how its options are read, and how each weight's cells
//! are collected.

pub mod iterator;
pub mod locator;
pub mod options;
pub mod settle;

pub use iterator::WeightIterator;
pub use locator::{find_control, locate_control, wait_for_selector};
pub use options::read_weight_options;
pub use settle::{read_settled_cells, SettlePolicy};
