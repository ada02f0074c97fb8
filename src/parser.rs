//! Heuristic parsing of bracket cell text.
//!
//! A bracket cell is read as plain text, one line per visual row:
//!
//! ```text
//! Jane Doe, 1st          <- name line, optional trailing seed
//! Lincoln High, JV, 10   <- detail line: school first, grade last
//! 3rd                    <- optional result lines
//! ```
//!
//! Nothing here touches the DOM, so markup changes on the source site only
//! affect the selectors in `bracket`, never these rules.

use crate::types::{leading_integer, ParsedEntry};
use regex::Regex;
use std::sync::LazyLock;

static SEED_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i),\s*(\d+(?:st|nd|rd|th))$").unwrap());

static PLACE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:1st|2nd|3rd|4th|5th|6th|7th|8th)\b").unwrap());

/// Parses one cell's text. Returns `None` when the cell has no visible text.
pub fn parse_cell(text: &str) -> Option<ParsedEntry> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    match lines.as_slice() {
        [] => None,
        [single] => Some(ParsedEntry::name_only(*single)),
        [name_line, detail_line, ..] => {
            let (name, seed) = split_seed(name_line);
            let (school, grade) = parse_detail(detail_line);
            let place = if lines.len() >= 3 {
                find_place(&lines)
            } else {
                None
            };

            Some(ParsedEntry {
                name,
                grade,
                school,
                seed,
                place,
            })
        }
    }
}

/// Parses every cell, dropping the empty ones. Order is preserved.
pub fn parse_cells<S: AsRef<str>>(cells: &[S]) -> Vec<ParsedEntry> {
    cells
        .iter()
        .filter_map(|cell| parse_cell(cell.as_ref()))
        .collect()
}

/// Splits `"Jane Doe, 1st"` into `("Jane Doe", Some("1st"))`.
///
/// A line that would be left without a name keeps its full text and no seed.
fn split_seed(name_line: &str) -> (String, Option<String>) {
    let Some(caps) = SEED_SUFFIX.captures(name_line) else {
        return (name_line.to_string(), None);
    };

    let whole = caps.get(0).map(|m| m.start()).unwrap_or(name_line.len());
    let name = name_line[..whole].trim_end();
    if name.is_empty() {
        return (name_line.to_string(), None);
    }

    let seed = caps.get(1).map(|m| m.as_str().to_string());
    (name.to_string(), seed)
}

/// School is the first comma segment, grade the last one.
fn parse_detail(detail_line: &str) -> (String, Option<i32>) {
    let segments: Vec<&str> = detail_line.split(',').map(str::trim).collect();
    let school = segments.first().copied().unwrap_or_default().to_string();
    let grade = segments.last().and_then(|last| leading_integer(last));
    (school, grade)
}

fn find_place(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .find(|line| PLACE_TOKEN.is_match(line))
        .map(|line| line.to_string())
}
