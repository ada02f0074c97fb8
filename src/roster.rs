use crate::types::WrestlerEntry;
use std::cmp::Ordering;

/// Append-only collection of scraped entries, sorted once at the end.
#[derive(Debug, Default)]
pub struct Roster {
    entries: Vec<WrestlerEntry>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_batches(batches: Vec<Vec<WrestlerEntry>>) -> Self {
        let mut roster = Self::new();
        for batch in batches {
            roster.extend(batch);
        }
        roster
    }

    pub fn extend(&mut self, batch: Vec<WrestlerEntry>) {
        self.entries.extend(batch);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by weight, then grade (missing as 0), then school.
    /// Ties keep scraping order.
    pub fn into_sorted(mut self) -> Vec<WrestlerEntry> {
        sort_entries(&mut self.entries);
        self.entries
    }
}

pub fn sort_entries(entries: &mut [WrestlerEntry]) {
    // slice::sort_by is stable
    entries.sort_by(compare_entries);
}

/// Missing weights sort ahead of every numeric weight.
fn compare_entries(a: &WrestlerEntry, b: &WrestlerEntry) -> Ordering {
    a.weight
        .cmp(&b.weight)
        .then_with(|| a.grade.unwrap_or(0).cmp(&b.grade.unwrap_or(0)))
        .then_with(|| a.school.cmp(&b.school))
}
