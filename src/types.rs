use serde::{Deserialize, Serialize};

/// One selectable division in the bracket viewer's weight dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightOption {
    pub value: String,
    pub label: String,
}

impl WeightOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// The empty-valued option is the "no selection" placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.value.is_empty()
    }

    /// Leading integer of the label, e.g. `"132 lbs"` gives 132.
    pub fn weight(&self) -> Option<i32> {
        leading_integer(&self.label)
    }
}

/// Fields the text parser can recover from a single bracket cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEntry {
    pub name: String,
    pub grade: Option<i32>,
    pub school: String,
    pub seed: Option<String>,
    pub place: Option<String>,
}

impl ParsedEntry {
    pub fn name_only(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn into_entry(self, weight: Option<i32>, tournament: &str) -> WrestlerEntry {
        WrestlerEntry {
            name: self.name,
            grade: self.grade,
            school: self.school,
            seed: self.seed,
            place: self.place,
            weight,
            tournament: tournament.to_string(),
        }
    }
}

/// A normalized roster row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrestlerEntry {
    pub name: String,
    pub grade: Option<i32>,
    pub school: String,
    pub seed: Option<String>,
    pub place: Option<String>,
    pub weight: Option<i32>,
    pub tournament: String,
}

/// Parses an optionally signed run of digits at the start of `text`,
/// ignoring leading whitespace and anything after the digits.
pub fn leading_integer(text: &str) -> Option<i32> {
    let trimmed = text.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };

    let digits_end = rest
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(rest.len());

    if digits_end == 0 {
        return None;
    }

    rest[..digits_end].parse::<i32>().ok().map(|n| sign * n)
}
