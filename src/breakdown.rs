use serde::Serialize;

use crate::constants::ERROR_MESSAGE;

/// One row of the breakdown list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownItem {
    pub label: String,
    pub value: String,
}

impl BreakdownItem {
    /// Splits at the first `:`, falling back to the first `" - "`. A line
    /// with neither becomes a label with an empty value.
    pub fn parse(line: &str) -> Self {
        let (label, value) = line
            .split_once(':')
            .or_else(|| line.split_once(" - "))
            .unwrap_or((line, ""));
        Self {
            label: label.trim().to_string(),
            value: value.trim().to_string(),
        }
    }
}

/// A model reply, read as a headline followed by label/value rows. There is
/// no guaranteed format; this is a best-effort reading of free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Estimate {
    pub headline: String,
    pub breakdown: Vec<BreakdownItem>,
    pub raw: String,
}

impl Estimate {
    pub fn parse(text: &str) -> Self {
        let mut lines = text.split('\n');
        let headline = lines.next().unwrap_or_default().trim().to_string();
        let breakdown = lines
            .filter(|line| !line.trim().is_empty())
            .map(BreakdownItem::parse)
            .collect();
        Self {
            headline,
            breakdown,
            raw: text.to_string(),
        }
    }

    pub fn failed() -> Self {
        Self {
            headline: ERROR_MESSAGE.to_string(),
            breakdown: Vec::new(),
            raw: String::new(),
        }
    }
}
