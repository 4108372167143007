use serde::{Deserialize, Serialize};

/// Phrases that open and close the transaction table, plus the words a
/// column header line is made of. All matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct TableMarkers {
    pub(crate) start: Vec<String>,
    pub(crate) end: Vec<String>,
    pub(crate) header_keywords: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_lowercase()).collect()
}

impl Default for TableMarkers {
    fn default() -> Self {
        Self {
            start: owned(&[
                "transaction details",
                "domestic transactions",
                "international transactions",
            ]),
            end: owned(&[
                "credit limit",
                "reward points summary",
                "reward point summary",
                "end of statement",
                "important information",
            ]),
            header_keywords: owned(&[
                "date",
                "amount",
                "particulars",
                "description",
                "details",
                "reward",
                "points",
                "merchant",
                "category",
                "ref no",
            ]),
        }
    }
}

impl TableMarkers {
    /// Defaults plus bank-specific phrases.
    pub(crate) fn with_extra(start: &[&str], end: &[&str]) -> Self {
        let mut markers = Self::default();
        markers.start.extend(owned(start));
        markers.end.extend(owned(end));
        markers
    }

    fn is_start(&self, lower: &str) -> bool {
        self.start.iter().any(|m| lower.contains(m.as_str()))
    }

    fn is_end(&self, lower: &str) -> bool {
        self.end.iter().any(|m| lower.contains(m.as_str()))
    }

    /// A header line names at least two column keywords and carries no figures.
    pub(crate) fn is_header(&self, line: &str) -> bool {
        if line.chars().any(|c| c.is_ascii_digit()) {
            return false;
        }
        let lower = line.to_lowercase();
        self.header_keywords
            .iter()
            .filter(|k| lower.contains(k.as_str()))
            .count()
            >= 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TableState {
    BeforeTable,
    InTable,
    Done,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TableScan {
    /// Candidate row lines, in statement order.
    pub(crate) rows: Vec<String>,
    pub(crate) headers_skipped: usize,
    /// False when no start marker was seen and the whole text was used.
    pub(crate) found_table: bool,
}

/// Single forward pass over the statement text.
///
/// A later start marker after an end marker re-enters the table, which covers
/// statements that print domestic and international sections separately.
pub(crate) fn scan_table(text: &str, markers: &TableMarkers) -> TableScan {
    let mut state = TableState::BeforeTable;
    let mut in_table = Vec::new();
    let mut whole_text = Vec::new();
    let mut headers_in_table = 0;
    let mut headers_anywhere = 0;
    let mut found_table = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let lower = trimmed.to_lowercase();

        // Fallback block for statements without a recognizable table.
        if !found_table {
            if markers.is_header(trimmed) {
                headers_anywhere += 1;
            } else {
                whole_text.push(trimmed.to_string());
            }
        }

        state = match state {
            TableState::BeforeTable | TableState::Done => {
                if markers.is_start(&lower) {
                    found_table = true;
                    TableState::InTable
                } else {
                    state
                }
            }
            TableState::InTable => {
                if markers.is_end(&lower) {
                    TableState::Done
                } else if markers.is_start(&lower) {
                    TableState::InTable
                } else if markers.is_header(trimmed) {
                    headers_in_table += 1;
                    TableState::InTable
                } else {
                    in_table.push(trimmed.to_string());
                    TableState::InTable
                }
            }
        };
    }

    if found_table {
        TableScan {
            rows: in_table,
            headers_skipped: headers_in_table,
            found_table,
        }
    } else {
        log::debug!("no table start marker found, scanning whole text");
        TableScan {
            rows: whole_text,
            headers_skipped: headers_anywhere,
            found_table,
        }
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
