use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

use super::fields::{
    collapse_whitespace, leading_date_re, looks_like_amount, looks_like_date, parse_amount, parse_date,
    ParsedAmount,
};
use crate::error::FieldError;

/// Which strategy produced the columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SplitKind {
    WideGap,
    Compact,
    LeadingDate,
    Whole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawRow {
    pub(crate) columns: Vec<String>,
    pub(crate) split: SplitKind,
}

/// A row strategy: `None` means "not my layout", try the next one.
pub(crate) type RowStrategy = fn(&str) -> Option<RawRow>;

pub(crate) const DEFAULT_STRATEGIES: &[RowStrategy] = &[split_wide_gap, split_compact, split_leading_date];

/// First strategy that accepts the line wins; otherwise the line is one column.
pub(crate) fn split_row(line: &str, strategies: &[RowStrategy]) -> RawRow {
    strategies
        .iter()
        .find_map(|strategy| strategy(line))
        .unwrap_or_else(|| RawRow {
            columns: vec![line.trim().to_string()],
            split: SplitKind::Whole,
        })
}

#[allow(clippy::expect_used)]
fn wide_gap_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}|\t").expect("wide gap regex"))
}

/// Columns padded apart with two or more spaces.
pub(crate) fn split_wide_gap(line: &str) -> Option<RawRow> {
    let columns: Vec<String> = wide_gap_re()
        .split(line.trim())
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect();
    (columns.len() >= 3).then_some(RawRow {
        columns,
        split: SplitKind::WideGap,
    })
}

#[allow(clippy::expect_used)]
fn compact_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // The marked amount ends the line, optionally followed by one more
        // `amount Cr|Dr` pair, so digits and markers inside the description
        // never end it early.
        Regex::new(concat!(
            r"(?i)^\s*(?P<date>\d{2}/\d{2}/\d{4})\s*",
            r"(?P<desc>.+?)\s*",
            r"(?P<amount>\d[\d,]*(?:\.\d{1,2})?)\s*",
            r"(?P<marker>cr|dr)\.?",
            r"(?:\s*\d[\d,]*(?:\.\d{1,2})?\s*(?:cr|dr)\.?)?\s*$"
        ))
        .expect("compact row regex")
    })
}

/// `DD/MM/YYYYDESCRIPTION123.45 Dr` with columns run together.
pub(crate) fn split_compact(line: &str) -> Option<RawRow> {
    let caps = compact_re().captures(line)?;
    let desc = caps["desc"].trim();
    if !desc.chars().any(char::is_alphabetic) {
        return None;
    }
    Some(RawRow {
        columns: vec![
            caps["date"].to_string(),
            desc.to_string(),
            format!("{} {}", &caps["amount"], &caps["marker"]),
        ],
        split: SplitKind::Compact,
    })
}

/// Lines that start with a date, split on any whitespace after it.
pub(crate) fn split_leading_date(line: &str) -> Option<RawRow> {
    let caps = leading_date_re().captures(line)?;
    let date = caps.name("date")?;
    parse_date(date.as_str()).ok()?;

    let mut columns = vec![date.as_str().to_string()];
    columns.extend(line[date.end()..].split_whitespace().map(String::from));
    (columns.len() >= 3).then_some(RawRow {
        columns,
        split: SplitKind::LeadingDate,
    })
}

// ── Row assembly ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RowFields {
    pub(crate) date: NaiveDate,
    pub(crate) description: String,
    pub(crate) amount: ParsedAmount,
    /// Amount-shaped columns that lost to `amount` and were not kept as
    /// description text. Non-zero routes the row to review.
    pub(crate) competing_amounts: usize,
}

/// Why a split row did not become a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RowReject {
    /// Nothing in the row is shaped like a date.
    NoDate,
    /// No column after the date is an amount.
    NoAmount,
    NoDescription,
    /// A date or amount column looked right but would not normalize.
    Field(FieldError),
}

fn is_marker(col: &str) -> bool {
    matches!(
        col.trim().trim_end_matches('.').to_lowercase().as_str(),
        "cr" | "dr"
    )
}

fn has_marker(col: &str) -> bool {
    let lower = col.trim().trim_end_matches('.').to_lowercase();
    lower.ends_with("cr") || lower.ends_with("dr")
}

/// A bare `Dr`/`Cr` column belongs to the amount before it.
fn attach_markers(columns: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(columns.len());
    for col in columns {
        match out.last_mut() {
            Some(prev) if is_marker(col) && looks_like_amount(prev) && !has_marker(prev) => {
                prev.push(' ');
                prev.push_str(col.trim());
            }
            _ => out.push(col.clone()),
        }
    }
    out
}

/// A first column that opens with a date but carries text after it, as in
/// `04/08/2025 SWIGGY    12    450.00`, is split in two.
fn detach_leading_date(columns: Vec<String>) -> Vec<String> {
    if columns.iter().any(|c| looks_like_date(c)) {
        return columns;
    }
    let Some(first) = columns.first() else {
        return columns;
    };
    let Some(date) = leading_date_re()
        .captures(first)
        .and_then(|caps| caps.name("date"))
        .filter(|m| parse_date(m.as_str()).is_ok())
    else {
        return columns;
    };

    let mut out = vec![date.as_str().to_string()];
    let rest = first[date.end()..].trim();
    if !rest.is_empty() {
        out.push(rest.to_string());
    }
    out.extend(columns.into_iter().skip(1));
    out
}

/// Pick date, amount and description out of a split row.
///
/// The amount is the first amount-shaped column after the date that carries a
/// `Dr`/`Cr` marker, else the last one with a decimal point, else the last
/// amount-shaped column. Columns that are
/// neither date nor amount form the description. For wide-gap rows, extra
/// numeric columns (reward points and the like) are dropped; for the other
/// splits they stay in the description because token boundaries there are not
/// column boundaries.
pub(crate) fn assemble_row(row: &RawRow, decimal_insertion: bool) -> Result<RowFields, RowReject> {
    let columns = attach_markers(&detach_leading_date(row.columns.clone()));

    let Some((date_idx, date)) = columns
        .iter()
        .enumerate()
        .find_map(|(i, c)| parse_date(c).ok().map(|d| (i, d)))
    else {
        // A date-shaped column that is not a calendar date discards the row.
        return Err(match columns.iter().find(|c| leading_date_re().is_match(c)) {
            Some(col) => RowReject::Field(FieldError::Date(col.trim().to_string())),
            None => RowReject::NoDate,
        });
    };

    let candidates: Vec<usize> = (date_idx + 1..columns.len())
        .filter(|&i| looks_like_amount(&columns[i]))
        .collect();
    let amount_idx = candidates
        .iter()
        .copied()
        .find(|&i| has_marker(&columns[i]))
        .or_else(|| candidates.iter().copied().rev().find(|&i| columns[i].contains('.')))
        .or_else(|| candidates.last().copied())
        .ok_or(RowReject::NoAmount)?;

    let amount = parse_amount(&columns[amount_idx], decimal_insertion).map_err(RowReject::Field)?;

    let description_parts: Vec<&str> = columns
        .iter()
        .enumerate()
        .filter(|(i, c)| {
            if *i == date_idx || *i == amount_idx {
                return false;
            }
            if !looks_like_amount(c) {
                return true;
            }
            match row.split {
                SplitKind::WideGap => false,
                _ => *i < amount_idx,
            }
        })
        .map(|(_, c)| c.as_str())
        .collect();

    let description = collapse_whitespace(&description_parts.join(" "));
    if description.is_empty() {
        return Err(RowReject::NoDescription);
    }

    let competing_amounts = candidates
        .iter()
        .filter(|&&i| i != amount_idx)
        .filter(|&&i| row.split == SplitKind::WideGap || i > amount_idx)
        .count();

    Ok(RowFields {
        date,
        description,
        amount,
        competing_amounts,
    })
}

#[cfg(test)]
#[path = "rows_tests.rs"]
mod tests;
