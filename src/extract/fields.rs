use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::FieldError;
use crate::models::TxnType;

// ── Dates ─────────────────────────────────────────────────────

/// Supported date shapes, tried in order. Groups: `d`, `m` or `mon`, `y`.
#[allow(clippy::expect_used)]
fn date_shapes() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        [
            // DD/MM/YYYY
            r"^(?P<d>\d{1,2})/(?P<m>\d{1,2})/(?P<y>\d{4})$",
            // DD-MM-YYYY
            r"^(?P<d>\d{1,2})-(?P<m>\d{1,2})-(?P<y>\d{4})$",
            // DD MMM YYYY, DD MMM YY
            r"^(?P<d>\d{1,2})\s+(?P<mon>[A-Za-z]{3,9})\.?,?\s+(?P<y>\d{4}|\d{2})$",
            // DD-MMM-YY, DD-MMM-YYYY
            r"^(?P<d>\d{1,2})-(?P<mon>[A-Za-z]{3,9})-(?P<y>\d{4}|\d{2})$",
            // MMM DD, YYYY
            r"^(?P<mon>[A-Za-z]{3,9})\.?\s+(?P<d>\d{1,2}),?\s+(?P<y>\d{4})$",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("date shape regex"))
        .collect()
    })
}

/// A date at the very start of a line, in any supported shape.
#[allow(clippy::expect_used)]
pub(crate) fn leading_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^\s*(?P<date>",
            r"\d{1,2}[/-]\d{1,2}[/-]\d{4}",
            r"|\d{1,2}[ -][A-Za-z]{3,9}[ -](?:\d{4}|\d{2})",
            r"|[A-Za-z]{3,9}\s+\d{1,2},\s*\d{4}",
            r")"
        ))
        .expect("leading date regex")
    })
}

fn month_from_name(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january", "february", "march", "april", "may", "june", "july", "august", "september",
        "october", "november", "december",
    ];
    let lower = name.to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(lower.as_str()))
        .map(|i| i as u32 + 1)
}

fn expand_year(y: &str) -> Option<i32> {
    let n: i32 = y.parse().ok()?;
    match y.len() {
        2 => Some(2000 + n),
        4 => Some(n),
        _ => None,
    }
}

/// Normalize a statement date to a calendar date. Two-digit years are 20YY.
pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, FieldError> {
    let s = s.trim();
    for shape in date_shapes() {
        let Some(caps) = shape.captures(s) else {
            continue;
        };
        let day: Option<u32> = caps.name("d").and_then(|d| d.as_str().parse().ok());
        let month = match (caps.name("m"), caps.name("mon")) {
            (Some(m), _) => m.as_str().parse().ok(),
            (None, Some(mon)) => month_from_name(mon.as_str()),
            (None, None) => None,
        };
        let year = caps.name("y").and_then(|y| expand_year(y.as_str()));

        if let (Some(d), Some(m), Some(y)) = (day, month, year) {
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                return Ok(date);
            }
        }
    }
    Err(FieldError::Date(s.to_string()))
}

pub(crate) fn looks_like_date(s: &str) -> bool {
    parse_date(s).is_ok()
}

// ── Amounts ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedAmount {
    /// Absolute value, two fraction digits.
    pub(crate) value: Decimal,
    pub(crate) kind: TxnType,
    /// Numeric text as printed, separators removed, before any decimal insertion.
    pub(crate) digits: String,
    pub(crate) decimal_inserted: bool,
}

#[allow(clippy::expect_used)]
fn amount_shape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^[+-]?\s*(?:₹|rs\.?|inr)?\s*[+-]?\d[\d,]*(?:\.\d{1,2})?\s*(?:cr|dr)?\.?$")
            .expect("amount shape regex")
    })
}

pub(crate) fn looks_like_amount(s: &str) -> bool {
    amount_shape_re().is_match(s.trim())
}

fn strip_suffix_ci<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let cut = s.len().checked_sub(suffix.len())?;
    if !s.is_char_boundary(cut) {
        return None;
    }
    let (head, tail) = s.split_at(cut);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() < prefix.len() || !s.is_char_boundary(prefix.len()) {
        return None;
    }
    let (head, tail) = s.split_at(prefix.len());
    head.eq_ignore_ascii_case(prefix).then_some(tail)
}

fn split_marker(s: &str) -> (&str, Option<TxnType>) {
    let s = s.trim();
    for (suffix, kind) in [
        ("cr.", TxnType::Credit),
        ("dr.", TxnType::Debit),
        ("cr", TxnType::Credit),
        ("dr", TxnType::Debit),
    ] {
        if let Some(head) = strip_suffix_ci(s, suffix) {
            return (head.trim_end(), Some(kind));
        }
    }
    (s, None)
}

fn split_sign(s: &str) -> (&str, Option<TxnType>) {
    let s = s.trim_start();
    if let Some(rest) = s.strip_prefix('+') {
        (rest, Some(TxnType::Credit))
    } else if let Some(rest) = s.strip_prefix('-') {
        (rest, Some(TxnType::Debit))
    } else {
        (s, None)
    }
}

fn strip_currency(s: &str) -> &str {
    let s = s.trim_start();
    for symbol in ["₹", "rs.", "rs", "inr"] {
        if let Some(rest) = strip_prefix_ci(s, symbol) {
            return rest.trim_start();
        }
    }
    s
}

/// Normalize a printed amount. `Cr`/`+` mean credit, `Dr`/`-` or no marker mean debit.
///
/// With `decimal_insertion`, a value printed without a decimal point and with
/// more than two digits is read as paise: `58193` becomes `581.93`.
pub(crate) fn parse_amount(raw: &str, decimal_insertion: bool) -> Result<ParsedAmount, FieldError> {
    let (body, marker) = split_marker(raw);
    let (body, sign) = split_sign(body);
    let (body, inner_sign) = split_sign(strip_currency(body));

    let digits: String = body
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();

    let well_formed = !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.matches('.').count() <= 1
        && !digits.starts_with('.')
        && !digits.ends_with('.');
    if !well_formed {
        return Err(FieldError::Amount(raw.trim().to_string()));
    }

    let insert = decimal_insertion && !digits.contains('.') && digits.len() > 2;
    let numeric = if insert {
        let (whole, paise) = digits.split_at(digits.len() - 2);
        format!("{whole}.{paise}")
    } else {
        digits.clone()
    };

    let mut value = Decimal::from_str(&numeric)
        .map_err(|_| FieldError::Amount(raw.trim().to_string()))?
        .abs()
        .round_dp(2);
    value.rescale(2);

    Ok(ParsedAmount {
        value,
        kind: marker.or(sign).or(inner_sign).unwrap_or(TxnType::Debit),
        digits,
        decimal_inserted: insert,
    })
}

// ── Merchant ──────────────────────────────────────────────────

#[allow(clippy::expect_used)]
fn network_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:(?:POS|UPI|NEFT|IMPS|ATM|PUR|TXN)(?:[\s/*:\-]+|$)|IND\*\s*)")
            .expect("network prefix regex")
    })
}

#[allow(clippy::expect_used)]
fn trailing_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"\s*(?:\d{1,2}[/-]\d{1,2}[/-](?:\d{4}|\d{2})",
            r"|\d{1,2}[ -][A-Za-z]{3}[ -](?:\d{4}|\d{2})",
            r"|(?:19|20)\d{2})\s*$"
        ))
        .expect("trailing date regex")
    })
}

#[allow(clippy::expect_used)]
fn trailing_reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s#*]+\d{6,}\s*$").expect("trailing reference regex"))
}

pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Best-effort short merchant name from a line description.
pub(crate) fn extract_merchant(description: &str) -> String {
    let collapsed = collapse_whitespace(description);
    let mut s = collapsed.as_str();

    while let Some(m) = network_prefix_re().find(s) {
        if m.end() == 0 {
            break;
        }
        s = &s[m.end()..];
    }

    let mut s = trailing_date_re().replace(s, "").into_owned();

    if let Some(idx) = s.find(['/', '-']) {
        if idx > 0 {
            s.truncate(idx);
        }
    }

    let s = trailing_reference_re().replace(&s, "");
    let merchant = collapse_whitespace(&s);
    if merchant.is_empty() {
        collapsed
    } else {
        merchant
    }
}

#[cfg(test)]
#[path = "fields_tests.rs"]
mod tests;
