use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

use super::detect::Bank;
use super::rows::{split_row, RawRow, RowStrategy, DEFAULT_STRATEGIES};
use super::table::TableMarkers;

/// Layout knowledge for one issuer. Everything else (field parsing,
/// categorization, ambiguity) is shared.
pub(crate) trait BankParser: Send + Sync {
    fn bank(&self) -> Bank;

    fn markers(&self) -> TableMarkers {
        TableMarkers::default()
    }

    fn strategies(&self) -> &'static [RowStrategy] {
        DEFAULT_STRATEGIES
    }

    /// Rewrite issuer quirks into the common row shape before splitting.
    fn clean_line<'a>(&self, line: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(line)
    }

    fn split(&self, line: &str) -> RawRow {
        split_row(&self.clean_line(line), self.strategies())
    }
}

pub(crate) struct HdfcParser;

impl BankParser for HdfcParser {
    fn bank(&self) -> Bank {
        Bank::Hdfc
    }
}

/// ICICI prints a reference serial between the date and the description.
pub(crate) struct IciciParser;

#[allow(clippy::expect_used)]
fn icici_serial_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<date>\s*\d{1,2}/\d{1,2}/\d{4})\s+\d{8,}\s+").expect("icici serial regex")
    })
}

impl BankParser for IciciParser {
    fn bank(&self) -> Bank {
        Bank::Icici
    }

    fn markers(&self) -> TableMarkers {
        let mut markers = TableMarkers::default();
        markers.header_keywords.push("serno".into());
        markers
    }

    fn clean_line<'a>(&self, line: &'a str) -> Cow<'a, str> {
        icici_serial_re().replace(line, "${date}  ")
    }
}

pub(crate) struct AxisParser;

impl BankParser for AxisParser {
    fn bank(&self) -> Bank {
        Bank::Axis
    }
}

/// SBI Card marks direction with a bare trailing `C` or `D`.
pub(crate) struct SbiParser;

#[allow(clippy::expect_used)]
fn sbi_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d)\s+([CD])\s*$").expect("sbi marker regex"))
}

impl BankParser for SbiParser {
    fn bank(&self) -> Bank {
        Bank::Sbi
    }

    fn markers(&self) -> TableMarkers {
        TableMarkers::with_extra(&["transactions for"], &[])
    }

    fn clean_line<'a>(&self, line: &'a str) -> Cow<'a, str> {
        sbi_marker_re().replace(line, "$1 ${2}r")
    }
}

pub(crate) struct KotakParser;

impl BankParser for KotakParser {
    fn bank(&self) -> Bank {
        Bank::Kotak
    }
}

/// Unknown issuer: default markers and strategies.
pub(crate) struct GenericParser;

impl BankParser for GenericParser {
    fn bank(&self) -> Bank {
        Bank::Generic
    }
}

pub(crate) fn parser_for(bank: Bank) -> Box<dyn BankParser> {
    match bank {
        Bank::Hdfc => Box::new(HdfcParser),
        Bank::Icici => Box::new(IciciParser),
        Bank::Axis => Box::new(AxisParser),
        Bank::Sbi => Box::new(SbiParser),
        Bank::Kotak => Box::new(KotakParser),
        Bank::Generic => Box::new(GenericParser),
    }
}

#[cfg(test)]
#[path = "banks_tests.rs"]
mod tests;
