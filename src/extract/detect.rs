use serde::{Deserialize, Serialize};

/// Issuers whose statement layout is recognized. `Generic` is the fallback
/// for anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Bank {
    Hdfc,
    Icici,
    Axis,
    Sbi,
    Kotak,
    Generic,
}

impl Bank {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Hdfc => "hdfc",
            Self::Icici => "icici",
            Self::Axis => "axis",
            Self::Sbi => "sbi",
            Self::Kotak => "kotak",
            Self::Generic => "generic",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "hdfc" => Some(Self::Hdfc),
            "icici" => Some(Self::Icici),
            "axis" => Some(Self::Axis),
            "sbi" | "sbicard" => Some(Self::Sbi),
            "kotak" => Some(Self::Kotak),
            "generic" => Some(Self::Generic),
            _ => None,
        }
    }

    pub(crate) fn all() -> &'static [Bank] {
        &[
            Self::Hdfc,
            Self::Icici,
            Self::Axis,
            Self::Sbi,
            Self::Kotak,
            Self::Generic,
        ]
    }
}

impl std::fmt::Display for Bank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Phrases that identify an issuer anywhere in the statement text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct BankSignature {
    pub(crate) bank: Bank,
    pub(crate) phrases: Vec<String>,
}

impl BankSignature {
    pub(crate) fn new(bank: Bank, phrases: &[&str]) -> Self {
        Self {
            bank,
            phrases: phrases.iter().map(|p| p.to_lowercase()).collect(),
        }
    }
}

pub(crate) fn default_signatures() -> Vec<BankSignature> {
    vec![
        BankSignature::new(Bank::Hdfc, &["hdfc bank"]),
        BankSignature::new(Bank::Icici, &["icici bank"]),
        BankSignature::new(Bank::Axis, &["axis bank"]),
        BankSignature::new(
            Bank::Sbi,
            &["sbi card", "sbi cards and payment services", "state bank of india"],
        ),
        BankSignature::new(Bank::Kotak, &["kotak mahindra bank"]),
    ]
}

/// First signature with a phrase in the text wins; no match is `Generic`.
pub(crate) fn detect_bank(text: &str, signatures: &[BankSignature]) -> Bank {
    let lower = text.to_lowercase();
    signatures
        .iter()
        .find(|sig| sig.phrases.iter().any(|p| lower.contains(p.as_str())))
        .map(|sig| sig.bank)
        .unwrap_or(Bank::Generic)
}

#[cfg(test)]
#[path = "detect_tests.rs"]
mod tests;
