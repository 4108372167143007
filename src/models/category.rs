use serde::{Deserialize, Serialize};

/// Fixed spending taxonomy. `Other` is the catch-all for unmatched merchants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Shopping,
    Transport,
    Entertainment,
    Bills,
    Health,
    Education,
    Travel,
    Groceries,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Shopping => "Shopping",
            Self::Transport => "Transport",
            Self::Entertainment => "Entertainment",
            Self::Bills => "Bills",
            Self::Health => "Health",
            Self::Education => "Education",
            Self::Travel => "Travel",
            Self::Groceries => "Groceries",
            Self::Other => "Other",
        }
    }

    /// Case-insensitive name lookup. Unknown names are `Other`.
    pub fn parse(s: &str) -> Self {
        let name = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
            .unwrap_or(Self::Other)
    }

    pub fn all() -> &'static [Category] {
        &[
            Self::Food,
            Self::Shopping,
            Self::Transport,
            Self::Entertainment,
            Self::Bills,
            Self::Health,
            Self::Education,
            Self::Travel,
            Self::Groceries,
            Self::Other,
        ]
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
