use serde::{Deserialize, Serialize};

use crate::models::{Category, Transaction};

/// Ordered category → keyword table. The first category with a matching
/// keyword wins, so more specific categories go first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct CategoryRules {
    pub(crate) rules: Vec<CategoryRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct CategoryRule {
    pub(crate) category: Category,
    pub(crate) keywords: Vec<String>,
}

impl CategoryRule {
    fn new(category: Category, keywords: &[&str]) -> Self {
        Self {
            category,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl Default for CategoryRules {
    fn default() -> Self {
        Self {
            rules: vec![
                CategoryRule::new(
                    Category::Groceries,
                    &[
                        "bigbasket", "blinkit", "grofers", "zepto", "instamart", "dmart",
                        "more retail", "reliance fresh", "nature basket", "jiomart", "spencer",
                    ],
                ),
                CategoryRule::new(
                    Category::Food,
                    &[
                        "swiggy", "zomato", "dominos", "domino's", "pizza", "mcdonald", "kfc",
                        "starbucks", "cafe", "restaurant", "eatsure", "burger", "chaayos",
                        "haldiram", "food",
                    ],
                ),
                CategoryRule::new(
                    Category::Travel,
                    &[
                        "makemytrip", "goibibo", "cleartrip", "yatra", "irctc", "indigo",
                        "air india", "vistara", "spicejet", "akasa", "oyo", "airbnb", "hotel",
                        "booking.com", "agoda",
                    ],
                ),
                CategoryRule::new(
                    Category::Transport,
                    &[
                        "uber", "olacabs", "ola cabs", "rapido", "metro", "fastag", "petrol",
                        "fuel", "hpcl", "bpcl", "indian oil", "iocl", "shell", "parking",
                    ],
                ),
                CategoryRule::new(
                    Category::Entertainment,
                    &[
                        "netflix", "spotify", "hotstar", "prime video", "bookmyshow", "pvr",
                        "inox", "sonyliv", "zee5", "youtube", "steam", "playstation",
                    ],
                ),
                CategoryRule::new(
                    Category::Bills,
                    &[
                        "airtel", "jio", "vodafone", "vi prepaid", "bsnl", "electricity",
                        "bescom", "tata power", "adani", "broadband", "act fibernet",
                        "insurance", "lic of india", "licindia", "gas bill", "water bill",
                        "bill payment", "bbps",
                    ],
                ),
                CategoryRule::new(
                    Category::Health,
                    &[
                        "apollo", "pharmeasy", "netmeds", "1mg", "medplus", "pharmacy",
                        "hospital", "clinic", "diagnostic", "practo", "cult.fit", "cultfit",
                    ],
                ),
                CategoryRule::new(
                    Category::Education,
                    &[
                        "udemy", "coursera", "byju", "unacademy", "school", "college",
                        "university", "tuition", "academy", "books",
                    ],
                ),
                CategoryRule::new(
                    Category::Shopping,
                    &[
                        "amazon", "flipkart", "myntra", "ajio", "nykaa", "meesho", "tata cliq",
                        "croma", "reliance digital", "decathlon", "ikea", "lifestyle",
                        "shoppers stop", "pantaloons", "dept stores",
                    ],
                ),
            ],
        }
    }
}

pub(crate) struct Categorizer {
    rules: Vec<CompiledRule>,
}

struct CompiledRule {
    keywords: Vec<String>,
    category: Category,
}

impl Categorizer {
    pub(crate) fn new(rules: &CategoryRules) -> Self {
        let compiled = rules
            .rules
            .iter()
            .map(|r| CompiledRule {
                keywords: r
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
                category: r.category,
            })
            .collect();

        Self { rules: compiled }
    }

    pub(crate) fn categorize(&self, text: &str) -> Category {
        let lower = text.to_lowercase();

        for rule in &self.rules {
            if rule.keywords.iter().any(|k| keyword_matches(&lower, k)) {
                return rule.category;
            }
        }

        Category::Other
    }

    /// Categorize on merchant first, then on the full description.
    pub(crate) fn categorize_transaction(&self, merchant: &str, description: &str) -> Category {
        match self.categorize(merchant) {
            Category::Other => self.categorize(description),
            found => found,
        }
    }

    pub(crate) fn categorize_batch(&self, transactions: &mut [Transaction]) {
        for txn in transactions.iter_mut() {
            if txn.category == Category::Other {
                txn.category = self.categorize_transaction(&txn.merchant, &txn.description);
            }
        }
    }
}

/// Keywords up to this many characters must also end on a word boundary, so
/// `shell` does not match `SHELLAC`.
const SHORT_KEYWORD_LEN: usize = 5;

/// A keyword matches where it starts a word. Short keywords must also end one.
fn keyword_matches(text: &str, keyword: &str) -> bool {
    let whole_word = keyword.chars().count() <= SHORT_KEYWORD_LEN;
    text.match_indices(keyword).any(|(at, _)| {
        let starts = text[..at]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let ends = !whole_word
            || text[at + keyword.len()..]
                .chars()
                .next()
                .is_none_or(|c| !c.is_alphanumeric());
        starts && ends
    })
}

#[cfg(test)]
mod tests;
