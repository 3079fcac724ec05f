use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Categories offered by the entry form. Free text is accepted as well.
pub const FORM_CATEGORIES: [&str; 5] = ["General", "Food", "Transport", "Taxes", "Others"];

pub const DEFAULT_CATEGORY: &str = "General";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!("Unknown transaction type: {:?}", other)),
        }
    }
}

/// The fixed category set used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Transport,
    Taxes,
    Others,
    Salary,
    Investment,
    Freelance,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Food,
        Category::Transport,
        Category::Taxes,
        Category::Others,
        Category::Salary,
        Category::Investment,
        Category::Freelance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Transport => "transport",
            Category::Taxes => "taxes",
            Category::Others => "others",
            Category::Salary => "salary",
            Category::Investment => "investment",
            Category::Freelance => "freelance",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Taxes => "Taxes",
            Category::Others => "Others",
            Category::Salary => "Salary",
            Category::Investment => "Investment",
            Category::Freelance => "Freelance",
        }
    }

    /// Maps a free-text entry category onto the reporting set.
    ///
    /// Matching ignores case and surrounding whitespace. Anything outside the
    /// set (the form's "General", typos, user-invented labels) yields `None`.
    pub fn reconcile(raw: &str) -> Option<Category> {
        let raw = raw.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(raw))
    }
}

/// A stored transaction, one spreadsheet row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub date: String, // ISO-8601 instant
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: String,
    pub amount: f64,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Incoming payload from the JSON API or the tracker form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RawCreateTransactionRequest {
    #[validate(length(min = 1, message = "Transaction name cannot be empty"))]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default = "default_category")]
    pub category: String,
    #[validate(range(exclusive_min = 0.0, message = "Amount must be greater than zero"))]
    pub amount: f64,
}

#[derive(Debug)]
pub struct CreateTransactionRequest {
    name: String,
    kind: TransactionType,
    category: String,
    amount: f64,
}

impl CreateTransactionRequest {
    pub fn new(raw: RawCreateTransactionRequest) -> Result<Self, String> {
        let raw = RawCreateTransactionRequest {
            name: raw.name.trim().to_string(),
            category: match raw.category.trim() {
                "" => default_category(),
                category => category.to_string(),
            },
            ..raw
        };

        raw.validate().map_err(|e| e.to_string())?;
        if !raw.amount.is_finite() {
            return Err("Amount must be a finite number".to_string());
        }

        Ok(Self {
            name: raw.name,
            kind: raw.kind,
            category: raw.category,
            amount: raw.amount,
        })
    }

    /// Stamps the request with a fresh id and creation instant.
    pub fn into_transaction(self, id: String, date: String) -> Transaction {
        Transaction {
            id,
            date,
            name: self.name,
            kind: self.kind,
            category: self.category,
            amount: self.amount,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }
}

/// Income minus expenses over the given transactions.
pub fn balance(transactions: &[Transaction]) -> f64 {
    transactions.iter().fold(0.0, |acc, t| match t.kind {
        TransactionType::Income => acc + t.amount,
        TransactionType::Expense => acc - t.amount,
    })
}
