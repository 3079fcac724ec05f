use crate::service::AnalysisError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use transactions::models::{Category, Transaction, TransactionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::Daily, Period::Weekly, Period::Monthly, Period::Yearly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Yearly => "yearly",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Period::Daily => "Daily",
            Period::Weekly => "Weekly",
            Period::Monthly => "Monthly",
            Period::Yearly => "Yearly",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Period::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AnalysisError::UnknownPeriod(s.to_string()))
    }
}

/// Aggregator input: a stored transaction with its category reconciled onto
/// the reporting set.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTransaction {
    pub id: String,
    pub date: String,
    pub description: String,
    pub amount: f64,
    pub kind: TransactionType,
    pub category: Option<Category>,
}

impl From<&Transaction> for ReportTransaction {
    fn from(t: &Transaction) -> Self {
        ReportTransaction {
            id: t.id.clone(),
            date: t.date.clone(),
            description: t.name.clone(),
            amount: t.amount,
            kind: t.kind,
            category: Category::reconcile(&t.category),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub key: String,
    pub income: f64,
    pub expenses: f64,
}

/// Expense totals for the categories shown in the breakdown chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategoryTotals {
    pub food: f64,
    pub transport: f64,
    pub taxes: f64,
    pub others: f64,
}

impl CategoryTotals {
    /// Adds an expense. Categories outside the breakdown are ignored.
    pub fn record(&mut self, category: Option<Category>, amount: f64) {
        let slot = match category {
            Some(Category::Food) => &mut self.food,
            Some(Category::Transport) => &mut self.transport,
            Some(Category::Taxes) => &mut self.taxes,
            Some(Category::Others) => &mut self.others,
            _ => return,
        };
        *slot += amount;
    }

    pub fn sum(&self) -> f64 {
        self.food + self.transport + self.taxes + self.others
    }

    pub fn entries(&self) -> [(Category, f64); 4] {
        [
            (Category::Food, self.food),
            (Category::Transport, self.transport),
            (Category::Taxes, self.taxes),
            (Category::Others, self.others),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub buckets: Vec<Bucket>,
    pub total_income: f64,
    pub total_expenses: f64,
    pub category_totals: CategoryTotals,
}

impl Summary {
    pub fn balance(&self) -> f64 {
        self.total_income - self.total_expenses
    }
}
