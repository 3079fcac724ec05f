use crate::models::{Transaction, TransactionType};
use spreadsheet::{Row, SheetError, Spreadsheet};

/// id | date | name | type | category | amount
pub const COLUMNS: &str = "A:F";
const COLUMN_COUNT: usize = 6;

fn to_row(t: &Transaction) -> Row {
    vec![
        t.id.clone(),
        t.date.clone(),
        t.name.clone(),
        t.kind.as_str().to_string(),
        t.category.clone(),
        t.amount.to_string(),
    ]
}

fn from_row(row: &[String]) -> Result<Transaction, String> {
    let [id, date, name, kind, category, amount] = row else {
        return Err(format!("expected {} cells, found {}", COLUMN_COUNT, row.len()));
    };

    let kind: TransactionType = kind.parse()?;
    let amount: f64 = amount
        .trim()
        .parse()
        .map_err(|_| format!("amount {:?} is not a number", amount))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(format!("amount {} is not a non-negative number", amount));
    }

    Ok(Transaction {
        id: id.clone(),
        date: date.clone(),
        name: name.clone(),
        kind,
        category: category.clone(),
        amount,
    })
}

pub(crate) struct TransactionRepository<'a> {
    sheet: &'a Spreadsheet,
}

impl<'a> TransactionRepository<'a> {
    pub fn new(sheet: &'a Spreadsheet) -> Self {
        Self { sheet }
    }

    /// All readable rows in sheet order. Rows that do not map onto a
    /// transaction (header row, hand edits) are skipped with a warning.
    pub async fn list(&self) -> Result<Vec<Transaction>, SheetError> {
        let rows = self.sheet.read_rows(COLUMNS).await?;

        let transactions = rows
            .iter()
            .enumerate()
            .filter_map(|(index, row)| match from_row(row) {
                Ok(t) => Some(t),
                Err(reason) => {
                    tracing::warn!("Skipping sheet row {}: {}", index + 1, reason);
                    None
                }
            })
            .collect();

        Ok(transactions)
    }

    pub async fn append(&self, t: &Transaction) -> Result<(), SheetError> {
        self.sheet.append_row(COLUMNS, to_row(t)).await
    }
}
