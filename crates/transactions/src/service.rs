use crate::models::{CreateTransactionRequest, RawCreateTransactionRequest, Transaction};
use crate::repository::TransactionRepository;
use chrono::{SecondsFormat, Utc};
use spreadsheet::{SheetError, Spreadsheet};
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Spreadsheet error: {0}")]
    Infrastructure(String),
}

impl From<SheetError> for TransactionError {
    fn from(err: SheetError) -> Self {
        TransactionError::Infrastructure(err.to_string())
    }
}

pub struct TransactionService;

impl TransactionService {
    #[instrument(skip(sheet))]
    pub async fn list_transactions(
        sheet: &Spreadsheet,
    ) -> Result<Vec<Transaction>, TransactionError> {
        let repo = TransactionRepository::new(sheet);
        let transactions = repo.list().await?;
        tracing::debug!("Loaded {} transactions", transactions.len());
        Ok(transactions)
    }

    #[instrument(skip(sheet))]
    pub async fn create_transaction(
        sheet: &Spreadsheet,
        raw: RawCreateTransactionRequest,
    ) -> Result<Transaction, TransactionError> {
        let req = CreateTransactionRequest::new(raw).map_err(TransactionError::InvalidInput)?;

        let id = uuid::Uuid::new_v4().to_string();
        let date = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let transaction = req.into_transaction(id, date);

        let repo = TransactionRepository::new(sheet);
        repo.append(&transaction).await?;

        tracing::info!(
            "Recorded {} {} ({})",
            transaction.kind,
            transaction.amount,
            transaction.id
        );
        Ok(transaction)
    }
}
