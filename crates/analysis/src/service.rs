use crate::aggregator;
use crate::models::{Period, ReportTransaction, Summary};
use spreadsheet::Spreadsheet;
use tracing::instrument;
use transactions::service::{TransactionError, TransactionService};

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Transaction {id} has an invalid date: {date:?}")]
    InvalidDate { id: String, date: String },
    #[error("Unknown period {0:?}, expected daily, weekly, monthly or yearly")]
    UnknownPeriod(String),
    #[error("Spreadsheet error: {0}")]
    Infrastructure(String),
}

impl From<TransactionError> for AnalysisError {
    fn from(err: TransactionError) -> Self {
        AnalysisError::Infrastructure(err.to_string())
    }
}

pub struct AnalysisService;

impl AnalysisService {
    /// Loads every stored transaction and aggregates it for `period`.
    #[instrument(skip(sheet))]
    pub async fn summarize(sheet: &Spreadsheet, period: Period) -> Result<Summary, AnalysisError> {
        let stored = TransactionService::list_transactions(sheet).await?;
        let report: Vec<ReportTransaction> = stored.iter().map(ReportTransaction::from).collect();

        aggregator::aggregate(&report, period).map_err(|e| {
            tracing::warn!("Aggregation failed: {}", e);
            e
        })
    }
}
