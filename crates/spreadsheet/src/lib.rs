use std::sync::{Arc, Mutex, PoisonError};

mod google;

use google::GoogleSheets;

/// One spreadsheet row, cell values in column order.
pub type Row = Vec<String>;

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("Invalid service account credentials: {0}")]
    Credentials(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Spreadsheet API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Everything needed to reach one tab of one Google spreadsheet.
#[derive(Clone, Debug)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub tab: String,
    pub service_account_email: String,
    pub private_key: String,
    pub api_base: String,
    pub token_url: String,
}

impl SheetsConfig {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        tab: impl Into<String>,
        service_account_email: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            tab: tab.into(),
            service_account_email: service_account_email.into(),
            private_key: private_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }

    /// A1 range for `columns` on the configured tab, e.g. `'Sheet1'!A:F`.
    pub fn range(&self, columns: &str) -> String {
        format!("'{}'!{}", self.tab.replace('\'', "''"), columns)
    }
}

// --- Backend Adapter Pattern ---
#[derive(Clone)]
enum Backend {
    Google(Arc<GoogleSheets>),
    Memory(Arc<Mutex<Vec<Row>>>),
}

/// Handle to the row store. Cheap to clone; clones share the same backend.
#[derive(Clone)]
pub struct Spreadsheet {
    backend: Backend,
}

impl Spreadsheet {
    pub fn connect(config: SheetsConfig) -> Result<Self, SheetError> {
        let client = GoogleSheets::new(config)?;
        Ok(Self {
            backend: Backend::Google(Arc::new(client)),
        })
    }

    /// Rows live in process memory and are gone on restart.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    pub fn is_in_memory(&self) -> bool {
        matches!(self.backend, Backend::Memory(_))
    }

    pub async fn read_rows(&self, columns: &str) -> Result<Vec<Row>, SheetError> {
        match &self.backend {
            Backend::Google(client) => client.get_values(columns).await,
            Backend::Memory(rows) => Ok(rows
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()),
        }
    }

    pub async fn append_row(&self, columns: &str, row: Row) -> Result<(), SheetError> {
        match &self.backend {
            Backend::Google(client) => client.append_values(columns, vec![row]).await,
            Backend::Memory(rows) => {
                rows.lock().unwrap_or_else(PoisonError::into_inner).push(row);
                Ok(())
            }
        }
    }
}

// do not add #[cfg(test)] here because it hides this function from the other crates' tests.
pub fn get_test_sheet(rows: Vec<Row>) -> Spreadsheet {
    Spreadsheet {
        backend: Backend::Memory(Arc::new(Mutex::new(rows))),
    }
}
