use clap::Parser;
use spreadsheet::{SheetsConfig, Spreadsheet};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub sheet: Spreadsheet,
    pub config: Config,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set when GOOGLE_SHEETS_ID is set")]
    Missing(&'static str),
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,

    #[arg(long, env = "GOOGLE_SHEETS_ID")]
    pub spreadsheet_id: Option<String>,

    #[arg(long, env = "GOOGLE_SHEETS_TAB", default_value = "Лист1")]
    pub sheet_tab: String,

    #[arg(long, env = "GOOGLE_SERVICE_ACCOUNT_EMAIL")]
    pub service_account_email: Option<String>,

    #[arg(
        long,
        env = "GOOGLE_PRIVATE_KEY",
        hide_env_values = true,
        allow_hyphen_values = true
    )]
    pub private_key: Option<String>,

    #[arg(long, env = "SHEETS_API_BASE", default_value = spreadsheet::DEFAULT_API_BASE)]
    pub sheets_api_base: String,

    #[arg(long, env = "GOOGLE_TOKEN_URL", default_value = spreadsheet::DEFAULT_TOKEN_URL)]
    pub token_url: String,
}

impl Config {
    /// `Ok(None)` means no spreadsheet is configured.
    pub fn sheets_config(&self) -> Result<Option<SheetsConfig>, ConfigError> {
        let Some(spreadsheet_id) = &self.spreadsheet_id else {
            return Ok(None);
        };
        let email = self
            .service_account_email
            .as_ref()
            .ok_or(ConfigError::Missing("GOOGLE_SERVICE_ACCOUNT_EMAIL"))?;
        let key = self
            .private_key
            .as_ref()
            .ok_or(ConfigError::Missing("GOOGLE_PRIVATE_KEY"))?;

        // Keys pasted into .env files usually carry literal "\n" sequences.
        let mut sheets = SheetsConfig::new(
            spreadsheet_id.as_str(),
            self.sheet_tab.as_str(),
            email.as_str(),
            key.replace("\\n", "\n"),
        );
        sheets.api_base = self.sheets_api_base.clone();
        sheets.token_url = self.token_url.clone();
        Ok(Some(sheets))
    }
}

// do not add #[cfg(test)] here because it hides this function from the handler crates' tests.
pub fn get_test_state(sheet: Spreadsheet) -> Arc<AppState> {
    Arc::new(AppState {
        sheet,
        config: Config::parse_from(["test"]),
    })
}
