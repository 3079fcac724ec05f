//! Minimal Google Sheets v4 client authenticated as a service account.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::{Row, SheetError, SheetsConfig};

const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

pub(crate) struct GoogleSheets {
    http: reqwest::Client,
    config: SheetsConfig,
    key: EncodingKey,
    token: Mutex<Option<AccessToken>>,
}

impl GoogleSheets {
    pub(crate) fn new(config: SheetsConfig) -> Result<Self, SheetError> {
        let key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())
            .map_err(|e| SheetError::Credentials(e.to_string()))?;

        Ok(Self {
            http: reqwest::Client::new(),
            config,
            key,
            token: Mutex::new(None),
        })
    }

    pub(crate) async fn get_values(&self, columns: &str) -> Result<Vec<Row>, SheetError> {
        let url = self.values_url(&self.config.range(columns))?;
        let token = self.access_token().await?;

        let response = self.http.get(url).bearer_auth(token).send().await?;
        let body: ValueRange = check_status(response).await?.json().await?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    pub(crate) async fn append_values(
        &self,
        columns: &str,
        rows: Vec<Row>,
    ) -> Result<(), SheetError> {
        let range = format!("{}:append", self.config.range(columns));
        let mut url = self.values_url(&range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let token = self.access_token().await?;
        let count = rows.len();

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "values": rows }))
            .send()
            .await?;
        check_status(response).await?;

        tracing::debug!("Appended {} row(s) to {}", count, range);
        Ok(())
    }

    fn values_url(&self, range: &str) -> Result<Url, SheetError> {
        let mut url = Url::parse(&self.config.api_base)
            .map_err(|e| SheetError::InvalidUrl(format!("{}: {}", self.config.api_base, e)))?;
        url.path_segments_mut()
            .map_err(|_| SheetError::InvalidUrl(self.config.api_base.clone()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.config.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }

    /// Returns a cached access token, exchanging a fresh signed assertion when
    /// the cached one is missing or about to expire.
    async fn access_token(&self) -> Result<String, SheetError> {
        let mut cached = self.token.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let claims = Claims {
            iss: &self.config.service_account_email,
            scope: SCOPE,
            aud: &self.config.token_url,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| SheetError::Credentials(e.to_string()))?;

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            tracing::error!("Token exchange failed with {}: {}", status, message);
            return Err(SheetError::Auth(format!("{}: {}", status, message)));
        }

        let token: TokenResponse = response.json().await?;
        tracing::info!("Obtained access token for {}", self.config.service_account_email);

        let value = token.access_token.clone();
        *cached = Some(AccessToken {
            value: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        });
        Ok(value)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SheetError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    Err(SheetError::Api { status, message })
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
