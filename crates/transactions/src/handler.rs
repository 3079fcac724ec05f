use crate::models::{
    self, FORM_CATEGORIES, RawCreateTransactionRequest, Transaction, TransactionType,
};
use crate::service::{TransactionError, TransactionService};
use askama::Template;
use axum::{
    Form, Json, Router,
    extract::{
        State,
        rejection::{FormRejection, JsonRejection},
    },
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use common::AppState;
use serde_json::json;
use std::sync::Arc;

impl IntoResponse for TransactionError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            TransactionError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            TransactionError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

#[derive(Template)]
#[template(path = "tracker.html")]
pub struct TrackerTemplate {
    pub transactions: Vec<TransactionView>,
    pub balance: String,
    pub balance_is_positive: bool,
    pub categories: Vec<&'static str>,
    pub error: Option<String>,
}

pub struct TransactionView {
    pub name: String,
    pub category: String,
    pub kind: &'static str,
    pub is_income: bool,
    pub amount: String,
}

impl From<&Transaction> for TransactionView {
    fn from(t: &Transaction) -> Self {
        TransactionView {
            name: t.name.clone(),
            category: t.category.clone(),
            kind: t.kind.as_str(),
            is_income: t.kind == TransactionType::Income,
            amount: format!("{:.2}", t.amount),
        }
    }
}

/// JSON API at the path the original web client used.
pub fn api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_transactions).post(create_transaction))
        .with_state(state)
}

pub fn tracker_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(tracker_page))
        .route("/add", post(add_transaction))
        .with_state(state)
}

async fn list_transactions(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, TransactionError> {
    let transactions = TransactionService::list_transactions(&state.sheet)
        .await
        .map_err(|e| {
            tracing::error!("Sheets GET error: {}", e);
            e
        })?;

    Ok(Json(json!({ "transactions": transactions })))
}

async fn create_transaction(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RawCreateTransactionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, TransactionError> {
    let Json(payload) =
        payload.map_err(|rejection| TransactionError::InvalidInput(rejection.body_text()))?;
    let transaction = TransactionService::create_transaction(&state.sheet, payload)
        .await
        .map_err(|e| {
            tracing::error!("Sheets POST error: {}", e);
            e
        })?;

    Ok(Json(json!({ "ok": true, "transaction": transaction })))
}

fn render_tracker(
    transactions: &[Transaction],
    error: Option<String>,
) -> Result<String, TransactionError> {
    let balance = models::balance(transactions);
    let template = TrackerTemplate {
        transactions: transactions.iter().map(TransactionView::from).collect(),
        balance: format!("{:.2}", balance),
        balance_is_positive: balance >= 0.0,
        categories: FORM_CATEGORIES.to_vec(),
        error,
    };

    template
        .render()
        .map_err(|e| TransactionError::Infrastructure(e.to_string()))
}

async fn tracker_page(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, TransactionError> {
    let transactions = TransactionService::list_transactions(&state.sheet).await?;
    Ok(Html(render_tracker(&transactions, None)?))
}

async fn add_transaction(
    State(state): State<Arc<AppState>>,
    payload: Result<Form<RawCreateTransactionRequest>, FormRejection>,
) -> Result<Response, TransactionError> {
    let result = match payload {
        Ok(Form(payload)) => TransactionService::create_transaction(&state.sheet, payload).await,
        Err(rejection) => Err(TransactionError::InvalidInput(rejection.body_text())),
    };

    match result {
        Ok(_) => Ok(Redirect::to("/tracker").into_response()),
        Err(TransactionError::InvalidInput(msg)) => {
            let transactions = TransactionService::list_transactions(&state.sheet).await?;
            let html = render_tracker(&transactions, Some(msg))?;
            Ok((StatusCode::BAD_REQUEST, Html(html)).into_response())
        }
        Err(e) => {
            tracing::error!("add_transaction error: {}", e);
            Err(e)
        }
    }
}
