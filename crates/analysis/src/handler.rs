use crate::models::{Bucket, CategoryTotals, Period, Summary};
use crate::service::{AnalysisError, AnalysisService};
use askama::Template;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use common::AppState;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            AnalysisError::UnknownPeriod(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AnalysisError::InvalidDate { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            AnalysisError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

#[derive(Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
}

impl PeriodQuery {
    fn period(&self) -> Result<Period, AnalysisError> {
        match self.period.as_deref() {
            None => Ok(Period::default()),
            Some(raw) => raw.parse(),
        }
    }
}

#[derive(Serialize)]
pub struct AnalysisResponse {
    pub period: Period,
    #[serde(flatten)]
    pub summary: Summary,
    pub balance: f64,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub period_label: &'static str,
    pub periods: Vec<PeriodLink>,
    pub total_income: String,
    pub total_expenses: String,
    pub balance: String,
    pub balance_is_positive: bool,
    pub buckets: Vec<BucketView>,
    pub categories: Vec<CategoryView>,
}

pub struct PeriodLink {
    pub value: &'static str,
    pub label: &'static str,
    pub active: bool,
}

pub struct BucketView {
    pub key: String,
    pub income: String,
    pub expenses: String,
    pub income_width: String,
    pub expenses_width: String,
}

pub struct CategoryView {
    pub name: &'static str,
    pub amount: String,
    pub percent: String,
}

fn bucket_views(buckets: &[Bucket]) -> Vec<BucketView> {
    let max = buckets
        .iter()
        .map(|b| b.income.max(b.expenses))
        .fold(0.0_f64, f64::max);
    let width = |value: f64| {
        if max > 0.0 {
            format!("{:.1}", value / max * 100.0)
        } else {
            "0".to_string()
        }
    };

    buckets
        .iter()
        .map(|b| BucketView {
            key: b.key.clone(),
            income: format!("{:.2}", b.income),
            expenses: format!("{:.2}", b.expenses),
            income_width: width(b.income),
            expenses_width: width(b.expenses),
        })
        .collect()
}

fn category_views(totals: &CategoryTotals) -> Vec<CategoryView> {
    let sum = totals.sum();
    totals
        .entries()
        .into_iter()
        .map(|(category, amount)| CategoryView {
            name: category.label(),
            amount: format!("{:.2}", amount),
            percent: if sum > 0.0 {
                format!("{:.0}", amount / sum * 100.0)
            } else {
                "0".to_string()
            },
        })
        .collect()
}

pub fn api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_analysis))
        .with_state(state)
}

pub fn dashboard_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_dashboard))
        .with_state(state)
}

async fn get_analysis(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PeriodQuery>,
) -> Result<impl IntoResponse, AnalysisError> {
    let period = query.period()?;
    tracing::info!("Aggregating transactions by {}", period);

    let summary = AnalysisService::summarize(&state.sheet, period).await?;
    let balance = summary.balance();

    Ok(Json(AnalysisResponse {
        period,
        summary,
        balance,
    }))
}

async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PeriodQuery>,
) -> Result<impl IntoResponse, AnalysisError> {
    let period = query.period()?;
    let summary = AnalysisService::summarize(&state.sheet, period).await?;
    let balance = summary.balance();

    let template = DashboardTemplate {
        period_label: period.label(),
        periods: Period::ALL
            .into_iter()
            .map(|p| PeriodLink {
                value: p.as_str(),
                label: p.label(),
                active: p == period,
            })
            .collect(),
        total_income: format!("{:.2}", summary.total_income),
        total_expenses: format!("{:.2}", summary.total_expenses),
        balance: format!("{:.2}", balance),
        balance_is_positive: balance >= 0.0,
        buckets: bucket_views(&summary.buckets),
        categories: category_views(&summary.category_totals),
    };

    let html = template
        .render()
        .map_err(|e| AnalysisError::Infrastructure(e.to_string()))?;
    Ok(Html(html))
}
