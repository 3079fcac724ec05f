use axum::{
    Router,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_embed::ServeEmbed;
use clap::Parser;
use common::{AppState, Config};
use rust_embed::RustEmbed;
use spreadsheet::Spreadsheet;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(RustEmbed, Clone)]
#[folder = "public/"]
struct Assets;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize Logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Load Config from .env, environment and CLI args
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }
    let config = Config::parse();

    // 3. Connect the transaction store
    let sheet = match config.sheets_config()? {
        Some(sheets) => {
            tracing::info!(
                "Using spreadsheet {} (tab {:?})",
                sheets.spreadsheet_id,
                sheets.tab
            );
            Spreadsheet::connect(sheets)?
        }
        None => {
            tracing::warn!(
                "GOOGLE_SHEETS_ID is not set! Transactions are kept IN MEMORY and lost on restart."
            );
            Spreadsheet::in_memory()
        }
    };

    let state = Arc::new(AppState {
        sheet,
        config: config.clone(),
    });

    // 4. Start Server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app(state)).await?;

    Ok(())
}

fn app(state: Arc<AppState>) -> Router {
    let serve_assets = ServeEmbed::<Assets>::new();

    Router::<Arc<AppState>>::new()
        .route("/", get(root_redirect))
        .nest("/api/sheets", transactions::handler::api_router(state.clone()))
        .nest("/api/analysis", analysis::handler::api_router(state.clone()))
        .nest("/tracker", transactions::handler::tracker_router(state.clone()))
        .nest("/dashboard", analysis::handler::dashboard_router(state.clone()))
        .nest_service("/public", serve_assets)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn root_redirect() -> Response {
    Redirect::to("/dashboard").into_response()
}
