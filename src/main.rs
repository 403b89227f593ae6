use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

mod chart;
mod dataset;
mod handlers;
mod middleware;
mod openai_client;
mod prompt;
mod session;

/// Shared application state: the completion client (absent when no
/// credential was configured) and the transient session store.
pub struct AppState {
    pub completion_client: Option<openai_client::CompletionClient>,
    pub sessions: session::SessionStore,
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_logging().expect("Failed to initialize logging");

    // The credential is read exactly once, here, and injected into the
    // client. A missing key degrades chart generation instead of aborting
    // startup, so upload and preview still work.
    let completion_client = match std::env::var("OPENAI_API_KEY").ok() {
        Some(api_key) if !api_key.is_empty() => {
            let model = std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo-instruct".to_string());
            tracing::info!("Initializing completion client ({})...", model);
            Some(openai_client::CompletionClient::new(api_key, model))
        }
        _ => {
            tracing::warn!("OPENAI_API_KEY not found. Chart generation will be disabled.");
            None
        }
    };

    let shared_state = Arc::new(AppState {
        completion_client,
        sessions: session::SessionStore::new(),
    });

    let app = Router::new()
        .merge(handlers::ui::ui_routes())
        .merge(handlers::upload::upload_routes())
        .merge(handlers::insight::insight_routes())
        .route("/api/status", axum::routing::get(api_status))
        .layer(axum::middleware::from_fn(
            middleware::logging::request_logging_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(Extension(shared_state));

    let listener = tokio::net::TcpListener::bind("0.0.0.0:80")
        .await
        .expect("failed to bind 0.0.0.0:80");
    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,sheet_insight=trace,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,sheet_insight=info,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    // JSON logging for aggregation, human-readable for development.
    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("📊 SheetInsight starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Build mode: {}",
        if cfg!(debug_assertions) { "development" } else { "production" }
    );
    tracing::info!(
        "Configuration - Completion service: {}",
        if std::env::var("OPENAI_API_KEY").is_ok() { "✅" } else { "❌" }
    );

    Ok(())
}

// API Status endpoint
async fn api_status(
    Extension(state): Extension<Arc<AppState>>,
) -> axum::response::Json<serde_json::Value> {
    use serde_json::json;

    let completion_status = if state.completion_client.is_some() {
        "configured"
    } else {
        "not_configured"
    };

    axum::response::Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "completion_service": completion_status,
        },
        "sessions": state.sessions.session_count().await,
        "features": {
            "spreadsheet_upload": true,
            "sample_dataset": true,
            "chart_generation": completion_status == "configured",
        },
        "endpoints": {
            "dashboard": "/",
            "status": "/api/status",
            "upload": "/upload/session/:session_id",
            "table": "/api/session/:session_id/table",
            "insight": "/api/insight/session/:session_id",
        }
    }))
}
