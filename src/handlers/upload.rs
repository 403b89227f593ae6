// src/handlers/upload.rs
use crate::dataset::{self, TableSummary};
use crate::AppState;
use axum::{
    extract::{multipart::Multipart, DefaultBodyLimit, Extension, Path},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

/// Spreadsheets are small; reject anything bigger at the HTTP layer before
/// the parser ever sees it.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn upload_routes() -> Router {
    Router::new()
        .route("/upload/session/:session_id", post(upload_spreadsheets))
        .route("/api/session/:session_id/table", get(get_active_table))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

#[derive(Debug, Serialize)]
pub struct UploadedSpreadsheet {
    pub filename: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<TableSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    /// Whether this upload is the table charts are built against.
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub files: Vec<UploadedSpreadsheet>,
    pub message: String,
}

fn failed_upload(filename: String, notice: &str) -> UploadedSpreadsheet {
    UploadedSpreadsheet {
        filename,
        success: false,
        upload_id: None,
        summary: None,
        notice: Some(notice.to_string()),
        active: false,
    }
}

/// Accept one or more spreadsheet files for a session. Each file is decoded
/// independently; a file that fails to decode produces an in-UI notice and
/// the session carries on. The first successfully registered table stays
/// the active one.
pub async fn upload_spreadsheets(
    Path(session_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Json<UploadResponse> {
    let mut results: Vec<UploadedSpreadsheet> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("multipart read failed for session {}: {}", session_id, e);
                results.push(failed_upload(
                    "unknown".to_string(),
                    "There was an error reading the upload.",
                ));
                break;
            }
        };

        let filename = field.file_name().unwrap_or("unknown").to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("failed to read upload '{}': {}", filename, e);
                results.push(failed_upload(filename, "There was an error reading the upload."));
                continue;
            }
        };

        let uploaded_at = Utc::now();
        match dataset::decode_table(&bytes, &filename) {
            Ok(table) => {
                let summary = dataset::table_summary(&table, &filename, uploaded_at);
                let (upload_id, active) = state
                    .sessions
                    .with_session(&session_id, |session| {
                        let id = session.register_table(table, summary.clone());
                        let active =
                            session.active_table().map(|t| t.upload_id == id).unwrap_or(false);
                        (id, active)
                    })
                    .await;

                tracing::info!(
                    "registered table '{}' ({} rows) for session {}{}",
                    summary.table_name,
                    summary.row_count,
                    session_id,
                    if active { "" } else { " (inactive, earlier upload wins)" }
                );

                results.push(UploadedSpreadsheet {
                    filename,
                    success: true,
                    upload_id: Some(upload_id),
                    summary: Some(summary),
                    notice: None,
                    active,
                });
            }
            Err(e) => {
                tracing::warn!("failed to decode '{}': {}", filename, e);
                results.push(failed_upload(filename, "There was an error processing this file."));
            }
        }
    }

    let parsed = results.iter().filter(|r| r.success).count();
    let message = format!("Processed {} of {} files", parsed, results.len());
    Json(UploadResponse {
        success: parsed > 0,
        files: results,
        message,
    })
}

/// Summary of the table charts are currently built against. Falls back to
/// the built-in sample dataset when the session has no usable upload.
pub async fn get_active_table(
    Path(session_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> Json<serde_json::Value> {
    let summary = state
        .sessions
        .with_session(&session_id, |session| {
            session.active_table().map(|stored| stored.summary.clone())
        })
        .await;

    match summary {
        Some(summary) => Json(serde_json::json!({ "sample": false, "summary": summary })),
        None => {
            let table = dataset::sample_table();
            let summary = dataset::table_summary(&table, "gapminder (built-in sample)", Utc::now());
            Json(serde_json::json!({ "sample": true, "summary": summary }))
        }
    }
}
