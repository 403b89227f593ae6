// src/handlers/insight.rs
//! The description → prompt → completion → figure pipeline behind the
//! dashboard's submit button.

use crate::chart::{self, Figure};
use crate::dataset::{self, Table};
use crate::prompt;
use crate::session::Exchange;
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    response::Json,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Title of the figure shown before the user has asked for anything.
pub const IDLE_PROMPT_TITLE: &str = "Please tell me what you want to see about your data";

pub fn insight_routes() -> Router {
    Router::new().route("/api/insight/session/:session_id", post(generate_insight))
}

#[derive(Debug, Deserialize)]
pub struct InsightRequest {
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct InsightResponse {
    pub figure: Figure,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub transcript: Vec<Exchange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Extract the charting call and render it. The call text is returned even
/// when rendering fails so the transcript still records what the model
/// produced; a completion with no recognizable call records the raw text.
fn completion_to_chart(completion: &str, table: &Table) -> (String, Figure) {
    match chart::extract_call(completion) {
        Ok(call) => {
            let figure = chart::figure_from_call(&call, table);
            (call, figure)
        }
        Err(e) => (
            completion.trim().to_string(),
            chart::placeholder_figure(&e.to_string()),
        ),
    }
}

async fn transcript_snapshot(state: &AppState, session_id: &str) -> Vec<Exchange> {
    state
        .sessions
        .with_session(session_id, |session| session.transcript.snapshot())
        .await
}

pub async fn generate_insight(
    Path(session_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<InsightRequest>,
) -> Json<InsightResponse> {
    let description = request.description.trim().to_string();

    if description.is_empty() {
        let transcript = transcript_snapshot(&state, &session_id).await;
        return Json(InsightResponse {
            figure: chart::placeholder_figure(IDLE_PROMPT_TITLE),
            code: None,
            transcript,
            error: None,
        });
    }

    // Active table for the session, or the built-in sample.
    let table = state
        .sessions
        .active_table(&session_id)
        .await
        .unwrap_or_else(dataset::sample_table);

    let schema_prompt = match prompt::build_prompt(&table) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("prompt rejected for session {}: {}", session_id, e);
            let transcript = transcript_snapshot(&state, &session_id).await;
            return Json(InsightResponse {
                figure: chart::placeholder_figure(&e.to_string()),
                code: None,
                transcript,
                error: Some(e.to_string()),
            });
        }
    };

    let Some(client) = state.completion_client.as_ref() else {
        let message = "Completion service is not configured. Set OPENAI_API_KEY and restart.";
        let transcript = transcript_snapshot(&state, &session_id).await;
        return Json(InsightResponse {
            figure: chart::placeholder_figure(message),
            code: None,
            transcript,
            error: Some(message.to_string()),
        });
    };

    let composed = state
        .sessions
        .with_session(&session_id, |session| {
            prompt::compose_request(&schema_prompt, &session.transcript, &description)
        })
        .await;

    tracing::debug!("session {} prompt:\n{}", session_id, composed);

    let completion = match client.complete(&composed).await {
        Ok(text) => text,
        Err(e) => {
            // Retries are exhausted by the client; surface the failure to
            // the user instead of letting it take the session down.
            tracing::error!("completion failed for session {}: {}", session_id, e);
            let transcript = transcript_snapshot(&state, &session_id).await;
            return Json(InsightResponse {
                figure: chart::placeholder_figure(&format!("Completion service error: {}", e)),
                code: None,
                transcript,
                error: Some(e),
            });
        }
    };

    tracing::info!("session {} completion: {}", session_id, completion);

    let (code, figure) = completion_to_chart(&completion, &table);
    let transcript = state
        .sessions
        .with_session(&session_id, |session| {
            session.transcript.push(description, code.clone());
            session.transcript.snapshot()
        })
        .await;

    Json(InsightResponse {
        figure,
        code: Some(code),
        transcript,
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::FIGURE_TEMPLATE;
    use crate::session::SessionStore;

    #[tokio::test]
    async fn test_valid_completion_grows_transcript_by_one() {
        let store = SessionStore::new();
        let table = dataset::sample_table();
        let completion =
            "px.line(df.query(\"continent == 'Oceania'\"), x='year', y='lifeExp', color='country')";

        let (code, figure) = completion_to_chart(completion, &table);
        let transcript = store
            .with_session("s1", |session| {
                session
                    .transcript
                    .push("life expectancy trend".to_string(), code.clone());
                session.transcript.snapshot()
            })
            .await;

        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].description, "life expectancy trend");
        assert_eq!(transcript[0].code, completion);

        assert_eq!(figure.layout.template, FIGURE_TEMPLATE);
        assert_eq!(figure.layout.margin.l, 0);
        assert_eq!(figure.layout.margin.r, 0);
        assert_eq!(figure.layout.margin.t, 30);
        assert_eq!(figure.layout.margin.b, 0);
        assert!(!figure.data.is_empty());
    }

    #[test]
    fn test_unusable_code_still_recorded() {
        let table = dataset::sample_table();

        // Renders as an error figure but the call text is preserved.
        let (code, figure) = completion_to_chart("px.line(df, x='year', y='missing')", &table);
        assert_eq!(code, "px.line(df, x='year', y='missing')");
        assert_eq!(figure.layout.title.as_deref(), Some("unknown column: missing"));

        // No call token at all: raw completion is recorded, figure explains.
        let (code, figure) = completion_to_chart("I would rather not.", &table);
        assert_eq!(code, "I would rather not.");
        assert_eq!(
            figure.layout.title.as_deref(),
            Some("no px function call found in completion")
        );
    }
}
