// src/session.rs
//! Per-session conversation state and the transient dataset registry.
//!
//! Everything here lives in process memory only; a session vanishes when
//! the process restarts or the browser moves on.

use crate::dataset::{Table, TableSummary};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Hard cap on how many description/code exchanges a session keeps. When
/// the transcript is full the oldest exchange is dropped, so the prompt the
/// model sees stays bounded.
pub const MAX_TRANSCRIPT_EXCHANGES: usize = 20;

/// One description → generated-code round trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exchange {
    pub description: String,
    pub code: String,
}

/// Append-only transcript of exchanges, bounded by
/// [`MAX_TRANSCRIPT_EXCHANGES`].
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    exchanges: VecDeque<Exchange>,
}

impl Transcript {
    pub fn push(&mut self, description: String, code: String) {
        if self.exchanges.len() == MAX_TRANSCRIPT_EXCHANGES {
            self.exchanges.pop_front();
        }
        self.exchanges.push_back(Exchange { description, code });
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn snapshot(&self) -> Vec<Exchange> {
        self.exchanges.iter().cloned().collect()
    }

    /// Render the transcript as the few-shot blocks the prompt carries.
    /// The section markers here double as the completion stop sequences.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for exchange in &self.exchanges {
            out.push_str(&format!(
                "\nDescription: {}\n\nCode: {}\n",
                exchange.description, exchange.code
            ));
        }
        out
    }
}

/// A parsed upload held by a session.
#[derive(Debug, Clone)]
pub struct StoredTable {
    pub upload_id: String,
    pub table: Table,
    pub summary: TableSummary,
}

/// State for one browser session: uploaded tables in arrival order plus the
/// running transcript.
#[derive(Debug, Default)]
pub struct Session {
    tables: Vec<StoredTable>,
    pub transcript: Transcript,
}

impl Session {
    /// Register a parsed upload. Returns the upload id. The first table to
    /// arrive stays the active one (first-wins); later uploads are kept and
    /// listed but only become active after a reset.
    pub fn register_table(&mut self, table: Table, summary: TableSummary) -> String {
        let upload_id = Uuid::new_v4().to_string();
        self.tables.push(StoredTable {
            upload_id: upload_id.clone(),
            table,
            summary,
        });
        upload_id
    }

    pub fn active_table(&self) -> Option<&StoredTable> {
        self.tables.first()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

/// Process-wide store of sessions, keyed by the session id the dashboard
/// page generates. Sessions are created lazily on first touch.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Run `f` against the session, creating it if it does not exist yet.
    pub async fn with_session<R>(&self, session_id: &str, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(session_id.to_string()).or_default();
        f(session)
    }

    /// Clone of the active table for the session, if any upload succeeded.
    pub async fn active_table(&self, session_id: &str) -> Option<Table> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .and_then(|s| s.active_table())
            .map(|stored| stored.table.clone())
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{sample_table, table_summary};
    use chrono::Utc;

    #[test]
    fn test_transcript_keeps_exchanges_in_order() {
        let mut transcript = Transcript::default();
        assert!(transcript.is_empty());
        for i in 0..5 {
            transcript.push(format!("description {}", i), format!("code {}", i));
        }
        let snapshot = transcript.snapshot();
        assert_eq!(snapshot.len(), 5);
        for (i, exchange) in snapshot.iter().enumerate() {
            assert_eq!(exchange.description, format!("description {}", i));
            assert_eq!(exchange.code, format!("code {}", i));
        }
    }

    #[test]
    fn test_transcript_drops_oldest_past_cap() {
        let mut transcript = Transcript::default();
        for i in 0..MAX_TRANSCRIPT_EXCHANGES + 3 {
            transcript.push(format!("d{}", i), format!("c{}", i));
        }
        assert_eq!(transcript.len(), MAX_TRANSCRIPT_EXCHANGES);
        assert_eq!(transcript.snapshot()[0].description, "d3");
    }

    #[test]
    fn test_transcript_render_format() {
        let mut transcript = Transcript::default();
        transcript.push("life expectancy trend".to_string(), "px.line(df, x='year', y='lifeExp')".to_string());
        let rendered = transcript.render();
        assert!(rendered.contains("Description: life expectancy trend"));
        assert!(rendered.contains("Code: px.line(df, x='year', y='lifeExp')"));
    }

    #[test]
    fn test_first_uploaded_table_wins() {
        let mut session = Session::default();
        let first = sample_table();
        let mut second = sample_table();
        second.name = "second".to_string();

        let summary = table_summary(&first, "first.csv", Utc::now());
        session.register_table(first, summary);
        let summary = table_summary(&second, "second.csv", Utc::now());
        session.register_table(second, summary);

        assert_eq!(session.table_count(), 2);
        assert_eq!(session.active_table().unwrap().summary.filename, "first.csv");
    }

    #[tokio::test]
    async fn test_store_creates_sessions_lazily() {
        let store = SessionStore::new();
        assert!(store.active_table("s1").await.is_none());
        assert_eq!(store.session_count().await, 0);

        store
            .with_session("s1", |session| {
                let table = sample_table();
                let summary = table_summary(&table, "gapminder", Utc::now());
                session.register_table(table, summary);
            })
            .await;

        assert_eq!(store.session_count().await, 1);
        assert!(store.active_table("s1").await.is_some());
    }
}
