// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Analytics record store backed by SQLite.
//
// Events are appended here before anything else happens to them, so they
// survive process restarts. All methods are synchronous; callers on an
// async runtime go through `spawn_blocking`.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use mallard_core::error::{MallardError, Result};

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS events (
        event_id TEXT PRIMARY KEY,
        kind TEXT NOT NULL,
        user_id TEXT,
        payload TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
"#;

/// What happened, with the fields the scripting side supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventKind {
    #[serde(rename_all = "camelCase")]
    AppScreen {
        screen_name: String,
        value: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Component {
        component_type: String,
        action: String,
        value: Option<String>,
        component_id: Option<String>,
    },
    PageView { path: String },
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::AppScreen { .. } => "app_screen",
            EventKind::Component { .. } => "component",
            EventKind::PageView { .. } => "page_view",
        }
    }
}

/// A recorded analytics event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OphanEvent {
    pub event_id: Uuid,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub kind: EventKind,
}

impl OphanEvent {
    pub fn new(kind: EventKind, user_id: Option<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            user_id,
            created_at: Utc::now(),
            kind,
        }
    }
}

pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Open (or create) the record store at the given path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| MallardError::Database(format!("open: {e}")))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| MallardError::Database(format!("WAL pragma: {e}")))?;

        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| MallardError::Database(format!("create table: {e}")))?;

        info!("analytics record store opened");
        Ok(Self { conn })
    }

    /// Open an in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| MallardError::Database(format!("open in-memory: {e}")))?;

        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| MallardError::Database(format!("create table: {e}")))?;

        debug!("in-memory analytics record store opened");
        Ok(Self { conn })
    }

    #[instrument(skip(self, event), fields(event_id = %event.event_id, kind = event.kind.label()))]
    pub fn append(&self, event: &OphanEvent) -> Result<()> {
        let payload = serde_json::to_string(&event.kind)
            .map_err(|e| MallardError::Database(format!("serialize payload: {e}")))?;

        self.conn
            .execute(
                "INSERT INTO events (event_id, kind, user_id, payload, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    event.event_id.to_string(),
                    event.kind.label(),
                    event.user_id,
                    payload,
                    event.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| MallardError::Database(format!("insert event: {e}")))?;

        debug!("event recorded");
        Ok(())
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
            .map_err(|e| MallardError::Database(format!("count events: {e}")))?;
        Ok(count as usize)
    }

    /// Most recently appended events first.
    #[instrument(skip(self))]
    pub fn recent(&self, limit: usize) -> Result<Vec<OphanEvent>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT event_id, user_id, payload, created_at
                 FROM events ORDER BY rowid DESC LIMIT ?1",
            )
            .map_err(|e| MallardError::Database(format!("prepare recent: {e}")))?;

        let events = stmt
            .query_map(params![limit as i64], row_to_event)
            .map_err(|e| MallardError::Database(format!("query recent: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| MallardError::Database(format!("collect rows: {e}")))?;

        Ok(events)
    }
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<OphanEvent> {
    let id_str: String = row.get(0)?;
    let user_id: Option<String> = row.get(1)?;
    let payload: String = row.get(2)?;
    let created_at_str: String = row.get(3)?;

    let event_id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let kind: EventKind = serde_json::from_str(&payload).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(OphanEvent {
        event_id,
        user_id,
        created_at,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_view(path: &str) -> OphanEvent {
        OphanEvent::new(EventKind::PageView { path: path.into() }, None)
    }

    #[test]
    fn append_and_read_back() {
        let store = RecordStore::open_in_memory().expect("open in-memory db");
        let event = OphanEvent::new(
            EventKind::Component {
                component_type: "button".into(),
                action: "tap".into(),
                value: None,
                component_id: Some("settings".into()),
            },
            Some("user-1".into()),
        );
        store.append(&event).expect("append");

        let events = store.recent(10).expect("recent");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_id, event.event_id);
        assert_eq!(events[0].user_id.as_deref(), Some("user-1"));
        assert_eq!(events[0].kind, event.kind);
    }

    #[test]
    fn recent_is_newest_first_and_limited() {
        let store = RecordStore::open_in_memory().expect("open in-memory db");
        for path in ["/a", "/b", "/c"] {
            store.append(&page_view(path)).expect("append");
        }
        assert_eq!(store.count().unwrap(), 3);

        let events = store.recent(2).expect("recent");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::PageView { path: "/c".into() });
    }

    #[test]
    fn duplicate_event_id_is_a_database_error() {
        let store = RecordStore::open_in_memory().expect("open in-memory db");
        let event = page_view("/a");
        store.append(&event).expect("append");
        let err = store.append(&event).unwrap_err();
        assert!(matches!(err, MallardError::Database(_)));
    }

    #[test]
    fn events_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ophan.db");
        {
            let store = RecordStore::open(&path).expect("open");
            store.append(&page_view("/front")).expect("append");
        }
        let store = RecordStore::open(&path).expect("reopen");
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn payload_uses_camel_case_tags() {
        let json = serde_json::to_value(EventKind::AppScreen {
            screen_name: "front".into(),
            value: None,
        })
        .unwrap();
        assert_eq!(json["type"], "appScreen");
        assert_eq!(json["screenName"], "front");
    }
}
