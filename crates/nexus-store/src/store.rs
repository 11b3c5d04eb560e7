use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use nexus_core::{KeyValueStore, Notification, Timestamp};

use crate::error::{Result, StoreError};
use crate::schema;

/// One row of the notification log.
#[derive(Clone, Debug, PartialEq)]
pub struct NotificationEntry {
    pub id: i64,
    pub delivered_at: Timestamp,
    pub notification: Notification,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        tracing::debug!(path = %path.display(), "store opened");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    // --- Key-value ---

    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE
             SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value],
        )?;
        tracing::trace!(key, bytes = value.len(), "kv write");
        Ok(())
    }

    pub fn remove_value(&self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    // --- Notification log ---

    pub fn record_notification(&self, notification: &Notification, at: Timestamp) -> Result<i64> {
        let payload = serde_json::to_string(notification)
            .map_err(|e| StoreError::InvalidData(format!("notification encode: {e}")))?;
        let kind = match notification {
            Notification::NewResults { .. } => "new_results",
            Notification::ExecutionFailed { .. } => "execution_failed",
        };
        self.conn.execute(
            "INSERT INTO notifications (agent_id, kind, payload, delivered_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![notification.agent_id().to_string(), kind, payload, at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Newest first. Rows whose payload no longer decodes are skipped.
    pub fn recent_notifications(&self, limit: usize) -> Result<Vec<NotificationEntry>> {
        self.query_notifications(
            "SELECT id, payload, delivered_at FROM notifications
             ORDER BY id DESC LIMIT ?1",
            params![limit as i64],
        )
    }

    pub fn notifications_for(&self, agent_id: Uuid) -> Result<Vec<NotificationEntry>> {
        self.query_notifications(
            "SELECT id, payload, delivered_at FROM notifications
             WHERE agent_id = ?1 ORDER BY id DESC",
            params![agent_id.to_string()],
        )
    }

    fn query_notifications(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<NotificationEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut entries = Vec::with_capacity(rows.len());
        for (id, payload, delivered_at) in rows {
            match serde_json::from_str(&payload) {
                Ok(notification) => entries.push(NotificationEntry {
                    id,
                    delivered_at,
                    notification,
                }),
                Err(e) => tracing::warn!(id, error = %e, "skipping undecodable notification"),
            }
        }
        Ok(entries)
    }
}

impl KeyValueStore for Store {
    type Error = StoreError;

    fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_value(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.remove_value(key)
    }
}
