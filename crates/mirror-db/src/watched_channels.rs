//! Chat channels watched for posted video links.

use crate::{Database, DbError, OptionalExt};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedChannel {
    pub id: i64,
    pub channel_id: String,
    pub name: String,
    pub active: bool,
    pub created_at: Option<String>,
}

const COLUMNS: &str = "id, channel_id, name, active, created_at";

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<WatchedChannel> {
    Ok(WatchedChannel {
        id: row.get(0)?,
        channel_id: row.get(1)?,
        name: row.get(2)?,
        active: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl Database {
    /// Insert a new, active watched channel.
    pub fn create_watched_channel(
        &self,
        channel_id: &str,
        name: &str,
    ) -> Result<WatchedChannel, DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO watched_channels (channel_id, name, active) VALUES (?1, ?2, true)",
                rusqlite::params![channel_id, name],
            )
            .map_err(|e| DbError::from_insert(e, format!("watched channel {channel_id}")))?;
            let id = conn.last_insert_rowid();
            let channel = conn.query_row(
                &format!("SELECT {COLUMNS} FROM watched_channels WHERE id = ?1"),
                [id],
                from_row,
            )?;
            Ok(channel)
        })
    }

    pub fn get_watched_channel(&self, channel_id: &str) -> Result<Option<WatchedChannel>, DbError> {
        self.with_conn(|conn| {
            let channel = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM watched_channels WHERE channel_id = ?1"),
                    [channel_id],
                    from_row,
                )
                .optional()?;
            Ok(channel)
        })
    }

    /// All watched channels, active or not, oldest first.
    pub fn get_all_watched_channels(&self) -> Result<Vec<WatchedChannel>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM watched_channels ORDER BY id"
            ))?;
            let rows = stmt.query_map([], from_row)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    pub fn get_active_watched_channels(&self) -> Result<Vec<WatchedChannel>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM watched_channels WHERE active = true ORDER BY id"
            ))?;
            let rows = stmt.query_map([], from_row)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    pub fn set_watched_channel_active(&self, id: i64, active: bool) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE watched_channels SET active = ?1 WHERE id = ?2",
                rusqlite::params![active, id],
            )?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("watched channel row {id}")));
            }
            Ok(())
        })
    }

    pub fn delete_watched_channel(&self, id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM watched_channels WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}
