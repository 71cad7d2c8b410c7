//! Playlists mirrored to YouTube.

use std::fmt;
use std::str::FromStr;

use crate::{Database, DbError, OptionalExt};
use serde::{Deserialize, Serialize};

/// How a playlist came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistKind {
    Server,
    Channel,
    Manual,
}

impl PlaylistKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaylistKind::Server => "server",
            PlaylistKind::Channel => "channel",
            PlaylistKind::Manual => "manual",
        }
    }
}

impl fmt::Display for PlaylistKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaylistKind {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "server" => Ok(PlaylistKind::Server),
            "channel" => Ok(PlaylistKind::Channel),
            "manual" => Ok(PlaylistKind::Manual),
            other => Err(DbError::InvalidData(format!("unknown playlist kind: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: i64,
    pub name: String,
    pub kind: PlaylistKind,
    pub youtube_playlist_id: Option<String>,
    pub watched_channel_id: Option<i64>,
    pub created_at: Option<String>,
}

impl Playlist {
    /// A playlist is synced once it carries a remote identifier.
    pub fn is_synced(&self) -> bool {
        self.youtube_playlist_id.is_some()
    }
}

const COLUMNS: &str = "id, name, kind, youtube_playlist_id, watched_channel_id, created_at";

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Playlist> {
    let kind: String = row.get(2)?;
    let kind = kind.parse::<PlaylistKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Playlist {
        id: row.get(0)?,
        name: row.get(1)?,
        kind,
        youtube_playlist_id: row.get(3)?,
        watched_channel_id: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl Database {
    /// Insert an unsynced playlist. A taken name yields [`DbError::Conflict`].
    pub fn create_playlist(
        &self,
        name: &str,
        kind: PlaylistKind,
        watched_channel_id: Option<i64>,
    ) -> Result<Playlist, DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO playlists (name, kind, watched_channel_id) VALUES (?1, ?2, ?3)",
                rusqlite::params![name, kind.as_str(), watched_channel_id],
            )
            .map_err(|e| DbError::from_insert(e, format!("playlist \"{name}\"")))?;
            let id = conn.last_insert_rowid();
            let playlist = conn.query_row(
                &format!("SELECT {COLUMNS} FROM playlists WHERE id = ?1"),
                [id],
                from_row,
            )?;
            Ok(playlist)
        })
    }

    pub fn get_playlist(&self, id: i64) -> Result<Option<Playlist>, DbError> {
        self.with_conn(|conn| {
            let playlist = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM playlists WHERE id = ?1"),
                    [id],
                    from_row,
                )
                .optional()?;
            Ok(playlist)
        })
    }

    pub fn get_playlist_by_name(&self, name: &str) -> Result<Option<Playlist>, DbError> {
        self.with_conn(|conn| {
            let playlist = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM playlists WHERE name = ?1"),
                    [name],
                    from_row,
                )
                .optional()?;
            Ok(playlist)
        })
    }

    /// Most recently created playlist owned by a watched channel row.
    pub fn get_latest_playlist_for_channel(
        &self,
        watched_channel_id: i64,
    ) -> Result<Option<Playlist>, DbError> {
        self.with_conn(|conn| {
            let playlist = conn
                .query_row(
                    &format!(
                        "SELECT {COLUMNS} FROM playlists WHERE watched_channel_id = ?1
                         ORDER BY id DESC LIMIT 1"
                    ),
                    [watched_channel_id],
                    from_row,
                )
                .optional()?;
            Ok(playlist)
        })
    }

    pub fn get_all_playlists(&self) -> Result<Vec<Playlist>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM playlists ORDER BY id"))?;
            let rows = stmt.query_map([], from_row)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    /// Playlists whose name contains `fragment`, for autocomplete.
    pub fn search_playlists(&self, fragment: &str, limit: u32) -> Result<Vec<Playlist>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM playlists WHERE instr(name, ?1) > 0 ORDER BY name LIMIT ?2"
            ))?;
            let rows = stmt.query_map(rusqlite::params![fragment, limit], from_row)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    pub fn set_playlist_youtube_id(&self, id: i64, youtube_playlist_id: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE playlists SET youtube_playlist_id = ?1 WHERE id = ?2",
                rusqlite::params![youtube_playlist_id, id],
            )?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("playlist row {id}")));
            }
            Ok(())
        })
    }

    /// Bind a playlist to a watched channel row.
    pub fn set_playlist_watched_channel(&self, id: i64, watched_channel_id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE playlists SET watched_channel_id = ?1 WHERE id = ?2",
                rusqlite::params![watched_channel_id, id],
            )?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("playlist row {id}")));
            }
            Ok(())
        })
    }

    /// Delete a playlist row; its songs go with it.
    pub fn delete_playlist(&self, id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM playlists WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}
