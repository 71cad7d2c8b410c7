//! Songs: one YouTube video inside one playlist.

use crate::{Database, DbError, OptionalExt};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub playlist_id: i64,
    pub youtube_video_id: String,
    pub youtube_playlist_item_id: Option<String>,
    pub created_at: Option<String>,
}

impl Song {
    pub fn is_linked(&self) -> bool {
        self.youtube_playlist_item_id.is_some()
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.youtube_video_id)
    }
}

const COLUMNS: &str = "id, playlist_id, youtube_video_id, youtube_playlist_item_id, created_at";

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Song> {
    Ok(Song {
        id: row.get(0)?,
        playlist_id: row.get(1)?,
        youtube_video_id: row.get(2)?,
        youtube_playlist_item_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl Database {
    /// Insert an unlinked song. The same video twice in one playlist is a conflict.
    pub fn create_song(&self, playlist_id: i64, youtube_video_id: &str) -> Result<Song, DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO songs (playlist_id, youtube_video_id) VALUES (?1, ?2)",
                rusqlite::params![playlist_id, youtube_video_id],
            )
            .map_err(|e| {
                DbError::from_insert(e, format!("video {youtube_video_id} in playlist {playlist_id}"))
            })?;
            let id = conn.last_insert_rowid();
            let song = conn.query_row(
                &format!("SELECT {COLUMNS} FROM songs WHERE id = ?1"),
                [id],
                from_row,
            )?;
            Ok(song)
        })
    }

    pub fn get_song(&self, id: i64) -> Result<Option<Song>, DbError> {
        self.with_conn(|conn| {
            let song = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM songs WHERE id = ?1"),
                    [id],
                    from_row,
                )
                .optional()?;
            Ok(song)
        })
    }

    pub fn get_song_by_video_id(
        &self,
        playlist_id: i64,
        youtube_video_id: &str,
    ) -> Result<Option<Song>, DbError> {
        self.with_conn(|conn| {
            let song = conn
                .query_row(
                    &format!(
                        "SELECT {COLUMNS} FROM songs WHERE playlist_id = ?1 AND youtube_video_id = ?2"
                    ),
                    rusqlite::params![playlist_id, youtube_video_id],
                    from_row,
                )
                .optional()?;
            Ok(song)
        })
    }

    pub fn get_playlist_songs(&self, playlist_id: i64) -> Result<Vec<Song>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM songs WHERE playlist_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt.query_map([playlist_id], from_row)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    pub fn set_song_playlist_item_id(&self, id: i64, item_id: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE songs SET youtube_playlist_item_id = ?1 WHERE id = ?2",
                rusqlite::params![item_id, id],
            )?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("song row {id}")));
            }
            Ok(())
        })
    }

    pub fn delete_song(&self, id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM songs WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}
