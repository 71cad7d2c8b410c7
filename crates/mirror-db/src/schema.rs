//! Database schema definitions and migrations.

use rusqlite::Connection;

use crate::DbError;

pub fn run_migrations(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(SCHEMA)?;
    migrate_legacy_tables(conn)?;
    Ok(())
}

fn migrate_legacy_tables(conn: &Connection) -> Result<(), DbError> {
    migrate_tokens_provider_column(conn)?;
    Ok(())
}

/// tokens: single-provider token tables get a provider column defaulting to youtube.
fn migrate_tokens_provider_column(conn: &Connection) -> Result<(), DbError> {
    if column_exists(conn, "tokens", "provider")? {
        return Ok(());
    }
    tracing::info!("Adding provider column to tokens");
    conn.execute_batch("ALTER TABLE tokens ADD COLUMN provider TEXT NOT NULL DEFAULT 'youtube';")?;
    Ok(())
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, DbError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let exists = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .any(|name| name.as_deref() == Ok(column));
    Ok(exists)
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tokens (
    id INTEGER PRIMARY KEY,
    provider TEXT NOT NULL DEFAULT 'youtube',
    access_token TEXT,
    refresh_token TEXT,
    scope TEXT,
    expires_at INTEGER
);

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    setting_type TEXT NOT NULL DEFAULT 'normal',
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS watched_channels (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    channel_id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS playlists (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    kind TEXT NOT NULL DEFAULT 'manual' CHECK(kind IN ('server', 'channel', 'manual')),
    youtube_playlist_id TEXT,
    watched_channel_id INTEGER,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (watched_channel_id) REFERENCES watched_channels(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_playlists_watched_channel_id
    ON playlists(watched_channel_id);

CREATE TABLE IF NOT EXISTS songs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    playlist_id INTEGER NOT NULL,
    youtube_video_id TEXT NOT NULL,
    youtube_playlist_item_id TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(playlist_id, youtube_video_id),
    FOREIGN KEY (playlist_id) REFERENCES playlists(id) ON DELETE CASCADE
);
"#;
