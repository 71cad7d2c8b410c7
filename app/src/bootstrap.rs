use std::path::PathBuf;
use std::sync::Arc;

use mirror_db::Database;

use crate::config::{AppConfig, SettingsManager};
use crate::watch::WatchMembership;

/// Foundation init (fatal on error): env, data dir, database, settings,
/// and the watch membership cache.
pub fn init_foundation() -> Result<(Database, AppConfig, Arc<WatchMembership>), anyhow::Error> {
    load_dotenv();
    let dir = data_dir();
    std::fs::create_dir_all(&dir)?;

    let db_path = dir.join("mirror.db");
    tracing::info!("Opening database at {}", db_path.display());
    let db = Database::open(&db_path)?;

    let sm = SettingsManager::new(db.clone());
    if let Err(e) = sm.migrate_from_env() {
        tracing::error!("Failed to migrate from env: {e}");
    }
    sm.initialize_defaults()?;

    let config = AppConfig::load(&sm)?;

    if let Ok(status) = sm.check_feature_status() {
        if !status.missing_settings.is_empty() {
            tracing::warn!(
                "Missing settings: {:?}, warnings: {:?}",
                status.missing_settings,
                status.warnings
            );
        }
    }

    let membership = Arc::new(WatchMembership::new());
    let watched = membership.initialize(&db)?;
    tracing::info!(watched, "Watch membership loaded");

    tracing::info!("Settings loaded (port={})", config.server_port);
    Ok((db, config, membership))
}

/// Determine the data directory for the application.
/// Priority: PLAYLIST_MIRROR_DATA_DIR env var > ~/.playlist-mirror
fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PLAYLIST_MIRROR_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".playlist-mirror")
}

/// Load .env from multiple candidate paths.
fn load_dotenv() {
    let candidates = [".env", "../.env", "../../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::info!("No .env file found, using system environment variables");
}
