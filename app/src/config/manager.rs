//! SettingsManager: DB-backed settings with defaults, env migration, and feature status.

use std::collections::HashMap;

use mirror_db::Database;

use super::defaults::DEFAULT_SETTINGS;
use super::validation::validate_setting;
use super::{FeatureStatus, SettingInfo, SettingType};

/// Wraps [`Database`] to provide high-level settings operations.
pub struct SettingsManager {
    db: Database,
}

fn setting_type(key: &str) -> SettingType {
    match DEFAULT_SETTINGS.get(key) {
        Some(d) if d.secret => SettingType::Secret,
        _ => SettingType::Normal,
    }
}

impl SettingsManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Get a setting value. Falls back to the default if not in DB.
    pub fn get_setting(&self, key: &str) -> Result<String, anyhow::Error> {
        if let Some(val) = self.db.get_setting(key)? {
            return Ok(val);
        }
        if let Some(def) = DEFAULT_SETTINGS.get(key) {
            return Ok(def.default.to_string());
        }
        anyhow::bail!("setting not found: {key}");
    }

    /// Set a setting value with validation.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), anyhow::Error> {
        if !DEFAULT_SETTINGS.contains_key(key) {
            anyhow::bail!("unknown setting key: {key}");
        }
        validate_setting(key, value).map_err(|e| anyhow::anyhow!("validation error for {key}: {e}"))?;
        self.db.set_setting(key, value, setting_type(key).as_str())?;
        Ok(())
    }

    /// All known settings with secret values masked.
    pub fn get_all_settings(&self) -> Result<HashMap<String, SettingInfo>, anyhow::Error> {
        let stored = self.db.get_all_settings()?;
        let mut result = HashMap::new();

        for (key, def) in DEFAULT_SETTINGS.iter() {
            let value = stored
                .get(*key)
                .cloned()
                .unwrap_or_else(|| def.default.to_string());
            let has_value = !value.is_empty();
            let setting_type = setting_type(key);
            let shown = if setting_type == SettingType::Secret && has_value {
                "********".to_string()
            } else {
                value
            };
            result.insert(
                key.to_string(),
                SettingInfo {
                    key: key.to_string(),
                    value: shown,
                    setting_type,
                    required: def.required,
                    description: def.description.to_string(),
                    has_value,
                },
            );
        }

        Ok(result)
    }

    /// Initialize default settings in DB (skip existing).
    pub fn initialize_defaults(&self) -> Result<(), anyhow::Error> {
        for (key, def) in DEFAULT_SETTINGS.iter() {
            if self.db.get_setting(key)?.is_some() {
                continue;
            }
            self.db.set_setting(key, def.default, setting_type(key).as_str())?;
        }
        Ok(())
    }

    /// Copy settings from environment variables into the DB (one-time, per key).
    pub fn migrate_from_env(&self) -> Result<u32, anyhow::Error> {
        self.migrate_from(|key| std::env::var(key).ok())
    }

    pub(crate) fn migrate_from(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<u32, anyhow::Error> {
        let mut migrated = 0u32;
        for key in DEFAULT_SETTINGS.keys() {
            if self.db.get_setting(key)?.is_some() {
                continue;
            }
            let Some(value) = lookup(key).filter(|v| !v.is_empty()) else {
                continue;
            };
            if let Err(e) = validate_setting(key, &value) {
                tracing::warn!("Ignoring invalid env setting {key}: {e}");
                continue;
            }
            self.db.set_setting(key, &value, setting_type(key).as_str())?;
            tracing::info!("Migrated setting from env: {key}");
            migrated += 1;
        }
        if migrated > 0 {
            tracing::info!("Migration completed: {migrated} settings migrated");
        }
        Ok(migrated)
    }

    /// Check which integrations are configured.
    pub fn check_feature_status(&self) -> Result<FeatureStatus, anyhow::Error> {
        let mut status = FeatureStatus {
            youtube_configured: true,
            twitch_configured: true,
            missing_settings: Vec::new(),
            warnings: Vec::new(),
        };

        for key in ["YOUTUBE_CLIENT_ID", "YOUTUBE_CLIENT_SECRET"] {
            if self.get_setting(key)?.is_empty() {
                status.missing_settings.push(key.to_string());
                status.youtube_configured = false;
            }
        }

        for key in ["TWITCH_CLIENT_ID", "TWITCH_CLIENT_SECRET", "TWITCH_USER_ID"] {
            if self.get_setting(key)?.is_empty() {
                status.missing_settings.push(key.to_string());
                status.twitch_configured = false;
            }
        }

        if !status.twitch_configured {
            status
                .warnings
                .push("Twitch chat is not configured - links are only added through the API".into());
        }

        Ok(status)
    }

    pub fn db(&self) -> &Database {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SettingsManager {
        SettingsManager::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn test_defaults_and_overrides() {
        let sm = manager();
        sm.initialize_defaults().unwrap();
        assert_eq!(sm.get_setting("SERVER_PORT").unwrap(), "8080");
        sm.set_setting("SERVER_PORT", "9090").unwrap();
        assert_eq!(sm.get_setting("SERVER_PORT").unwrap(), "9090");
        assert!(sm.set_setting("SERVER_PORT", "nope").is_err());
        assert!(sm.set_setting("UNKNOWN", "x").is_err());
        assert!(sm.get_setting("UNKNOWN").is_err());
    }

    #[test]
    fn test_migrate_skips_existing_and_invalid() {
        let sm = manager();
        sm.set_setting("SERVER_PORT", "9000").unwrap();
        let env: HashMap<&str, &str> = [
            ("SERVER_PORT", "7000"),
            ("YOUTUBE_PLAYLIST_PRIVACY", "bogus"),
            ("TWITCH_USER_ID", "42"),
        ]
        .into_iter()
        .collect();

        let migrated = sm
            .migrate_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(migrated, 1);
        assert_eq!(sm.get_setting("SERVER_PORT").unwrap(), "9000");
        assert_eq!(sm.get_setting("YOUTUBE_PLAYLIST_PRIVACY").unwrap(), "public");
        assert_eq!(sm.get_setting("TWITCH_USER_ID").unwrap(), "42");
    }

    #[test]
    fn test_secrets_are_masked() {
        let sm = manager();
        sm.set_setting("YOUTUBE_CLIENT_SECRET", "shh").unwrap();
        let all = sm.get_all_settings().unwrap();
        let secret = &all["YOUTUBE_CLIENT_SECRET"];
        assert_eq!(secret.value, "********");
        assert_eq!(secret.setting_type, SettingType::Secret);
        assert!(secret.has_value);
    }

    #[test]
    fn test_feature_status() {
        let sm = manager();
        let status = sm.check_feature_status().unwrap();
        assert!(!status.youtube_configured);
        assert!(!status.twitch_configured);
        assert!(status.missing_settings.contains(&"YOUTUBE_CLIENT_ID".to_string()));
    }
}
