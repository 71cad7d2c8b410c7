//! Runtime application configuration loaded from DB + environment overrides.

use youtube_client::api::PrivacyStatus;

use super::manager::SettingsManager;

/// Runtime configuration populated from the settings DB.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub youtube_client_id: String,
    pub youtube_client_secret: String,
    pub playlist_privacy: PrivacyStatus,
    pub twitch_client_id: String,
    pub twitch_client_secret: String,
    pub twitch_user_id: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 8080,
            youtube_client_id: String::new(),
            youtube_client_secret: String::new(),
            playlist_privacy: PrivacyStatus::Public,
            twitch_client_id: String::new(),
            twitch_client_secret: String::new(),
            twitch_user_id: String::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the settings manager (DB-first, env overrides).
    pub fn load(sm: &SettingsManager) -> Result<Self, anyhow::Error> {
        let g = |key: &str| -> String { sm.get_setting(key).unwrap_or_default() };

        let mut server_port = parse_u16(&g("SERVER_PORT"), 8080);
        if let Ok(v) = std::env::var("SERVER_PORT") {
            if let Ok(p) = v.parse::<u16>() {
                server_port = p;
            }
        }

        let privacy = g("YOUTUBE_PLAYLIST_PRIVACY");
        let playlist_privacy = PrivacyStatus::parse(&privacy).unwrap_or_else(|| {
            tracing::warn!("Unknown playlist privacy {privacy:?}, using public");
            PrivacyStatus::Public
        });

        Ok(Self {
            server_port,
            youtube_client_id: g("YOUTUBE_CLIENT_ID"),
            youtube_client_secret: g("YOUTUBE_CLIENT_SECRET"),
            playlist_privacy,
            twitch_client_id: g("TWITCH_CLIENT_ID"),
            twitch_client_secret: g("TWITCH_CLIENT_SECRET"),
            twitch_user_id: g("TWITCH_USER_ID"),
        })
    }

    pub fn youtube_configured(&self) -> bool {
        !self.youtube_client_id.is_empty() && !self.youtube_client_secret.is_empty()
    }

    pub fn twitch_configured(&self) -> bool {
        !self.twitch_client_id.is_empty()
            && !self.twitch_client_secret.is_empty()
            && !self.twitch_user_id.is_empty()
    }

    pub fn youtube_redirect_uri(&self) -> String {
        format!("http://localhost:{}/callback/youtube", self.server_port)
    }

    pub fn twitch_redirect_uri(&self) -> String {
        format!("http://localhost:{}/callback/twitch", self.server_port)
    }
}

fn parse_u16(s: &str, default: u16) -> u16 {
    s.parse().unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_db::Database;

    #[test]
    fn test_load_from_settings() {
        let sm = SettingsManager::new(Database::open_in_memory().unwrap());
        sm.initialize_defaults().unwrap();
        sm.set_setting("YOUTUBE_PLAYLIST_PRIVACY", "unlisted").unwrap();
        sm.set_setting("TWITCH_USER_ID", "1234").unwrap();

        let config = AppConfig::load(&sm).unwrap();
        assert_eq!(config.playlist_privacy, PrivacyStatus::Unlisted);
        assert_eq!(config.twitch_user_id, "1234");
        assert!(!config.youtube_configured());
        assert!(!config.twitch_configured());
    }

    #[test]
    fn test_redirect_uris_follow_port() {
        let config = AppConfig {
            server_port: 9000,
            ..AppConfig::default()
        };
        assert_eq!(config.youtube_redirect_uri(), "http://localhost:9000/callback/youtube");
        assert_eq!(config.twitch_redirect_uri(), "http://localhost:9000/callback/twitch");
    }
}
