//! All setting definitions with their default values.

use std::collections::HashMap;
use std::sync::LazyLock;

/// (key, default, secret, required, description)
type DefTuple = (&'static str, &'static str, bool, bool, &'static str);

const DEFS: &[DefTuple] = &[
    ("SERVER_PORT", "8080", false, false, "Admin HTTP server port"),
    ("YOUTUBE_CLIENT_ID", "", false, true, "Google OAuth client id"),
    ("YOUTUBE_CLIENT_SECRET", "", true, true, "Google OAuth client secret"),
    (
        "YOUTUBE_PLAYLIST_PRIVACY",
        "public",
        false,
        false,
        "Privacy of created YouTube playlists (public, unlisted, private)",
    ),
    ("TWITCH_CLIENT_ID", "", false, false, "Twitch application client id"),
    ("TWITCH_CLIENT_SECRET", "", true, false, "Twitch application client secret"),
    ("TWITCH_USER_ID", "", false, false, "Twitch user id of the account reading chat"),
];

/// A single setting definition.
#[derive(Debug, Clone)]
pub struct SettingDef {
    pub key: &'static str,
    pub default: &'static str,
    pub secret: bool,
    pub required: bool,
    pub description: &'static str,
}

/// Global setting definitions indexed by key.
pub static DEFAULT_SETTINGS: LazyLock<HashMap<&'static str, SettingDef>> = LazyLock::new(|| {
    DEFS.iter()
        .map(|&(key, default, secret, required, description)| {
            (
                key,
                SettingDef {
                    key,
                    default,
                    secret,
                    required,
                    description,
                },
            )
        })
        .collect()
});

pub fn get_default(key: &str) -> Option<&'static str> {
    DEFAULT_SETTINGS.get(key).map(|d| d.default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defs_are_unique_and_keyed() {
        assert_eq!(DEFAULT_SETTINGS.len(), DEFS.len());
        for (key, def) in DEFAULT_SETTINGS.iter() {
            assert_eq!(*key, def.key);
        }
        assert_eq!(get_default("SERVER_PORT"), Some("8080"));
        assert_eq!(get_default("NOPE"), None);
    }
}
