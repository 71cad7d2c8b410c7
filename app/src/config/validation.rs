//! Setting value validation.

use regex::Regex;
use std::sync::LazyLock;

static RE_GOOGLE_CLIENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+-[0-9A-Za-z_]+\.apps\.googleusercontent\.com$").unwrap());
static RE_TWITCH_CLIENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-z]{30}$").unwrap());
static RE_NUMERIC_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{1,20}$").unwrap());

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
/// Empty values are accepted for optional credentials.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        "SERVER_PORT" => {
            let v: u32 = value.parse().map_err(|_| "must be an integer")?;
            if !(1..=65535).contains(&v) {
                return Err("must be between 1 and 65535".into());
            }
        }
        "YOUTUBE_CLIENT_ID" => {
            if !value.is_empty() && !RE_GOOGLE_CLIENT_ID.is_match(value) {
                return Err("expected a Google OAuth client id (...apps.googleusercontent.com)".into());
            }
        }
        "YOUTUBE_PLAYLIST_PRIVACY" => {
            if !["public", "unlisted", "private"].contains(&value) {
                return Err("must be public, unlisted, or private".into());
            }
        }
        "TWITCH_CLIENT_ID" => {
            if !value.is_empty() && !RE_TWITCH_CLIENT_ID.is_match(value) {
                return Err("expected a 30 character Twitch client id".into());
            }
        }
        "TWITCH_USER_ID" => {
            if !value.is_empty() && !RE_NUMERIC_ID.is_match(value) {
                return Err("must be a numeric Twitch user id".into());
            }
        }
        _ => {}
    }
    Ok(())
}
