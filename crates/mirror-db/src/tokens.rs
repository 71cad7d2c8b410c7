//! OAuth token storage, one logical slot per provider.

use crate::{Database, DbError, OptionalExt};
use serde::{Deserialize, Serialize};

pub const PROVIDER_YOUTUBE: &str = "youtube";
pub const PROVIDER_TWITCH: &str = "twitch";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_at: i64,
}

impl Database {
    /// Append a token for `provider`. The newest row wins on read.
    pub fn save_token(&self, provider: &str, token: &Token) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tokens (provider, access_token, refresh_token, scope, expires_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![provider, token.access_token, token.refresh_token, token.scope, token.expires_at],
            )?;
            Ok(())
        })
    }

    pub fn get_latest_token(&self, provider: &str) -> Result<Option<Token>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT access_token, refresh_token, scope, expires_at FROM tokens
                 WHERE provider = ?1 ORDER BY id DESC LIMIT 1",
            )?;
            let token = stmt
                .query_row([provider], |row| {
                    Ok(Token {
                        access_token: row.get(0)?,
                        refresh_token: row.get(1)?,
                        scope: row.get(2)?,
                        expires_at: row.get(3)?,
                    })
                })
                .optional()?;
            Ok(token)
        })
    }

    pub fn delete_tokens(&self, provider: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM tokens WHERE provider = ?1", [provider])?;
            Ok(())
        })
    }
}
