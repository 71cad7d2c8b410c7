//! Mirrors YouTube links posted in watched Twitch chats into YouTube playlists.

pub mod app;
pub mod background;
pub mod bootstrap;
pub mod chat_bridge;
pub mod config;
pub mod ingest;
pub mod reconcile;
pub mod server;
pub mod watch;

pub use bootstrap::init_foundation;
