//! Chat message ingestion: watched-channel filter, link extraction and
//! hand-off to the reconciler.

pub mod links;
mod listener;

pub use listener::{IncomingMessage, IngestError, IngestReport, MessageListener};
