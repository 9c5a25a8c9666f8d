//! # groupcast-telegram
//! Typed client for the Telegram Bot API — the only platform surface
//! groupcast talks to. Authentication, transport and wire encoding all
//! live behind `api.telegram.org`; this crate just shapes the calls.

pub mod api;
pub mod poller;
pub mod types;

pub use api::TelegramApi;
pub use poller::{spawn_update_stream, UpdateStream};
