//! Trait seams between the broadcast engine and the platform client.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::SendReceipt;

/// Anything that can deliver a text message to a chat.
///
/// The engine is generic over this so tests can drive a full broadcast
/// cycle with a recording mock instead of the network.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<SendReceipt>;
}
