//! Telegram Bot API client — getMe, getUpdates, sendMessage.
//!
//! Every method POSTs JSON to `{base_url}/bot{TOKEN}/{method}` and decodes
//! the standard `{ok, result, ...}` envelope. Failures keep the server's
//! `error_code` and `parameters` so callers can react to kicks, flood
//! control and supergroup migrations without string matching.

use async_trait::async_trait;
use groupcast_core::config::GroupcastConfig;
use groupcast_core::error::{GroupcastError, Result};
use groupcast_core::traits::Messenger;
use groupcast_core::types::SendReceipt;

use crate::types::{ApiEnvelope, Message, Update, User};

/// Bot API client. Cheap to clone — the underlying `reqwest::Client`
/// shares its connection pool across clones.
#[derive(Clone)]
pub struct TelegramApi {
    client: reqwest::Client,
    base_url: String,
    bot_token: String,
    poll_timeout: u64,
    /// Last update_id seen, for long-poll offset tracking.
    last_update_id: Option<i64>,
}

impl TelegramApi {
    pub fn new(config: &GroupcastConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(config.api.user_agent.clone())
            // Long polls hold the connection open for poll_timeout seconds;
            // give the transport some slack on top of that.
            .timeout(std::time::Duration::from_secs(
                config.timing.poll_timeout_secs + 15,
            ))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            poll_timeout: config.timing.poll_timeout_secs,
            last_update_id: None,
        }
    }

    /// Build API URL for a method.
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.bot_token, method)
    }

    /// POST one Bot API method and decode its envelope.
    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let response = self
            .client
            .post(self.api_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| GroupcastError::Http(format!("{method} failed: {e}")))?;

        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| GroupcastError::Http(format!("invalid {method} response: {e}")))?;

        check_envelope(method, envelope)
    }

    // ─── Bot Info ───────────────────────────────────

    /// Check the token and fetch the bot's own account.
    /// API: POST /bot{TOKEN}/getMe
    ///
    /// A rejected token comes back as `Auth` so startup can fail fast
    /// with a message that points at the credential, not the network.
    pub async fn get_me(&self) -> Result<User> {
        match self.call("getMe", serde_json::json!({})).await {
            Err(GroupcastError::Api {
                code: code @ (401 | 404),
                description,
                ..
            }) => Err(GroupcastError::Auth(format!(
                "bot token rejected ({code}): {description}"
            ))),
            other => other,
        }
    }

    // ─── Updates (Long Polling) ────────────────────

    /// Fetch the next batch of updates via long polling.
    /// API: POST /bot{TOKEN}/getUpdates
    ///
    /// Tracks the offset internally so each update is delivered once.
    /// Only `message` and `my_chat_member` updates are requested — the
    /// two kinds the roster is built from.
    pub async fn get_updates(&mut self) -> Result<Vec<Update>> {
        let mut body = serde_json::json!({
            "timeout": self.poll_timeout,
            "allowed_updates": ["message", "my_chat_member"],
        });
        if let Some(last) = self.last_update_id {
            body["offset"] = serde_json::Value::from(last + 1);
        }

        let updates: Vec<Update> = self.call("getUpdates", body).await?;
        if let Some(last) = updates.last() {
            self.last_update_id = Some(last.update_id);
        }
        Ok(updates)
    }

    /// Get bot token (for display/debug).
    pub fn token_preview(&self) -> String {
        if self.bot_token.len() > 10 {
            format!(
                "{}...{}",
                &self.bot_token[..5],
                &self.bot_token[self.bot_token.len() - 5..]
            )
        } else {
            "***".into()
        }
    }
}

#[async_trait]
impl Messenger for TelegramApi {
    /// Send a plain-text message.
    /// API: POST /bot{TOKEN}/sendMessage
    ///
    /// No parse_mode — the promo text is sent exactly as configured, so
    /// stray `*` or `_` characters can never turn into a 400.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<SendReceipt> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        let message: Message = self.call("sendMessage", body).await?;
        Ok(SendReceipt {
            message_id: message.message_id,
            date: Some(message.date),
        })
    }
}

/// Turn a decoded envelope into a result, keeping the structured failure
/// parameters the server attached.
fn check_envelope<T>(method: &str, envelope: ApiEnvelope<T>) -> Result<T> {
    if envelope.ok {
        envelope
            .result
            .ok_or_else(|| GroupcastError::Http(format!("{method}: ok response without result")))
    } else {
        let parameters = envelope.parameters.unwrap_or_default();
        Err(GroupcastError::Api {
            code: envelope.error_code.unwrap_or(0),
            description: envelope
                .description
                .unwrap_or_else(|| "unknown error".into()),
            retry_after: parameters.retry_after,
            migrate_to_chat_id: parameters.migrate_to_chat_id,
        })
    }
}
