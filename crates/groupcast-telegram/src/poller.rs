//! Background long-poll loop feeding roster events to the rest of the app.

use futures::stream::Stream;
use groupcast_core::types::RosterEvent;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::api::TelegramApi;

/// Spawn the long-poll task — returns a stream of roster events.
///
/// Poll errors are logged and retried after a short pause; the task only
/// exits when the receiving side of the stream is dropped.
pub fn spawn_update_stream(api: TelegramApi) -> UpdateStream {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut api = api;
        tracing::info!("📡 update poll loop started");

        loop {
            match api.get_updates().await {
                Ok(updates) => {
                    for update in updates {
                        if let Some(event) = update.roster_event()
                            && tx.send(event).is_err()
                        {
                            tracing::info!("update poll loop stopped (receiver dropped)");
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("⚠️ update poll error: {e}");
                    tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
                }
            }
        }
    });

    UpdateStream { rx }
}

/// Stream of membership events derived from platform updates.
pub struct UpdateStream {
    rx: tokio::sync::mpsc::UnboundedReceiver<RosterEvent>,
}

impl Stream for UpdateStream {
    type Item = RosterEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Unpin for UpdateStream {}
