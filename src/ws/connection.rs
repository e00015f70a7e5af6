//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{PoolSelector, WsCommand, WsMessage, WsMessageType};
use super::subscription::EventFilter;
use crate::api::dto::PoolDetailResponse;
use crate::domain::{ParticipantId, PoolEvent, PoolId};
use crate::service::SettlementService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<PoolEvent>,
    settlement: Arc<SettlementService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut filter = EventFilter::new();

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut filter, &settlement).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Event from EventBus
            event = event_rx.recv() => {
                match event {
                    Ok(pool_event) => {
                        if filter.admits(&pool_event) {
                            let msg = WsMessage::new(
                                uuid::Uuid::new_v4().to_string(),
                                WsMessageType::Event,
                                serde_json::to_value(&pool_event).unwrap_or_default(),
                            );
                            let json = serde_json::to_string(&msg).unwrap_or_default();
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Handles a text message from the client, returning an optional JSON response.
async fn handle_text_message(
    text: &str,
    filter: &mut EventFilter,
    settlement: &SettlementService,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return serde_json::to_string(&WsMessage::error(String::new(), 400, "malformed JSON")).ok();
    };

    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return serde_json::to_string(&WsMessage::error(msg.id, 404, "unknown command")).ok();
    };

    let response = match command {
        WsCommand::Subscribe {
            pool_ids,
            participant,
            events,
        } => {
            if let Err(kind) = filter.set_kinds(&events) {
                return serde_json::to_string(&WsMessage::error(
                    msg.id,
                    400,
                    &format!("unknown event kind {kind}"),
                ))
                .ok();
            }
            let all = pool_ids.iter().any(PoolSelector::is_wildcard);
            filter.follow(&selected(&pool_ids), all);
            filter.set_participant(
                participant
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .map(ParticipantId::new),
            );
            WsMessage::new(msg.id, WsMessageType::Response, filter_state(filter))
        }
        WsCommand::Unsubscribe { pool_ids } => {
            filter.unfollow(&selected(&pool_ids));
            WsMessage::new(msg.id, WsMessageType::Response, filter_state(filter))
        }
        WsCommand::GetPool { pool_id } => match settlement.get_pool(PoolId::new(pool_id)).await {
            Ok(pool) => WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::to_value(PoolDetailResponse::from(&pool)).unwrap_or_default(),
            ),
            Err(err) => WsMessage::error(msg.id, err.error_code(), &err.to_string()),
        },
    };
    serde_json::to_string(&response).ok()
}

fn filter_state(filter: &EventFilter) -> serde_json::Value {
    serde_json::json!({
        "pools": filter.pools(),
        "all_pools": filter.follows_all(),
        "participant": filter.participant().map(ToString::to_string),
        "events": filter.kinds(),
    })
}

fn selected(pool_ids: &[PoolSelector]) -> Vec<PoolId> {
    pool_ids.iter().filter_map(PoolSelector::pool_id).collect()
}
