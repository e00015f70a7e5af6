//! WebSocket message types: envelope, commands, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::PoolId;

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server message stamped with the current time.
    #[must_use]
    pub fn new(id: String, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id,
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an error message with a numeric code.
    #[must_use]
    pub fn error(id: String, code: u32, message: &str) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message }),
        )
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send over WebSocket, carried in the
/// envelope's `payload`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Subscribe to events for specific pools.
    Subscribe {
        /// Pool indices to subscribe to. Use `["*"]` for all pools.
        pool_ids: Vec<PoolSelector>,
        /// Only deliver ledger and claim events of this participant.
        #[serde(default)]
        participant: Option<String>,
        /// Only deliver these event kinds; empty means all.
        #[serde(default)]
        events: Vec<String>,
    },
    /// Unsubscribe from events for specific pools.
    Unsubscribe {
        /// Pool indices to unsubscribe from.
        pool_ids: Vec<PoolSelector>,
    },
    /// Get the current pool record.
    GetPool {
        /// Target pool index.
        pool_id: u64,
    },
}

/// One entry of a subscription list: a pool index or the `"*"` wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PoolSelector {
    /// A single pool.
    Id(u64),
    /// A pool index or wildcard given as a string.
    Text(String),
}

impl PoolSelector {
    /// Returns the selected pool, or `None` for the wildcard and garbage.
    #[must_use]
    pub fn pool_id(&self) -> Option<PoolId> {
        match self {
            Self::Id(id) => Some(PoolId::new(*id)),
            Self::Text(s) => s.trim().parse().ok().map(PoolId::new),
        }
    }

    /// Returns `true` for the `"*"` wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim() == "*")
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_command_accepts_numbers_strings_and_wildcard() {
        let Ok(cmd) = serde_json::from_value::<WsCommand>(serde_json::json!({
            "command": "subscribe",
            "pool_ids": [0, "3", "*"]
        })) else {
            panic!("command should parse");
        };
        let WsCommand::Subscribe {
            pool_ids,
            participant,
            events,
        } = cmd
        else {
            panic!("expected subscribe");
        };
        assert_eq!(pool_ids.first().and_then(PoolSelector::pool_id), Some(PoolId::new(0)));
        assert_eq!(pool_ids.get(1).and_then(PoolSelector::pool_id), Some(PoolId::new(3)));
        assert!(pool_ids.get(2).is_some_and(PoolSelector::is_wildcard));
        assert!(participant.is_none());
        assert!(events.is_empty());
    }

    #[test]
    fn subscribe_command_carries_participant_and_kinds() {
        let Ok(WsCommand::Subscribe {
            participant,
            events,
            ..
        }) = serde_json::from_value::<WsCommand>(serde_json::json!({
            "command": "subscribe",
            "pool_ids": [1],
            "participant": "alice",
            "events": ["share_claimed"]
        }))
        else {
            panic!("command should parse");
        };
        assert_eq!(participant.as_deref(), Some("alice"));
        assert_eq!(events, vec!["share_claimed".to_string()]);
    }

    #[test]
    fn unknown_command_is_rejected() {
        let result = serde_json::from_value::<WsCommand>(serde_json::json!({
            "command": "swap",
            "pool_id": 1
        }));
        assert!(result.is_err());
    }
}
