//! Initiate, finalize and claim DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /pools/:id/initiate`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct InitiateRequest {
    /// Minimum synthetic the first leg must deliver. Defaults to zero.
    #[serde(default)]
    pub min_synthetic_out: Option<String>,
}

/// Response body for `POST /pools/:id/initiate`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InitiateResponse {
    /// Correlation id for this command.
    pub command_id: String,
    /// Pool index.
    pub pool_id: u64,
    /// Synthetic position handle.
    pub settlement_handle: u64,
    /// Source amount handed to the exchange.
    pub amount_in: String,
    /// Synthetic asset held.
    pub synthetic: String,
    /// Synthetic amount received.
    pub synthetic_received: String,
    /// Settlement delay imposed by the exchange, in seconds.
    pub maturity_delay_secs: u64,
    /// Earliest instant the position can be finalized.
    pub matures_at: DateTime<Utc>,
}

/// Request body for `POST /pools/:id/finalize`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct FinalizeRequest {
    /// Minimum target the second leg must deliver. Defaults to zero.
    #[serde(default)]
    pub min_target_out: Option<String>,
}

/// Response body for `POST /pools/:id/finalize`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FinalizeResponse {
    /// Correlation id for this command.
    pub command_id: String,
    /// Pool index.
    pub pool_id: u64,
    /// Target asset received.
    pub target_asset: String,
    /// Target amount realized.
    pub realized_output: String,
}

/// Response body for `POST /pools/:id/claim`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClaimResponse {
    /// Correlation id for this command.
    pub command_id: String,
    /// Pool index.
    pub pool_id: u64,
    /// Claimant.
    pub participant: String,
    /// Target asset paid.
    pub target_asset: String,
    /// Share paid.
    pub share: String,
}
