//! Pool-related DTOs for create, get, list, participant and quote.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::{Pool, PoolSummary};
use crate::service::{ParticipantStatus, SwapQuote};

/// Request body for `POST /pools`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePoolRequest {
    /// Asset depositors contribute (`"native"` or a token id).
    pub source_asset: String,
    /// Asset participants receive (`"native"` or a token id).
    pub target_asset: String,
    /// Minimum aggregate contribution before the swap may be initiated.
    pub threshold: String,
}

/// Response body for `POST /pools` (201 Created).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePoolResponse {
    /// Sequential pool index.
    pub pool_id: u64,
    /// Source asset.
    pub source_asset: String,
    /// Target asset.
    pub target_asset: String,
    /// Synthetic route resolved for the pair.
    pub synthetic: String,
    /// Threshold echoed from the request.
    pub threshold: String,
    /// Pool phase.
    pub phase: String,
}

/// Single pool detail for `GET /pools/:id`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PoolDetailResponse {
    /// Pool index.
    pub pool_id: u64,
    /// Source asset.
    pub source_asset: String,
    /// Target asset.
    pub target_asset: String,
    /// Synthetic route.
    pub synthetic: String,
    /// Initiation threshold.
    pub threshold: String,
    /// Pool phase (`open`, `initiated`, `finalized`).
    pub phase: String,
    /// Aggregate active contribution.
    pub total_contributed: String,
    /// Number of participants with a non-zero contribution.
    pub participant_count: usize,
    /// Synthetic position handle, once initiated.
    pub settlement_handle: Option<u64>,
    /// Synthetic amount received at initiation.
    pub synthetic_received: String,
    /// Target amount realized at finalization.
    pub realized_output: String,
    /// Amount still held in custody for this pool.
    pub custody: String,
    /// Sum of shares paid out.
    pub total_claimed: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Initiation timestamp.
    pub initiated_at: Option<DateTime<Utc>>,
    /// Finalization timestamp.
    pub finalized_at: Option<DateTime<Utc>>,
}

impl From<&Pool> for PoolDetailResponse {
    fn from(pool: &Pool) -> Self {
        Self {
            pool_id: pool.id.get(),
            source_asset: pool.source_asset.to_string(),
            target_asset: pool.target_asset.to_string(),
            synthetic: pool.synthetic.to_string(),
            threshold: pool.threshold.to_string(),
            phase: pool.phase.as_str().to_string(),
            total_contributed: pool.total_contributed.to_string(),
            participant_count: pool.participant_count(),
            settlement_handle: pool.settlement_handle.map(|h| h.get()),
            synthetic_received: pool.synthetic_received.to_string(),
            realized_output: pool.realized_output.to_string(),
            custody: pool.custody.to_string(),
            total_claimed: pool.total_claimed.to_string(),
            created_at: pool.created_at,
            updated_at: pool.last_modified_at,
            initiated_at: pool.initiated_at,
            finalized_at: pool.finalized_at,
        }
    }
}

/// Pool summary for list responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PoolSummaryDto {
    /// Pool index.
    pub pool_id: u64,
    /// Source asset.
    pub source_asset: String,
    /// Target asset.
    pub target_asset: String,
    /// Pool phase.
    pub phase: String,
    /// Aggregate active contribution.
    pub total_contributed: String,
    /// Initiation threshold.
    pub threshold: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<PoolSummary> for PoolSummaryDto {
    fn from(s: PoolSummary) -> Self {
        Self {
            pool_id: s.pool_id.get(),
            source_asset: s.source_asset.to_string(),
            target_asset: s.target_asset.to_string(),
            phase: s.phase.as_str().to_string(),
            total_contributed: s.total_contributed.to_string(),
            threshold: s.threshold.to_string(),
            created_at: s.created_at,
        }
    }
}

/// Paginated list response for `GET /pools`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PoolListResponse {
    /// Pool summaries.
    pub data: Vec<PoolSummaryDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Response body for `GET /pools/:id/participants/:who`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ParticipantResponse {
    /// Pool index.
    pub pool_id: u64,
    /// Participant identity.
    pub participant: String,
    /// Recorded contribution.
    pub contribution: String,
    /// Whether the share was already claimed.
    pub claimed: bool,
    /// Share a claim would pay right now.
    pub claimable: String,
}

impl From<ParticipantStatus> for ParticipantResponse {
    fn from(s: ParticipantStatus) -> Self {
        Self {
            pool_id: s.pool_id.get(),
            participant: s.participant.to_string(),
            contribution: s.contribution.to_string(),
            claimed: s.claimed,
            claimable: s.claimable.to_string(),
        }
    }
}

/// Response body for `GET /pools/:id/quote`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuoteResponse {
    /// Pool index.
    pub pool_id: u64,
    /// Pool phase.
    pub phase: String,
    /// Source amount of the first leg.
    pub source_amount: String,
    /// Synthetic expected (or held) after the first leg.
    pub expected_synthetic: String,
    /// Target expected from the second leg.
    pub expected_target: String,
    /// Synthetic position handle, once initiated.
    pub settlement_handle: Option<u64>,
    /// Whether the synthetic position has matured.
    pub matured: bool,
    /// Server timestamp of the quote.
    pub quoted_at: DateTime<Utc>,
}

impl From<SwapQuote> for QuoteResponse {
    fn from(q: SwapQuote) -> Self {
        Self {
            pool_id: q.pool_id.get(),
            phase: q.phase.as_str().to_string(),
            source_amount: q.source_amount.to_string(),
            expected_synthetic: q.expected_synthetic.to_string(),
            expected_target: q.expected_target.to_string(),
            settlement_handle: q.settlement_handle.map(|h| h.get()),
            matured: q.matured,
            quoted_at: Utc::now(),
        }
    }
}
