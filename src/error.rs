//! Settlement error types with HTTP status code mapping.
//!
//! [`SettlementError`] is the single error type shared by the domain, the
//! external collaborators, and the REST layer. Every variant carries a
//! numeric code and maps to an HTTP status and a structured JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Asset, ParticipantId, PoolId, SettlementHandle};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2003,
///     "message": "pool 0 is not open",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Every way a settlement operation can be rejected.
///
/// A rejected call never leaves partial state behind, so callers may
/// retry with different parameters.
///
/// # Error Code Ranges
///
/// | Range     | Category              | HTTP Status                  |
/// |-----------|-----------------------|------------------------------|
/// | 1000–1999 | Validation            | 400 Bad Request              |
/// | 2000–2999 | Not Found / Lifecycle | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server                | 500 Internal Server Error    |
/// | 4000–4999 | Settlement            | 422 Unprocessable Entity     |
/// | 5000–5999 | Authorization         | 403 Forbidden                |
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettlementError {
    /// The exchange facility has no synthetic route for the asset pair.
    #[error("no swappable synth route from {source_asset} to {target_asset}")]
    NoRouteFound {
        /// Requested source asset.
        source_asset: Asset,
        /// Requested target asset.
        target_asset: Asset,
    },

    /// No pool exists at the given index.
    #[error("pool {0} does not exist")]
    PoolNotFound(PoolId),

    /// Deposit or withdraw attempted after the swap was initiated.
    #[error("pool {0} is closed")]
    PoolNotOpen(PoolId),

    /// Finalize attempted on a pool that was never initiated.
    #[error("swap for pool {0} has not been initiated")]
    SwapNotInitiated(PoolId),

    /// Claim attempted before the swap was finalized.
    #[error("swap for pool {0} has not been finalized")]
    SwapNotFinalized(PoolId),

    /// Initiation attempted before the pool reached its threshold.
    #[error("pool {pool_id} has not reached its threshold ({contributed} < {threshold})")]
    ThresholdNotReached {
        /// Pool identifier.
        pool_id: PoolId,
        /// Current aggregate contribution.
        contributed: u128,
        /// Configured threshold.
        threshold: u128,
    },

    /// Finalize attempted before the settlement delay elapsed.
    #[error("synthetic position {0} has not matured")]
    NotYetMatured(SettlementHandle),

    /// Claim attempted by someone with no recorded contribution.
    #[error("{participant} did not participate in pool {pool_id}")]
    NotAParticipant {
        /// Pool identifier.
        pool_id: PoolId,
        /// The caller.
        participant: ParticipantId,
    },

    /// Second claim attempted by the same participant.
    #[error("{participant} already claimed from pool {pool_id}")]
    AlreadyClaimed {
        /// Pool identifier.
        pool_id: PoolId,
        /// The caller.
        participant: ParticipantId,
    },

    /// Withdraw attempted with no recorded contribution.
    #[error("insufficient balance in pool {pool_id} for {participant}")]
    InsufficientBalance {
        /// Pool identifier.
        pool_id: PoolId,
        /// The caller.
        participant: ParticipantId,
    },

    /// The exchange returned less than the caller-supplied minimum.
    #[error("slippage exceeded: expected at least {minimum}, got {received}")]
    SlippageExceeded {
        /// Caller-supplied minimum.
        minimum: u128,
        /// Amount the exchange would deliver.
        received: u128,
    },

    /// Amount must be strictly positive.
    #[error("amount must be greater than zero")]
    InvalidAmount,

    /// Attached native value does not match what the asset leg requires.
    #[error("attached value {attached} does not match required {expected}")]
    ValueMismatch {
        /// Value the leg requires.
        expected: u128,
        /// Value the caller attached.
        attached: u128,
    },

    /// Caller is not the configured operator.
    #[error("{0} is not authorized to perform this operation")]
    Unauthorized(ParticipantId),

    /// The exchange does not know the given settlement handle.
    #[error("unknown settlement handle {0}")]
    UnknownHandle(SettlementHandle),

    /// A transfer could not be funded from the account's balance.
    #[error("insufficient {asset} funds for {account}: needed {needed}, available {available}")]
    InsufficientFunds {
        /// Account being debited.
        account: ParticipantId,
        /// Asset being moved.
        asset: Asset,
        /// Amount requested.
        needed: u128,
        /// Amount held.
        available: u128,
    },

    /// Integer arithmetic overflowed.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SettlementError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidAmount => 1002,
            Self::ValueMismatch { .. } => 1003,
            Self::PoolNotFound(_) => 2001,
            Self::UnknownHandle(_) => 2002,
            Self::PoolNotOpen(_) => 2003,
            Self::SwapNotInitiated(_) => 2004,
            Self::SwapNotFinalized(_) => 2005,
            Self::NotYetMatured(_) => 2006,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::ArithmeticOverflow => 3002,
            Self::NoRouteFound { .. } => 4001,
            Self::ThresholdNotReached { .. } => 4002,
            Self::InsufficientBalance { .. } => 4003,
            Self::SlippageExceeded { .. } => 4004,
            Self::NotAParticipant { .. } => 4005,
            Self::AlreadyClaimed { .. } => 4006,
            Self::InsufficientFunds { .. } => 4007,
            Self::Unauthorized(_) => 5001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidAmount | Self::ValueMismatch { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::PoolNotFound(_) | Self::UnknownHandle(_) => StatusCode::NOT_FOUND,
            Self::PoolNotOpen(_)
            | Self::SwapNotInitiated(_)
            | Self::SwapNotFinalized(_)
            | Self::NotYetMatured(_) => StatusCode::CONFLICT,
            Self::NoRouteFound { .. }
            | Self::ThresholdNotReached { .. }
            | Self::InsufficientBalance { .. }
            | Self::SlippageExceeded { .. }
            | Self::NotAParticipant { .. }
            | Self::AlreadyClaimed { .. }
            | Self::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::ArithmeticOverflow | Self::PersistenceError(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for SettlementError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_errors_are_conflicts() {
        let err = SettlementError::PoolNotOpen(PoolId::new(3));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), 2003);
        assert_eq!(err.to_string(), "pool 3 is closed");
    }

    #[test]
    fn claim_errors_are_distinguishable() {
        let who = ParticipantId::new("alice");
        let not_in = SettlementError::NotAParticipant {
            pool_id: PoolId::new(0),
            participant: who.clone(),
        };
        let twice = SettlementError::AlreadyClaimed {
            pool_id: PoolId::new(0),
            participant: who,
        };
        assert_ne!(not_in.error_code(), twice.error_code());
        assert_ne!(not_in.to_string(), twice.to_string());
    }

    #[test]
    fn into_response_carries_status() {
        let response = SettlementError::Unauthorized(ParticipantId::new("mallory")).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
