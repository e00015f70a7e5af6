//! Swap lifecycle handlers: initiate, finalize, claim.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::caller::caller;
use crate::api::dto::{
    ClaimResponse, FinalizeRequest, FinalizeResponse, InitiateRequest, InitiateResponse,
    parse_optional_amount,
};
use crate::app_state::AppState;
use crate::domain::PoolId;
use crate::error::{ErrorResponse, SettlementError};
use crate::service::Initiation;

/// `POST /pools/:id/initiate`: Convert the pooled source into the synthetic.
///
/// # Errors
///
/// Returns [`SettlementError`] when the caller is not the operator, the
/// pool is missing, closed or below threshold, or the slippage guard trips.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/initiate",
    tag = "Settlement",
    summary = "Initiate the pool swap",
    description = "Hands the pooled source asset to the exchange and opens the synthetic position. Closes the pool to deposits and withdrawals. Operator only.",
    params(
        ("id" = u64, Path, description = "Pool index"),
        ("x-participant-id" = String, Header, description = "Caller identity"),
    ),
    request_body = InitiateRequest,
    responses(
        (status = 200, description = "Swap initiated", body = InitiateResponse),
        (status = 403, description = "Caller is not the operator", body = ErrorResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
        (status = 409, description = "Pool is closed", body = ErrorResponse),
        (status = 422, description = "Threshold not reached or slippage exceeded", body = ErrorResponse),
    )
)]
pub async fn initiate(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(req): Json<InitiateRequest>,
) -> Result<impl IntoResponse, SettlementError> {
    let who = caller(&headers)?;
    let min_out = parse_optional_amount("min_synthetic_out", req.min_synthetic_out.as_deref())?;
    let pool_id = PoolId::new(id);

    let Initiation {
        amount_in,
        position,
    } = state.settlement.initiate(pool_id, &who, min_out).await?;

    Ok(Json(InitiateResponse {
        command_id: uuid::Uuid::new_v4().to_string(),
        pool_id: id,
        settlement_handle: position.handle.get(),
        amount_in: amount_in.to_string(),
        synthetic: position.synthetic.to_string(),
        synthetic_received: position.balance.to_string(),
        maturity_delay_secs: position.maturity_delay_secs,
        matures_at: position.matures_at,
    }))
}

/// `POST /pools/:id/finalize`: Redeem the matured synthetic into the target.
///
/// # Errors
///
/// Returns [`SettlementError`] when the pool is missing or not initiated,
/// the position has not matured, or the slippage guard trips.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/finalize",
    tag = "Settlement",
    summary = "Finalize the pool swap",
    description = "Converts the matured synthetic into the target asset and opens claims. Callable by anyone.",
    params(
        ("id" = u64, Path, description = "Pool index"),
    ),
    request_body = FinalizeRequest,
    responses(
        (status = 200, description = "Swap finalized", body = FinalizeResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
        (status = 409, description = "Not initiated or not yet matured", body = ErrorResponse),
        (status = 422, description = "Slippage exceeded", body = ErrorResponse),
    )
)]
pub async fn finalize(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<FinalizeRequest>,
) -> Result<impl IntoResponse, SettlementError> {
    let min_out = parse_optional_amount("min_target_out", req.min_target_out.as_deref())?;
    let pool_id = PoolId::new(id);

    let payout = state.settlement.finalize(pool_id, min_out).await?;

    Ok(Json(FinalizeResponse {
        command_id: uuid::Uuid::new_v4().to_string(),
        pool_id: id,
        target_asset: payout.asset.to_string(),
        realized_output: payout.amount.to_string(),
    }))
}

/// `POST /pools/:id/claim`: Collect the caller's share of the output.
///
/// # Errors
///
/// Returns [`SettlementError`] when the pool is missing or not finalized,
/// the caller did not participate, or already claimed.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/claim",
    tag = "Settlement",
    summary = "Claim a share",
    description = "Pays floor(realized * contribution / total) of the target asset to the caller. Each participant may claim once.",
    params(
        ("id" = u64, Path, description = "Pool index"),
        ("x-participant-id" = String, Header, description = "Caller identity"),
    ),
    responses(
        (status = 200, description = "Share paid", body = ClaimResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
        (status = 409, description = "Swap not finalized", body = ErrorResponse),
        (status = 422, description = "Not a participant or already claimed", body = ErrorResponse),
    )
)]
pub async fn claim(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, SettlementError> {
    let who = caller(&headers)?;
    let pool_id = PoolId::new(id);

    let payout = state.settlement.claim(pool_id, &who).await?;

    Ok(Json(ClaimResponse {
        command_id: uuid::Uuid::new_v4().to_string(),
        pool_id: id,
        participant: who.to_string(),
        target_asset: payout.asset.to_string(),
        share: payout.amount.to_string(),
    }))
}

/// Swap lifecycle routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pools/{id}/initiate", post(initiate))
        .route("/pools/{id}/finalize", post(finalize))
        .route("/pools/{id}/claim", post(claim))
}
