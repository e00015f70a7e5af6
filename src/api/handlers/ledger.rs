//! Deposit ledger handlers: deposit and withdraw while a pool is open.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::caller::caller;
use crate::api::dto::{
    DepositRequest, DepositResponse, WithdrawRequest, WithdrawResponse, parse_amount,
    parse_optional_amount,
};
use crate::app_state::AppState;
use crate::domain::PoolId;
use crate::error::{ErrorResponse, SettlementError};

/// `POST /pools/:id/deposit`: Contribute source asset to an open pool.
///
/// # Errors
///
/// Returns [`SettlementError`] on a missing or closed pool, a zero amount,
/// mismatched attached value, or insufficient caller funds.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/deposit",
    tag = "Ledger",
    summary = "Deposit into a pool",
    description = "Moves the caller's source asset into custody and records the contribution. For a native source asset `attached_value` must equal `amount`.",
    params(
        ("id" = u64, Path, description = "Pool index"),
        ("x-participant-id" = String, Header, description = "Caller identity"),
    ),
    request_body = DepositRequest,
    responses(
        (status = 200, description = "Deposit recorded", body = DepositResponse),
        (status = 400, description = "Invalid amount or attached value", body = ErrorResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
        (status = 409, description = "Pool is closed", body = ErrorResponse),
        (status = 422, description = "Insufficient funds", body = ErrorResponse),
    )
)]
pub async fn deposit(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(req): Json<DepositRequest>,
) -> Result<impl IntoResponse, SettlementError> {
    let who = caller(&headers)?;
    let pool_id = PoolId::new(id);
    let amount = parse_amount("amount", &req.amount)?;
    let attached_value = parse_optional_amount("attached_value", req.attached_value.as_deref())?;

    let receipt = state
        .settlement
        .deposit(pool_id, &who, amount, attached_value)
        .await?;

    Ok(Json(DepositResponse {
        command_id: uuid::Uuid::new_v4().to_string(),
        pool_id: id,
        participant: who.to_string(),
        amount: receipt.amount.to_string(),
        contribution: receipt.contribution.to_string(),
        pool_total: receipt.pool_total.to_string(),
    }))
}

/// `POST /pools/:id/withdraw`: Reclaim contribution from an open pool.
///
/// # Errors
///
/// Returns [`SettlementError`] on a missing or closed pool, a zero amount,
/// or a caller with no balance.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/withdraw",
    tag = "Ledger",
    summary = "Withdraw from a pool",
    description = "Returns up to `amount` of the caller's contribution. Requests above the balance release the full balance.",
    params(
        ("id" = u64, Path, description = "Pool index"),
        ("x-participant-id" = String, Header, description = "Caller identity"),
    ),
    request_body = WithdrawRequest,
    responses(
        (status = 200, description = "Withdrawal recorded", body = WithdrawResponse),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
        (status = 409, description = "Pool is closed", body = ErrorResponse),
        (status = 422, description = "No balance to withdraw", body = ErrorResponse),
    )
)]
pub async fn withdraw(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(req): Json<WithdrawRequest>,
) -> Result<impl IntoResponse, SettlementError> {
    let who = caller(&headers)?;
    let pool_id = PoolId::new(id);
    let requested = parse_amount("amount", &req.amount)?;

    let receipt = state.settlement.withdraw(pool_id, &who, requested).await?;

    Ok(Json(WithdrawResponse {
        command_id: uuid::Uuid::new_v4().to_string(),
        pool_id: id,
        participant: who.to_string(),
        requested: requested.to_string(),
        withdrawn: receipt.amount.to_string(),
        contribution: receipt.contribution.to_string(),
        pool_total: receipt.pool_total.to_string(),
    }))
}

/// Deposit ledger routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pools/{id}/deposit", post(deposit))
        .route("/pools/{id}/withdraw", post(withdraw))
}
