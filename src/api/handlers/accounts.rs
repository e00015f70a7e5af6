//! Simulated account handlers: balance lookup and operator credit.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::caller::caller;
use crate::api::dto::{BalanceResponse, CreditRequest, parse_amount};
use crate::app_state::AppState;
use crate::domain::{Asset, ParticipantId};
use crate::error::{ErrorResponse, SettlementError};

/// `GET /accounts/:who/balances/:asset`: Balance held by an account.
///
/// # Errors
///
/// Returns [`SettlementError::InvalidRequest`] for a malformed asset id.
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{who}/balances/{asset}",
    tag = "Accounts",
    summary = "Get account balance",
    description = "Returns the simulated balance of `asset` held by `who`.",
    params(
        ("who" = String, Path, description = "Account identity"),
        ("asset" = String, Path, description = "`native` or a token id"),
    ),
    responses(
        (status = 200, description = "Balance", body = BalanceResponse),
        (status = 400, description = "Invalid asset", body = ErrorResponse),
    )
)]
pub async fn get_balance(
    State(state): State<AppState>,
    Path((who, asset)): Path<(String, String)>,
) -> Result<impl IntoResponse, SettlementError> {
    let account = ParticipantId::new(who);
    let asset: Asset = asset.parse().map_err(SettlementError::InvalidRequest)?;
    let balance = state.accounts.balance_of(&account, &asset)?;

    Ok(Json(BalanceResponse {
        account: account.to_string(),
        asset: asset.to_string(),
        balance: balance.to_string(),
    }))
}

/// `POST /accounts/:who/credit`: Mint simulated funds into an account.
///
/// # Errors
///
/// Returns [`SettlementError::Unauthorized`] for non-operators or
/// [`SettlementError::InvalidRequest`] for malformed input.
#[utoipa::path(
    post,
    path = "/api/v1/accounts/{who}/credit",
    tag = "Accounts",
    summary = "Credit an account",
    description = "Adds simulated funds to an account so it can deposit. Operator only.",
    params(
        ("who" = String, Path, description = "Account identity"),
        ("x-participant-id" = String, Header, description = "Caller identity"),
    ),
    request_body = CreditRequest,
    responses(
        (status = 200, description = "Balance after credit", body = BalanceResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Caller is not the operator", body = ErrorResponse),
    )
)]
pub async fn credit(
    State(state): State<AppState>,
    Path(who): Path<String>,
    headers: HeaderMap,
    Json(req): Json<CreditRequest>,
) -> Result<impl IntoResponse, SettlementError> {
    state.settlement.ensure_operator(&caller(&headers)?)?;
    let account = ParticipantId::new(who);
    let asset: Asset = req.asset.parse().map_err(SettlementError::InvalidRequest)?;
    let amount = parse_amount("amount", &req.amount)?;

    let balance = state.accounts.credit(&account, &asset, amount)?;
    tracing::debug!(%account, %asset, amount, "account credited");

    Ok(Json(BalanceResponse {
        account: account.to_string(),
        asset: asset.to_string(),
        balance: balance.to_string(),
    }))
}

/// Account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts/{who}/balances/{asset}", get(get_balance))
        .route("/accounts/{who}/credit", post(credit))
}
