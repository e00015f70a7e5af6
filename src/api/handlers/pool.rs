//! Pool registry handlers: create, list, get, participant state, quote.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::caller::caller;
use crate::api::dto::{
    CreatePoolRequest, CreatePoolResponse, PaginationParams, ParticipantResponse,
    PoolDetailResponse, PoolListResponse, PoolSummaryDto, QuoteResponse, parse_amount,
};
use crate::app_state::AppState;
use crate::domain::{Asset, ParticipantId, PoolId, PoolPhase};
use crate::error::{ErrorResponse, SettlementError};

/// `POST /pools`: Create a new settlement pool.
///
/// # Errors
///
/// Returns [`SettlementError`] on invalid input, unauthorized caller, or an
/// unroutable asset pair.
#[utoipa::path(
    post,
    path = "/api/v1/pools",
    tag = "Pools",
    summary = "Create a settlement pool",
    description = "Creates an open pool over a source/target asset pair. The exchange must offer a synthetic route between them. Operator only.",
    request_body = CreatePoolRequest,
    params(
        ("x-participant-id" = String, Header, description = "Caller identity"),
    ),
    responses(
        (status = 201, description = "Pool created", body = CreatePoolResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Caller is not the operator", body = ErrorResponse),
        (status = 422, description = "No synthetic route for the pair", body = ErrorResponse),
    )
)]
pub async fn create_pool(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreatePoolRequest>,
) -> Result<impl IntoResponse, SettlementError> {
    let who = caller(&headers)?;
    let source: Asset = req
        .source_asset
        .parse()
        .map_err(SettlementError::InvalidRequest)?;
    let target: Asset = req
        .target_asset
        .parse()
        .map_err(SettlementError::InvalidRequest)?;
    let threshold = parse_amount("threshold", &req.threshold)?;

    let pool_id = state
        .settlement
        .create_pool(&who, source, target, threshold)
        .await?;
    let pool = state.settlement.get_pool(pool_id).await?;

    let response = CreatePoolResponse {
        pool_id: pool_id.get(),
        source_asset: pool.source_asset.to_string(),
        target_asset: pool.target_asset.to_string(),
        synthetic: pool.synthetic.to_string(),
        threshold: pool.threshold.to_string(),
        phase: PoolPhase::Open.as_str().to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /pools`: List all pools with pagination.
///
/// # Errors
///
/// Returns [`SettlementError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/pools",
    tag = "Pools",
    summary = "List pools",
    description = "Returns a paginated list of all pools in creation order.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated pool list", body = PoolListResponse),
    )
)]
pub async fn list_pools(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, SettlementError> {
    let summaries = state.settlement.list_pools().await;
    let (page, pagination) = params.paginate(summaries);
    let data = page.into_iter().map(PoolSummaryDto::from).collect();

    Ok(Json(PoolListResponse { data, pagination }))
}

/// `GET /pools/:id`: Get pool details.
///
/// # Errors
///
/// Returns [`SettlementError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}",
    tag = "Pools",
    summary = "Get pool details",
    description = "Returns the full record of a single pool: phase, totals, synthetic position and custody.",
    params(
        ("id" = u64, Path, description = "Pool index"),
    ),
    responses(
        (status = 200, description = "Pool details", body = PoolDetailResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn get_pool(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, SettlementError> {
    let pool = state.settlement.get_pool(PoolId::new(id)).await?;
    Ok(Json(PoolDetailResponse::from(&pool)))
}

/// `GET /pools/:id/participants/:who`: Contribution and claim state.
///
/// # Errors
///
/// Returns [`SettlementError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}/participants/{who}",
    tag = "Pools",
    summary = "Get participant state",
    description = "Returns the participant's recorded contribution, whether they claimed, and the share a claim would pay now.",
    params(
        ("id" = u64, Path, description = "Pool index"),
        ("who" = String, Path, description = "Participant identity"),
    ),
    responses(
        (status = 200, description = "Participant state", body = ParticipantResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn get_participant(
    State(state): State<AppState>,
    Path((id, who)): Path<(u64, String)>,
) -> Result<impl IntoResponse, SettlementError> {
    let status = state
        .settlement
        .participant_status(PoolId::new(id), &ParticipantId::new(who))
        .await?;
    Ok(Json(ParticipantResponse::from(status)))
}

/// `GET /pools/:id/quote`: Quote both swap legs (read-only).
///
/// # Errors
///
/// Returns [`SettlementError`] on a missing pool or an exchange quoting
/// failure.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}/quote",
    tag = "Pools",
    summary = "Quote the pool swap",
    description = "Returns expected synthetic and target amounts at current exchange rates. Clients derive their slippage guards from this.",
    params(
        ("id" = u64, Path, description = "Pool index"),
    ),
    responses(
        (status = 200, description = "Quote computed", body = QuoteResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn quote_pool(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, SettlementError> {
    let quote = state.settlement.quote(PoolId::new(id)).await?;
    Ok(Json(QuoteResponse::from(quote)))
}

/// Pool registry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pools", post(create_pool).get(list_pools))
        .route("/pools/{id}", get(get_pool))
        .route("/pools/{id}/participants/{who}", get(get_participant))
        .route("/pools/{id}/quote", get(quote_pool))
}
