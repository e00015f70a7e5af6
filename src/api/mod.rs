//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All endpoints are mounted under `/api/v1`; the caller identity travels
//! in the `x-participant-id` header.

pub mod caller;
pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document covering every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "synth-pool-settlement",
        description = "Pooled synthetic-route swap settlement engine"
    ),
    paths(
        handlers::pool::create_pool,
        handlers::pool::list_pools,
        handlers::pool::get_pool,
        handlers::pool::get_participant,
        handlers::pool::quote_pool,
        handlers::ledger::deposit,
        handlers::ledger::withdraw,
        handlers::settlement::initiate,
        handlers::settlement::finalize,
        handlers::settlement::claim,
        handlers::accounts::get_balance,
        handlers::accounts::credit,
        handlers::system::health_handler,
    ),
    tags(
        (name = "Pools", description = "Pool registry"),
        (name = "Ledger", description = "Deposits and withdrawals"),
        (name = "Settlement", description = "Swap lifecycle and claims"),
        (name = "Accounts", description = "Simulated balances"),
        (name = "System", description = "Service status"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
