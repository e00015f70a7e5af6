//! Application wiring: collaborators, service, state and router.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use chrono::TimeDelta;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::config::SettlementConfig;
use crate::custody::{AccountBook, TransferAgent};
use crate::domain::{EventBus, PoolRegistry};
use crate::exchange::{SimulatedExchange, SynthExchange};
use crate::service::SettlementService;
use crate::ws::handler::ws_handler;

/// Fully wired in-memory engine.
#[derive(Debug, Clone)]
pub struct Engine {
    /// Handler state.
    pub state: AppState,
    /// Exchange facility, exposed so callers can drive its clock.
    pub exchange: Arc<SimulatedExchange>,
}

/// Builds the exchange, balance book, registry, bus and service from
/// `config`.
#[must_use]
pub fn build_engine(config: &SettlementConfig) -> Engine {
    let delay = TimeDelta::seconds(i64::try_from(config.settlement_delay_secs).unwrap_or(i64::MAX));
    let exchange = Arc::new(
        SimulatedExchange::new(delay, config.exchange_fee_bps)
            .with_listings(config.listings.iter().cloned()),
    );
    let accounts = Arc::new(AccountBook::new(config.custody_account.clone()));
    let event_bus = EventBus::new(config.event_bus_capacity);

    let settlement = Arc::new(SettlementService::new(
        Arc::new(PoolRegistry::new()),
        Arc::clone(&exchange) as Arc<dyn SynthExchange>,
        Arc::clone(&accounts) as Arc<dyn TransferAgent>,
        event_bus.clone(),
        config.operator.clone(),
    ));

    Engine {
        state: AppState {
            settlement,
            accounts,
            event_bus,
        },
        exchange,
    }
}

/// Builds the HTTP router: REST API, WebSocket endpoint, tracing and CORS.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::net::SocketAddr;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::config::{DEFAULT_LISTINGS, parse_listings};
    use crate::domain::ParticipantId;

    fn config() -> SettlementConfig {
        SettlementConfig {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            operator: ParticipantId::new("operator"),
            custody_account: ParticipantId::new("custody"),
            settlement_delay_secs: 60,
            exchange_fee_bps: 0,
            listings: parse_listings(DEFAULT_LISTINGS).unwrap_or_default(),
            database_url: String::new(),
            database_max_connections: 1,
            database_min_connections: 0,
            database_connect_timeout_secs: 1,
            persistence_enabled: false,
            event_bus_capacity: 16,
        }
    }

    #[tokio::test]
    async fn health_is_served_at_root() {
        let app = build_app(build_engine(&config()).state);
        let Ok(request) = Request::builder().uri("/health").body(Body::empty()) else {
            panic!("request should build");
        };
        let Ok(response) = app.oneshot(request).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_pool_maps_to_not_found() {
        let app = build_app(build_engine(&config()).state);
        let Ok(request) = Request::builder()
            .uri("/api/v1/pools/7")
            .body(Body::empty())
        else {
            panic!("request should build");
        };
        let Ok(response) = app.oneshot(request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_pool_requires_participant_header() {
        let app = build_app(build_engine(&config()).state);
        let Ok(request) = Request::builder()
            .method("POST")
            .uri("/api/v1/pools")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"source_asset":"DAI","target_asset":"WBTC","threshold":"100"}"#,
            ))
        else {
            panic!("request should build");
        };
        let Ok(response) = app.oneshot(request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn engine_uses_configured_listings() {
        let engine = build_engine(&config());
        assert_eq!(engine.exchange.settlement_delay(), TimeDelta::seconds(60));
        assert_eq!(
            engine.state.settlement.operator(),
            &ParticipantId::new("operator")
        );
    }
}
