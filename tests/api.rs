//! End-to-end tests driving the real router over TCP.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::TimeDelta;
use futures_util::{SinkExt, StreamExt};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

use synth_pool_settlement::api::dto::{
    BalanceResponse, ClaimResponse, CreatePoolResponse, DepositResponse, FinalizeResponse,
    InitiateResponse, ParticipantResponse, PoolDetailResponse, PoolListResponse, QuoteResponse,
    WithdrawResponse,
};
use synth_pool_settlement::app::{build_app, build_engine};
use synth_pool_settlement::config::{SettlementConfig, parse_listings};
use synth_pool_settlement::domain::ParticipantId;
use synth_pool_settlement::exchange::SimulatedExchange;

const OPERATOR: &str = "operator";
const ETHER: u128 = 1_000_000_000_000_000_000;

struct TestServer {
    base: String,
    addr: SocketAddr,
    exchange: Arc<SimulatedExchange>,
    client: reqwest::Client,
}

fn config() -> SettlementConfig {
    SettlementConfig {
        listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        operator: ParticipantId::new(OPERATOR),
        custody_account: ParticipantId::new("custody"),
        settlement_delay_secs: 300,
        exchange_fee_bps: 30,
        listings: parse_listings("DAI:sUSD:1,WBTC:sBTC:60000,native:sETH:3000")
            .unwrap_or_default(),
        database_url: String::new(),
        database_max_connections: 1,
        database_min_connections: 0,
        database_connect_timeout_secs: 1,
        persistence_enabled: false,
        event_bus_capacity: 256,
    }
}

async fn spawn_server() -> TestServer {
    let engine = build_engine(&config());
    let exchange = Arc::clone(&engine.exchange);
    let app = build_app(engine.state);

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("failed to bind test listener");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("listener has no local address");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    TestServer {
        base: format!("http://{addr}/api/v1"),
        addr,
        exchange,
        client: reqwest::Client::new(),
    }
}

impl TestServer {
    async fn post(&self, path: &str, who: &str, body: Value) -> reqwest::Response {
        let Ok(response) = self
            .client
            .post(format!("{}{path}", self.base))
            .header("x-participant-id", who)
            .json(&body)
            .send()
            .await
        else {
            panic!("POST {path} failed");
        };
        response
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        let Ok(response) = self.client.get(format!("{}{path}", self.base)).send().await else {
            panic!("GET {path} failed");
        };
        response
    }

    async fn credit(&self, who: &str, asset: &str, amount: u128) {
        let response = self
            .post(
                &format!("/accounts/{who}/credit"),
                OPERATOR,
                json!({ "asset": asset, "amount": amount.to_string() }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    async fn create_pool(&self, source: &str, target: &str, threshold: u128) -> u64 {
        let response = self
            .post(
                "/pools",
                OPERATOR,
                json!({
                    "source_asset": source,
                    "target_asset": target,
                    "threshold": threshold.to_string(),
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let Ok(created) = response.json::<CreatePoolResponse>().await else {
            panic!("invalid create response");
        };
        created.pool_id
    }

    async fn balance(&self, who: &str, asset: &str) -> u128 {
        let Ok(body) = self
            .get(&format!("/accounts/{who}/balances/{asset}"))
            .await
            .json::<BalanceResponse>()
            .await
        else {
            panic!("invalid balance response");
        };
        body.balance.parse().unwrap_or_default()
    }
}

async fn error_code(response: reqwest::Response) -> u64 {
    let Ok(body) = response.json::<Value>().await else {
        panic!("error body is not JSON");
    };
    body["error"]["code"].as_u64().unwrap_or_default()
}

#[tokio::test]
async fn full_pool_lifecycle_over_http() {
    let server = spawn_server().await;
    server.credit("alice", "DAI", 1_000_000 * ETHER).await;
    server.credit("bob", "DAI", 1_000_000 * ETHER).await;

    let pool_id = server.create_pool("DAI", "WBTC", 750_000 * ETHER).await;
    let Ok(detail) = server
        .get(&format!("/pools/{pool_id}"))
        .await
        .json::<PoolDetailResponse>()
        .await
    else {
        panic!("invalid pool detail");
    };
    assert_eq!(detail.synthetic, "sBTC");
    assert_eq!(detail.phase, "open");

    // Deposits
    let response = server
        .post(
            &format!("/pools/{pool_id}/deposit"),
            "alice",
            json!({ "amount": (750_000 * ETHER).to_string() }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let Ok(deposit) = response.json::<DepositResponse>().await else {
        panic!("invalid deposit response");
    };
    assert_eq!(deposit.pool_total, (750_000 * ETHER).to_string());

    let response = server
        .post(
            &format!("/pools/{pool_id}/deposit"),
            "bob",
            json!({ "amount": (300_000 * ETHER).to_string() }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Partial withdraw leaves bob with a quarter of the pool.
    let response = server
        .post(
            &format!("/pools/{pool_id}/withdraw"),
            "bob",
            json!({ "amount": (50_000 * ETHER).to_string() }),
        )
        .await;
    let Ok(withdraw) = response.json::<WithdrawResponse>().await else {
        panic!("invalid withdraw response");
    };
    assert_eq!(withdraw.withdrawn, (50_000 * ETHER).to_string());
    assert_eq!(withdraw.contribution, (250_000 * ETHER).to_string());
    assert_eq!(server.balance("bob", "DAI").await, 750_000 * ETHER);

    // Only the operator may initiate.
    let response = server
        .post(&format!("/pools/{pool_id}/initiate"), "alice", json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let Ok(quote) = server
        .get(&format!("/pools/{pool_id}/quote"))
        .await
        .json::<QuoteResponse>()
        .await
    else {
        panic!("invalid quote");
    };
    let response = server
        .post(
            &format!("/pools/{pool_id}/initiate"),
            OPERATOR,
            json!({ "min_synthetic_out": quote.expected_synthetic }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let Ok(initiated) = response.json::<InitiateResponse>().await else {
        panic!("invalid initiate response");
    };
    assert_eq!(initiated.maturity_delay_secs, 300);
    assert_eq!(initiated.amount_in, (1_000_000 * ETHER).to_string());

    // Closed to ledger moves.
    let response = server
        .post(
            &format!("/pools/{pool_id}/deposit"),
            "alice",
            json!({ "amount": "1" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(response).await, 2003);

    // Not yet matured.
    let response = server
        .post(&format!("/pools/{pool_id}/finalize"), "carol", json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(response).await, 2006);

    assert!(server.exchange.advance(TimeDelta::seconds(300)).is_ok());
    let response = server
        .post(&format!("/pools/{pool_id}/finalize"), "carol", json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let Ok(finalized) = response.json::<FinalizeResponse>().await else {
        panic!("invalid finalize response");
    };
    let realized: u128 = finalized.realized_output.parse().unwrap_or_default();
    assert!(realized > 0);

    // Claims.
    let Ok(status) = server
        .get(&format!("/pools/{pool_id}/participants/alice"))
        .await
        .json::<ParticipantResponse>()
        .await
    else {
        panic!("invalid participant response");
    };
    assert_eq!(status.claimable, (realized * 3 / 4).to_string());

    let response = server
        .post(&format!("/pools/{pool_id}/claim"), "alice", json!({}))
        .await;
    let Ok(claim) = response.json::<ClaimResponse>().await else {
        panic!("invalid claim response");
    };
    assert_eq!(claim.share, (realized * 3 / 4).to_string());
    assert_eq!(server.balance("alice", "WBTC").await, realized * 3 / 4);

    let response = server
        .post(&format!("/pools/{pool_id}/claim"), "alice", json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(response).await, 4006);

    let response = server
        .post(&format!("/pools/{pool_id}/claim"), "mallory", json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(response).await, 4005);

    let response = server
        .post(&format!("/pools/{pool_id}/claim"), "bob", json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(server.balance("bob", "WBTC").await, realized / 4);
}

#[tokio::test]
async fn native_source_requires_attached_value() {
    let server = spawn_server().await;
    server.credit("alice", "native", 10 * ETHER).await;
    let pool_id = server.create_pool("native", "DAI", 5 * ETHER).await;

    let response = server
        .post(
            &format!("/pools/{pool_id}/deposit"),
            "alice",
            json!({ "amount": (5 * ETHER).to_string() }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, 1003);

    let response = server
        .post(
            &format!("/pools/{pool_id}/deposit"),
            "alice",
            json!({
                "amount": (5 * ETHER).to_string(),
                "attached_value": (5 * ETHER).to_string(),
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(server.balance("alice", "native").await, 5 * ETHER);
}

#[tokio::test]
async fn pool_creation_is_validated() {
    let server = spawn_server().await;

    let response = server
        .post(
            "/pools",
            "alice",
            json!({ "source_asset": "DAI", "target_asset": "WBTC", "threshold": "1" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = server
        .post(
            "/pools",
            OPERATOR,
            json!({ "source_asset": "DOGE", "target_asset": "WBTC", "threshold": "1" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(response).await, 4001);

    let response = server
        .post(
            "/pools",
            OPERATOR,
            json!({ "source_asset": "DAI", "target_asset": "WBTC", "threshold": "lots" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    server.create_pool("DAI", "WBTC", 1).await;
    server.create_pool("WBTC", "native", 1).await;
    let Ok(list) = server
        .get("/pools?page=1&per_page=1")
        .await
        .json::<PoolListResponse>()
        .await
    else {
        panic!("invalid pool list");
    };
    assert_eq!(list.data.len(), 1);
    assert_eq!(list.pagination.total, 2);
    assert_eq!(list.pagination.total_pages, 2);
}

#[tokio::test]
async fn websocket_streams_subscribed_events() {
    let server = spawn_server().await;
    let Ok((mut ws, _)) = tokio_tungstenite::connect_async(format!("ws://{}/ws", server.addr)).await
    else {
        panic!("websocket handshake failed");
    };

    let subscribe = json!({
        "id": "sub-1",
        "type": "command",
        "timestamp": chrono::Utc::now(),
        "payload": { "command": "subscribe", "pool_ids": ["*"] }
    });
    assert!(ws.send(Message::text(subscribe.to_string())).await.is_ok());
    let Some(Ok(Message::Text(ack))) = ws.next().await else {
        panic!("expected subscribe response");
    };
    let Ok(ack) = serde_json::from_str::<Value>(ack.as_str()) else {
        panic!("response is not JSON");
    };
    assert_eq!(ack["id"], "sub-1");
    assert_eq!(ack["payload"]["all_pools"], true);

    let pool_id = server.create_pool("DAI", "WBTC", 10).await;

    let Some(Ok(Message::Text(event))) = ws.next().await else {
        panic!("expected event");
    };
    let Ok(event) = serde_json::from_str::<Value>(event.as_str()) else {
        panic!("event is not JSON");
    };
    assert_eq!(event["type"], "event");
    assert_eq!(event["payload"]["event_type"], "pool_created");
    assert_eq!(event["payload"]["pool_id"], pool_id);
}

#[tokio::test]
async fn websocket_filters_by_participant_and_kind() {
    let server = spawn_server().await;
    let Ok((mut ws, _)) = tokio_tungstenite::connect_async(format!("ws://{}/ws", server.addr)).await
    else {
        panic!("websocket handshake failed");
    };

    let subscribe = json!({
        "id": "sub-alice",
        "type": "command",
        "timestamp": chrono::Utc::now(),
        "payload": {
            "command": "subscribe",
            "pool_ids": ["*"],
            "participant": "alice",
            "events": ["deposited"]
        }
    });
    assert!(ws.send(Message::text(subscribe.to_string())).await.is_ok());
    let Some(Ok(Message::Text(ack))) = ws.next().await else {
        panic!("expected subscribe response");
    };
    let Ok(ack) = serde_json::from_str::<Value>(ack.as_str()) else {
        panic!("response is not JSON");
    };
    assert_eq!(ack["payload"]["participant"], "alice");
    assert_eq!(ack["payload"]["events"], json!(["deposited"]));

    let pool_id = server.create_pool("DAI", "WBTC", 100 * ETHER).await;
    server.credit("bob", "DAI", 10 * ETHER).await;
    server.credit("alice", "DAI", 10 * ETHER).await;
    let deposit = json!({ "amount": (5 * ETHER).to_string() });
    let response = server
        .post(&format!("/pools/{pool_id}/deposit"), "bob", deposit.clone())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = server
        .post(&format!("/pools/{pool_id}/deposit"), "alice", deposit)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let Some(Ok(Message::Text(event))) = ws.next().await else {
        panic!("expected event");
    };
    let Ok(event) = serde_json::from_str::<Value>(event.as_str()) else {
        panic!("event is not JSON");
    };
    assert_eq!(event["payload"]["event_type"], "deposited");
    assert_eq!(event["payload"]["participant"], "alice");
}

#[tokio::test]
async fn custody_account_is_refused_as_depositor() {
    let server = spawn_server().await;
    let pool_id = server.create_pool("DAI", "WBTC", 100 * ETHER).await;
    server.credit("custody", "DAI", 10 * ETHER).await;

    let response = server
        .post(
            &format!("/pools/{pool_id}/deposit"),
            "custody",
            json!({ "amount": (10 * ETHER).to_string() }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let Ok(detail) = server
        .get(&format!("/pools/{pool_id}"))
        .await
        .json::<PoolDetailResponse>()
        .await
    else {
        panic!("pool detail is not JSON");
    };
    assert_eq!(detail.total_contributed, "0");
}
