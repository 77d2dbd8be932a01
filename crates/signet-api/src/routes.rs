//! HTTP handlers. Thin by design: decode the body, call the engine, map the
//! outcome to the wire shape. Validation failures are 200 + `message`/`error`
//! (a node never crashes on a bad inbound payload); a signing failure is the
//! one fatal-internal case and surfaces as HTTP 500.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use signet_core::{
    AcceptTransactionRequest, ContainerName, DepositRequest, PrepareRequest,
    SendTransactionRequest, SignetError, Transaction, TransactionChain,
};
use signet_protocol::Node;

/// Map an engine error to the wire: signing failures are HTTP 500, anything
/// else is a 200 with a descriptive error body.
fn error_reply(e: SignetError) -> Response {
    match e {
        SignetError::Signing(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": format!("Error signing transaction: {e}") })),
        )
            .into_response(),
        other => Json(json!({ "error": other.to_string() })).into_response(),
    }
}

// ── Common routes ─────────────────────────────────────────────────────────────

pub async fn root(State(node): State<Arc<Node>>) -> Json<serde_json::Value> {
    Json(json!({ "message": format!("Hello from {}!", node.config.name) }))
}

pub async fn transactions(State(node): State<Arc<Node>>) -> Json<TransactionChain> {
    Json(node.chain_wire())
}

pub async fn public_key(State(node): State<Arc<Node>>) -> Json<serde_json::Value> {
    Json(json!({ "public_key": node.public_key_pem() }))
}

pub async fn verify_chain(State(node): State<Arc<Node>>) -> Json<serde_json::Value> {
    match node.verify_own_chain().await {
        Ok(()) => Json(json!({ "message": "Chain is valid" })),
        Err(_) => Json(json!({ "error": "Chain verification failed" })),
    }
}

// ── Participant routes ────────────────────────────────────────────────────────

pub async fn get_balance(State(node): State<Arc<Node>>) -> Json<serde_json::Value> {
    Json(json!({ "balance": node.balance_of(&node.config.name) }))
}

pub async fn show_transactions(State(node): State<Arc<Node>>) -> Json<serde_json::Value> {
    Json(json!({ "transaction_requests": node.pending_transactions() }))
}

pub async fn send_transaction(
    State(node): State<Arc<Node>>,
    Json(request): Json<SendTransactionRequest>,
) -> Response {
    match node.send_transaction(request).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => error_reply(e),
    }
}

pub async fn receive_transaction(
    State(node): State<Arc<Node>>,
    Json(tx): Json<Transaction>,
) -> Json<serde_json::Value> {
    node.receive_transaction(tx);
    Json(json!({ "message": "Transaction received" }))
}

pub async fn accept_transaction(
    State(node): State<Arc<Node>>,
    Json(request): Json<AcceptTransactionRequest>,
) -> Response {
    match node.accept_transaction(request.number).await {
        Ok(Some(reply)) => Json(json!({ "message": reply })).into_response(),
        Ok(None) => Json(json!({ "error": "Transaction was manipulated" })).into_response(),
        Err(SignetError::UnknownPendingIndex { .. }) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Invalid transaction index" })),
        )
            .into_response(),
        Err(e) => error_reply(e),
    }
}

pub async fn deposit_money(
    State(node): State<Arc<Node>>,
    Json(request): Json<DepositRequest>,
) -> Response {
    match node.deposit_money(request).await {
        Ok(reply) => Json(json!({ "message": reply })).into_response(),
        Err(e) => error_reply(e),
    }
}

pub async fn sign_money_deposit(
    State(node): State<Arc<Node>>,
    Json(tx): Json<Transaction>,
) -> Response {
    match node.sign_money_deposit(tx) {
        Ok(signed) => Json(signed).into_response(),
        Err(e) => error_reply(e),
    }
}

// ── Authority routes ──────────────────────────────────────────────────────────

pub async fn auth_deposit_money(
    State(node): State<Arc<Node>>,
    Json(request): Json<DepositRequest>,
) -> Response {
    match node.auth_deposit_money(request).await {
        Ok(verdict) => Json(json!({ "message": verdict.message() })).into_response(),
        Err(e) => error_reply(e),
    }
}

pub async fn verify_transaction(
    State(node): State<Arc<Node>>,
    Json(tx): Json<Transaction>,
) -> Response {
    match node.verify_transaction(tx).await {
        Ok(verdict) => Json(json!({ "message": verdict.message() })).into_response(),
        Err(e) => error_reply(e),
    }
}

pub async fn prepare_transaction(
    State(node): State<Arc<Node>>,
    Json(request): Json<PrepareRequest>,
) -> Response {
    Json(node.prepare_transaction(&request)).into_response()
}

pub async fn add_to_chain(State(node): State<Arc<Node>>, Json(tx): Json<Transaction>) -> Response {
    let outcome = node.add_to_chain(tx).await;
    Json(json!({ "message": outcome.message() })).into_response()
}

pub async fn unlock_transaction(State(node): State<Arc<Node>>) -> Json<serde_json::Value> {
    node.unlock_transaction();
    Json(json!({ "message": "unlocked" }))
}

pub async fn join(State(node): State<Arc<Node>>, Json(request): Json<ContainerName>) -> Response {
    match node.join(request.name).await {
        Ok(reply) => Json(json!({ "message": reply })).into_response(),
        Err(e) => error_reply(e),
    }
}

pub async fn synchronize(
    State(node): State<Arc<Node>>,
    Json(chain): Json<TransactionChain>,
) -> Response {
    let status = node.synchronize(chain).await;
    Json(json!({ "message": status.message() })).into_response()
}
