use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use signet_protocol::Node;

use crate::routes;

/// Build the node's HTTP surface. Paths (trailing slashes included) are the
/// wire contract; all bodies are JSON.
pub fn router(node: Arc<Node>) -> Router {
    let cors = CorsLayer::new().allow_methods(Any).allow_origin(Any).allow_headers(Any);

    Router::new()
        .route("/", get(routes::root))
        .route("/transactions", get(routes::transactions))
        .route("/public_key", get(routes::public_key))
        .route("/verify_chain", get(routes::verify_chain))
        .route("/get_balance", get(routes::get_balance))
        .route("/show_transactions", get(routes::show_transactions))
        .route("/send_transaction/", post(routes::send_transaction))
        .route("/receive_transaction/", post(routes::receive_transaction))
        .route("/accept_transaction/", post(routes::accept_transaction))
        .route("/deposit_money", post(routes::deposit_money))
        .route("/auth_deposit_money", post(routes::auth_deposit_money))
        .route("/sign_money_deposit", post(routes::sign_money_deposit))
        .route("/verify_transaction/", post(routes::verify_transaction))
        .route("/prepare_transaction", post(routes::prepare_transaction))
        .route("/add_to_chain/", post(routes::add_to_chain))
        .route("/unlock_transaction/", post(routes::unlock_transaction))
        .route("/join", post(routes::join))
        .route("/synchronize", post(routes::synchronize))
        .layer(cors)
        .with_state(node)
}

/// Serve the API on an already-bound listener until the process exits.
pub async fn serve(node: Arc<Node>, listener: tokio::net::TcpListener) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, name = %node.config.name, "API server started");
    }
    axum::serve(listener, router(node)).await
}
