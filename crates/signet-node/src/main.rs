//! signet-node — the Signet node binary.
//!
//! Startup sequence:
//!   1. Load (or generate on first start) the RSA keypair in --key-dir
//!   2. Build the protocol engine over the HTTP peer adapter
//!   3. Spawn the deadlock watchdog
//!   4. Optionally join an authority (participants)
//!   5. Serve the JSON-over-HTTP API
//!
//! One binary serves every endpoint; whether a node acts as an authority is
//! decided by its membership in the authority list and by which endpoints
//! peers call.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use signet_core::{Clock, KeyResolver, KeyStore, SystemClock, Transport, DEFAULT_AUTHORITIES, PEER_PORT};
use signet_crypto::DiskKeyStore;
use signet_peer::{HttpKeyResolver, HttpTransport, PeerClient};
use signet_protocol::{run_watchdog, Node, NodeConfig};

#[derive(Parser, Debug)]
#[command(
    name = "signet-node",
    version,
    about = "Signet node — a permissioned ledger of authority-signed transfers"
)]
struct Args {
    /// This node's name. Peers reach it at http://<name>:<peer-port>.
    #[arg(long, env = "CONTAINERNAME")]
    name: String,

    /// Listen address for the HTTP API.
    #[arg(long, default_value = "0.0.0.0:8000")]
    listen: SocketAddr,

    /// Authority names, comma-separated. Every authority, self included when
    /// this node is one.
    #[arg(long, env = "AUTHORITY_NODES", value_delimiter = ',')]
    authorities: Vec<String>,

    /// Directory holding private_key.pem / public_key.pem (generated on
    /// first start).
    #[arg(long, default_value = ".")]
    key_dir: PathBuf,

    /// Port peers listen on.
    #[arg(long, default_value_t = PEER_PORT)]
    peer_port: u16,

    /// Authority to join at startup (participants; retried is not needed —
    /// a failed join is logged and can be repeated via the CLI).
    #[arg(long)]
    join: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,signet=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!(name = %args.name, "Signet node starting");

    // ── Key material ──────────────────────────────────────────────────────────
    let keys = Arc::new(DiskKeyStore::open(&args.key_dir).context("loading key material")?)
        as Arc<dyn KeyStore>;

    // ── Topology ──────────────────────────────────────────────────────────────
    let authorities: Vec<String> = if args.authorities.is_empty() {
        DEFAULT_AUTHORITIES.iter().map(|a| a.to_string()).collect()
    } else {
        args.authorities.clone()
    };
    let config = NodeConfig { name: args.name.clone(), authorities };
    info!(authority = config.is_authority(), peers = config.authorities.len(), "role resolved");

    // ── Engine ────────────────────────────────────────────────────────────────
    let transport =
        Arc::new(HttpTransport::new().context("building HTTP transport")?) as Arc<dyn Transport>;
    let peers = PeerClient::with_port(transport, args.peer_port);
    let resolver = Arc::new(HttpKeyResolver::new(peers.clone())) as Arc<dyn KeyResolver>;
    let node = Arc::new(Node::new(
        config,
        keys,
        resolver,
        peers.clone(),
        Arc::new(SystemClock) as Arc<dyn Clock>,
    ));

    // ── Watchdog ──────────────────────────────────────────────────────────────
    tokio::spawn(run_watchdog(Arc::clone(&node)));

    // ── Optional join ─────────────────────────────────────────────────────────
    if let Some(authority) = args.join {
        let name = args.name.clone();
        tokio::spawn(async move {
            // Give the local listener a moment before the authority pushes
            // its chain back at us.
            tokio::time::sleep(Duration::from_secs(1)).await;
            match peers.post(&authority, "join", &serde_json::json!({ "name": name })).await {
                Ok(_) => info!(authority = %authority, "joined"),
                Err(e) => warn!(authority = %authority, error = %e, "join failed"),
            }
        });
    }

    // ── Serve ─────────────────────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("binding {}", args.listen))?;
    info!("node ready");
    signet_api::serve(node, listener).await.context("serving API")?;
    Ok(())
}
