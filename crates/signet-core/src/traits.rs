//! Seams between the protocol core and its collaborators.
//!
//! The core never talks HTTP, reads key files, or looks at a wall clock
//! directly; it goes through these traits so tests can wire an in-memory
//! network and a fixed clock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::SignetError;

// ── Transport ─────────────────────────────────────────────────────────────────

/// Request/response JSON calls to a peer URL.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, SignetError>;

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, SignetError>;
}

// ── KeyStore ──────────────────────────────────────────────────────────────────

/// This node's keypair. Signing routines never see PEM strings; PEM handling
/// stays behind the implementation.
pub trait KeyStore: Send + Sync {
    /// Sign `data`, returning the hex-encoded signature.
    fn sign(&self, data: &[u8]) -> Result<String, SignetError>;

    /// This node's public key, SubjectPublicKeyInfo PEM.
    fn public_key_pem(&self) -> String;
}

// ── KeyResolver ───────────────────────────────────────────────────────────────

/// Maps a node name to its public key PEM (over the wire, via the node's own
/// public-key endpoint).
#[async_trait]
pub trait KeyResolver: Send + Sync {
    async fn public_key_of(&self, name: &str) -> Result<String, SignetError>;
}

// ── Clock ─────────────────────────────────────────────────────────────────────

/// UTC timestamps. Behind a trait so the watchdog and expiration checks are
/// testable without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The production clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
