//! ─── Signet Protocol Constants ──────────────────────────────────────────────
//!
//! A fixed set of authority nodes validates and commits signed transfers
//! between participant nodes. Every node is addressable by name on a
//! well-known port; these constants pin the wire-level agreements.

// ── Addressing ───────────────────────────────────────────────────────────────

/// Well-known port every node listens on. Peers are addressed as
/// `http://<name>:8000/<path>`.
pub const PEER_PORT: u16 = 8000;

/// Per-request timeout for outbound peer calls (seconds). Must resolve well
/// inside the lock watchdog window so a hung peer cannot wedge a commit round
/// past recovery.
pub const REQUEST_TIMEOUT_SECS: u64 = 3;

// ── Protocol timing ──────────────────────────────────────────────────────────

/// Proposals carry `expiration = now + 10 minutes`. Advisory: a verifying
/// authority rejects a transaction older than its expiration.
pub const PROPOSAL_TTL_MINS: i64 = 10;

/// A blocker older than this is cleared unilaterally by the watchdog.
pub const LOCK_TIMEOUT_SECS: i64 = 5;

/// Watchdog wake-up interval (seconds).
pub const WATCHDOG_INTERVAL_SECS: u64 = 1;

/// Attempts when submitting to a uniformly random authority.
pub const SUBMIT_ATTEMPTS: u32 = 3;

// ── Commit idempotence ───────────────────────────────────────────────────────

/// Capacity of the recency cache deduplicating the commit broadcast.
pub const RECENCY_CACHE_CAPACITY: usize = 100;

// ── Genesis ──────────────────────────────────────────────────────────────────

/// Sender and recipient of the deterministic first transaction.
pub const GENESIS_NAME: &str = "Genesis";

/// Fixed genesis timestamp. The timestamp is outside the hash input, but the
/// genesis transaction must be byte-identical on every node, so wall-clock
/// time cannot be used here.
pub const GENESIS_TIMESTAMP: &str = "2024-01-01T00:00:00";

// ── Default topology ─────────────────────────────────────────────────────────

/// Default authority names, overridable via node configuration. The list
/// contains every authority, the local node included when it is one.
pub const DEFAULT_AUTHORITIES: &[&str] = &["authority_1", "authority_2", "authority_3"];
