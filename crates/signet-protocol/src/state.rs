use chrono::{DateTime, Utc};

use signet_chain::{Chain, RecencyCache};
use signet_core::{Transaction, RECENCY_CACHE_CAPACITY};

// ── LockState ─────────────────────────────────────────────────────────────────

/// The exclusive commit lock of one node.
///
/// `blocker` names the current owner (always this node's own name — both the
/// 2PC driver and an accepted prepare self-lock, since unlocks are broadcast).
/// `set_at` feeds the deadlock watchdog; `competing` collects peers that
/// reported themselves locked during the current attempt.
#[derive(Debug, Default)]
pub struct LockState {
    pub blocker: Option<String>,
    pub set_at: Option<DateTime<Utc>>,
    pub competing: Vec<String>,
}

impl LockState {
    pub fn is_held(&self) -> bool {
        self.blocker.is_some()
    }

    pub fn acquire(&mut self, owner: String, at: DateTime<Utc>) {
        self.blocker = Some(owner);
        self.set_at = Some(at);
    }

    pub fn clear(&mut self) {
        self.blocker = None;
        self.set_at = None;
        self.competing.clear();
    }
}

// ── NodeState ─────────────────────────────────────────────────────────────────

/// Everything mutable a node owns, guarded by one mutex. The guard is held
/// only during state mutation and released across every outbound call; the
/// protocol-level invariant is "at most one HELD commit round at a time".
#[derive(Debug)]
pub struct NodeState {
    pub chain: Chain,
    /// Received-but-not-yet-counter-signed proposals, in arrival order.
    pub pending: Vec<Transaction>,
    pub lock: LockState,
    /// Participants that joined this node and receive commit forwards.
    pub connected_nodes: Vec<String>,
    pub recency: RecencyCache,
    /// Set when a prepare round learned a peer chain is ahead of ours.
    pub synchronization_needed: bool,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            chain: Chain::new(),
            pending: Vec::new(),
            lock: LockState::default(),
            connected_nodes: Vec::new(),
            recency: RecencyCache::new(RECENCY_CACHE_CAPACITY),
            synchronization_needed: false,
        }
    }
}
