//! Heartbeat watchdog: the system's final guarantee against deadlock when
//! the lock-release election and explicit unlocks both fail.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use signet_core::{LOCK_TIMEOUT_SECS, WATCHDOG_INTERVAL_SECS};

use crate::engine::Node;

impl Node {
    /// Clear the lock if it has been held longer than the timeout. Returns
    /// whether a stale lock was cleared. Called by the watchdog task; exposed
    /// so tests can drive it with an injected clock.
    pub fn expire_stale_lock(&self) -> bool {
        let mut st = self.state();
        let Some(set_at) = st.lock.set_at else {
            return false;
        };
        if self.clock().now() - set_at > chrono::Duration::seconds(LOCK_TIMEOUT_SECS) {
            warn!(blocker = ?st.lock.blocker, "deadlock detected; unlocking");
            st.lock.clear();
            return true;
        }
        false
    }
}

/// Long-lived watchdog task; spawn once per node.
pub async fn run_watchdog(node: Arc<Node>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(WATCHDOG_INTERVAL_SECS));
    loop {
        ticker.tick().await;
        node.expire_stale_lock();
    }
}
