use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use signet_chain::verify_whole_chain;
use signet_core::{
    iso_utc, parse_iso_utc, Clock, DepositRequest, KeyResolver, KeyStore, PrepareReply,
    PrepareRequest, SignetError, Transaction, TransactionChain, PROPOSAL_TTL_MINS,
};
use signet_crypto::transaction_hash;
use signet_peer::PeerClient;

use crate::state::NodeState;

// ── Configuration ─────────────────────────────────────────────────────────────

/// Identity and topology of one node.
#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// This node's own name (peers address it as `http://<name>:8000`).
    pub name: String,
    /// Every authority, the local node included when it is one. Quorum and
    /// both 2PC fan-outs run over this list.
    pub authorities: Vec<String>,
}

impl NodeConfig {
    pub fn is_authority(&self) -> bool {
        self.authorities.iter().any(|a| a == &self.name)
    }
}

// ── Handler outcomes ──────────────────────────────────────────────────────────

/// Outcome of the 2PC driver, one per wire reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyVerdict {
    Busy,
    InsufficientBalance,
    Invalid,
    Accepted,
    Retry,
}

impl VerifyVerdict {
    pub fn message(&self) -> &'static str {
        match self {
            VerifyVerdict::Busy => "try again",
            VerifyVerdict::InsufficientBalance => "Insufficient balance",
            VerifyVerdict::Invalid => "transaction is not valid",
            VerifyVerdict::Accepted => "transaction accepted",
            VerifyVerdict::Retry => "retry transaction",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    AlreadyProcessed,
    Added,
    NotAdded,
}

impl CommitOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            CommitOutcome::AlreadyProcessed => "transaction was already processed",
            CommitOutcome::Added => "transaction added",
            CommitOutcome::NotAdded => "transaction not added",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    Synchronized,
    NothingToSynchronize,
    Invalid,
}

impl SyncStatus {
    pub fn message(&self) -> &'static str {
        match self {
            SyncStatus::Synchronized => "synchronized",
            SyncStatus::NothingToSynchronize => "nothing to synchronize",
            SyncStatus::Invalid => "chain is not valid",
        }
    }
}

// ── Node ──────────────────────────────────────────────────────────────────────

/// The protocol engine of one node — authority and participant roles both
/// live here; which endpoints peers call decides how a node behaves.
///
/// All mutable state sits behind one mutex (`NodeState`); the guard is never
/// held across an await. Outbound traffic goes through the peer adapter, key
/// material through the `KeyStore` seam, peer public keys through the
/// `KeyResolver` seam, and wall-clock time through `Clock`.
pub struct Node {
    pub config: NodeConfig,
    state: Mutex<NodeState>,
    keys: Arc<dyn KeyStore>,
    resolver: Arc<dyn KeyResolver>,
    peers: PeerClient,
    clock: Arc<dyn Clock>,
}

impl Node {
    pub fn new(
        config: NodeConfig,
        keys: Arc<dyn KeyStore>,
        resolver: Arc<dyn KeyResolver>,
        peers: PeerClient,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { config, state: Mutex::new(NodeState::default()), keys, resolver, peers, clock }
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, NodeState> {
        self.state.lock().expect("node state poisoned")
    }

    pub(crate) fn keys(&self) -> &dyn KeyStore {
        self.keys.as_ref()
    }

    pub(crate) fn peers(&self) -> &PeerClient {
        &self.peers
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// This node's public key PEM (served at `GET /public_key`).
    pub fn public_key_pem(&self) -> String {
        self.keys.public_key_pem()
    }

    /// Wire copy of the committed chain.
    pub fn chain_wire(&self) -> TransactionChain {
        self.state().chain.to_wire()
    }

    /// Chain length (test and logging convenience).
    pub fn chain_len(&self) -> usize {
        self.state().chain.len()
    }

    pub fn balance_of(&self, name: &str) -> f64 {
        self.state().chain.balance(name)
    }

    /// Current owner of the exclusive commit lock, if any.
    pub fn current_blocker(&self) -> Option<String> {
        self.state().lock.blocker.clone()
    }

    /// Whether a prepare round learned that a peer chain is ahead of ours.
    pub fn synchronization_needed(&self) -> bool {
        self.state().synchronization_needed
    }

    /// Whole-chain self-audit, served at `GET /verify_chain`.
    pub async fn verify_own_chain(&self) -> Result<(), SignetError> {
        let snapshot = self.state().chain.clone();
        verify_whole_chain(snapshot.transactions(), self.resolver.as_ref(), &self.config.authorities)
            .await
    }

    fn release_lock(&self) {
        self.state().lock.clear();
    }

    // ── 2PC driver (`/verify_transaction/`) ──────────────────────────────────

    /// Drive a full commit round for `tx`.
    ///
    /// Enters HELD by acquiring the exclusive lock (or answers busy), then
    /// validates, authority-signs, runs the prepare quorum and broadcasts the
    /// commit. Validation failures release the lock before returning; a
    /// failed quorum leaves the lock to the release election / watchdog.
    /// `Err` means signing failed — a fatal internal error (HTTP 500).
    pub async fn verify_transaction(&self, mut tx: Transaction) -> Result<VerifyVerdict, SignetError> {
        {
            let mut st = self.state();
            if st.lock.is_held() {
                debug!(blocker = ?st.lock.blocker, "commit round already in process");
                return Ok(VerifyVerdict::Busy);
            }
            let now = self.clock.now();
            st.lock.acquire(self.config.name.clone(), now);
        }
        debug!(index = tx.index, sender = %tx.sender, recipient = %tx.recipient, "lock acquired");

        // Advisory expiration check: a stale proposal is rejected.
        if let Some(expiration) = tx.expiration.as_deref().and_then(parse_iso_utc) {
            if self.clock.now() > expiration {
                warn!(expiration = ?tx.expiration, "proposal expired");
                self.release_lock();
                return Ok(VerifyVerdict::Invalid);
            }
        }

        let snapshot = self.state().chain.clone();

        if !tx.is_deposit() {
            let have = snapshot.balance(&tx.sender);
            if have < tx.amount {
                info!(sender = %tx.sender, have, need = tx.amount, "insufficient balance");
                self.release_lock();
                return Ok(VerifyVerdict::InsufficientBalance);
            }
        }

        if let Err(e) = snapshot.verify_transaction(&tx, self.resolver.as_ref()).await {
            warn!(error = %e, "transaction rejected");
            self.release_lock();
            return Ok(VerifyVerdict::Invalid);
        }

        // Sign as authority and stamp the commit time.
        let hash = tx.carried_hash().to_owned();
        let signature = match self.keys.sign(hash.as_bytes()) {
            Ok(sig) => sig,
            Err(e) => {
                self.release_lock();
                return Err(e);
            }
        };
        tx.authority_signature = Some(signature);
        tx.timestamp = iso_utc(self.clock.now());

        // Deposits bypass the prepare quorum; everything else needs it.
        if !tx.is_deposit() && !self.run_prepare_round(&tx).await {
            self.run_lock_release_election().await;
            return Ok(VerifyVerdict::Retry);
        }

        self.broadcast_commit(&tx).await;
        Ok(VerifyVerdict::Accepted)
    }

    /// Prepare fan-out over every authority (self included). Returns whether
    /// the quorum was reached: `authorities - 1` approvals, lowered by one
    /// per unreachable peer.
    async fn run_prepare_round(&self, tx: &Transaction) -> bool {
        let request = PrepareRequest {
            transaction: tx.clone(),
            container_name: self.config.name.clone(),
        };
        let mut required = self.config.authorities.len().saturating_sub(1);
        let mut approvals = 0usize;

        for authority in &self.config.authorities {
            match self.peers.prepare_transaction(authority, &request).await {
                Ok(PrepareReply::Accepted { .. }) => {
                    debug!(authority = %authority, "prepare approved");
                    approvals += 1;
                }
                Ok(PrepareReply::NeedSync { current_index, .. }) => {
                    warn!(authority = %authority, current_index, "peer chain is ahead; synchronization needed");
                    self.state().synchronization_needed = true;
                    break;
                }
                Ok(PrepareReply::Busy { blocker, .. }) => {
                    debug!(authority = %authority, blocker = %blocker, "peer already in a commit round");
                    self.state().lock.competing.push(blocker);
                }
                Err(e) => {
                    warn!(authority = %authority, error = %e, "peer unreachable; lowering quorum");
                    required = required.saturating_sub(1);
                }
            }
            if approvals >= required {
                break;
            }
        }

        if approvals >= required {
            info!(approvals, required, "quorum reached");
            true
        } else {
            info!(approvals, required, "quorum not reached");
            false
        }
    }

    /// Fire-and-forget commit broadcast to every authority, self included.
    /// Order across peers is not guaranteed; the recency cache in the commit
    /// handler makes redelivery safe.
    async fn broadcast_commit(&self, tx: &Transaction) {
        for authority in &self.config.authorities {
            if let Err(e) = self.peers.add_to_chain(authority, tx).await {
                warn!(authority = %authority, error = %e, "commit broadcast failed");
            }
        }
    }

    /// Deterministic tie-break after a failed quorum: the lexicographically
    /// smallest competing blocker — if it is us — broadcasts the unlock.
    /// Everyone else holds their lock and waits (for the unlock or for the
    /// watchdog).
    async fn run_lock_release_election(&self) {
        let competing = self.state().lock.competing.clone();
        let Some(smallest) = competing.iter().min() else {
            debug!("no competing blockers recorded; leaving recovery to the watchdog");
            return;
        };
        if *smallest != self.config.name {
            debug!(winner = %smallest, "lost lock-release election; holding");
            return;
        }
        info!("won lock-release election; broadcasting unlock");
        for authority in &self.config.authorities {
            match self.peers.unlock_transaction(authority).await {
                Ok(_) => debug!(authority = %authority, "unlocked"),
                Err(e) => warn!(authority = %authority, error = %e, "unlock broadcast failed"),
            }
        }
    }

    // ── Prepare handler (`/prepare_transaction`) ─────────────────────────────

    /// Vote on a peer authority's commit round. An accepted prepare
    /// self-locks this node for the duration (unlocks are broadcast, so
    /// every authority stores its own name).
    pub fn prepare_transaction(&self, request: &PrepareRequest) -> PrepareReply {
        let mut st = self.state();
        if let Some(blocker) = st.lock.blocker.clone() {
            debug!(proposer = %request.container_name, blocker = %blocker, "prepare refused: busy");
            return PrepareReply::busy(blocker);
        }
        let chain_len = st.chain.len() as u64;
        if request.transaction.index != chain_len {
            debug!(
                proposer = %request.container_name,
                index = request.transaction.index,
                chain_len,
                "prepare refused: chains diverge"
            );
            return PrepareReply::need_sync(chain_len);
        }
        let now = self.clock.now();
        st.lock.acquire(self.config.name.clone(), now);
        debug!(proposer = %request.container_name, "prepare accepted");
        PrepareReply::accepted()
    }

    // ── Commit handler (`/add_to_chain/`) ────────────────────────────────────

    /// Idempotently apply a committed transaction, then replay it to every
    /// connected participant. Participants that fail to acknowledge are
    /// dropped from the connected set.
    pub async fn add_to_chain(&self, tx: Transaction) -> CommitOutcome {
        {
            let mut st = self.state();
            if st.recency.exists(&tx) {
                debug!(index = tx.index, "commit replay ignored");
                return CommitOutcome::AlreadyProcessed;
            }
            st.recency.add(tx.clone());
        }

        let snapshot = self.state().chain.clone();
        let verdict = snapshot
            .verify_authority_transaction(&tx, self.resolver.as_ref(), &self.config.authorities)
            .await;

        match verdict {
            Ok(()) => {
                let connected = {
                    let mut st = self.state();
                    st.chain.append(tx.clone());
                    st.lock.clear();
                    st.connected_nodes.clone()
                };
                info!(index = tx.index, sender = %tx.sender, recipient = %tx.recipient, "transaction committed");
                self.forward_to_connected(&tx, connected).await;
                CommitOutcome::Added
            }
            Err(e) => {
                warn!(error = %e, "commit rejected");
                self.release_lock();
                CommitOutcome::NotAdded
            }
        }
    }

    async fn forward_to_connected(&self, tx: &Transaction, connected: Vec<String>) {
        for node in connected {
            let acknowledged = match self.peers.add_to_chain(&node, tx).await {
                Ok(reply) => positive_commit_ack(&reply),
                Err(e) => {
                    warn!(node = %node, error = %e, "commit forward failed");
                    false
                }
            };
            if !acknowledged {
                info!(node = %node, "dropping unresponsive participant");
                self.state().connected_nodes.retain(|n| n != &node);
            }
        }
    }

    // ── Unlock handler (`/unlock_transaction/`) ──────────────────────────────

    pub fn unlock_transaction(&self) {
        info!("lock cleared by broadcast unlock");
        self.release_lock();
    }

    // ── Join (`/join`) ───────────────────────────────────────────────────────

    /// Record a participant and push it the whole chain. A transport failure
    /// is surfaced to the caller.
    pub async fn join(&self, name: String) -> Result<serde_json::Value, SignetError> {
        {
            let mut st = self.state();
            if !st.connected_nodes.contains(&name) {
                st.connected_nodes.push(name.clone());
                info!(node = %name, "participant joined");
            }
        }
        let chain = self.chain_wire();
        self.peers.synchronize(&name, &chain).await
    }

    // ── Synchronize handler (`/synchronize`) ─────────────────────────────────

    /// Adopt a strictly longer peer chain that passes whole-chain
    /// verification. No partial merge.
    pub async fn synchronize(&self, incoming: TransactionChain) -> SyncStatus {
        if incoming.transactions.len() <= self.chain_len() {
            return SyncStatus::NothingToSynchronize;
        }
        if let Err(e) = verify_whole_chain(
            &incoming.transactions,
            self.resolver.as_ref(),
            &self.config.authorities,
        )
        .await
        {
            warn!(error = %e, "rejecting peer chain");
            return SyncStatus::Invalid;
        }
        let mut st = self.state();
        if st.chain.adopt_if_longer(incoming.transactions) {
            st.synchronization_needed = false;
            info!(len = st.chain.len(), "adopted longer chain");
            SyncStatus::Synchronized
        } else {
            SyncStatus::NothingToSynchronize
        }
    }

    // ── Deposit driver (`/auth_deposit_money`) ───────────────────────────────

    /// Mint a balance: build the self-transfer at the current tip, round-trip
    /// it through the depositor for both signatures, then drive the commit.
    /// The one non-conservative operation in the system.
    pub async fn auth_deposit_money(
        &self,
        request: DepositRequest,
    ) -> Result<VerifyVerdict, SignetError> {
        let (index, previous_hash) = {
            let st = self.state();
            (st.chain.len() as u64, st.chain.tip().current_hash.clone())
        };
        let now = self.clock.now();
        let mut tx = Transaction {
            index,
            sender: request.name.clone(),
            recipient: request.name.clone(),
            amount: request.amount,
            expiration: Some(iso_utc(now + chrono::Duration::minutes(PROPOSAL_TTL_MINS))),
            previous_hash,
            current_hash: None,
            sender_signature: None,
            recipient_signature: None,
            timestamp: iso_utc(now),
            authority_signature: None,
        };
        tx.current_hash = Some(transaction_hash(&tx));

        info!(name = %request.name, amount = request.amount, "driving deposit");
        let signed = self.peers.sign_money_deposit(&request.name, &tx).await?;
        self.verify_transaction(signed).await
    }
}

/// A positive acknowledgement for a forwarded commit: the participant either
/// added the transaction or had already processed it.
fn positive_commit_ack(reply: &serde_json::Value) -> bool {
    matches!(
        reply["message"].as_str(),
        Some("transaction added") | Some("transaction was already processed")
    )
}
