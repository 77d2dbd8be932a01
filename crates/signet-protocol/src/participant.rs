//! Participant-role operations: propose transfers, counter-sign incoming
//! requests, submit to an authority, and mint deposits. A participant never
//! votes; it talks to authorities through the retrying peer adapter.

use tracing::{info, warn};

use signet_core::{
    iso_utc, DepositRequest, SendTransactionRequest, SignetError, Transaction, TransactionChain,
    PROPOSAL_TTL_MINS,
};
use signet_crypto::transaction_hash;

use crate::engine::Node;

impl Node {
    // ── Propose (`/send_transaction/`) ───────────────────────────────────────

    /// Build a transfer on top of the local tip, sign it as sender, and hand
    /// it to the recipient's pending queue. No chain state mutates on either
    /// side.
    pub async fn send_transaction(
        &self,
        request: SendTransactionRequest,
    ) -> Result<serde_json::Value, SignetError> {
        let (index, previous_hash) = {
            let st = self.state();
            (st.chain.len() as u64, st.chain.tip().current_hash.clone())
        };
        let now = self.clock().now();
        let mut tx = Transaction {
            index,
            sender: self.config.name.clone(),
            recipient: request.container.clone(),
            amount: request.amount,
            expiration: Some(iso_utc(now + chrono::Duration::minutes(PROPOSAL_TTL_MINS))),
            previous_hash,
            current_hash: None,
            sender_signature: None,
            recipient_signature: None,
            timestamp: iso_utc(now),
            authority_signature: None,
        };
        let hash = transaction_hash(&tx);
        tx.current_hash = Some(hash.clone());
        tx.sender_signature = Some(self.keys().sign(hash.as_bytes())?);

        info!(recipient = %request.container, amount = request.amount, "proposing transfer");
        let response = self.peers().receive_transaction(&request.container, &tx).await?;
        Ok(serde_json::json!({ "message": "Transaction sent", "response": response }))
    }

    // ── Receive (`/receive_transaction/`) ────────────────────────────────────

    /// Enqueue an incoming proposal for later operator review.
    pub fn receive_transaction(&self, tx: Transaction) {
        info!(sender = %tx.sender, amount = tx.amount, "proposal received");
        self.state().pending.push(tx);
    }

    /// The pending queue, in arrival order (`GET /show_transactions`).
    pub fn pending_transactions(&self) -> TransactionChain {
        TransactionChain { transactions: self.state().pending.clone() }
    }

    // ── Accept (`/accept_transaction/`) ──────────────────────────────────────

    /// Counter-sign the pending entry at `number` and submit it to a random
    /// authority (3 attempts). The accepted entry leaves the queue; the only
    /// success criterion here is a 2xx from the authority.
    ///
    /// Returns `Ok(None)` when the entry's carried hash no longer matches its
    /// fields — the proposal was manipulated and is not submitted.
    pub async fn accept_transaction(
        &self,
        number: usize,
    ) -> Result<Option<serde_json::Value>, SignetError> {
        let mut tx = {
            let st = self.state();
            st.pending.get(number).cloned().ok_or(SignetError::UnknownPendingIndex {
                got: number,
                len: st.pending.len(),
            })?
        };

        let hash = transaction_hash(&tx);
        if hash != tx.carried_hash() {
            warn!(number, "pending proposal was manipulated");
            return Ok(None);
        }
        tx.recipient_signature = Some(self.keys().sign(hash.as_bytes())?);

        let reply = self
            .peers()
            .submit_to_random_authority(
                &self.config.authorities,
                "verify_transaction/",
                &serde_json::to_value(&tx).unwrap_or_default(),
            )
            .await?;

        let mut st = self.state();
        if number < st.pending.len() {
            st.pending.remove(number);
        }
        Ok(Some(reply))
    }

    // ── Deposit (`/deposit_money`, `/sign_money_deposit`) ────────────────────

    /// Ask an authority to drive a deposit round for `name`.
    pub async fn deposit_money(
        &self,
        request: DepositRequest,
    ) -> Result<serde_json::Value, SignetError> {
        self.peers()
            .submit_to_random_authority(
                &self.config.authorities,
                "auth_deposit_money",
                &serde_json::to_value(&request).unwrap_or_default(),
            )
            .await
    }

    /// Counter-sign a deposit skeleton built by an authority. The transfer
    /// must name this node as both sender and recipient, and its carried
    /// hash must match its fields.
    pub fn sign_money_deposit(&self, mut tx: Transaction) -> Result<Transaction, SignetError> {
        if tx.sender != self.config.name || tx.recipient != self.config.name {
            return Err(SignetError::DepositPartyMismatch);
        }
        let hash = transaction_hash(&tx);
        if hash != tx.carried_hash() {
            return Err(SignetError::HashMismatch {
                computed: hash,
                carried: tx.carried_hash().to_string(),
            });
        }
        let signature = self.keys().sign(hash.as_bytes())?;
        tx.sender_signature = Some(signature.clone());
        tx.recipient_signature = Some(signature);
        info!(amount = tx.amount, "deposit counter-signed");
        Ok(tx)
    }
}
