use tracing::warn;

use signet_core::{
    KeyResolver, SignetError, Transaction, TransactionChain, GENESIS_NAME, GENESIS_TIMESTAMP,
};
use signet_crypto::{transaction_hash, verify};

// ── Chain ─────────────────────────────────────────────────────────────────────

/// In-memory ordered log of committed transactions, starting at genesis.
///
/// The chain itself is pure data: appends assume the caller has verified, and
/// the verification methods resolve peer public keys through the `KeyResolver`
/// seam. Callers snapshot (clone) the chain before awaiting on verification so
/// no lock is held across the network.
#[derive(Clone, Debug)]
pub struct Chain {
    transactions: Vec<Transaction>,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Chain {
    /// A fresh chain holding only the genesis transaction.
    pub fn new() -> Self {
        Self { transactions: vec![Self::genesis()] }
    }

    /// The deterministic first transaction. Byte-identical on every node:
    /// all hashed fields are constants and the timestamp is pinned.
    pub fn genesis() -> Transaction {
        let mut tx = Transaction {
            index: 0,
            sender: GENESIS_NAME.into(),
            recipient: GENESIS_NAME.into(),
            amount: 0.0,
            expiration: None,
            previous_hash: None,
            current_hash: None,
            sender_signature: None,
            recipient_signature: None,
            timestamp: GENESIS_TIMESTAMP.into(),
            authority_signature: None,
        };
        tx.current_hash = Some(transaction_hash(&tx));
        tx
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// The most recently committed transaction (genesis at minimum).
    pub fn tip(&self) -> &Transaction {
        self.transactions.last().expect("chain always holds genesis")
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Wire form of the whole chain.
    pub fn to_wire(&self) -> TransactionChain {
        TransactionChain { transactions: self.transactions.clone() }
    }

    /// Pure append; the caller has verified.
    pub fn append(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    /// Net balance of `name` over all committed transactions. A deposit
    /// (self-transfer) credits once — the naive sum would cancel it out.
    pub fn balance(&self, name: &str) -> f64 {
        let mut balance = 0.0;
        for tx in &self.transactions {
            if tx.sender == name && tx.recipient == name {
                balance += tx.amount;
                continue;
            }
            if tx.sender == name {
                balance -= tx.amount;
            }
            if tx.recipient == name {
                balance += tx.amount;
            }
        }
        balance
    }

    /// Replace the chain when `peer` is strictly longer. Verification is the
    /// caller's job (`verify_whole_chain`); this only enforces monotonicity.
    pub fn adopt_if_longer(&mut self, peer: Vec<Transaction>) -> bool {
        if peer.len() > self.transactions.len() {
            self.transactions = peer;
            return true;
        }
        false
    }

    // ── Verification ─────────────────────────────────────────────────────────

    /// Hash, chain-link, and index checks against this chain's tip.
    fn check_position(&self, tx: &Transaction) -> Result<(), SignetError> {
        let computed = transaction_hash(tx);
        if tx.carried_hash() != computed {
            return Err(SignetError::HashMismatch {
                computed,
                carried: tx.carried_hash().to_string(),
            });
        }
        if tx.previous_hash.as_deref() != self.tip().current_hash.as_deref() {
            return Err(SignetError::PreviousHashMismatch);
        }
        if tx.index != self.len() as u64 {
            return Err(SignetError::IndexMismatch { expected: self.len() as u64, got: tx.index });
        }
        Ok(())
    }

    /// Full participant-level verification: position checks plus sender and
    /// recipient signatures over `current_hash`. For a deposit both
    /// signatures must be present and verify against the same key.
    pub async fn verify_transaction(
        &self,
        tx: &Transaction,
        resolver: &dyn KeyResolver,
    ) -> Result<(), SignetError> {
        self.check_position(tx)?;
        let hash = tx.carried_hash().to_owned();

        let sender_pem = resolver.public_key_of(&tx.sender).await?;
        check_signature(&sender_pem, &tx.sender_signature, &hash, "sender")?;

        let recipient_pem = if tx.is_deposit() {
            sender_pem
        } else {
            resolver.public_key_of(&tx.recipient).await?
        };
        check_signature(&recipient_pem, &tx.recipient_signature, &hash, "recipient")?;
        Ok(())
    }

    /// Commit-time verification: everything `verify_transaction` checks, plus
    /// at least one known authority key must verify `authority_signature`.
    pub async fn verify_authority_transaction(
        &self,
        tx: &Transaction,
        resolver: &dyn KeyResolver,
        authorities: &[String],
    ) -> Result<(), SignetError> {
        self.verify_transaction(tx, resolver).await?;
        let authority_pems = resolve_authority_keys(resolver, authorities).await;
        check_authority_signature(&authority_pems, tx)
    }
}

// ── Whole-chain verification ──────────────────────────────────────────────────

/// Apply the per-index invariants to a chain provided by a peer: for every
/// `i > 0`, hash correctness, chain linkage, `index == i`, valid sender and
/// recipient signatures, and at least one valid authority signature.
/// The genesis entry is not checked.
pub async fn verify_whole_chain(
    transactions: &[Transaction],
    resolver: &dyn KeyResolver,
    authorities: &[String],
) -> Result<(), SignetError> {
    let authority_pems = resolve_authority_keys(resolver, authorities).await;
    let mut party_pems: std::collections::HashMap<String, String> = Default::default();

    for (i, tx) in transactions.iter().enumerate().skip(1) {
        let invalid = |reason: String| SignetError::ChainInvalid { index: i as u64, reason };

        let computed = transaction_hash(tx);
        if tx.carried_hash() != computed {
            return Err(invalid("hash mismatch".into()));
        }
        if tx.previous_hash.as_deref().unwrap_or("") != transactions[i - 1].carried_hash() {
            return Err(invalid("broken chain link".into()));
        }
        if tx.index != i as u64 {
            return Err(invalid(format!("index {} at position {i}", tx.index)));
        }

        for (name, sig, role) in [
            (&tx.sender, &tx.sender_signature, "sender"),
            (&tx.recipient, &tx.recipient_signature, "recipient"),
        ] {
            if !party_pems.contains_key(name) {
                let pem = resolver.public_key_of(name).await.map_err(|e| invalid(e.to_string()))?;
                party_pems.insert(name.clone(), pem);
            }
            check_signature(&party_pems[name], sig, &computed, role)
                .map_err(|e| invalid(e.to_string()))?;
        }

        check_authority_signature(&authority_pems, tx).map_err(|e| invalid(e.to_string()))?;
    }
    Ok(())
}

// ── Signature helpers ─────────────────────────────────────────────────────────

fn check_signature(
    pem: &str,
    signature: &Option<String>,
    hash: &str,
    role: &'static str,
) -> Result<(), SignetError> {
    let sig = signature
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(SignetError::MissingSignature { role })?;
    if !verify(pem, sig, hash.as_bytes()) {
        return Err(SignetError::InvalidSignature { role });
    }
    Ok(())
}

/// Fetch the public keys of all authorities, skipping unreachable ones — only
/// one of them has to verify the authority signature.
async fn resolve_authority_keys(resolver: &dyn KeyResolver, authorities: &[String]) -> Vec<String> {
    let mut pems = Vec::with_capacity(authorities.len());
    for name in authorities {
        match resolver.public_key_of(name).await {
            Ok(pem) => pems.push(pem),
            Err(e) => warn!(authority = %name, error = %e, "authority key unavailable"),
        }
    }
    pems
}

fn check_authority_signature(
    authority_pems: &[String],
    tx: &Transaction,
) -> Result<(), SignetError> {
    let sig = tx
        .authority_signature
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(SignetError::MissingSignature { role: "authority" })?;
    let hash = tx.carried_hash();
    if authority_pems.iter().any(|pem| verify(pem, sig, hash.as_bytes())) {
        return Ok(());
    }
    Err(SignetError::NoAuthoritySignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    use signet_core::KeyStore;
    use signet_crypto::KeyPair;

    struct StaticResolver {
        keys: HashMap<String, String>,
    }

    #[async_trait]
    impl KeyResolver for StaticResolver {
        async fn public_key_of(&self, name: &str) -> Result<String, SignetError> {
            self.keys.get(name).cloned().ok_or_else(|| SignetError::KeyResolution {
                node: name.into(),
                reason: "unknown node".into(),
            })
        }
    }

    struct Net {
        resolver: StaticResolver,
        pairs: HashMap<String, KeyPair>,
        authority: String,
    }

    fn network(names: &[&str], authority: &str) -> Net {
        let mut keys = HashMap::new();
        let mut pairs = HashMap::new();
        for name in names {
            let pair = KeyPair::generate().unwrap();
            keys.insert(name.to_string(), pair.public_key_pem());
            pairs.insert(name.to_string(), pair);
        }
        Net { resolver: StaticResolver { keys }, pairs, authority: authority.into() }
    }

    /// Build a fully signed transaction on top of `chain`'s tip.
    fn signed_tx(net: &Net, chain: &Chain, sender: &str, recipient: &str, amount: f64) -> Transaction {
        let mut tx = Transaction {
            index: chain.len() as u64,
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            expiration: Some("2099-01-01T00:00:00".into()),
            previous_hash: chain.tip().current_hash.clone(),
            current_hash: None,
            sender_signature: None,
            recipient_signature: None,
            timestamp: "2024-06-01T00:00:00".into(),
            authority_signature: None,
        };
        let hash = transaction_hash(&tx);
        tx.current_hash = Some(hash.clone());
        tx.sender_signature = Some(net.pairs[sender].sign(hash.as_bytes()).unwrap());
        tx.recipient_signature = Some(net.pairs[recipient].sign(hash.as_bytes()).unwrap());
        tx.authority_signature = Some(net.pairs[&net.authority].sign(hash.as_bytes()).unwrap());
        tx
    }

    #[test]
    fn genesis_is_deterministic() {
        assert_eq!(Chain::genesis(), Chain::genesis());
        let chain = Chain::new();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.tip().sender, GENESIS_NAME);
        assert!(chain.tip().current_hash.is_some());
    }

    #[test]
    fn balance_counts_deposit_once() {
        let net = network(&["alice", "bob", "auth"], "auth");
        let mut chain = Chain::new();
        let deposit = signed_tx(&net, &chain, "alice", "alice", 100.0);
        chain.append(deposit);
        assert_eq!(chain.balance("alice"), 100.0);

        let transfer = signed_tx(&net, &chain, "alice", "bob", 30.0);
        chain.append(transfer);
        assert_eq!(chain.balance("alice"), 70.0);
        assert_eq!(chain.balance("bob"), 30.0);
        assert_eq!(chain.balance("nobody"), 0.0);
    }

    #[tokio::test]
    async fn verify_transaction_accepts_well_formed() {
        let net = network(&["alice", "bob", "auth"], "auth");
        let mut chain = Chain::new();
        chain.append(signed_tx(&net, &chain, "alice", "alice", 100.0));
        let tx = signed_tx(&net, &chain, "alice", "bob", 30.0);
        chain.verify_transaction(&tx, &net.resolver).await.unwrap();
    }

    #[tokio::test]
    async fn verify_transaction_rejects_tampering() {
        let net = network(&["alice", "bob", "auth"], "auth");
        let chain = Chain::new();
        let mut tx = signed_tx(&net, &chain, "alice", "bob", 30.0);
        tx.amount = 300.0; // carried hash no longer matches
        assert!(matches!(
            chain.verify_transaction(&tx, &net.resolver).await,
            Err(SignetError::HashMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn verify_transaction_rejects_wrong_index_and_link() {
        let net = network(&["alice", "bob", "auth"], "auth");
        let chain = Chain::new();

        let mut stale = signed_tx(&net, &chain, "alice", "bob", 1.0);
        stale.index = 5;
        stale.current_hash = Some(transaction_hash(&stale));
        assert!(matches!(
            chain.verify_transaction(&stale, &net.resolver).await,
            Err(SignetError::IndexMismatch { expected: 1, got: 5 })
        ));

        let mut unlinked = signed_tx(&net, &chain, "alice", "bob", 1.0);
        unlinked.previous_hash = Some("0000".into());
        unlinked.current_hash = Some(transaction_hash(&unlinked));
        assert!(matches!(
            chain.verify_transaction(&unlinked, &net.resolver).await,
            Err(SignetError::PreviousHashMismatch)
        ));
    }

    #[tokio::test]
    async fn verify_transaction_rejects_foreign_signature() {
        let net = network(&["alice", "bob", "mallory", "auth"], "auth");
        let chain = Chain::new();
        let mut tx = signed_tx(&net, &chain, "alice", "bob", 30.0);
        // mallory signs in alice's place
        let hash = tx.carried_hash().to_owned();
        tx.sender_signature = Some(net.pairs["mallory"].sign(hash.as_bytes()).unwrap());
        assert!(matches!(
            chain.verify_transaction(&tx, &net.resolver).await,
            Err(SignetError::InvalidSignature { role: "sender" })
        ));
    }

    #[tokio::test]
    async fn authority_signature_is_required_at_commit() {
        let net = network(&["alice", "bob", "auth"], "auth");
        let chain = Chain::new();
        let authorities = vec!["auth".to_string()];

        let mut tx = signed_tx(&net, &chain, "alice", "bob", 30.0);
        chain
            .verify_authority_transaction(&tx, &net.resolver, &authorities)
            .await
            .unwrap();

        tx.authority_signature = None;
        assert!(matches!(
            chain.verify_authority_transaction(&tx, &net.resolver, &authorities).await,
            Err(SignetError::MissingSignature { role: "authority" })
        ));

        // A signature from a non-authority does not count.
        let hash = tx.carried_hash().to_owned();
        tx.authority_signature = Some(net.pairs["bob"].sign(hash.as_bytes()).unwrap());
        assert!(matches!(
            chain.verify_authority_transaction(&tx, &net.resolver, &authorities).await,
            Err(SignetError::NoAuthoritySignature)
        ));
    }

    #[tokio::test]
    async fn whole_chain_verification_and_adoption() {
        let net = network(&["alice", "bob", "auth"], "auth");
        let mut chain = Chain::new();
        chain.append(signed_tx(&net, &chain, "alice", "alice", 100.0));
        chain.append(signed_tx(&net, &chain, "alice", "bob", 30.0));

        let authorities = vec!["auth".to_string()];
        verify_whole_chain(chain.transactions(), &net.resolver, &authorities)
            .await
            .unwrap();

        // Tampering anywhere is caught with the failing index.
        let mut forged: Vec<_> = chain.transactions().to_vec();
        forged[1].amount = 1_000_000.0;
        let err = verify_whole_chain(&forged, &net.resolver, &authorities).await;
        assert!(matches!(err, Err(SignetError::ChainInvalid { index: 1, .. })));

        // Adoption is monotone: longer replaces, equal-or-shorter does not.
        let mut other = Chain::new();
        assert!(other.adopt_if_longer(chain.transactions().to_vec()));
        assert_eq!(other.len(), 3);
        assert!(!other.adopt_if_longer(vec![Chain::genesis()]));
        assert_eq!(other.len(), 3);
    }
}
