use std::collections::VecDeque;

use signet_core::Transaction;

/// Bounded LRU set of recently committed transactions.
///
/// The commit broadcast is fire-and-forget per peer, so the same transaction
/// can arrive more than once; this cache makes `/add_to_chain/` idempotent.
/// Membership is exact structural equality. On `add`, a present entry moves
/// to the most-recently-used end; when full, the least-recently-used entry is
/// evicted first.
#[derive(Debug)]
pub struct RecencyCache {
    capacity: usize,
    entries: VecDeque<Transaction>,
}

impl RecencyCache {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, entries: VecDeque::with_capacity(capacity) }
    }

    pub fn exists(&self, tx: &Transaction) -> bool {
        self.entries.contains(tx)
    }

    pub fn add(&mut self, tx: Transaction) {
        if let Some(pos) = self.entries.iter().position(|e| e == &tx) {
            self.entries.remove(pos);
        } else if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(tx);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(index: u64) -> Transaction {
        Transaction {
            index,
            sender: "a".into(),
            recipient: "b".into(),
            amount: 1.0,
            expiration: None,
            previous_hash: None,
            current_hash: Some(format!("h{index}")),
            sender_signature: None,
            recipient_signature: None,
            timestamp: "t".into(),
            authority_signature: None,
        }
    }

    #[test]
    fn retains_the_k_most_recently_touched() {
        let mut cache = RecencyCache::new(3);
        cache.add(tx(0));
        cache.add(tx(1));
        cache.add(tx(2));
        // Touch 0 so it becomes most-recent; 1 is now the LRU.
        cache.add(tx(0));
        cache.add(tx(3));
        assert_eq!(cache.len(), 3);
        assert!(!cache.exists(&tx(1)));
        assert!(cache.exists(&tx(0)));
        assert!(cache.exists(&tx(2)));
        assert!(cache.exists(&tx(3)));
    }

    #[test]
    fn promote_does_not_grow_the_cache() {
        let mut cache = RecencyCache::new(2);
        cache.add(tx(0));
        cache.add(tx(0));
        cache.add(tx(0));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn equality_is_structural() {
        let mut cache = RecencyCache::new(2);
        cache.add(tx(0));
        let mut altered = tx(0);
        altered.amount = 2.0;
        assert!(!cache.exists(&altered));
    }
}
