use sha2::{Digest, Sha256};

use signet_core::Transaction;

/// String form of the amount for hashing. `{:?}` keeps the trailing `.0` on
/// integral values (`0.0`, `100.0`, `30.5`), which is the form every node on
/// the wire must agree on.
fn amount_repr(amount: f64) -> String {
    format!("{amount:?}")
}

/// Absent or empty optional fields render as the literal `None` in the hash
/// input. Interop rule; see the canonical serialization below.
fn opt_repr(value: &Option<String>) -> &str {
    match value.as_deref() {
        Some(s) if !s.is_empty() => s,
        _ => "None",
    }
}

/// Canonical serialization for hashing: the concatenation, with no separator,
/// of the string forms of `index, sender, recipient, amount, previous_hash,
/// expiration` — in that exact order. Signatures and `timestamp` are excluded
/// so signing parties can sign before those fields are finalized.
pub fn canonical_input(tx: &Transaction) -> String {
    let mut input = String::new();
    input.push_str(&tx.index.to_string());
    input.push_str(&tx.sender);
    input.push_str(&tx.recipient);
    input.push_str(&amount_repr(tx.amount));
    input.push_str(opt_repr(&tx.previous_hash));
    input.push_str(opt_repr(&tx.expiration));
    input
}

/// SHA-256 of the canonical field serialization, lowercase hex.
pub fn transaction_hash(tx: &Transaction) -> String {
    hex::encode(Sha256::digest(canonical_input(tx).as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(index: u64, sender: &str, recipient: &str, amount: f64) -> Transaction {
        Transaction {
            index,
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            expiration: None,
            previous_hash: None,
            current_hash: None,
            sender_signature: None,
            recipient_signature: None,
            timestamp: String::new(),
            authority_signature: None,
        }
    }

    #[test]
    fn amount_keeps_trailing_zero() {
        assert_eq!(amount_repr(0.0), "0.0");
        assert_eq!(amount_repr(100.0), "100.0");
        assert_eq!(amount_repr(30.5), "30.5");
    }

    #[test]
    fn genesis_hash_is_stable() {
        // "0GenesisGenesis0.0NoneNone"
        let genesis = tx(0, "Genesis", "Genesis", 0.0);
        assert_eq!(canonical_input(&genesis), "0GenesisGenesis0.0NoneNone");
        assert_eq!(
            transaction_hash(&genesis),
            "7d96a91d787c9501e9d88874734412e94c2d542331895ad304dddca8338f276b"
        );
    }

    #[test]
    fn known_vector() {
        let t = tx(1, "alice", "boB", 30.5);
        assert_eq!(
            transaction_hash(&t),
            "7e434d02e3d793742623c07367e55fed84463955885cfcac856802a0cbb1d448"
        );
    }

    #[test]
    fn hash_ignores_signatures_and_timestamp() {
        let mut a = tx(2, "alice", "bob", 10.0);
        a.previous_hash = Some("abc".into());
        a.expiration = Some("2030-01-01T00:00:00".into());
        let baseline = transaction_hash(&a);

        a.timestamp = "2030-06-01T00:00:00".into();
        a.sender_signature = Some("ff".into());
        a.recipient_signature = Some("ee".into());
        a.authority_signature = Some("dd".into());
        a.current_hash = Some(baseline.clone());
        assert_eq!(transaction_hash(&a), baseline);
    }

    #[test]
    fn empty_string_renders_as_none() {
        let mut a = tx(3, "alice", "bob", 1.0);
        a.previous_hash = Some(String::new());
        let b = tx(3, "alice", "bob", 1.0);
        assert_eq!(transaction_hash(&a), transaction_hash(&b));
    }
}
