use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Transaction ───────────────────────────────────────────────────────────────

/// The atomic unit of the chain.
///
/// `current_hash` is SHA-256 over the canonical field serialization (index,
/// sender, recipient, amount, previous_hash, expiration — signatures and
/// `timestamp` excluded so parties can sign before those are finalized).
/// Signatures are hex-encoded RSA-PKCS#1v1.5-SHA256 over the UTF-8 bytes of
/// `current_hash`. They may be absent during construction; a committed
/// transaction carries all three.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Position in the chain; equals the count of preceding transactions at
    /// commit time.
    pub index: u64,
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
    /// ISO-8601 UTC. Advisory: a verifying authority rejects proposals older
    /// than this.
    #[serde(default)]
    pub expiration: Option<String>,
    /// `current_hash` of the transaction at `index - 1`; absent on genesis.
    #[serde(default)]
    pub previous_hash: Option<String>,
    #[serde(default)]
    pub current_hash: Option<String>,
    #[serde(default)]
    pub sender_signature: Option<String>,
    #[serde(default)]
    pub recipient_signature: Option<String>,
    /// ISO-8601 UTC, written by the committing authority. Not hashed.
    pub timestamp: String,
    #[serde(default)]
    pub authority_signature: Option<String>,
}

impl Transaction {
    /// A self-transfer denotes a deposit: it mints balance and bypasses the
    /// balance check and the authority quorum.
    pub fn is_deposit(&self) -> bool {
        self.sender == self.recipient
    }

    /// The carried hash, or empty when unset.
    pub fn carried_hash(&self) -> &str {
        self.current_hash.as_deref().unwrap_or("")
    }
}

/// Wire form of a whole chain.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TransactionChain {
    pub transactions: Vec<Transaction>,
}

// ── Timestamps ────────────────────────────────────────────────────────────────

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Render a UTC instant in the wire's ISO-8601 form (no offset suffix).
pub fn iso_utc(t: DateTime<Utc>) -> String {
    t.format(ISO_FORMAT).to_string()
}

/// Parse a wire timestamp back into a UTC instant. Returns `None` on any
/// malformed input; callers treat unparseable advisory fields as absent.
pub fn parse_iso_utc(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, ISO_FORMAT)
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Transaction {
        Transaction {
            index: 1,
            sender: "alice".into(),
            recipient: "bob".into(),
            amount: 30.0,
            expiration: Some("2024-06-01T00:10:00".into()),
            previous_hash: Some("ab".into()),
            current_hash: Some("cd".into()),
            sender_signature: None,
            recipient_signature: None,
            timestamp: "2024-06-01T00:00:00".into(),
            authority_signature: None,
        }
    }

    #[test]
    fn deposit_is_self_transfer() {
        let mut tx = sample();
        assert!(!tx.is_deposit());
        tx.recipient = tx.sender.clone();
        assert!(tx.is_deposit());
    }

    #[test]
    fn serde_round_trip_preserves_absent_fields() {
        let tx = sample();
        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, back);
        // Absent optional keys deserialize as None rather than failing.
        let partial: Transaction = serde_json::from_str(
            r#"{"index":0,"sender":"a","recipient":"b","amount":1.0,"timestamp":"t"}"#,
        )
        .unwrap();
        assert_eq!(partial.current_hash, None);
    }

    #[test]
    fn timestamp_round_trip() {
        let t = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 45).unwrap();
        let s = iso_utc(t);
        assert_eq!(parse_iso_utc(&s), Some(t));
        assert_eq!(parse_iso_utc("not a timestamp"), None);
    }
}
