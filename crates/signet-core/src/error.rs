use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignetError {
    // ── Validation errors ────────────────────────────────────────────────────
    #[error("transaction hash mismatch: computed {computed}, carried {carried}")]
    HashMismatch { computed: String, carried: String },

    #[error("previous hash does not match the chain tip")]
    PreviousHashMismatch,

    #[error("transaction index out of order: expected {expected}, got {got}")]
    IndexMismatch { expected: u64, got: u64 },

    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: f64, have: f64 },

    #[error("missing {role} signature")]
    MissingSignature { role: &'static str },

    #[error("invalid {role} signature")]
    InvalidSignature { role: &'static str },

    #[error("no known authority key verifies the authority signature")]
    NoAuthoritySignature,

    #[error("transaction expired at {expiration}")]
    Expired { expiration: String },

    #[error("chain verification failed at index {index}: {reason}")]
    ChainInvalid { index: u64, reason: String },

    #[error("no pending transaction at position {got} (queue holds {len})")]
    UnknownPendingIndex { got: usize, len: usize },

    #[error("deposit is not addressed to this node")]
    DepositPartyMismatch,

    // ── Transport / resolution errors ────────────────────────────────────────
    #[error("transport error talking to {peer}: {reason}")]
    Transport { peer: String, reason: String },

    #[error("could not resolve public key of {node}: {reason}")]
    KeyResolution { node: String, reason: String },

    #[error("no authority accepted the submission after {attempts} attempts")]
    AuthoritiesUnavailable { attempts: u32 },

    // ── Crypto / key material ────────────────────────────────────────────────
    #[error("signing failed: {0}")]
    Signing(String),

    #[error("key material error: {0}")]
    KeyMaterial(String),

    #[error("key file I/O: {0}")]
    KeyFile(#[from] std::io::Error),
}
