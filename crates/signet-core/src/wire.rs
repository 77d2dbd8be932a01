use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;

// ── Requests ──────────────────────────────────────────────────────────────────

/// Body of `POST /send_transaction/`: operator asks this node to propose a
/// transfer to `container`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SendTransactionRequest {
    pub container: String,
    pub amount: f64,
}

/// Body of `POST /accept_transaction/`: position into the pending queue.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AcceptTransactionRequest {
    pub number: usize,
}

/// Body of `POST /join`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContainerName {
    pub name: String,
}

/// Body of `POST /deposit_money` and `POST /auth_deposit_money`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DepositRequest {
    pub name: String,
    pub amount: f64,
}

/// Body of `POST /prepare_transaction`: the transaction under commit plus the
/// proposing authority's identity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrepareRequest {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub container_name: String,
}

// ── Prepare replies ───────────────────────────────────────────────────────────

/// The three shapes a `/prepare_transaction` reply takes. Deserialization is
/// by field presence (`status` / `current_index` / `blocker`), so the 2PC
/// driver's match is exhaustive.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrepareReply {
    Accepted {
        message: String,
        status: String,
    },
    NeedSync {
        message: String,
        current_index: u64,
        suggestion: String,
    },
    Busy {
        message: String,
        blocker: String,
    },
}

impl PrepareReply {
    pub fn accepted() -> Self {
        PrepareReply::Accepted {
            message: "Transaction is good to go.".into(),
            status: "accepted".into(),
        }
    }

    pub fn need_sync(current_index: u64) -> Self {
        PrepareReply::NeedSync {
            message: "We need to synchronize...".into(),
            current_index,
            suggestion: "Please use the longer chain as the source of truth.".into(),
        }
    }

    pub fn busy(blocker: impl Into<String>) -> Self {
        PrepareReply::Busy {
            message: "Sorry, transaction is already in process.".into(),
            blocker: blocker.into(),
        }
    }
}
