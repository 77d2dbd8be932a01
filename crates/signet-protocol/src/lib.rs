pub mod engine;
pub mod participant;
pub mod state;
pub mod watchdog;

pub use engine::{CommitOutcome, Node, NodeConfig, SyncStatus, VerifyVerdict};
pub use state::{LockState, NodeState};
pub use watchdog::run_watchdog;
