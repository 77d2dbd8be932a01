pub mod chain;
pub mod recency;

pub use chain::{verify_whole_chain, Chain};
pub use recency::RecencyCache;
