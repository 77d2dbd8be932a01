pub mod constants;
pub mod error;
pub mod traits;
pub mod transaction;
pub mod wire;

pub use constants::*;
pub use error::SignetError;
pub use traits::{Clock, KeyResolver, KeyStore, SystemClock, Transport};
pub use transaction::{iso_utc, parse_iso_utc, Transaction, TransactionChain};
pub use wire::*;
