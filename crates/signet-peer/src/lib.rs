pub mod client;
pub mod resolver;

pub use client::{HttpTransport, PeerClient};
pub use resolver::HttpKeyResolver;
