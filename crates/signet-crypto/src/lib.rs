pub mod hash;
pub mod keys;

pub use hash::{canonical_input, transaction_hash};
pub use keys::{
    generate_keypair, sign_hex, verify, DiskKeyStore, KeyPair, PRIVATE_KEY_FILE, PUBLIC_KEY_FILE,
};
