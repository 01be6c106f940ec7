//! Key agreement, key derivation and frame protection.

mod frame;
mod key_exchange;
mod keying;

pub use frame::{open, seal, SecureFrame, TAG_LEN};
pub use key_exchange::{DhGroup, KeyPair, SharedSecret};
pub use keying::SessionKeyMaterial;
