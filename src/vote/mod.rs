//! Vote proposals and ballot payloads

pub mod encryption;
pub mod proposal;

pub use encryption::{ElectionPublicKey, EncryptedVote};
pub use proposal::{PayloadType, Proposal};
