//! Ledger primitives and their binary encoding
//!
//! All integers are big-endian. Fragments are the unit of submission; a
//! block is a header followed by size-prefixed fragments.

pub mod address;
pub mod block;
pub mod certificate;
pub mod codec;
pub mod fee;
pub mod fragment;
pub mod params;
pub mod time;
pub mod transaction;
pub mod value;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

pub use address::{Address, AddressKind, Discrimination};
pub use block::{Block, Block0Builder, HeaderId};
pub use certificate::{VoteCast, VotePayload, VotePlanId};
pub use fee::{CertificateKind, LinearFee, PerCertificateFee, PerVoteCertificateFee};
pub use fragment::{Fragment, FragmentId};
pub use time::{BlockDate, TimeEra};
pub use transaction::{Input, InputSource, Output, Transaction, TxPayload, Witness};
pub use value::Value;

/// Blake2b with a 256-bit digest
pub fn blake2b256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b::<U32>::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blake2b256_concatenates_parts() {
        assert_eq!(blake2b256(&[&b"ab"[..], &b"cd"[..]]), blake2b256(&[&b"abcd"[..]]));
        assert_ne!(blake2b256(&[&b"abcd"[..]]), blake2b256(&[&b"abce"[..]]));
    }
}
