//! Private ballots
//!
//! A choice among `n` options is a unit vector of length `n`. Each component
//! is ElGamal-encrypted on Ristretto255 under the election key:
//! `(A, B) = (r·G, m·G + r·H)`. Every ciphertext carries a disjunctive
//! Chaum-Pedersen proof that `m ∈ {0, 1}`, and a final Chaum-Pedersen proof
//! shows the components add up to an encryption of one. Tallying is done
//! elsewhere; this module only produces and checks ballots.

use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha512};

use bech32::{Bech32, Hrp};

use crate::chain::codec::{ByteReader, CodecError};
use crate::{Result, WalletError};

pub const ELECTION_KEY_HRP: &str = "ristretto255_votepk";

const POINT_SIZE: usize = 32;
const SCALAR_SIZE: usize = 32;
pub const CIPHERTEXT_SIZE: usize = 2 * POINT_SIZE;
pub const UNIT_PROOF_SIZE: usize = 4 * SCALAR_SIZE;
pub const SUM_PROOF_SIZE: usize = 2 * SCALAR_SIZE;

const UNIT_DOMAIN: &[u8] = b"wallet-engine/vote/unit";
const SUM_DOMAIN: &[u8] = b"wallet-engine/vote/sum";

/// Public key of an election committee
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElectionPublicKey(RistrettoPoint);

impl ElectionPublicKey {
    pub fn from_point(point: RistrettoPoint) -> Self {
        Self(point)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; POINT_SIZE] = bytes.try_into().map_err(|_| {
            WalletError::InvalidVoteEncryptionKey(format!("expected {} bytes", POINT_SIZE))
        })?;
        CompressedRistretto(bytes)
            .decompress()
            .map(Self)
            .ok_or_else(|| WalletError::InvalidVoteEncryptionKey("not a curve point".to_string()))
    }

    /// Parse the `ristretto255_votepk1…` text form
    pub fn from_bech32(text: &str) -> Result<Self> {
        let (hrp, data) = bech32::decode(text)
            .map_err(|e| WalletError::InvalidVoteEncryptionKey(e.to_string()))?;
        if hrp.as_str() != ELECTION_KEY_HRP {
            return Err(WalletError::InvalidVoteEncryptionKey(format!(
                "unexpected prefix '{}'",
                hrp
            )));
        }
        Self::from_bytes(&data)
    }

    pub fn to_bech32(&self) -> Result<String> {
        let hrp = Hrp::parse(ELECTION_KEY_HRP)
            .map_err(|e| WalletError::InvalidVoteEncryptionKey(e.to_string()))?;
        bech32::encode::<Bech32>(hrp, &self.to_bytes())
            .map_err(|e| WalletError::InvalidVoteEncryptionKey(e.to_string()))
    }

    pub fn to_bytes(&self) -> [u8; POINT_SIZE] {
        self.0.compress().to_bytes()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ciphertext {
    pub e1: RistrettoPoint,
    pub e2: RistrettoPoint,
}

/// Proof that a ciphertext encrypts 0 or 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitProof {
    challenges: [Scalar; 2],
    responses: [Scalar; 2],
}

/// Proof that the ciphertexts sum to an encryption of 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SumProof {
    challenge: Scalar,
    response: Scalar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedVote {
    ciphertexts: Vec<Ciphertext>,
    proofs: Vec<UnitProof>,
    sum_proof: SumProof,
}

fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    let mut wide = [0u8; 64];
    rng.fill_bytes(&mut wide);
    Scalar::from_bytes_mod_order_wide(&wide)
}

fn challenge(domain: &[u8], index: u8, points: &[RistrettoPoint]) -> Scalar {
    let mut hasher = Sha512::new();
    hasher.update(domain);
    hasher.update([index]);
    for point in points {
        hasher.update(point.compress().as_bytes());
    }
    let mut wide = [0u8; 64];
    wide.copy_from_slice(&hasher.finalize());
    Scalar::from_bytes_mod_order_wide(&wide)
}

impl EncryptedVote {
    /// Encrypt `choice` out of `num_choices` options
    ///
    /// The caller validates `choice < num_choices`.
    pub fn encrypt<R: RngCore + CryptoRng>(
        key: &ElectionPublicKey,
        num_choices: u8,
        choice: u8,
        rng: &mut R,
    ) -> Self {
        let g = RISTRETTO_BASEPOINT_POINT;
        let h = key.0;

        let mut ciphertexts = Vec::with_capacity(usize::from(num_choices));
        let mut proofs = Vec::with_capacity(usize::from(num_choices));
        let mut randomness_sum = Scalar::ZERO;

        for index in 0..num_choices {
            let bit = usize::from(index == choice);
            let r = random_scalar(rng);
            randomness_sum += r;

            let message = if bit == 1 { g } else { RistrettoPoint::default() };
            let ciphertext = Ciphertext {
                e1: r * g,
                e2: message + r * h,
            };

            // Simulate the branch we do not know, prove the one we do
            let fake = 1 - bit;
            let fake_challenge = random_scalar(rng);
            let fake_response = random_scalar(rng);
            let w = random_scalar(rng);

            let mut commitments = [RistrettoPoint::default(); 4];
            commitments[2 * fake] = fake_response * g - fake_challenge * ciphertext.e1;
            commitments[2 * fake + 1] = fake_response * h
                - fake_challenge * (ciphertext.e2 - Scalar::from(fake as u64) * g);
            commitments[2 * bit] = w * g;
            commitments[2 * bit + 1] = w * h;

            let c = challenge(
                UNIT_DOMAIN,
                index,
                &[h, ciphertext.e1, ciphertext.e2, commitments[0], commitments[1], commitments[2], commitments[3]],
            );
            let real_challenge = c - fake_challenge;

            let mut challenges = [Scalar::ZERO; 2];
            let mut responses = [Scalar::ZERO; 2];
            challenges[fake] = fake_challenge;
            responses[fake] = fake_response;
            challenges[bit] = real_challenge;
            responses[bit] = w + real_challenge * r;

            ciphertexts.push(ciphertext);
            proofs.push(UnitProof {
                challenges,
                responses,
            });
        }

        let (sum_e1, sum_e2) = Self::sum(&ciphertexts);
        let w = random_scalar(rng);
        let t1 = w * g;
        let t2 = w * h;
        let c = challenge(SUM_DOMAIN, num_choices, &[h, sum_e1, sum_e2, t1, t2]);
        let sum_proof = SumProof {
            challenge: c,
            response: w + c * randomness_sum,
        };

        Self {
            ciphertexts,
            proofs,
            sum_proof,
        }
    }

    fn sum(ciphertexts: &[Ciphertext]) -> (RistrettoPoint, RistrettoPoint) {
        (
            ciphertexts.iter().map(|c| c.e1).sum(),
            ciphertexts.iter().map(|c| c.e2).sum(),
        )
    }

    pub fn num_choices(&self) -> usize {
        self.ciphertexts.len()
    }

    pub fn ciphertexts(&self) -> &[Ciphertext] {
        &self.ciphertexts
    }

    /// Check every proof against the election key
    pub fn verify(&self, key: &ElectionPublicKey) -> bool {
        let g = RISTRETTO_BASEPOINT_POINT;
        let h = key.0;

        if self.ciphertexts.is_empty() || self.ciphertexts.len() != self.proofs.len() {
            return false;
        }
        let Ok(num_choices) = u8::try_from(self.ciphertexts.len()) else {
            return false;
        };

        for (index, (ciphertext, proof)) in self.ciphertexts.iter().zip(&self.proofs).enumerate() {
            let mut commitments = [RistrettoPoint::default(); 4];
            for bit in 0..2 {
                let e = proof.challenges[bit];
                let z = proof.responses[bit];
                commitments[2 * bit] = z * g - e * ciphertext.e1;
                commitments[2 * bit + 1] = z * h - e * (ciphertext.e2 - Scalar::from(bit as u64) * g);
            }
            let c = challenge(
                UNIT_DOMAIN,
                index as u8,
                &[h, ciphertext.e1, ciphertext.e2, commitments[0], commitments[1], commitments[2], commitments[3]],
            );
            if proof.challenges[0] + proof.challenges[1] != c {
                return false;
            }
        }

        let (sum_e1, sum_e2) = Self::sum(&self.ciphertexts);
        let e = self.sum_proof.challenge;
        let z = self.sum_proof.response;
        let t1 = z * g - e * sum_e1;
        let t2 = z * h - e * (sum_e2 - g);
        challenge(SUM_DOMAIN, num_choices, &[h, sum_e1, sum_e2, t1, t2]) == e
    }

    pub fn serialized_size(num_choices: usize) -> usize {
        1 + num_choices * (CIPHERTEXT_SIZE + UNIT_PROOF_SIZE) + SUM_PROOF_SIZE
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        // Length fits: encrypt takes a u8 and read caps at u8::MAX
        out.push(self.ciphertexts.len() as u8);
        for ciphertext in &self.ciphertexts {
            out.extend_from_slice(ciphertext.e1.compress().as_bytes());
            out.extend_from_slice(ciphertext.e2.compress().as_bytes());
        }
        for proof in &self.proofs {
            for scalar in proof.challenges.iter().chain(&proof.responses) {
                out.extend_from_slice(scalar.as_bytes());
            }
        }
        out.extend_from_slice(self.sum_proof.challenge.as_bytes());
        out.extend_from_slice(self.sum_proof.response.as_bytes());
    }

    pub fn read(reader: &mut ByteReader<'_>) -> std::result::Result<Self, CodecError> {
        let count = usize::from(reader.u8()?);
        if count == 0 {
            return Err(CodecError::invalid("encrypted vote without choices"));
        }

        let mut ciphertexts = Vec::with_capacity(count);
        for _ in 0..count {
            ciphertexts.push(Ciphertext {
                e1: read_point(reader)?,
                e2: read_point(reader)?,
            });
        }

        let mut proofs = Vec::with_capacity(count);
        for _ in 0..count {
            proofs.push(UnitProof {
                challenges: [read_scalar(reader)?, read_scalar(reader)?],
                responses: [read_scalar(reader)?, read_scalar(reader)?],
            });
        }

        let sum_proof = SumProof {
            challenge: read_scalar(reader)?,
            response: read_scalar(reader)?,
        };

        Ok(Self {
            ciphertexts,
            proofs,
            sum_proof,
        })
    }
}

fn read_point(reader: &mut ByteReader<'_>) -> std::result::Result<RistrettoPoint, CodecError> {
    CompressedRistretto(reader.array()?)
        .decompress()
        .ok_or_else(|| CodecError::invalid("invalid ristretto point"))
}

fn read_scalar(reader: &mut ByteReader<'_>) -> std::result::Result<Scalar, CodecError> {
    Option::<Scalar>::from(Scalar::from_canonical_bytes(reader.array()?))
        .ok_or_else(|| CodecError::invalid("non-canonical scalar"))
}
