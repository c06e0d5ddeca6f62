//! Shared fixtures for wallet engine integration tests
//!
//! Provides a fixed recovery phrase, a genesis block builder and a clock
//! positioned relative to the genesis date.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use wallet_engine::chain::Block0Builder;
use wallet_engine::keys::recovery;
use wallet_engine::{Address, Discrimination, LinearFee, SecretKey, Value};

pub const MNEMONIC: &str =
    "neck bulb teach illegal soul cry monitor claw amount boring provide village rival draft stone";

pub const GENESIS_TIME: u64 = 1_600_000_000;
pub const SLOTS_PER_EPOCH: u32 = 100;
pub const SLOT_DURATION: u8 = 10;

/// Initialize logging for tests
///
/// Also loads `.env` so `RUST_LOG` and `WALLET_ENGINE_*` can be set there.
pub fn init_test_logging() {
    dotenv::dotenv().ok();
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

pub fn account_key() -> SecretKey {
    recovery::derive_account_key(MNEMONIC, "").expect("Fixture mnemonic must be valid")
}

pub fn legacy_key() -> SecretKey {
    SecretKey::from_seed(&[0x42; 32])
}

pub fn fees() -> LinearFee {
    LinearFee::new(10, 1, 0)
}

pub fn block0_builder(fees: LinearFee) -> Block0Builder {
    Block0Builder::new(
        Discrimination::Test,
        GENESIS_TIME,
        SLOTS_PER_EPOCH,
        SLOT_DURATION,
        fees,
    )
}

/// Genesis with five UTXO entries worth 1_020_101 in total
///
/// The account key owns 1_000_000 and 1, the legacy key owns 10_000,
/// 10_000 and 100.
pub fn utxo_genesis() -> Vec<u8> {
    let account = account_key().public_key();
    let legacy = legacy_key().public_key();

    block0_builder(fees())
        .with_fund(Address::single(Discrimination::Test, account), Value(1_000_000))
        .with_fund(Address::single(Discrimination::Test, legacy), Value(10_000))
        .with_fund(Address::single(Discrimination::Test, legacy), Value(10_000))
        .with_fund(Address::single(Discrimination::Test, account), Value(1))
        .with_fund(Address::single(Discrimination::Test, legacy), Value(100))
        .build()
        .expect("Failed to build genesis")
}

/// Genesis paying each value to the recovered key's single address
pub fn single_genesis(values: &[u64]) -> Vec<u8> {
    let address = Address::single(Discrimination::Test, account_key().public_key());
    values
        .iter()
        .fold(block0_builder(fees()), |builder, value| {
            builder.with_fund(address, Value(*value))
        })
        .build()
        .expect("Failed to build genesis")
}

/// The five [`utxo_genesis`] values, all owned by the recovered key
pub fn recovered_utxo_genesis() -> Vec<u8> {
    single_genesis(&[1_000_000, 10_000, 10_000, 1, 100])
}

/// Genesis crediting the account address directly
pub fn account_genesis(fees: LinearFee, balance: u64) -> Vec<u8> {
    block0_builder(fees)
        .with_fund(
            Address::account(Discrimination::Test, account_key().public_key()),
            Value(balance),
        )
        .build()
        .expect("Failed to build genesis")
}

/// Wall-clock time `secs` after genesis
pub fn after_genesis(secs: u64) -> DateTime<Utc> {
    Utc.timestamp_opt((GENESIS_TIME + secs) as i64, 0)
        .single()
        .expect("Valid timestamp")
}
