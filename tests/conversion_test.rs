//! UTXO to account conversion tests
//!
//! The fixture genesis holds entries worth 1_000_000, 10_000, 10_000, 1
//! and 100 under a fee of `10 + 1 × bytes`. Spending one entry costs 106,
//! so the 1 and 100 entries are ignored and the rest fit one transaction.
//!
//! Run with: cargo test --test conversion_test -- --nocapture

mod common;

use common::*;
use wallet_engine::chain::{AddressKind, InputSource};
use wallet_engine::{BlockDate, Fragment, Value, Wallet, WalletError};

const VALID_UNTIL: BlockDate = BlockDate {
    epoch: 0,
    slot_id: 50,
};

fn recovered_wallet(genesis: &[u8]) -> (Wallet, wallet_engine::Settings) {
    let mut wallet = Wallet::recover(MNEMONIC).expect("Recovery failed");
    let settings = wallet.initial_funds(genesis).expect("Discovery failed");
    (wallet, settings)
}

fn input_count(conversion: &wallet_engine::Conversion) -> usize {
    conversion
        .transactions()
        .iter()
        .map(|bytes| {
            Fragment::from_bytes(bytes)
                .ok()
                .and_then(|f| f.transaction().map(|tx| tx.inputs().len()))
                .unwrap_or(0)
        })
        .sum()
}

fn funded_wallet() -> (Wallet, wallet_engine::Settings) {
    let mut wallet = Wallet::import_keys(account_key().as_bytes(), legacy_key().as_bytes())
        .expect("Import failed");
    let settings = wallet.initial_funds(&utxo_genesis()).expect("Discovery failed");
    (wallet, settings)
}

#[test]
fn test_conversion_builds_single_transaction() -> anyhow::Result<()> {
    init_test_logging();

    let (wallet, settings) = funded_wallet();
    let conversion = wallet.convert(&settings, VALID_UNTIL)?;

    assert_eq!(conversion.len(), 1, "Expected exactly one conversion transaction");
    assert_eq!(conversion.ignored().count, 2);
    assert_eq!(conversion.ignored().value, Value(101));

    let bytes = conversion.get(0)?;
    assert_eq!(bytes.len(), 374, "4 framing + 1 tag + 369 transaction bytes");

    let fragment = Fragment::from_bytes(bytes)?;
    let tx = fragment.transaction().expect("Conversion must be a transaction");
    assert_eq!(tx.inputs().len(), 3);
    assert_eq!(tx.outputs().len(), 1);
    assert_eq!(tx.valid_until(), VALID_UNTIL);

    // 1_020_000 in, fee 10 + 374
    let output = &tx.outputs()[0];
    assert_eq!(output.value, Value(1_019_616));
    assert_eq!(output.address.kind, AddressKind::Account(account_key().public_key()));

    log::info!("Conversion fragment {}", fragment.id()?);
    Ok(())
}

#[test]
fn test_every_entry_is_converted_or_ignored() -> anyhow::Result<()> {
    init_test_logging();

    let (wallet, settings) = funded_wallet();
    let conversion = wallet.convert(&settings, VALID_UNTIL)?;

    assert_eq!(conversion.ignored().count + input_count(&conversion), wallet.utxos().len());
    Ok(())
}

// ============================================================================
// Wallets recovered from the mnemonic
// ============================================================================

#[test]
fn test_recovered_wallet_converts_in_one_transaction() -> anyhow::Result<()> {
    init_test_logging();

    let (wallet, settings) = recovered_wallet(&recovered_utxo_genesis());
    assert_eq!(wallet.total_value(), Value(1_020_101));

    let conversion = wallet.convert(&settings, VALID_UNTIL)?;
    assert_eq!(conversion.len(), 1);
    assert_eq!(conversion.ignored().count, 2);
    assert_eq!(conversion.ignored().value, Value(101));

    let bytes = conversion.get(0)?;
    assert_eq!(bytes.len(), 374);

    let fragment = Fragment::from_bytes(bytes)?;
    let tx = fragment.transaction().expect("transaction");
    assert_eq!(tx.inputs().len(), 3);
    assert_eq!(tx.outputs()[0].value, Value(1_019_616));

    let block0_hash = settings.block0_initial_hash().as_bytes();
    let sign_data_hash = tx.sign_data_hash();
    for witness in tx.witnesses() {
        assert!(witness.verify(&account_key().public_key(), block0_hash, &sign_data_hash));
    }
    Ok(())
}

#[test]
fn test_more_entries_than_one_transaction_holds() -> anyhow::Result<()> {
    init_test_logging();

    let (wallet, settings) = recovered_wallet(&single_genesis(&[1_000; 301]));
    assert_eq!(wallet.utxos().len(), 301);

    let conversion = wallet.convert(&settings, VALID_UNTIL)?;
    assert_eq!(conversion.len(), 2);
    assert_eq!(conversion.ignored().count, 0);
    assert_eq!(conversion.ignored().value, Value::zero());
    assert_eq!(input_count(&conversion), 301);

    let first = Fragment::from_bytes(conversion.get(0)?)?;
    assert_eq!(first.transaction().expect("transaction").inputs().len(), 255);
    Ok(())
}

#[test]
fn test_entry_below_its_own_fee_is_ignored() -> anyhow::Result<()> {
    init_test_logging();

    // Above the marginal fee of 106 but short of the 172 a lone input costs
    let (wallet, settings) = recovered_wallet(&single_genesis(&[150]));

    let conversion = wallet.convert(&settings, VALID_UNTIL)?;
    assert!(conversion.is_empty());
    assert_eq!(conversion.ignored().count, 1);
    assert_eq!(conversion.ignored().value, Value(150));
    Ok(())
}

#[test]
fn test_witnesses_are_signed_by_owning_keys() -> anyhow::Result<()> {
    init_test_logging();

    let (wallet, settings) = funded_wallet();
    let conversion = wallet.convert(&settings, VALID_UNTIL)?;
    let fragment = Fragment::from_bytes(conversion.get(0)?)?;
    let tx = fragment.transaction().expect("transaction");

    let block0_hash = settings.block0_initial_hash().as_bytes();
    let sign_data_hash = tx.sign_data_hash();
    let account = account_key().public_key();
    let legacy = legacy_key().public_key();

    // Account-owned entries are spent first
    let expected_signers = [account, legacy, legacy];
    for ((input, witness), signer) in tx.inputs().iter().zip(tx.witnesses()).zip(expected_signers) {
        assert!(matches!(input.source, InputSource::Utxo { .. }));
        assert!(
            witness.verify(&signer, block0_hash, &sign_data_hash),
            "Witness for {:?} does not verify",
            input.source
        );
    }
    assert_eq!(tx.inputs()[0].value, Value(1_000_000));
    Ok(())
}

#[test]
fn test_conversion_is_read_only() -> anyhow::Result<()> {
    init_test_logging();

    let (wallet, settings) = funded_wallet();
    let before = wallet.utxos().to_vec();

    let first = wallet.convert(&settings, VALID_UNTIL)?;
    let second = wallet.convert(&settings, VALID_UNTIL)?;

    assert_eq!(wallet.utxos(), before.as_slice());
    assert_eq!(wallet.spending_counter(), 0);
    assert!(wallet.pending_transactions().is_empty());
    assert_eq!(wallet.total_value(), Value(1_020_101));
    // Signing is deterministic
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_conversion_errors() -> anyhow::Result<()> {
    init_test_logging();

    let (wallet, settings) = funded_wallet();
    assert!(matches!(
        wallet.convert(&settings, BlockDate::new(0, 100)),
        Err(WalletError::ExpiredOrOutOfRange(_))
    ));
    assert!(matches!(
        wallet.convert(&settings, VALID_UNTIL)?.get(1),
        Err(WalletError::IndexOutOfRange { index: 1, len: 1 })
    ));

    let mut utxo_only = Wallet::import_utxo_keys(legacy_key().as_bytes())?;
    utxo_only.initial_funds(&utxo_genesis())?;
    assert_eq!(utxo_only.total_value(), Value(20_100));
    assert!(matches!(
        utxo_only.convert(&settings, VALID_UNTIL),
        Err(WalletError::NotFound(_))
    ));
    Ok(())
}

#[test]
fn test_nothing_to_convert() -> anyhow::Result<()> {
    init_test_logging();

    let mut wallet = Wallet::recover(MNEMONIC)?;
    let settings = wallet.initial_funds(&account_genesis(fees(), 1_000))?;

    let conversion = wallet.convert(&settings, VALID_UNTIL)?;
    assert!(conversion.is_empty());
    assert_eq!(conversion.ignored().count, 0);
    Ok(())
}
