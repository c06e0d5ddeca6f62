//! Fragment codec and genesis settings tests
//!
//! Run with: cargo test --test fragment_codec_test -- --nocapture

mod common;

use common::*;
use wallet_engine::chain::block::HEADER_SIZE;
use wallet_engine::chain::{Block, BlockDate, PerVoteCertificateFee};
use wallet_engine::{Fragment, FragmentId, LinearFee, Settings, Wallet, WalletError};

#[test]
fn test_fragment_id_is_stable() -> anyhow::Result<()> {
    init_test_logging();

    let block = Block::from_bytes(&utxo_genesis())?;
    for (id, fragment) in block.fragments() {
        let bytes = fragment.to_bytes()?;
        let decoded = Fragment::from_bytes(&bytes)?;

        assert_eq!(decoded.id()?, *id);
        assert_eq!(decoded.id()?, decoded.id()?);
        assert_eq!(decoded.to_bytes()?, bytes, "Re-encoding must be canonical");
    }
    Ok(())
}

#[test]
fn test_fragment_id_text_form() -> anyhow::Result<()> {
    let block = Block::from_bytes(&utxo_genesis())?;
    let (id, _) = &block.fragments()[1];

    let parsed: FragmentId = id.to_string().parse()?;
    assert_eq!(&parsed, id);
    assert_eq!(id.to_string().len(), 64);
    Ok(())
}

#[test]
fn test_genesis_header() -> anyhow::Result<()> {
    init_test_logging();

    let bytes = utxo_genesis();
    let block = Block::from_bytes(&bytes)?;
    let header = block.header();

    assert_eq!(header.chain_length, 0);
    assert_eq!(header.date, BlockDate::default());
    assert_eq!(header.content_size as usize, bytes.len() - HEADER_SIZE);
    assert_eq!(Settings::from_block(&bytes)?.block0_initial_hash(), &block.id());
    Ok(())
}

#[test]
fn test_malformed_fragments() {
    init_test_logging();

    let cases: [(&str, Vec<u8>); 4] = [
        ("empty", vec![]),
        ("size without content", vec![0, 0, 0, 10, 2]),
        ("zero size", vec![0, 0, 0, 0]),
        ("transaction truncated", vec![0, 0, 0, 3, 2, 1, 0]),
    ];
    for (name, bytes) in cases {
        assert!(
            matches!(Fragment::from_bytes(&bytes), Err(WalletError::InvalidFragment(_))),
            "{} should be rejected",
            name
        );
    }
}

#[test]
fn test_apply_external_fragment() -> anyhow::Result<()> {
    init_test_logging();

    // A later fragment paying the account arrives outside the genesis block
    let mut wallet = Wallet::recover(MNEMONIC)?;
    wallet.initial_funds(&account_genesis(fees(), 100))?;

    let extra = Block::from_bytes(&account_genesis(fees(), 250))?;
    let (_, payment) = &extra.fragments()[1];
    let bytes = payment.to_bytes()?;

    assert!(!wallet.is_known(&payment.id()?));
    assert!(wallet.apply_fragment(&bytes)?);
    assert!(wallet.is_known(&payment.id()?));
    assert_eq!(wallet.account_balance().0, 350);
    assert!(!wallet.apply_fragment(&bytes)?, "Same fragment twice is a no-op");
    assert_eq!(wallet.account_balance().0, 350);
    Ok(())
}

#[test]
fn test_vote_fee_from_genesis() -> anyhow::Result<()> {
    init_test_logging();

    let mut fees = LinearFee::new(1, 2, 3);
    fees.per_vote_certificate_fees = PerVoteCertificateFee {
        vote_plan: 0,
        vote_cast: 9,
    };
    let settings = Settings::from_block(&account_genesis(fees, 0))?;

    assert_eq!(settings.fees().per_vote_certificate_fees.vote_cast, 9);
    assert_eq!(settings.transaction_max_expiry_epochs(), 1);
    assert_eq!(settings.time_era().slots_per_epoch(), SLOTS_PER_EPOCH);
    assert_eq!(settings.slot_duration(), SLOT_DURATION);
    Ok(())
}
