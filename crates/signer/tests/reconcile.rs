use ethers::{
    abi::{self, Token},
    providers::{MockProvider, Provider},
    types::{Address, Bytes, Log, H256, I256, U256, U64},
    utils::keccak256,
};
use quill_signer::{Reconciler, SignerError, SpendAsset, SubmissionReceipt};
use std::sync::Arc;

const ENTRY_POINT: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";

fn receipt(sender: Address, nonce: u64, block: u64) -> SubmissionReceipt {
    SubmissionReceipt {
        sender,
        nonce: nonce.into(),
        tx_hash: H256::zero(),
        block_number: U64::from(block),
        gas_used: U256::from(90_000),
        relay_gas_used: None,
    }
}

fn completion_event_log(
    entry_point: Address,
    sender: Address,
    nonce: u64,
    gas_used: u64,
    block: u64,
) -> Log {
    let signature = H256::from(keccak256(
        "UserOperationEvent(bytes32,address,address,uint256,bool,uint256,uint256)",
    ));
    Log {
        address: entry_point,
        topics: vec![signature, H256::zero(), H256::from(sender), H256::from(Address::zero())],
        data: abi::encode(&[
            Token::Uint(nonce.into()),
            Token::Bool(true),
            Token::Uint(U256::from(gas_used) * 1_000),
            Token::Uint(gas_used.into()),
        ])
        .into(),
        block_hash: Some(H256::zero()),
        block_number: Some(U64::from(block)),
        transaction_hash: Some(H256::zero()),
        transaction_index: Some(U64::zero()),
        log_index: Some(U256::zero()),
        transaction_log_index: None,
        log_type: None,
        removed: Some(false),
    }
}

#[tokio::test]
async fn token_spend_reconciles_against_entry_point_event() {
    let (provider, mock) = Provider::mocked();
    let entry_point: Address = ENTRY_POINT.parse().unwrap();
    let token = Address::random();
    let sender = Address::random();

    let reconciler = Reconciler::new(Arc::new(provider), entry_point, SpendAsset::Erc20(token));

    // the balance query runs before the event query; responses are served
    // in reverse push order
    mock.push::<Vec<Log>, _>(vec![completion_event_log(entry_point, sender, 1, 97, 7)]).unwrap();
    mock.push::<Bytes, _>(Bytes::from(abi::encode(&[Token::Uint(U256::from(1_000))]))).unwrap();

    let reconciliation =
        reconciler.reconcile(&receipt(sender, 1, 7), U256::from(1_100)).await.unwrap();

    assert_eq!(reconciliation.gas_paid, U256::from(100));
    assert_eq!(reconciliation.gas_used, U256::from(97));
    assert_eq!(reconciliation.delta, I256::from(3));
}

#[tokio::test]
async fn missing_event_is_reported_incomplete() {
    let (provider, mock) = Provider::mocked();
    let entry_point: Address = ENTRY_POINT.parse().unwrap();
    let sender = Address::random();

    let reconciler = Reconciler::new(Arc::new(provider), entry_point, SpendAsset::Native);

    mock.push::<Vec<Log>, _>(Vec::<Log>::new()).unwrap();
    mock.push(U256::from(1_000)).unwrap();

    let err = reconciler.reconcile(&receipt(sender, 1, 7), U256::from(1_100)).await.unwrap_err();
    match err {
        SignerError::ReconciliationIncomplete { nonce, block, .. } => {
            assert_eq!(nonce, U256::from(1));
            assert_eq!(block, U64::from(7));
        }
        other => panic!("expected ReconciliationIncomplete, got {other:?}"),
    }
}

#[tokio::test]
async fn event_for_another_nonce_does_not_reconcile() {
    let (provider, mock) = Provider::mocked();
    let entry_point: Address = ENTRY_POINT.parse().unwrap();
    let sender = Address::random();

    let reconciler = Reconciler::new(Arc::new(provider), entry_point, SpendAsset::Native);

    // the entry point emitted an event in the block, but for a different nonce
    mock.push::<Vec<Log>, _>(vec![completion_event_log(entry_point, sender, 2, 97, 7)]).unwrap();
    mock.push(U256::from(1_000)).unwrap();

    let err = reconciler.reconcile(&receipt(sender, 1, 7), U256::from(1_100)).await.unwrap_err();
    assert!(matches!(err, SignerError::ReconciliationIncomplete { .. }));
}
