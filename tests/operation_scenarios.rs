// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! End-to-end operation runs over fake chains and a fake guardian network.
//!
//! Source is a non-account-model chain (Solana, through a platform client);
//! destination is Sepolia, driven by the built-in account-model submitter.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use url::Url;

use token_bridge_rs::testing::{
    signed_vaa, FakeBridgeContract, FakeChainRpc, FakeClock, FakeConnector, FakeGuardian,
    FakePlatform, RpcEvent,
};
use token_bridge_rs::{
    AttestationWaiter, Bridge, BridgeError, BridgeOperation, ChainAdapter, ChainEndpoint,
    ChainHandle, ChainId, ChainName, EndpointResolver, MessageReference, OperationArtifact,
    OperationKind, OperationState, OperationStep, PayloadKind, SubmissionWarning, TokenId,
    TransactionSubmitter, TransferRequest, TxId, UniversalAddress, WaitConfig,
};

struct Harness {
    platform: FakePlatform,
    source_contract: FakeBridgeContract,
    rpc: FakeChainRpc,
    connector: FakeConnector,
    destination_contract: FakeBridgeContract,
    guardian: FakeGuardian,
    clock: FakeClock,
    bridge: Bridge<FakeGuardian, FakeClock>,
}

impl Harness {
    fn new() -> Self {
        let clock = FakeClock::new();
        let guardian = FakeGuardian::new();

        let platform = FakePlatform::new(ChainName::Solana);
        let source_contract = FakeBridgeContract::new(ChainName::Solana);
        let source = ChainHandle::new(
            Arc::new(ChainAdapter::other(Arc::new(platform.clone()))),
            Arc::new(source_contract.clone()),
        )
        .unwrap();

        let url = Url::parse("http://sepolia.test").unwrap();
        let rpc = FakeChainRpc::new(11155111);
        let connector = FakeConnector::new();
        connector.add_endpoint(url.clone(), rpc.clone());

        let submitter = TransactionSubmitter::builder()
            .clock(Arc::new(clock.clone()))
            .build();
        let adapter = ChainAdapter::account_model(
            ChainEndpoint::new(ChainName::Sepolia, vec![url]),
            Address::repeat_byte(0x11),
            EndpointResolver::new(Arc::new(connector.clone())),
            submitter,
        )
        .unwrap();
        let destination_contract = FakeBridgeContract::new(ChainName::Sepolia);
        let destination = ChainHandle::new(
            Arc::new(adapter),
            Arc::new(destination_contract.clone()),
        )
        .unwrap();

        let bridge = Bridge::builder()
            .chains(vec![source, destination])
            .waiter(AttestationWaiter::new(guardian.clone(), clock.clone()))
            .wait_config(WaitConfig::default())
            .build();

        Self {
            platform,
            source_contract,
            rpc,
            connector,
            destination_contract,
            guardian,
            clock,
            bridge,
        }
    }

    /// The source transaction will publish `message()`, which the guardians
    /// sign after two pending polls.
    fn with_signed_message(self, kind: PayloadKind) -> Self {
        self.platform.emit_messages(vec![message()]);
        self.guardian
            .sign_after(message(), 2, signed_vaa(&message(), kind));
        self
    }
}

fn token() -> TokenId {
    TokenId::new(ChainName::Solana, UniversalAddress::from([0x5e; 32]))
}

fn wrapped() -> UniversalAddress {
    UniversalAddress::from_evm(Address::repeat_byte(0x77))
}

fn message() -> MessageReference {
    MessageReference::new(ChainId::SOLANA, UniversalAddress::from([0xe1; 32]), 41)
}

fn transfer_request() -> TransferRequest {
    TransferRequest {
        token: token(),
        amount: U256::from(1_500_000_000u64),
        recipient_chain: ChainName::Sepolia,
        recipient: UniversalAddress::from_evm(Address::repeat_byte(0x22)),
    }
}

#[tokio::test]
async fn test_attest_runs_to_completion() {
    let harness = Harness::new().with_signed_message(PayloadKind::AttestMeta);
    harness
        .destination_contract
        .wrap_on_submit(token(), wrapped());

    let mut op = BridgeOperation::attest(token(), ChainName::Sepolia).unwrap();
    let artifact = harness.bridge.execute(&mut op).await.unwrap();

    assert_eq!(artifact, OperationArtifact::WrappedAsset(wrapped()));
    assert!(!wrapped().is_zero());
    assert_eq!(op.state(), OperationState::Completed);
    assert_eq!(op.source_transactions().len(), 1);
    assert!(!op.destination_transactions().is_empty());
    assert_eq!(op.message(), Some(&message()));
    assert!(op.warnings().is_empty());

    assert_eq!(harness.source_contract.builds(), vec!["attest_token"]);
    assert_eq!(harness.destination_contract.builds(), vec!["create_wrapped"]);
    assert_eq!(harness.guardian.call_count(&message()), 3);
    assert_eq!(harness.rpc.sent().len(), 1);
    assert!(harness.rpc.sent()[0].gas.limit.is_some());
}

#[tokio::test]
async fn test_already_attested_token_short_circuits() {
    let harness = Harness::new().with_signed_message(PayloadKind::AttestMeta);
    harness
        .destination_contract
        .set_wrapped_asset(token(), wrapped());

    let mut op = BridgeOperation::attest(token(), ChainName::Sepolia).unwrap();
    let artifact = harness.bridge.execute(&mut op).await.unwrap();

    assert_eq!(artifact, OperationArtifact::WrappedAsset(wrapped()));
    assert_eq!(op.state(), OperationState::Completed);
    assert_eq!(op.transactions().count(), 0);
    assert!(harness.platform.submitted().is_empty());
    assert!(harness.rpc.sent().is_empty());
    assert_eq!(harness.guardian.total_calls(), 0);
    assert_eq!(harness.destination_contract.wrapped_asset_queries(), 1);
}

#[tokio::test]
async fn test_attestation_timeout_leaves_source_tx_for_resume() {
    let harness = Harness::new();
    harness.platform.emit_messages(vec![message()]);

    let mut op = BridgeOperation::attest(token(), ChainName::Sepolia).unwrap();
    let err = harness.bridge.execute(&mut op).await.unwrap_err();

    assert!(matches!(
        err,
        BridgeError::OperationFailed {
            step: OperationStep::AttestationWait,
            ..
        }
    ));
    assert!(matches!(
        err.root(),
        BridgeError::AttestationTimeout { reference, waited }
            if *reference == message() && *waited == Duration::from_secs(300)
    ));
    assert_eq!(op.state(), OperationState::Failed);
    assert_eq!(harness.clock.total_sleep_time(), Duration::from_secs(300));
    assert!(harness.rpc.sent().is_empty());

    let source_tx = op.source_transactions()[0].hash.clone();
    assert_eq!(err.resumable_from(), Some(&source_tx));
    assert_eq!(op.source_tx(), Some(&source_tx));

    // Guardians catch up; resuming reuses the recorded source transaction.
    harness
        .guardian
        .sign_after(message(), 0, signed_vaa(&message(), PayloadKind::AttestMeta));
    harness
        .destination_contract
        .wrap_on_submit(token(), wrapped());

    let mut resumed = BridgeOperation::resume(
        OperationKind::Attest,
        ChainName::Solana,
        ChainName::Sepolia,
        token(),
        source_tx,
    )
    .unwrap();
    let artifact = harness.bridge.execute(&mut resumed).await.unwrap();

    assert_eq!(artifact, OperationArtifact::WrappedAsset(wrapped()));
    assert_eq!(resumed.message(), Some(&message()));
    assert!(resumed.source_transactions().is_empty());
    assert_eq!(harness.platform.submitted().len(), 1);
}

#[tokio::test]
async fn test_gas_estimation_failure_still_completes() {
    let harness = Harness::new().with_signed_message(PayloadKind::AttestMeta);
    harness
        .destination_contract
        .wrap_on_submit(token(), wrapped());
    harness.rpc.fail_gas_estimation("execution reverted");

    let mut op = BridgeOperation::attest(token(), ChainName::Sepolia).unwrap();
    harness.bridge.execute(&mut op).await.unwrap();

    assert_eq!(op.state(), OperationState::Completed);
    assert_eq!(harness.rpc.estimate_calls(), 1);
    assert_eq!(harness.rpc.sent()[0].gas.limit, None);
    assert!(matches!(
        op.warnings(),
        [SubmissionWarning::GasEstimationFailed {
            chain: ChainName::Sepolia,
            ..
        }]
    ));
}

#[tokio::test]
async fn test_destination_revert_fails_with_hash_and_status() {
    let harness = Harness::new().with_signed_message(PayloadKind::AttestMeta);
    harness.rpc.set_receipt_status(0);

    let mut op = BridgeOperation::attest(token(), ChainName::Sepolia).unwrap();
    let err = harness.bridge.execute(&mut op).await.unwrap_err();

    let expected = TxId::from(harness.rpc.tx_hash(0));
    assert_eq!(err.revert_details(), Some((&expected, 0)));
    assert!(matches!(
        err,
        BridgeError::OperationFailed {
            step: OperationStep::DestinationSubmission,
            ..
        }
    ));
    assert_eq!(op.state(), OperationState::Failed);
    assert!(op.destination_transactions().is_empty());
    assert_eq!(harness.rpc.sent().len(), 1);
}

#[tokio::test]
async fn test_resume_without_message_fails_before_waiting() {
    let harness = Harness::new();
    harness
        .platform
        .insert_transaction(TxId::from("no-message-sig"), vec![]);

    let mut op = BridgeOperation::resume(
        OperationKind::Transfer,
        ChainName::Solana,
        ChainName::Sepolia,
        token(),
        TxId::from("no-message-sig"),
    )
    .unwrap();
    let err = harness.bridge.execute(&mut op).await.unwrap_err();

    assert!(matches!(
        err,
        BridgeError::OperationFailed {
            step: OperationStep::Resume,
            ..
        }
    ));
    assert!(matches!(
        err.root(),
        BridgeError::NoMessageFound { tx } if tx.as_str() == "no-message-sig"
    ));
    assert_eq!(op.state(), OperationState::Failed);
    assert_eq!(harness.guardian.total_calls(), 0);
    assert_eq!(harness.clock.sleep_count(), 0);
    assert!(harness.connector.connections().is_empty());
}

#[tokio::test]
async fn test_transfer_returns_destination_tx() {
    let harness = Harness::new().with_signed_message(PayloadKind::Transfer);

    let mut op = BridgeOperation::transfer(ChainName::Solana, transfer_request()).unwrap();
    let artifact = harness.bridge.execute(&mut op).await.unwrap();

    assert_eq!(
        artifact,
        OperationArtifact::DestinationTx(TxId::from(harness.rpc.tx_hash(0)))
    );
    assert_eq!(harness.source_contract.builds(), vec!["transfer_tokens"]);
    assert_eq!(harness.destination_contract.builds(), vec!["complete_transfer"]);
    // Transfers are never short-circuited.
    assert_eq!(harness.destination_contract.wrapped_asset_queries(), 0);
}

#[tokio::test]
async fn test_transfer_waits_with_transfer_deadline() {
    let harness = Harness::new();
    harness.platform.emit_messages(vec![message()]);

    let mut op = BridgeOperation::transfer(ChainName::Solana, transfer_request()).unwrap();
    let err = harness.bridge.execute(&mut op).await.unwrap_err();

    assert!(matches!(err.root(), BridgeError::AttestationTimeout { .. }));
    assert_eq!(harness.clock.total_sleep_time(), Duration::from_secs(30 * 60));
}

#[tokio::test]
async fn test_resume_matches_fresh_run_reference() {
    let harness = Harness::new().with_signed_message(PayloadKind::Transfer);

    let mut fresh = BridgeOperation::transfer(ChainName::Solana, transfer_request()).unwrap();
    harness.bridge.execute(&mut fresh).await.unwrap();
    let source_tx = fresh.source_tx().cloned().unwrap();

    let mut resumed = BridgeOperation::resume(
        OperationKind::Transfer,
        ChainName::Solana,
        ChainName::Sepolia,
        token(),
        source_tx,
    )
    .unwrap();
    harness.bridge.execute(&mut resumed).await.unwrap();

    assert_eq!(resumed.message(), fresh.message());
}

#[tokio::test]
async fn test_executed_operation_cannot_rerun() {
    let harness = Harness::new();
    harness
        .destination_contract
        .set_wrapped_asset(token(), wrapped());

    let mut op = BridgeOperation::attest(token(), ChainName::Sepolia).unwrap();
    harness.bridge.execute(&mut op).await.unwrap();

    assert!(matches!(
        harness.bridge.execute(&mut op).await,
        Err(BridgeError::InvalidTransition {
            from: OperationState::Completed,
            ..
        })
    ));
}

#[tokio::test]
async fn test_missing_wrapped_asset_after_submission_fails() {
    let harness = Harness::new().with_signed_message(PayloadKind::AttestMeta);

    let mut op = BridgeOperation::attest(token(), ChainName::Sepolia).unwrap();
    let err = harness.bridge.execute(&mut op).await.unwrap_err();

    assert!(matches!(
        err,
        BridgeError::OperationFailed {
            step: OperationStep::WrappedAssetVerification,
            ..
        }
    ));
    assert!(matches!(
        err.root(),
        BridgeError::WrappedAssetNotFound {
            chain: ChainName::Sepolia,
            ..
        }
    ));
}

#[tokio::test]
async fn test_destination_intents_confirm_in_order() {
    let harness = Harness::new().with_signed_message(PayloadKind::Transfer);
    harness.destination_contract.set_transactions_per_build(2);
    harness.rpc.delay_receipts(1);

    let mut op = BridgeOperation::transfer(ChainName::Solana, transfer_request()).unwrap();
    let artifact = harness.bridge.execute(&mut op).await.unwrap();

    let (first, second) = (harness.rpc.tx_hash(0), harness.rpc.tx_hash(1));
    assert_eq!(
        harness.rpc.journal(),
        vec![
            RpcEvent::Sent(first),
            RpcEvent::Confirmed(first),
            RpcEvent::Sent(second),
            RpcEvent::Confirmed(second),
        ]
    );
    let recorded: Vec<TxId> = op
        .destination_transactions()
        .iter()
        .map(|tx| tx.hash.clone())
        .collect();
    assert_eq!(recorded, vec![TxId::from(first), TxId::from(second)]);
    assert_eq!(artifact, OperationArtifact::DestinationTx(TxId::from(second)));
}

#[tokio::test]
async fn test_destination_revert_stops_the_sequence() {
    let harness = Harness::new().with_signed_message(PayloadKind::Transfer);
    harness.destination_contract.set_transactions_per_build(2);
    harness.rpc.revert_nth(0);

    let mut op = BridgeOperation::transfer(ChainName::Solana, transfer_request()).unwrap();
    let err = harness.bridge.execute(&mut op).await.unwrap_err();

    let first = harness.rpc.tx_hash(0);
    assert_eq!(err.revert_details(), Some((&TxId::from(first), 0)));
    assert_eq!(harness.rpc.sent().len(), 1);
    assert_eq!(
        harness.rpc.journal(),
        vec![RpcEvent::Sent(first), RpcEvent::Confirmed(first)]
    );
    assert!(op.destination_transactions().is_empty());
    // The source message is intact, so the operation can be resumed.
    assert_eq!(
        err.resumable_from(),
        Some(&op.source_transactions()[0].hash)
    );
}

#[tokio::test]
async fn test_partial_source_sequence_is_not_resumable() {
    let harness = Harness::new().with_signed_message(PayloadKind::Transfer);
    harness.source_contract.set_transactions_per_build(2);
    harness.platform.revert_nth(1);

    let mut op = BridgeOperation::transfer(ChainName::Solana, transfer_request()).unwrap();
    let err = harness.bridge.execute(&mut op).await.unwrap_err();

    assert!(matches!(
        err,
        BridgeError::OperationFailed {
            step: OperationStep::SourceSubmission,
            ..
        }
    ));
    assert!(matches!(
        err.root(),
        BridgeError::TransactionReverted { status: 0, .. }
    ));
    // The sequence never completed, so no message-bearing transaction exists.
    assert_eq!(op.source_transactions().len(), 1);
    assert_eq!(err.resumable_from(), None);
    assert_eq!(op.source_tx(), None);
    assert_eq!(harness.guardian.total_calls(), 0);
}

#[tokio::test]
async fn test_source_without_message_is_not_resumable() {
    let harness = Harness::new();

    let mut op = BridgeOperation::attest(token(), ChainName::Sepolia).unwrap();
    let err = harness.bridge.execute(&mut op).await.unwrap_err();

    assert!(matches!(
        err,
        BridgeError::OperationFailed {
            step: OperationStep::MessageParsing,
            ..
        }
    ));
    assert!(matches!(err.root(), BridgeError::NoMessageFound { .. }));
    assert_eq!(op.source_transactions().len(), 1);
    assert_eq!(err.resumable_from(), None);
}

#[tokio::test]
async fn test_resume_point_is_the_message_transaction() {
    let harness = Harness::new();
    harness.platform.emit_messages(vec![message()]);
    harness.source_contract.set_transactions_per_build(2);

    let mut op = BridgeOperation::transfer(ChainName::Solana, transfer_request()).unwrap();
    let err = harness.bridge.execute(&mut op).await.unwrap_err();

    assert!(matches!(err.root(), BridgeError::AttestationTimeout { .. }));
    let last = &op.source_transactions()[1].hash;
    assert_eq!(err.resumable_from(), Some(last));
    assert_eq!(op.source_tx(), Some(last));
}
