// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Fake implementations of the bridge capability traits
//!
//! These let the orchestrator be exercised end to end, including adversarial
//! cases (dead RPC endpoints, reverts, failing gas estimation, rate limits,
//! attestation delays), without a chain or the guardian network.
//!
//! Every fake is cheap to clone and clones share state, so a test can keep a
//! handle for configuration and assertions after handing one to the code
//! under test.

use alloy_primitives::{keccak256, Address, Bytes, FixedBytes, TxHash, U256};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use url::Url;

use crate::error::{BridgeError, Result};
use crate::protocol::{
    AssetMeta, Attestation, ChainId, ChainName, GuardianSignature, MessageReference, PayloadKind,
    Platform, PlatformTransaction, ReceiptSummary, SubmittedTransaction, TokenId,
    TransactionIntent, TransferRequest, TxId, UniversalAddress, UnsignedTransaction,
};
use crate::traits::{
    BridgeContract, ChainRpc, Clock, GuardianService, PlatformClient, RpcConnector,
};

// ============================================================================
// Fake Chain RPC
// ============================================================================

#[derive(Debug)]
struct RpcState {
    chain_id: u64,
    offline: bool,
    gas_estimate: std::result::Result<U256, String>,
    estimate_calls: usize,
    sent: Vec<TransactionIntent>,
    receipts: HashMap<TxHash, ReceiptSummary>,
    messages: HashMap<TxHash, Vec<MessageReference>>,
    withhold_receipts: bool,
    receipt_status: u64,
    reverted: HashSet<usize>,
    receipt_delay: usize,
    receipt_polls: HashMap<TxHash, usize>,
    journal: Vec<RpcEvent>,
    emitted: Vec<MessageReference>,
}

/// What a [`FakeChainRpc`] observed, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RpcEvent {
    Sent(TxHash),
    Confirmed(TxHash),
}

/// A fake account-model node.
///
/// Sent transactions are mined immediately with the configured receipt
/// status (1 by default) and hashes derived from a per-node counter.
#[derive(Clone, Debug)]
pub struct FakeChainRpc {
    state: Arc<Mutex<RpcState>>,
}

impl FakeChainRpc {
    pub const DEFAULT_GAS_ESTIMATE: u64 = 100_000;
    pub const GAS_USED: u64 = 52_000;

    pub fn new(chain_id: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(RpcState {
                chain_id,
                offline: false,
                gas_estimate: Ok(U256::from(Self::DEFAULT_GAS_ESTIMATE)),
                estimate_calls: 0,
                sent: Vec::new(),
                receipts: HashMap::new(),
                messages: HashMap::new(),
                withhold_receipts: false,
                receipt_status: 1,
                reverted: HashSet::new(),
                receipt_delay: 0,
                receipt_polls: HashMap::new(),
                journal: Vec::new(),
                emitted: Vec::new(),
            })),
        }
    }

    /// A node that accepts connections but never answers.
    pub fn offline(chain_id: u64) -> Self {
        let rpc = Self::new(chain_id);
        rpc.state.lock().unwrap().offline = true;
        rpc
    }

    pub fn set_gas_estimate(&self, gas: U256) {
        self.state.lock().unwrap().gas_estimate = Ok(gas);
    }

    /// Make every `eth_estimateGas` call fail with `reason`.
    pub fn fail_gas_estimation(&self, reason: &str) {
        self.state.lock().unwrap().gas_estimate = Err(reason.to_string());
    }

    pub fn estimate_calls(&self) -> usize {
        self.state.lock().unwrap().estimate_calls
    }

    /// Transactions are accepted but never mined.
    pub fn withhold_receipts(&self) {
        self.state.lock().unwrap().withhold_receipts = true;
    }

    /// Receipt status for transactions sent from now on.
    pub fn set_receipt_status(&self, status: u64) {
        self.state.lock().unwrap().receipt_status = status;
    }

    /// Receipt status 0 for the `n`th transaction sent (0-based), whatever
    /// the configured status.
    pub fn revert_nth(&self, n: usize) {
        self.state.lock().unwrap().reverted.insert(n);
    }

    /// Report each receipt as pending for its first `polls` queries.
    ///
    /// Pending queries yield to the scheduler, so concurrent submissions
    /// interleave while a receipt is outstanding.
    pub fn delay_receipts(&self, polls: usize) {
        self.state.lock().unwrap().receipt_delay = polls;
    }

    /// Sends and confirmations observed so far, in order.
    pub fn journal(&self) -> Vec<RpcEvent> {
        self.state.lock().unwrap().journal.clone()
    }

    /// Messages published by every transaction sent from now on.
    pub fn emit_messages(&self, messages: Vec<MessageReference>) {
        self.state.lock().unwrap().emitted = messages;
    }

    /// Register an already-mined transaction.
    pub fn insert_transaction(&self, hash: TxHash, messages: Vec<MessageReference>) {
        let mut state = self.state.lock().unwrap();
        state.receipts.insert(
            hash,
            ReceiptSummary {
                status: 1,
                gas_used: Self::GAS_USED,
            },
        );
        state.messages.insert(hash, messages);
    }

    /// Intents broadcast so far, in order.
    pub fn sent(&self) -> Vec<TransactionIntent> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Hash the `n`th transaction sent through this node will get (0-based).
    pub fn tx_hash(&self, n: usize) -> TxHash {
        let chain_id = self.state.lock().unwrap().chain_id;
        keccak256(format!("fake-tx-{chain_id}-{n}"))
    }
}

#[async_trait]
impl ChainRpc for FakeChainRpc {
    async fn chain_id(&self) -> Result<u64> {
        let state = self.state.lock().unwrap();
        if state.offline {
            return Err(BridgeError::Provider("connection refused".to_string()));
        }
        Ok(state.chain_id)
    }

    async fn estimate_gas(&self, _intent: &TransactionIntent) -> Result<U256> {
        let mut state = self.state.lock().unwrap();
        state.estimate_calls += 1;
        state
            .gas_estimate
            .clone()
            .map_err(BridgeError::Provider)
    }

    async fn send_transaction(&self, intent: &TransactionIntent) -> Result<TxHash> {
        let n = self.state.lock().unwrap().sent.len();
        let hash = self.tx_hash(n);

        let mut state = self.state.lock().unwrap();
        state.sent.push(intent.clone());
        state.journal.push(RpcEvent::Sent(hash));
        if !state.withhold_receipts {
            let status = if state.reverted.contains(&n) {
                0
            } else {
                state.receipt_status
            };
            state.receipts.insert(
                hash,
                ReceiptSummary {
                    status,
                    gas_used: Self::GAS_USED,
                },
            );
            let emitted = state.emitted.clone();
            state.messages.insert(hash, emitted);
        }
        Ok(hash)
    }

    async fn get_transaction_receipt(&self, hash: TxHash) -> Result<Option<ReceiptSummary>> {
        let pending = {
            let mut state = self.state.lock().unwrap();
            let delay = state.receipt_delay;
            let polls = state.receipt_polls.entry(hash).or_insert(0);
            *polls += 1;
            *polls <= delay
        };
        if pending {
            tokio::task::yield_now().await;
            return Ok(None);
        }

        let mut state = self.state.lock().unwrap();
        let receipt = state.receipts.get(&hash).copied();
        if receipt.is_some() {
            state.journal.push(RpcEvent::Confirmed(hash));
        }
        Ok(receipt)
    }

    async fn parse_transaction(&self, hash: TxHash) -> Result<Vec<MessageReference>> {
        self.state
            .lock()
            .unwrap()
            .messages
            .get(&hash)
            .cloned()
            .ok_or(BridgeError::TransactionNotFound { tx: hash.into() })
    }
}

// ============================================================================
// Fake RPC Connector
// ============================================================================

#[derive(Debug, Default)]
struct ConnectorState {
    endpoints: HashMap<Url, FakeChainRpc>,
    connections: Vec<Url>,
}

/// Hands out [`FakeChainRpc`] sessions by URL.
///
/// Unknown URLs fail to connect.
#[derive(Clone, Debug, Default)]
pub struct FakeConnector {
    state: Arc<Mutex<ConnectorState>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_endpoint(&self, url: Url, rpc: FakeChainRpc) {
        self.state.lock().unwrap().endpoints.insert(url, rpc);
    }

    /// An endpoint that connects but never answers the liveness probe.
    pub fn add_unreachable(&self, url: Url) {
        self.add_endpoint(url, FakeChainRpc::offline(0));
    }

    /// URLs connected to so far, in order.
    pub fn connections(&self) -> Vec<Url> {
        self.state.lock().unwrap().connections.clone()
    }
}

#[async_trait]
impl RpcConnector for FakeConnector {
    async fn connect(&self, url: &Url) -> Result<Arc<dyn ChainRpc>> {
        let mut state = self.state.lock().unwrap();
        state.connections.push(url.clone());
        match state.endpoints.get(url) {
            Some(rpc) => Ok(Arc::new(rpc.clone())),
            None => Err(BridgeError::Provider(format!("cannot connect to {url}"))),
        }
    }
}

// ============================================================================
// Fake Guardian Service
// ============================================================================

#[derive(Debug, Clone)]
enum GuardianScript {
    SignAfter { pending: usize, vaa: Bytes },
    RateLimit { retry_after_seconds: u64 },
    Error,
}

#[derive(Debug, Default)]
struct GuardianState {
    scripts: HashMap<MessageReference, GuardianScript>,
    calls: HashMap<MessageReference, usize>,
}

/// A scripted guardian network.
///
/// Messages without a script are never signed.
#[derive(Clone, Debug, Default)]
pub struct FakeGuardian {
    state: Arc<Mutex<GuardianState>>,
}

impl FakeGuardian {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer "not signed yet" `pending` times, then return `vaa`.
    pub fn sign_after(&self, reference: MessageReference, pending: usize, vaa: Bytes) {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(reference, GuardianScript::SignAfter { pending, vaa });
    }

    pub fn rate_limit(&self, reference: MessageReference, retry_after_seconds: u64) {
        self.state.lock().unwrap().scripts.insert(
            reference,
            GuardianScript::RateLimit {
                retry_after_seconds,
            },
        );
    }

    /// Every query for `reference` fails with a network-style error.
    pub fn fail_with_errors(&self, reference: MessageReference) {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(reference, GuardianScript::Error);
    }

    pub fn call_count(&self, reference: &MessageReference) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(reference)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls.values().sum()
    }
}

#[async_trait]
impl GuardianService for FakeGuardian {
    async fn get_attestation(&self, reference: &MessageReference) -> Result<Option<Bytes>> {
        let mut state = self.state.lock().unwrap();
        let call = {
            let calls = state.calls.entry(*reference).or_insert(0);
            *calls += 1;
            *calls
        };

        match state.scripts.get(reference) {
            None => Ok(None),
            Some(GuardianScript::SignAfter { pending, vaa }) => {
                if call > *pending {
                    Ok(Some(vaa.clone()))
                } else {
                    Ok(None)
                }
            }
            Some(GuardianScript::RateLimit {
                retry_after_seconds,
            }) => Err(BridgeError::RateLimitExceeded {
                retry_after_seconds: *retry_after_seconds,
            }),
            Some(GuardianScript::Error) => Err(BridgeError::Provider(
                "Simulated guardian API error".to_string(),
            )),
        }
    }
}

/// A well-formed VAA for `reference` carrying a payload of `kind`.
///
/// Metadata payloads describe a 9-decimal Solana token; transfer payloads
/// are zero-filled past the payload id.
pub fn signed_vaa(reference: &MessageReference, kind: PayloadKind) -> Bytes {
    let payload = match kind {
        PayloadKind::AttestMeta => AssetMeta {
            token_address: UniversalAddress::from([0x5e; 32]),
            token_chain: ChainId::SOLANA,
            decimals: 9,
            symbol: FixedBytes::right_padding_from(b"FAKE"),
            name: FixedBytes::right_padding_from(b"Fake Token"),
        }
        .encode(),
        PayloadKind::Transfer | PayloadKind::TransferWithPayload => {
            let mut bytes = vec![0u8; 133];
            bytes[0] = kind.id();
            Bytes::from(bytes)
        }
    };

    Attestation {
        version: 1,
        guardian_set_index: 0,
        signatures: vec![GuardianSignature {
            guardian_index: 0,
            signature: FixedBytes::from([0x11; 65]),
        }],
        timestamp: 1_700_000_000,
        nonce: 0,
        emitter_chain: reference.emitter_chain,
        emitter_address: reference.emitter_address,
        sequence: reference.sequence,
        consistency_level: 1,
        payload,
    }
    .encode()
}

// ============================================================================
// Fake Bridge Contract
// ============================================================================

#[derive(Debug, Default)]
struct ContractState {
    decimals: HashMap<UniversalAddress, u8>,
    decimals_queries: usize,
    wrapped: HashMap<TokenId, UniversalAddress>,
    wrap_on_submit: Option<(TokenId, UniversalAddress)>,
    fail_wrapped_queries: bool,
    wrapped_asset_queries: usize,
    transactions_per_build: Option<usize>,
    builds: Vec<&'static str>,
}

/// An in-memory token bridge.
///
/// Builders return one transaction per call, shaped for the chain's platform
/// family. The address they target is [`FakeBridgeContract::ADDRESS`].
#[derive(Clone, Debug)]
pub struct FakeBridgeContract {
    chain: ChainName,
    state: Arc<Mutex<ContractState>>,
}

impl FakeBridgeContract {
    pub const ADDRESS: Address = Address::repeat_byte(0xb7);

    pub fn new(chain: ChainName) -> Self {
        Self {
            chain,
            state: Arc::new(Mutex::new(ContractState::default())),
        }
    }

    pub fn set_decimals(&self, token: UniversalAddress, decimals: u8) {
        self.state.lock().unwrap().decimals.insert(token, decimals);
    }

    pub fn decimals_queries(&self) -> usize {
        self.state.lock().unwrap().decimals_queries
    }

    pub fn set_wrapped_asset(&self, token: TokenId, wrapped: UniversalAddress) {
        self.state.lock().unwrap().wrapped.insert(token, wrapped);
    }

    /// Register `wrapped` for `token` once a submit-attestation transaction
    /// has been built.
    pub fn wrap_on_submit(&self, token: TokenId, wrapped: UniversalAddress) {
        self.state.lock().unwrap().wrap_on_submit = Some((token, wrapped));
    }

    pub fn fail_wrapped_asset_queries(&self) {
        self.state.lock().unwrap().fail_wrapped_queries = true;
    }

    pub fn wrapped_asset_queries(&self) -> usize {
        self.state.lock().unwrap().wrapped_asset_queries
    }

    /// Return `n` transactions from every builder instead of one.
    pub fn set_transactions_per_build(&self, n: usize) {
        self.state.lock().unwrap().transactions_per_build = Some(n);
    }

    /// Builder methods called so far, in order.
    pub fn builds(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().builds.clone()
    }

    fn build(&self, method: &'static str) -> Vec<UnsignedTransaction> {
        let mut state = self.state.lock().unwrap();
        state.builds.push(method);
        let count = state.transactions_per_build.unwrap_or(1);
        drop(state);

        (0..count)
            .map(|i| match self.chain.platform() {
                Platform::AccountModel => UnsignedTransaction::AccountModel(
                    TransactionIntent::call(Self::ADDRESS, method.as_bytes().to_vec()),
                ),
                Platform::Other => UnsignedTransaction::Platform(PlatformTransaction {
                    description: format!("{method} #{i}"),
                    payload: Bytes::copy_from_slice(method.as_bytes()),
                }),
            })
            .collect()
    }
}

#[async_trait]
impl BridgeContract for FakeBridgeContract {
    fn chain(&self) -> ChainName {
        self.chain
    }

    async fn build_attestation_tx(
        &self,
        _token: &TokenId,
        _payer: &UniversalAddress,
    ) -> Result<Vec<UnsignedTransaction>> {
        Ok(self.build("attest_token"))
    }

    async fn build_submit_attestation_tx(
        &self,
        _attestation: &Attestation,
        _payer: &UniversalAddress,
    ) -> Result<Vec<UnsignedTransaction>> {
        let txs = self.build("create_wrapped");
        let mut state = self.state.lock().unwrap();
        if let Some((token, wrapped)) = state.wrap_on_submit.take() {
            state.wrapped.insert(token, wrapped);
        }
        Ok(txs)
    }

    async fn build_transfer_tx(
        &self,
        _transfer: &TransferRequest,
        _payer: &UniversalAddress,
    ) -> Result<Vec<UnsignedTransaction>> {
        Ok(self.build("transfer_tokens"))
    }

    async fn build_redeem_tx(
        &self,
        _payer: &UniversalAddress,
        _attestation: &Attestation,
    ) -> Result<Vec<UnsignedTransaction>> {
        Ok(self.build("complete_transfer"))
    }

    async fn get_wrapped_asset(&self, token: &TokenId) -> Result<Option<UniversalAddress>> {
        let mut state = self.state.lock().unwrap();
        state.wrapped_asset_queries += 1;
        if state.fail_wrapped_queries {
            return Err(BridgeError::Provider("Simulated RPC error".to_string()));
        }
        Ok(state.wrapped.get(token).copied())
    }

    async fn get_decimals(&self, token: &UniversalAddress) -> Result<u8> {
        let mut state = self.state.lock().unwrap();
        state.decimals_queries += 1;
        state
            .decimals
            .get(token)
            .copied()
            .ok_or_else(|| BridgeError::Provider(format!("no decimals for {token}")))
    }
}

// ============================================================================
// Fake Platform Client
// ============================================================================

#[derive(Debug, Default)]
struct PlatformState {
    transactions: HashMap<TxId, Vec<MessageReference>>,
    submitted: Vec<PlatformTransaction>,
    emitted: Vec<MessageReference>,
    status: Option<u64>,
    reverted: HashSet<usize>,
}

/// A non-account-model chain that confirms every transaction instantly.
#[derive(Clone, Debug)]
pub struct FakePlatform {
    chain: ChainName,
    signer: UniversalAddress,
    state: Arc<Mutex<PlatformState>>,
}

impl FakePlatform {
    pub fn new(chain: ChainName) -> Self {
        Self {
            chain,
            signer: UniversalAddress::from([0x50; 32]),
            state: Arc::new(Mutex::new(PlatformState::default())),
        }
    }

    /// Register an already-confirmed transaction.
    pub fn insert_transaction(&self, tx: TxId, messages: Vec<MessageReference>) {
        self.state.lock().unwrap().transactions.insert(tx, messages);
    }

    /// Messages published by every transaction submitted from now on.
    pub fn emit_messages(&self, messages: Vec<MessageReference>) {
        self.state.lock().unwrap().emitted = messages;
    }

    pub fn set_status(&self, status: u64) {
        self.state.lock().unwrap().status = Some(status);
    }

    /// Receipt status 0 for the `n`th submission (0-based).
    pub fn revert_nth(&self, n: usize) {
        self.state.lock().unwrap().reverted.insert(n);
    }

    pub fn submitted(&self) -> Vec<PlatformTransaction> {
        self.state.lock().unwrap().submitted.clone()
    }
}

#[async_trait]
impl PlatformClient for FakePlatform {
    fn chain(&self) -> ChainName {
        self.chain
    }

    fn signer_address(&self) -> UniversalAddress {
        self.signer
    }

    async fn sign_send_wait(&self, tx: &PlatformTransaction) -> Result<SubmittedTransaction> {
        let mut state = self.state.lock().unwrap();
        let n = state.submitted.len();
        state.submitted.push(tx.clone());
        let hash = TxId::from(format!("{}-sig-{}", self.chain, n + 1));
        let emitted = state.emitted.clone();
        state.transactions.insert(hash.clone(), emitted);

        let status = if state.reverted.contains(&n) {
            0
        } else {
            state.status.unwrap_or(1)
        };
        Ok(SubmittedTransaction {
            chain: self.chain,
            hash,
            status,
            gas_used: 5_000,
        })
    }

    async fn parse_transaction(&self, tx: &TxId) -> Result<Vec<MessageReference>> {
        self.state
            .lock()
            .unwrap()
            .transactions
            .get(tx)
            .cloned()
            .ok_or_else(|| BridgeError::TransactionNotFound { tx: tx.clone() })
    }
}

// ============================================================================
// Fake Clock
// ============================================================================

/// A fake clock for testing time-dependent behavior without actual delays.
///
/// Sleeps return immediately and advance the clock by the requested
/// duration.
#[derive(Clone, Debug)]
pub struct FakeClock {
    current_time: Arc<Mutex<Instant>>,
    sleep_log: Arc<Mutex<Vec<Duration>>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self {
            current_time: Arc::new(Mutex::new(Instant::now())),
            sleep_log: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fast-forward the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut time = self.current_time.lock().unwrap();
        *time += duration;
    }

    /// Get the total time "slept" by this clock
    pub fn total_sleep_time(&self) -> Duration {
        self.sleep_log.lock().unwrap().iter().sum()
    }

    /// Get the number of times sleep was called
    pub fn sleep_count(&self) -> usize {
        self.sleep_log.lock().unwrap().len()
    }
}

#[async_trait]
impl Clock for FakeClock {
    async fn sleep(&self, duration: Duration) {
        self.sleep_log.lock().unwrap().push(duration);
        self.advance(duration);
    }

    fn now(&self) -> Instant {
        *self.current_time.lock().unwrap()
    }
}
