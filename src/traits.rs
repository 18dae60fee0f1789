// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Capability traits the orchestrator is built on.
//!
//! Every external system the bridge touches (chain RPC nodes, the guardian
//! network, bridge contracts, non-EVM platform clients and time itself) sits
//! behind one of these traits. Production implementations live in
//! [`crate::providers`]; [`crate::testing`] provides fakes that can simulate
//! reverts, dead endpoints, rate limiting and attestation delays.
//!
//! # Example: Implementing a Test Fake
//!
//! ```rust,ignore
//! use token_bridge_rs::{GuardianService, MessageReference, Result};
//! use alloy_primitives::Bytes;
//!
//! struct NeverSigned;
//!
//! #[async_trait::async_trait]
//! impl GuardianService for NeverSigned {
//!     async fn get_attestation(&self, _: &MessageReference) -> Result<Option<Bytes>> {
//!         Ok(None)
//!     }
//! }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy_primitives::{Bytes, TxHash, U256};
use async_trait::async_trait;
use url::Url;

use crate::error::Result;
use crate::protocol::{
    Attestation, ChainName, MessageReference, PlatformTransaction, ReceiptSummary,
    SubmittedTransaction, TokenId, TransactionIntent, TransferRequest, TxId, UniversalAddress,
    UnsignedTransaction,
};

/// JSON-RPC access to one account-model chain through one endpoint.
///
/// The implementation owns the signing wallet; callers only hand over
/// unsigned intents.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// EVM chain ID reported by the node. Used as the liveness probe.
    async fn chain_id(&self) -> Result<u64>;

    /// Estimates the gas limit for an intent.
    async fn estimate_gas(&self, intent: &TransactionIntent) -> Result<U256>;

    /// Signs and broadcasts an intent, returning as soon as the node accepts
    /// it.
    async fn send_transaction(&self, intent: &TransactionIntent) -> Result<TxHash>;

    /// Returns `None` while the transaction is not yet mined.
    async fn get_transaction_receipt(&self, hash: TxHash) -> Result<Option<ReceiptSummary>>;

    /// Messages published to the core bridge by a confirmed transaction.
    ///
    /// # Errors
    ///
    /// [`BridgeError::TransactionNotFound`](crate::BridgeError::TransactionNotFound)
    /// when the node has no receipt for `hash`.
    async fn parse_transaction(&self, hash: TxHash) -> Result<Vec<MessageReference>>;
}

/// Opens a [`ChainRpc`] session against a URL.
#[async_trait]
pub trait RpcConnector: Send + Sync {
    async fn connect(&self, url: &Url) -> Result<Arc<dyn ChainRpc>>;
}

/// Access to the guardian network's signed VAAs.
///
/// # Test Scenarios
///
/// - VAA never signed (timeout)
/// - Rate limiting (429)
/// - VAA for a different message
/// - Flaky API responses
#[async_trait]
pub trait GuardianService: Send + Sync {
    /// Fetches the signed VAA for a message.
    ///
    /// Returns `Ok(None)` while guardians have not reached quorum.
    ///
    /// # Errors
    ///
    /// [`BridgeError::RateLimitExceeded`](crate::BridgeError::RateLimitExceeded)
    /// when the service throttles the caller; network or decoding errors
    /// otherwise.
    async fn get_attestation(&self, reference: &MessageReference) -> Result<Option<Bytes>>;
}

/// Token bridge contract on one chain.
///
/// Builders return a finite ordered sequence that must be submitted and
/// confirmed one entry at a time.
#[async_trait]
pub trait BridgeContract: Send + Sync {
    fn chain(&self) -> ChainName;

    /// Transactions publishing the token's metadata from its origin chain.
    async fn build_attestation_tx(
        &self,
        token: &TokenId,
        payer: &UniversalAddress,
    ) -> Result<Vec<UnsignedTransaction>>;

    /// Transactions creating or updating the wrapped asset from a metadata
    /// VAA.
    async fn build_submit_attestation_tx(
        &self,
        attestation: &Attestation,
        payer: &UniversalAddress,
    ) -> Result<Vec<UnsignedTransaction>>;

    /// Transactions locking (origin chain) or burning (wrapped) the token.
    async fn build_transfer_tx(
        &self,
        transfer: &TransferRequest,
        payer: &UniversalAddress,
    ) -> Result<Vec<UnsignedTransaction>>;

    /// Transactions completing a transfer from a transfer VAA.
    async fn build_redeem_tx(
        &self,
        payer: &UniversalAddress,
        attestation: &Attestation,
    ) -> Result<Vec<UnsignedTransaction>>;

    /// Local address of the wrapped representation of `token`, or `None`
    /// when it has not been attested here.
    async fn get_wrapped_asset(&self, token: &TokenId) -> Result<Option<UniversalAddress>>;

    /// Decimal precision of a token deployed on this chain.
    async fn get_decimals(&self, token: &UniversalAddress) -> Result<u8>;
}

/// Signing and submission for chains outside the account model.
///
/// The client owns its credential and its own confirmation semantics.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    fn chain(&self) -> ChainName;

    fn signer_address(&self) -> UniversalAddress;

    /// Signs, sends and waits for confirmation of one transaction.
    async fn sign_send_wait(&self, tx: &PlatformTransaction) -> Result<SubmittedTransaction>;

    async fn parse_transaction(&self, tx: &TxId) -> Result<Vec<MessageReference>>;
}

/// Trait for time-based operations.
///
/// Lets tests fast-forward through polling loops and deadlines without
/// actually waiting.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);

    fn now(&self) -> Instant;
}
