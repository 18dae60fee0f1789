// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! # token-bridge-rs
//!
//! Orchestrates Wormhole token bridge operations between two chains:
//! attesting a token's metadata so a wrapped representation exists on the
//! destination, and transferring an amount of it.
//!
//! An operation runs as one sequential pipeline:
//!
//! 1. idempotency check against the destination chain
//! 2. source submission (or resumption from a known source transaction)
//! 3. polling the guardian network for the signed VAA, bounded by a deadline
//! 4. destination submission through a live RPC endpoint, with gas
//!    estimation and receipt classification
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use token_bridge_rs::providers::{GuardianApi, TokioClock};
//! use token_bridge_rs::{
//!     AttestationWaiter, Bridge, BridgeError, BridgeOperation, ChainHandle, ChainName, TokenId,
//! };
//!
//! # async fn example(solana: ChainHandle, sepolia: ChainHandle, token: TokenId) -> Result<(), BridgeError> {
//! let bridge = Bridge::builder()
//!     .chains(vec![solana, sepolia])
//!     .waiter(AttestationWaiter::new(GuardianApi::testnet(), TokioClock))
//!     .build();
//!
//! let mut op = BridgeOperation::attest(token, ChainName::Sepolia)?;
//! let wrapped = bridge.execute(&mut op).await?;
//! println!("wrapped asset: {wrapped}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Public API
//!
//! - [`Bridge`], [`BridgeOperation`] and [`OperationState`]: the orchestrator
//!   and its state machine
//! - [`ChainAdapter`] and [`TransactionSubmitter`]: per-platform submission,
//!   with [`EndpointResolver`] picking a live RPC endpoint
//! - [`AttestationWaiter`]: deadline-bounded guardian polling
//! - [`BridgeConfig`]: environment-sourced configuration
//! - [`traits`]: the seams to chains, guardians and time, with production
//!   implementations in [`providers`] and fakes in [`testing`]
//! - [`BridgeError`] and [`Result`]

mod attestation;
mod config;
mod contracts;
mod error;
mod idempotency;
mod numeric;
mod operation;
mod protocol;
mod resume;
mod submitter;

pub mod providers;
pub mod testing;
pub mod traits;

pub use attestation::AttestationWaiter;
pub use config::{
    BridgeConfig, Credential, SecretMaterial, SolanaKeypair, WaitConfig, GUARDIAN_API_MAINNET,
    GUARDIAN_API_TESTNET,
};
pub use contracts::erc20::Erc20Contract;
pub use error::{BridgeError, Result};
pub use idempotency::{CompletionCheck, IdempotencyGuard};
pub use numeric::{format_units, normalize, parse_units, NumericValue};
pub use operation::{
    Bridge, BridgeOperation, ChainHandle, OperationArtifact, OperationId, OperationKind,
    OperationState, OperationStep,
};
pub use protocol::{
    AssetMeta, Attestation, BridgeContracts, ChainEndpoint, ChainId, ChainName, DecimalsCache,
    GasFields, GuardianSignature, MessageReference, Network, PayloadKind, Platform,
    PlatformTransaction, RawTransaction, ReceiptSummary, SubmissionWarning, SubmittedTransaction,
    TokenDescriptor, TokenId, TransactionIntent, TransferRequest, TxId, UniversalAddress,
    UnsignedTransaction,
};
pub use resume::recover_reference;
pub use submitter::{
    AccountModelChain, ChainAdapter, EndpointResolver, LiveEndpoint, OtherChain, SignerLocks,
    SubmissionOutcome, TransactionSubmitter,
};
pub use traits::{BridgeContract, ChainRpc, Clock, GuardianService, PlatformClient, RpcConnector};

// Public module for advanced users who need custom instrumentation
pub mod spans;
