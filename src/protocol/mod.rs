// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Wormhole protocol types
//!
//! Chain identity, message references, VAA envelopes, tokens and the
//! transaction shapes exchanged with chain adapters.

mod chain;
mod message;
mod token;
mod transaction;
mod vaa;

pub use chain::{BridgeContracts, ChainEndpoint, ChainId, ChainName, Network, Platform};
pub use message::{MessageReference, UniversalAddress};
pub use token::{DecimalsCache, TokenDescriptor, TokenId, TransferRequest};
pub use transaction::{
    GasFields, PlatformTransaction, RawTransaction, ReceiptSummary, SubmissionWarning,
    SubmittedTransaction, TransactionIntent, TxId, UnsignedTransaction,
};
pub use vaa::{AssetMeta, Attestation, GuardianSignature, PayloadKind};
