// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use thiserror::Error;

use crate::operation::{OperationState, OperationStep};
use crate::protocol::{ChainName, MessageReference, Platform, TokenId, TxId};

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("No live RPC endpoint among {candidates} candidate(s)")]
    ProviderUnavailable { candidates: usize },

    #[error("Invalid amount {input:?}: {reason}")]
    InvalidAmount { input: String, reason: String },

    #[error("Gas estimation failed: {reason}")]
    GasEstimationFailed { reason: String },

    #[error("Transaction reverted: {hash} (receipt status {status})")]
    TransactionReverted { hash: TxId, status: u64 },

    #[error("No receipt returned for transaction {hash}")]
    InvalidReceipt { hash: TxId },

    #[error("Timed out after {waited:?} waiting for attestation of {reference}")]
    AttestationTimeout {
        reference: MessageReference,
        waited: Duration,
    },

    #[error("No bridge message found in transaction {tx}")]
    NoMessageFound { tx: TxId },

    #[error("Platform {platform:?} of chain {chain} is not supported here")]
    UnsupportedPlatform { chain: ChainName, platform: Platform },

    #[error("Transaction not found: {tx}")]
    TransactionNotFound { tx: TxId },

    #[error("Wrapped asset for {token} not found on {chain}")]
    WrappedAssetNotFound { token: TokenId, chain: ChainName },

    #[error("Invalid VAA: {reason}")]
    InvalidVaa { reason: String },

    #[error("Guardian returned VAA for {actual}, expected {expected}")]
    AttestationMismatch {
        expected: MessageReference,
        actual: MessageReference,
    },

    #[error("Guardian request failed: {reason}")]
    AttestationFailed { reason: String },

    #[error("Rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimitExceeded { retry_after_seconds: u64 },

    #[error("Illegal state transition {from:?} -> {to:?}")]
    InvalidTransition {
        from: OperationState,
        to: OperationState,
    },

    #[error("Operation failed during {step}: {source}")]
    OperationFailed {
        step: OperationStep,
        /// Source transaction the message was parsed from, usable for resumption.
        source_tx: Option<TxId>,
        #[source]
        source: Box<BridgeError>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("RPC error: {0}")]
    Rpc(#[from] alloy_json_rpc::RpcError<alloy_transport::TransportErrorKind>),

    #[error("Contract call failed: {0}")]
    ContractCall(#[from] alloy_contract::Error),

    #[error("ABI encoding/decoding error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Hex conversion error: {0}")]
    Hex(#[from] alloy_primitives::hex::FromHexError),
}

impl BridgeError {
    /// Strips any [`BridgeError::OperationFailed`] wrapping.
    pub fn root(&self) -> &BridgeError {
        match self {
            BridgeError::OperationFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// Hash and receipt status when the root cause is a revert.
    pub fn revert_details(&self) -> Option<(&TxId, u64)> {
        match self.root() {
            BridgeError::TransactionReverted { hash, status } => Some((hash, *status)),
            _ => None,
        }
    }

    /// Source transaction recorded before the failure, if any.
    pub fn resumable_from(&self) -> Option<&TxId> {
        match self {
            BridgeError::OperationFailed { source_tx, .. } => source_tx.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn invalid_amount(input: impl ToString, reason: impl Into<String>) -> Self {
        BridgeError::InvalidAmount {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_vaa(reason: impl Into<String>) -> Self {
        BridgeError::InvalidVaa {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_unwraps_nested_failures() {
        let revert = BridgeError::TransactionReverted {
            hash: TxId::from("0xabc"),
            status: 0,
        };
        let wrapped = BridgeError::OperationFailed {
            step: OperationStep::DestinationSubmission,
            source_tx: Some(TxId::from("0xsource")),
            source: Box::new(revert),
        };

        assert!(matches!(
            wrapped.root(),
            BridgeError::TransactionReverted { status: 0, .. }
        ));
        let (hash, status) = wrapped.revert_details().unwrap();
        assert_eq!(hash.as_str(), "0xabc");
        assert_eq!(status, 0);
        assert_eq!(wrapped.resumable_from().unwrap().as_str(), "0xsource");
    }

    #[test]
    fn test_error_messages() {
        let err = BridgeError::TransactionReverted {
            hash: TxId::from("0xdead"),
            status: 0,
        };
        insta::assert_snapshot!(err.to_string(), @"Transaction reverted: 0xdead (receipt status 0)");

        let err = BridgeError::ProviderUnavailable { candidates: 3 };
        insta::assert_snapshot!(err.to_string(), @"No live RPC endpoint among 3 candidate(s)");
    }
}
