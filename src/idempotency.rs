// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Detects operations whose effect already exists on the destination chain

use tracing::{debug, info, warn, Instrument};

use crate::operation::{OperationArtifact, OperationKind};
use crate::protocol::TokenId;
use crate::spans;
use crate::traits::BridgeContract;

/// Result of the pre-flight completion check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionCheck {
    /// The effect exists; nothing needs to be submitted.
    AlreadyCompleted(OperationArtifact),
    NotCompleted,
}

/// Pre-flight check against destination-chain state.
///
/// A failed query is reported as [`CompletionCheck::NotCompleted`]. A
/// transient RPC error is therefore indistinguishable from a genuine
/// negative; the worst case is redoing an attestation that already exists,
/// which the destination contract turns into an update.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdempotencyGuard;

impl IdempotencyGuard {
    pub fn new() -> Self {
        Self
    }

    pub async fn check(
        &self,
        kind: OperationKind,
        token: &TokenId,
        destination: &dyn BridgeContract,
    ) -> CompletionCheck {
        let span = spans::idempotency_check(token, &destination.chain());
        async move {
            match kind {
                OperationKind::Attest => match destination.get_wrapped_asset(token).await {
                    Ok(Some(wrapped)) => {
                        info!(
                            token = %token,
                            wrapped = %wrapped,
                            event = "wrapped_asset_already_exists"
                        );
                        CompletionCheck::AlreadyCompleted(OperationArtifact::WrappedAsset(wrapped))
                    }
                    Ok(None) => {
                        debug!(token = %token, event = "wrapped_asset_missing");
                        CompletionCheck::NotCompleted
                    }
                    Err(e) => {
                        warn!(
                            token = %token,
                            error = %e,
                            event = "wrapped_asset_query_failed"
                        );
                        CompletionCheck::NotCompleted
                    }
                },
                // Every transfer is a new message; there is nothing to look up.
                OperationKind::Transfer => CompletionCheck::NotCompleted,
            }
        }
        .instrument(span)
        .await
    }
}
