// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Account-model transaction submission
//!
//! [`EndpointResolver`] finds a responsive RPC node, [`TransactionSubmitter`]
//! takes one normalized [`TransactionIntent`] through gas estimation, signing,
//! broadcast and receipt classification, and [`ChainAdapter`] closes over both
//! per chain so the orchestrator never branches on a platform name.

mod adapter;
mod locks;
mod resolver;

pub use adapter::{AccountModelChain, ChainAdapter, OtherChain};
pub use locks::SignerLocks;
pub use resolver::{EndpointResolver, LiveEndpoint};

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::TxHash;
use bon::Builder;
use tracing::{debug, error, info, warn, Instrument};

use crate::error::{BridgeError, Result};
use crate::protocol::{
    ChainName, ReceiptSummary, SubmissionWarning, SubmittedTransaction, TransactionIntent,
    UniversalAddress,
};
use crate::spans;
use crate::traits::{ChainRpc, Clock};

/// A confirmed transaction plus any recoverable problem met on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub transaction: SubmittedTransaction,
    pub warning: Option<SubmissionWarning>,
}

/// Estimates, signs, sends and confirms account-model transactions.
///
/// Submissions sharing a signer on the same chain are serialized through
/// [`SignerLocks`]; the lock is held from estimation until the receipt is
/// classified.
#[derive(Builder, Clone)]
pub struct TransactionSubmitter {
    clock: Arc<dyn Clock>,
    #[builder(default)]
    locks: Arc<SignerLocks>,
    #[builder(default = Duration::from_secs(2))]
    receipt_poll_interval: Duration,
    #[builder(default = Duration::from_secs(180))]
    receipt_timeout: Duration,
}

impl TransactionSubmitter {
    pub fn locks(&self) -> &Arc<SignerLocks> {
        &self.locks
    }

    /// Submits one intent and blocks until its receipt is classified.
    ///
    /// Gas estimation failures are downgraded to a [`SubmissionWarning`] and
    /// the transaction is sent without an explicit limit.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::TransactionReverted`] for receipt status 0
    /// - [`BridgeError::InvalidReceipt`] if no receipt appears before the
    ///   receipt timeout
    /// - RPC errors from broadcasting
    pub async fn submit(
        &self,
        chain: ChainName,
        signer: UniversalAddress,
        rpc: &dyn ChainRpc,
        intent: &TransactionIntent,
    ) -> Result<SubmissionOutcome> {
        let span = spans::submit_transaction(&chain, &intent.to, &intent.value);
        self.submit_inner(chain, signer, rpc, intent)
            .instrument(span)
            .await
    }

    async fn submit_inner(
        &self,
        chain: ChainName,
        signer: UniversalAddress,
        rpc: &dyn ChainRpc,
        intent: &TransactionIntent,
    ) -> Result<SubmissionOutcome> {
        let _signer_guard = self.locks.acquire(chain, signer).await;

        let mut intent = intent.clone();
        let mut warning = None;

        if intent.gas.limit.is_none() {
            match rpc.estimate_gas(&intent).await {
                Ok(limit) => {
                    debug!(gas_limit = %limit, event = "gas_estimated");
                    intent.gas.limit = Some(limit);
                }
                Err(e) => {
                    let failure = BridgeError::GasEstimationFailed {
                        reason: e.to_string(),
                    };
                    warn!(
                        chain = %chain,
                        error = %failure,
                        event = "gas_estimation_failed"
                    );
                    warning = Some(SubmissionWarning::GasEstimationFailed {
                        chain,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let hash = rpc.send_transaction(&intent).await.inspect_err(|e| {
            spans::record_error(e);
            error!(chain = %chain, error = %e, event = "transaction_send_failed");
        })?;
        info!(chain = %chain, tx_hash = %hash, event = "transaction_sent");

        let receipt = self.wait_for_receipt(chain, rpc, hash).await?;

        if !receipt.succeeded() {
            spans::record_error_with_context(
                "TransactionReverted",
                &format!("Transaction {hash} reverted"),
                Some(&format!("receipt status {}", receipt.status)),
            );
            error!(
                chain = %chain,
                tx_hash = %hash,
                status = receipt.status,
                gas_used = receipt.gas_used,
                event = "transaction_reverted"
            );
            return Err(BridgeError::TransactionReverted {
                hash: hash.into(),
                status: receipt.status,
            });
        }

        info!(
            chain = %chain,
            tx_hash = %hash,
            gas_used = receipt.gas_used,
            event = "transaction_confirmed"
        );

        Ok(SubmissionOutcome {
            transaction: SubmittedTransaction {
                chain,
                hash: hash.into(),
                status: receipt.status,
                gas_used: receipt.gas_used,
            },
            warning,
        })
    }

    async fn wait_for_receipt(
        &self,
        chain: ChainName,
        rpc: &dyn ChainRpc,
        hash: TxHash,
    ) -> Result<ReceiptSummary> {
        let started = self.clock.now();

        loop {
            if let Some(receipt) = rpc.get_transaction_receipt(hash).await? {
                return Ok(receipt);
            }

            let elapsed = self.clock.now().saturating_duration_since(started);
            if elapsed >= self.receipt_timeout {
                error!(
                    chain = %chain,
                    tx_hash = %hash,
                    waited_secs = elapsed.as_secs(),
                    event = "receipt_not_found"
                );
                return Err(BridgeError::InvalidReceipt { hash: hash.into() });
            }

            debug!(tx_hash = %hash, event = "receipt_pending");
            self.clock
                .sleep(self.receipt_poll_interval.min(self.receipt_timeout - elapsed))
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeChainRpc, FakeClock};
    use alloy_primitives::{address, U256};

    fn submitter(clock: &FakeClock) -> TransactionSubmitter {
        TransactionSubmitter::builder()
            .clock(Arc::new(clock.clone()))
            .build()
    }

    fn intent() -> TransactionIntent {
        TransactionIntent::call(address!("DB5492265f6038831E89f495670FF909aDe94bd9"), vec![0x01])
    }

    #[tokio::test]
    async fn test_estimated_limit_is_applied() {
        let clock = FakeClock::new();
        let rpc = FakeChainRpc::new(11155111);
        rpc.set_gas_estimate(U256::from(90_000u64));

        let outcome = submitter(&clock)
            .submit(ChainName::Sepolia, UniversalAddress::ZERO, &rpc, &intent())
            .await
            .unwrap();

        assert!(outcome.warning.is_none());
        assert_eq!(rpc.sent()[0].gas.limit, Some(U256::from(90_000u64)));
    }

    #[tokio::test]
    async fn test_explicit_limit_skips_estimation() {
        let clock = FakeClock::new();
        let rpc = FakeChainRpc::new(11155111);
        rpc.fail_gas_estimation("should not be called");

        let outcome = submitter(&clock)
            .submit(
                ChainName::Sepolia,
                UniversalAddress::ZERO,
                &rpc,
                &intent().with_gas_limit(U256::from(21_000u64)),
            )
            .await
            .unwrap();

        assert!(outcome.warning.is_none());
        assert_eq!(rpc.estimate_calls(), 0);
    }

    #[tokio::test]
    async fn test_receipt_timeout_is_invalid_receipt() {
        let clock = FakeClock::new();
        let rpc = FakeChainRpc::new(11155111);
        rpc.withhold_receipts();

        let result = submitter(&clock)
            .submit(ChainName::Sepolia, UniversalAddress::ZERO, &rpc, &intent())
            .await;

        assert!(matches!(result, Err(BridgeError::InvalidReceipt { .. })));
        assert_eq!(clock.total_sleep_time(), Duration::from_secs(180));
    }
}
