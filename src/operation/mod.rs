// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Bridge operations and the orchestrator that drives them
//!
//! A [`BridgeOperation`] records one attest-or-transfer run. [`Bridge`] owns
//! the per-chain capabilities and walks an operation through its states:
//!
//! 1. idempotency check against the destination chain
//! 2. source submission, or re-parsing a recorded source transaction
//! 3. attestation wait
//! 4. destination submission
//! 5. wrapped asset verification (attest only)
//!
//! Every step is strictly sequential. Errors leaving the pipeline are wrapped
//! in [`BridgeError::OperationFailed`] with the failing step and, once one
//! exists, the source transaction to resume from.

mod state;

pub use state::{OperationState, OperationStep};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bon::Builder;
use tracing::{debug, error, info, Instrument};

use crate::attestation::AttestationWaiter;
use crate::config::WaitConfig;
use crate::error::{BridgeError, Result};
use crate::idempotency::{CompletionCheck, IdempotencyGuard};
use crate::protocol::{
    Attestation, ChainName, DecimalsCache, MessageReference, PayloadKind, SubmissionWarning,
    SubmittedTransaction, TokenDescriptor, TokenId, TransferRequest, TxId, UniversalAddress,
};
use crate::resume::recover_reference;
use crate::spans;
use crate::submitter::{ChainAdapter, SubmissionOutcome};
use crate::traits::{BridgeContract, Clock, GuardianService};

static NEXT_OPERATION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique operation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(pub u64);

impl OperationId {
    fn next() -> Self {
        Self(NEXT_OPERATION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Register a token's metadata on the destination chain.
    Attest,
    /// Move an amount of a token to a recipient on the destination chain.
    Transfer,
}

impl OperationKind {
    /// Payload the guardian VAA must carry for this kind.
    pub fn payload_kind(self) -> PayloadKind {
        match self {
            OperationKind::Attest => PayloadKind::AttestMeta,
            OperationKind::Transfer => PayloadKind::Transfer,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Attest => f.write_str("attest"),
            OperationKind::Transfer => f.write_str("transfer"),
        }
    }
}

/// What a completed operation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationArtifact {
    /// Address of the wrapped token on the destination chain.
    WrappedAsset(UniversalAddress),
    /// Hash of the final destination transaction.
    DestinationTx(TxId),
}

impl fmt::Display for OperationArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationArtifact::WrappedAsset(address) => write!(f, "{address}"),
            OperationArtifact::DestinationTx(tx) => write!(f, "{tx}"),
        }
    }
}

/// One attest-or-transfer run.
///
/// Mutated only by [`Bridge::execute`]. Once it reaches
/// [`OperationState::Completed`] or [`OperationState::Failed`] it cannot be
/// executed again; start a resume operation instead.
#[derive(Debug, Clone)]
pub struct BridgeOperation {
    id: OperationId,
    kind: OperationKind,
    source: ChainName,
    destination: ChainName,
    token: TokenId,
    transfer: Option<TransferRequest>,
    resume_from: Option<TxId>,
    state: OperationState,
    source_transactions: Vec<SubmittedTransaction>,
    destination_transactions: Vec<SubmittedTransaction>,
    message: Option<MessageReference>,
    message_tx: Option<TxId>,
    attestation: Option<Attestation>,
    warnings: Vec<SubmissionWarning>,
    artifact: Option<OperationArtifact>,
}

impl BridgeOperation {
    fn new(
        kind: OperationKind,
        source: ChainName,
        destination: ChainName,
        token: TokenId,
    ) -> Result<Self> {
        if source == destination {
            return Err(BridgeError::InvalidConfig(format!(
                "source and destination are both {source}"
            )));
        }
        Ok(Self {
            id: OperationId::next(),
            kind,
            source,
            destination,
            token,
            transfer: None,
            resume_from: None,
            state: OperationState::Idle,
            source_transactions: Vec::new(),
            destination_transactions: Vec::new(),
            message: None,
            message_tx: None,
            attestation: None,
            warnings: Vec::new(),
            artifact: None,
        })
    }

    /// Attest `token` from its origin chain onto `destination`.
    pub fn attest(token: TokenId, destination: ChainName) -> Result<Self> {
        Self::new(OperationKind::Attest, token.chain, destination, token)
    }

    /// Transfer out of `source`, to the request's recipient chain.
    ///
    /// `source` may be the token's origin chain (lock) or a chain holding its
    /// wrapped form (burn).
    pub fn transfer(source: ChainName, request: TransferRequest) -> Result<Self> {
        if request.amount.is_zero() {
            return Err(BridgeError::invalid_amount(
                request.amount,
                "transfer amount must be positive",
            ));
        }
        let mut op = Self::new(
            OperationKind::Transfer,
            source,
            request.recipient_chain,
            request.token,
        )?;
        op.transfer = Some(request);
        Ok(op)
    }

    /// Continue an operation whose source transaction `tx` is already
    /// confirmed on `source`.
    pub fn resume(
        kind: OperationKind,
        source: ChainName,
        destination: ChainName,
        token: TokenId,
        tx: TxId,
    ) -> Result<Self> {
        let mut op = Self::new(kind, source, destination, token)?;
        op.resume_from = Some(tx);
        Ok(op)
    }

    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn source(&self) -> ChainName {
        self.source
    }

    pub fn destination(&self) -> ChainName {
        self.destination
    }

    pub fn token(&self) -> &TokenId {
        &self.token
    }

    pub fn transfer_request(&self) -> Option<&TransferRequest> {
        self.transfer.as_ref()
    }

    pub fn state(&self) -> OperationState {
        self.state
    }

    pub fn source_transactions(&self) -> &[SubmittedTransaction] {
        &self.source_transactions
    }

    pub fn destination_transactions(&self) -> &[SubmittedTransaction] {
        &self.destination_transactions
    }

    /// Every transaction this operation submitted, in order.
    pub fn transactions(&self) -> impl Iterator<Item = &SubmittedTransaction> {
        self.source_transactions
            .iter()
            .chain(self.destination_transactions.iter())
    }

    pub fn message(&self) -> Option<&MessageReference> {
        self.message.as_ref()
    }

    pub fn attestation(&self) -> Option<&Attestation> {
        self.attestation.as_ref()
    }

    pub fn warnings(&self) -> &[SubmissionWarning] {
        &self.warnings
    }

    pub fn artifact(&self) -> Option<&OperationArtifact> {
        self.artifact.as_ref()
    }

    pub fn is_resume(&self) -> bool {
        self.resume_from.is_some()
    }

    /// The source transaction a later resume should start from.
    ///
    /// Set only once a message has been parsed from it; a source sequence
    /// that fails before emitting a message leaves nothing to resume.
    pub fn source_tx(&self) -> Option<&TxId> {
        self.message_tx.as_ref()
    }

    fn transition(&mut self, next: OperationState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(BridgeError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        debug!(
            operation = %self.id,
            from = %self.state,
            to = %next,
            event = "operation_state_changed"
        );
        self.state = next;
        Ok(())
    }

    fn failure(&self, step: OperationStep, error: BridgeError) -> BridgeError {
        BridgeError::OperationFailed {
            step,
            source_tx: self.source_tx().cloned(),
            source: Box::new(error),
        }
    }

    fn record(&mut self, outcome: SubmissionOutcome, destination: bool) {
        if let Some(warning) = outcome.warning {
            self.warnings.push(warning);
        }
        if destination {
            self.destination_transactions.push(outcome.transaction);
        } else {
            self.source_transactions.push(outcome.transaction);
        }
    }
}

/// A chain's submission adapter together with its bridge contract.
#[derive(Clone)]
pub struct ChainHandle {
    adapter: Arc<ChainAdapter>,
    contract: Arc<dyn BridgeContract>,
}

impl ChainHandle {
    /// # Errors
    ///
    /// [`BridgeError::InvalidConfig`] if adapter and contract belong to
    /// different chains.
    pub fn new(adapter: Arc<ChainAdapter>, contract: Arc<dyn BridgeContract>) -> Result<Self> {
        if adapter.chain() != contract.chain() {
            return Err(BridgeError::InvalidConfig(format!(
                "adapter for {} paired with contract for {}",
                adapter.chain(),
                contract.chain()
            )));
        }
        Ok(Self { adapter, contract })
    }

    pub fn chain(&self) -> ChainName {
        self.adapter.chain()
    }

    pub fn adapter(&self) -> &ChainAdapter {
        &self.adapter
    }

    pub fn contract(&self) -> &dyn BridgeContract {
        self.contract.as_ref()
    }
}

/// The orchestrator.
///
/// Holds read-only per-chain capabilities and can drive any number of
/// independent operations concurrently.
///
/// # Example
///
/// ```rust,ignore
/// let bridge = Bridge::builder()
///     .chains(vec![solana, sepolia])
///     .waiter(AttestationWaiter::new(GuardianApi::testnet(), TokioClock::new()))
///     .build();
///
/// let mut op = BridgeOperation::attest(token, ChainName::Sepolia)?;
/// let wrapped = bridge.execute(&mut op).await?;
/// ```
#[derive(Builder)]
pub struct Bridge<G: GuardianService, C: Clock> {
    chains: Vec<ChainHandle>,
    waiter: AttestationWaiter<G, C>,
    #[builder(default)]
    wait_config: WaitConfig,
    #[builder(default)]
    guard: IdempotencyGuard,
    #[builder(skip)]
    decimals: DecimalsCache,
}

impl<G: GuardianService, C: Clock> Bridge<G, C> {
    pub fn chain(&self, chain: ChainName) -> Result<&ChainHandle> {
        self.chains
            .iter()
            .find(|handle| handle.chain() == chain)
            .ok_or_else(|| BridgeError::InvalidConfig(format!("no adapter configured for {chain}")))
    }

    pub fn wait_config(&self) -> &WaitConfig {
        &self.wait_config
    }

    /// Token precision, fetched once per token from its origin chain.
    pub async fn token_descriptor(&self, token: &TokenId) -> Result<TokenDescriptor> {
        let origin = self.chain(token.chain)?;
        self.decimals.describe(token, origin.contract()).await
    }

    /// Drives `op` from [`OperationState::Idle`] to a terminal state.
    ///
    /// # Errors
    ///
    /// [`BridgeError::InvalidTransition`] if `op` has already been executed;
    /// otherwise [`BridgeError::OperationFailed`] wrapping the cause, with
    /// `op` left in [`OperationState::Failed`].
    pub async fn execute(&self, op: &mut BridgeOperation) -> Result<OperationArtifact> {
        if op.state != OperationState::Idle {
            return Err(BridgeError::InvalidTransition {
                from: op.state,
                to: OperationState::SourceSubmitted,
            });
        }

        let span = spans::bridge_operation(
            op.id,
            op.kind,
            &op.source,
            &op.destination,
            &op.token,
            op.is_resume(),
        );

        async {
            info!(
                operation = %op.id,
                kind = %op.kind,
                source_chain = %op.source,
                destination_chain = %op.destination,
                token = %op.token,
                event = "operation_started"
            );

            let result = self.run(op).await;

            match &result {
                Ok(artifact) => {
                    info!(
                        operation = %op.id,
                        artifact = %artifact,
                        transactions = op.transactions().count(),
                        warnings = op.warnings.len(),
                        event = "operation_completed"
                    );
                }
                Err(e) => {
                    if !op.state.is_terminal() {
                        op.state = OperationState::Failed;
                    }
                    spans::record_error(e);
                    error!(
                        operation = %op.id,
                        error = %e,
                        source_tx = ?op.source_tx().map(TxId::as_str),
                        event = "operation_failed"
                    );
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, op: &mut BridgeOperation) -> Result<OperationArtifact> {
        let source = self.chain(op.source)?;
        let destination = self.chain(op.destination)?;

        let check = self
            .guard
            .check(op.kind, &op.token, destination.contract())
            .await;
        if let CompletionCheck::AlreadyCompleted(artifact) = check {
            op.transition(OperationState::Completed)?;
            op.artifact = Some(artifact.clone());
            info!(
                operation = %op.id,
                artifact = %artifact,
                event = "operation_already_completed"
            );
            return Ok(artifact);
        }

        let (reference, message_tx) = match op.resume_from.clone() {
            Some(tx) => {
                let reference = recover_reference(source.adapter(), &tx)
                    .await
                    .map_err(|e| op.failure(OperationStep::Resume, e))?;
                (reference, tx)
            }
            None => self.submit_source(op, source).await?,
        };
        op.message = Some(reference);
        op.message_tx = Some(message_tx);
        op.transition(OperationState::SourceSubmitted)?;

        op.transition(OperationState::AttestationPending)?;
        let attestation = self
            .waiter
            .wait(
                &reference,
                op.kind.payload_kind(),
                self.wait_config.deadline_for(op.kind),
            )
            .await
            .map_err(|e| op.failure(OperationStep::AttestationWait, e))?;
        op.attestation = Some(attestation.clone());
        op.transition(OperationState::AttestationReceived)?;

        self.submit_destination(op, destination, &attestation)
            .await?;
        op.transition(OperationState::DestSubmitted)?;

        let artifact = match op.kind {
            OperationKind::Attest => {
                let wrapped = destination
                    .contract()
                    .get_wrapped_asset(&op.token)
                    .await
                    .map_err(|e| op.failure(OperationStep::WrappedAssetVerification, e))?;
                match wrapped {
                    Some(address) => OperationArtifact::WrappedAsset(address),
                    None => {
                        return Err(op.failure(
                            OperationStep::WrappedAssetVerification,
                            BridgeError::WrappedAssetNotFound {
                                token: op.token,
                                chain: op.destination,
                            },
                        ))
                    }
                }
            }
            OperationKind::Transfer => match op.destination_transactions.last() {
                Some(tx) => OperationArtifact::DestinationTx(tx.hash.clone()),
                None => {
                    return Err(op.failure(
                        OperationStep::DestinationSubmission,
                        BridgeError::Provider("no redeem transaction was produced".to_string()),
                    ))
                }
            },
        };

        op.artifact = Some(artifact.clone());
        op.transition(OperationState::Completed)?;
        Ok(artifact)
    }

    async fn submit_source(
        &self,
        op: &mut BridgeOperation,
        source: &ChainHandle,
    ) -> Result<(MessageReference, TxId)> {
        let payer = source.adapter().signer_address();

        let built = match op.kind {
            OperationKind::Attest => {
                source
                    .contract()
                    .build_attestation_tx(&op.token, &payer)
                    .await
            }
            OperationKind::Transfer => match &op.transfer {
                Some(request) => source.contract().build_transfer_tx(request, &payer).await,
                None => Err(BridgeError::InvalidConfig(
                    "transfer operation without transfer parameters".to_string(),
                )),
            },
        };
        let txs = built.map_err(|e| op.failure(OperationStep::SourceSubmission, e))?;

        for tx in &txs {
            let outcome = source
                .adapter()
                .submit(tx)
                .await
                .map_err(|e| op.failure(OperationStep::SourceSubmission, e))?;
            op.record(outcome, false);
        }

        let Some(last) = op.source_transactions.last().map(|tx| tx.hash.clone()) else {
            return Err(op.failure(
                OperationStep::SourceSubmission,
                BridgeError::Provider("no source transaction was produced".to_string()),
            ));
        };

        let messages = source
            .adapter()
            .parse_transaction(&last)
            .await
            .map_err(|e| op.failure(OperationStep::MessageParsing, e))?;

        let reference = messages.into_iter().next().ok_or_else(|| {
            op.failure(
                OperationStep::MessageParsing,
                BridgeError::NoMessageFound { tx: last.clone() },
            )
        })?;

        info!(
            operation = %op.id,
            tx_hash = %last,
            reference = %reference,
            event = "source_message_emitted"
        );
        Ok((reference, last))
    }

    async fn submit_destination(
        &self,
        op: &mut BridgeOperation,
        destination: &ChainHandle,
        attestation: &Attestation,
    ) -> Result<()> {
        let payer = destination.adapter().signer_address();

        let built = match op.kind {
            OperationKind::Attest => {
                destination
                    .contract()
                    .build_submit_attestation_tx(attestation, &payer)
                    .await
            }
            OperationKind::Transfer => {
                destination
                    .contract()
                    .build_redeem_tx(&payer, attestation)
                    .await
            }
        };
        let txs = built.map_err(|e| op.failure(OperationStep::DestinationSubmission, e))?;

        for tx in &txs {
            let outcome = destination
                .adapter()
                .submit(tx)
                .await
                .map_err(|e| op.failure(OperationStep::DestinationSubmission, e))?;
            op.record(outcome, true);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    fn token() -> TokenId {
        TokenId::new(ChainName::Solana, UniversalAddress::from([0x5e; 32]))
    }

    #[test]
    fn test_attest_requires_distinct_chains() {
        assert!(BridgeOperation::attest(token(), ChainName::Solana).is_err());

        let op = BridgeOperation::attest(token(), ChainName::Sepolia).unwrap();
        assert_eq!(op.source(), ChainName::Solana);
        assert_eq!(op.state(), OperationState::Idle);
        assert!(op.source_tx().is_none());
    }

    #[test]
    fn test_transfer_rejects_zero_amount() {
        let request = TransferRequest {
            token: token(),
            amount: U256::ZERO,
            recipient_chain: ChainName::Sepolia,
            recipient: UniversalAddress::from([0x01; 32]),
        };
        assert!(matches!(
            BridgeOperation::transfer(ChainName::Solana, request),
            Err(BridgeError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_operation_ids_are_unique() {
        let a = BridgeOperation::attest(token(), ChainName::Sepolia).unwrap();
        let b = BridgeOperation::attest(token(), ChainName::Sepolia).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_resume_source_tx_unset_until_recovered() {
        let op = BridgeOperation::resume(
            OperationKind::Transfer,
            ChainName::Solana,
            ChainName::Sepolia,
            token(),
            TxId::from("5sig"),
        )
        .unwrap();
        assert!(op.is_resume());
        assert!(op.source_tx().is_none());
    }

    #[test]
    fn test_illegal_transition_rejected() {
        let mut op = BridgeOperation::attest(token(), ChainName::Sepolia).unwrap();
        let err = op.transition(OperationState::DestSubmitted).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::InvalidTransition {
                from: OperationState::Idle,
                to: OperationState::DestSubmitted
            }
        ));
    }
}
