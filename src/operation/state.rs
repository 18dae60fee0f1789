// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

/// Lifecycle of a [`BridgeOperation`](super::BridgeOperation).
///
/// ```text
/// Idle -> SourceSubmitted -> AttestationPending -> AttestationReceived -> DestSubmitted -> Completed
///   \______________________________________________________________________________________/^
///                              (already completed on destination)
/// ```
///
/// `Failed` is reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OperationState {
    #[default]
    Idle,
    SourceSubmitted,
    AttestationPending,
    AttestationReceived,
    DestSubmitted,
    Completed,
    Failed,
}

impl OperationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, OperationState::Completed | OperationState::Failed)
    }

    /// Whether `self -> next` is a legal forward step.
    pub fn can_transition_to(self, next: OperationState) -> bool {
        use OperationState::*;

        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Idle, SourceSubmitted)
            | (Idle, Completed)
            | (SourceSubmitted, AttestationPending)
            | (AttestationPending, AttestationReceived)
            | (AttestationReceived, DestSubmitted)
            | (DestSubmitted, Completed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The pipeline step an error escaped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationStep {
    SourceSubmission,
    MessageParsing,
    Resume,
    AttestationWait,
    DestinationSubmission,
    WrappedAssetVerification,
}

impl fmt::Display for OperationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            OperationStep::SourceSubmission => "source submission",
            OperationStep::MessageParsing => "message parsing",
            OperationStep::Resume => "resume",
            OperationStep::AttestationWait => "attestation wait",
            OperationStep::DestinationSubmission => "destination submission",
            OperationStep::WrappedAssetVerification => "wrapped asset verification",
        };
        f.write_str(step)
    }
}
