// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Span constructors for bridge operations
//!
//! Static span names under the `token_bridge.` prefix with structured
//! attributes, kept apart from the orchestration code. Error fields follow
//! OpenTelemetry conventions (`error.type`, `error.message`,
//! `otel.status_code`) and are filled in by [`record_error`] or
//! [`record_error_with_context`].
//!
//! # Example
//!
//! ```rust,no_run
//! use token_bridge_rs::spans;
//! use token_bridge_rs::{ChainName, TxId};
//!
//! let span = spans::resume_from_transaction(&TxId::from("0xabc"), &ChainName::Sepolia);
//! let _guard = span.enter();
//! ```

use std::time::Duration;

use alloy_primitives::{Address, U256};
use tracing::Span;
use url::Url;

use crate::operation::{OperationId, OperationKind};
use crate::protocol::{ChainName, MessageReference, PayloadKind, TokenId, TxId};

/// Top-level span for one operation.
///
/// Parent: caller
/// Children: every other span in this module
#[inline]
pub fn bridge_operation(
    id: OperationId,
    kind: OperationKind,
    source_chain: &ChainName,
    destination_chain: &ChainName,
    token: &TokenId,
    resumed: bool,
) -> Span {
    tracing::info_span!(
        "token_bridge.operation",
        operation.id = %id,
        operation.kind = %kind,
        source_chain = %source_chain,
        destination_chain = %destination_chain,
        token = %token,
        resumed = resumed,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Destination-state lookup before any work is done.
#[inline]
pub fn idempotency_check(token: &TokenId, destination_chain: &ChainName) -> Span {
    tracing::debug_span!(
        "token_bridge.idempotency_check",
        token = %token,
        destination_chain = %destination_chain,
    )
}

/// Signing, broadcasting and confirming one account-model transaction.
///
/// Parent: token_bridge.operation
/// Children: token_bridge.rpc_call
#[inline]
pub fn submit_transaction(chain: &ChainName, to: &Address, value: &U256) -> Span {
    tracing::info_span!(
        "token_bridge.submit_transaction",
        chain = %chain,
        to = %to,
        value = %value,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Polling the guardian service until a VAA appears or the deadline passes.
///
/// Parent: token_bridge.operation
/// Children: token_bridge.guardian_request (one per attempt)
#[inline]
pub fn wait_for_attestation(
    reference: &MessageReference,
    payload: PayloadKind,
    deadline: Duration,
    poll_interval: Duration,
) -> Span {
    tracing::info_span!(
        "token_bridge.wait_for_attestation",
        reference = %reference,
        payload = ?payload,
        deadline_secs = deadline.as_secs(),
        poll_interval_secs = poll_interval.as_secs(),
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// A single HTTP request to the guardian REST API.
#[inline]
pub fn guardian_request(url: &str) -> Span {
    tracing::debug_span!("token_bridge.guardian_request", http.url = %url)
}

/// Re-parsing a recorded source transaction.
///
/// Parent: token_bridge.operation
/// Children: token_bridge.rpc_call
#[inline]
pub fn resume_from_transaction(tx: &TxId, source_chain: &ChainName) -> Span {
    tracing::info_span!(
        "token_bridge.resume_from_transaction",
        tx_hash = %tx,
        source_chain = %source_chain,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// RPC call to an account-model node.
#[inline]
pub fn rpc_call(method: &str, url: &Url) -> Span {
    tracing::trace_span!("token_bridge.rpc_call", rpc.method = method, rpc.url = %url)
}

/// Record error attributes on the current span.
///
/// - error.type: the variant name, taken from the message prefix
/// - error.message: the full message
/// - error.source: the underlying cause, if any
pub fn record_error<E: std::error::Error>(error: &E) {
    let current_span = Span::current();
    let message = error.to_string();
    current_span.record(
        "error.type",
        message.split(':').next().unwrap_or("Unknown"),
    );
    current_span.record("error.message", message.as_str());
    current_span.record("otel.status_code", "ERROR");

    if let Some(source) = error.source() {
        current_span.record("error.source", source.to_string());
    }
}

/// Record error attributes with custom context on the current span.
pub fn record_error_with_context(
    error_type: &str,
    error_message: &str,
    additional_context: Option<&str>,
) {
    let current_span = Span::current();
    current_span.record("error.type", error_type);
    current_span.record("error.message", error_message);
    current_span.record("otel.status_code", "ERROR");

    if let Some(context) = additional_context {
        current_span.record("error.context", context);
    }
}
