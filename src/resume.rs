// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Re-deriving a message reference from a recorded source transaction

use tracing::{error, info, warn, Instrument};

use crate::error::{BridgeError, Result};
use crate::protocol::{MessageReference, TxId};
use crate::spans;
use crate::submitter::ChainAdapter;

/// Parses `tx` on `source` and returns the message it emitted.
///
/// The transaction is read, never resubmitted. When it emitted several
/// messages the first one is used, which is the one a fresh run would have
/// picked from the same transaction.
///
/// # Errors
///
/// [`BridgeError::NoMessageFound`] if the transaction emitted nothing.
pub async fn recover_reference(source: &ChainAdapter, tx: &TxId) -> Result<MessageReference> {
    let span = spans::resume_from_transaction(tx, &source.chain());
    async move {
        let messages = source.parse_transaction(tx).await?;

        if messages.len() > 1 {
            warn!(
                tx_hash = %tx,
                message_count = messages.len(),
                event = "multiple_messages_in_transaction"
            );
        }

        match messages.into_iter().next() {
            Some(reference) => {
                info!(
                    tx_hash = %tx,
                    reference = %reference,
                    event = "message_reference_recovered"
                );
                Ok(reference)
            }
            None => {
                spans::record_error_with_context(
                    "NoMessageFound",
                    &format!("Transaction {tx} emitted no bridge message"),
                    None,
                );
                error!(tx_hash = %tx, event = "no_message_found");
                Err(BridgeError::NoMessageFound { tx: tx.clone() })
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ChainId, ChainName, UniversalAddress};
    use crate::testing::FakePlatform;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_message_wins() {
        let platform = FakePlatform::new(ChainName::Solana);
        let first = MessageReference::new(ChainId::SOLANA, UniversalAddress::from([1; 32]), 5);
        let second = MessageReference::new(ChainId::SOLANA, UniversalAddress::from([1; 32]), 6);
        platform.insert_transaction(TxId::from("sig1"), vec![first, second]);

        let adapter = ChainAdapter::other(Arc::new(platform));
        let recovered = recover_reference(&adapter, &TxId::from("sig1")).await.unwrap();
        assert_eq!(recovered, first);
    }

    #[tokio::test]
    async fn test_empty_transaction_has_no_message() {
        let platform = FakePlatform::new(ChainName::Solana);
        platform.insert_transaction(TxId::from("sig2"), vec![]);

        let adapter = ChainAdapter::other(Arc::new(platform));
        let result = recover_reference(&adapter, &TxId::from("sig2")).await;
        assert!(matches!(result, Err(BridgeError::NoMessageFound { tx }) if tx.as_str() == "sig2"));
    }
}
