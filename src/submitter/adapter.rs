// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use alloy_primitives::Address;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{EndpointResolver, LiveEndpoint, SubmissionOutcome, TransactionSubmitter};
use crate::error::{BridgeError, Result};
use crate::protocol::{
    ChainEndpoint, ChainName, MessageReference, Platform, TxId, UniversalAddress,
    UnsignedTransaction,
};
use crate::traits::PlatformClient;

/// Per-chain submission capability, one variant per platform family.
pub enum ChainAdapter {
    AccountModel(AccountModelChain),
    Other(OtherChain),
}

/// EVM-style chain driven by the built-in submitter.
pub struct AccountModelChain {
    endpoint: ChainEndpoint,
    signer: Address,
    resolver: EndpointResolver,
    submitter: TransactionSubmitter,
    live: Mutex<Option<LiveEndpoint>>,
}

/// Any other chain, reached through its platform client.
pub struct OtherChain {
    client: Arc<dyn PlatformClient>,
}

impl ChainAdapter {
    /// Adapter for an account-model chain.
    ///
    /// # Errors
    ///
    /// [`BridgeError::UnsupportedPlatform`] if `endpoint` is not an
    /// account-model chain.
    pub fn account_model(
        endpoint: ChainEndpoint,
        signer: Address,
        resolver: EndpointResolver,
        submitter: TransactionSubmitter,
    ) -> Result<Self> {
        if endpoint.platform != Platform::AccountModel {
            return Err(BridgeError::UnsupportedPlatform {
                chain: endpoint.chain,
                platform: endpoint.platform,
            });
        }
        Ok(ChainAdapter::AccountModel(AccountModelChain {
            endpoint,
            signer,
            resolver,
            submitter,
            live: Mutex::new(None),
        }))
    }

    pub fn other(client: Arc<dyn PlatformClient>) -> Self {
        ChainAdapter::Other(OtherChain { client })
    }

    pub fn chain(&self) -> ChainName {
        match self {
            ChainAdapter::AccountModel(inner) => inner.endpoint.chain,
            ChainAdapter::Other(inner) => inner.client.chain(),
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            ChainAdapter::AccountModel(_) => Platform::AccountModel,
            ChainAdapter::Other(_) => Platform::Other,
        }
    }

    /// Address paying for and signing this chain's transactions.
    pub fn signer_address(&self) -> UniversalAddress {
        match self {
            ChainAdapter::AccountModel(inner) => UniversalAddress::from_evm(inner.signer),
            ChainAdapter::Other(inner) => inner.client.signer_address(),
        }
    }

    /// Submits one transaction and waits for a successful confirmation.
    ///
    /// # Errors
    ///
    /// [`BridgeError::UnsupportedPlatform`] when the transaction was built
    /// for a different platform family than this chain's.
    pub async fn submit(&self, tx: &UnsignedTransaction) -> Result<SubmissionOutcome> {
        match (self, tx) {
            (ChainAdapter::AccountModel(inner), UnsignedTransaction::AccountModel(intent)) => {
                let live = inner.live_endpoint().await?;
                inner
                    .submitter
                    .submit(
                        inner.endpoint.chain,
                        UniversalAddress::from_evm(inner.signer),
                        live.rpc.as_ref(),
                        intent,
                    )
                    .await
            }
            (ChainAdapter::Other(inner), UnsignedTransaction::Platform(platform_tx)) => {
                debug!(
                    chain = %inner.client.chain(),
                    description = %platform_tx.description,
                    event = "platform_transaction_submitting"
                );
                let transaction = inner.client.sign_send_wait(platform_tx).await?;
                if transaction.status == 0 {
                    return Err(BridgeError::TransactionReverted {
                        hash: transaction.hash,
                        status: transaction.status,
                    });
                }
                info!(
                    chain = %transaction.chain,
                    tx_hash = %transaction.hash,
                    event = "transaction_confirmed"
                );
                Ok(SubmissionOutcome {
                    transaction,
                    warning: None,
                })
            }
            (adapter, UnsignedTransaction::AccountModel(_)) => {
                Err(BridgeError::UnsupportedPlatform {
                    chain: adapter.chain(),
                    platform: Platform::AccountModel,
                })
            }
            (adapter, UnsignedTransaction::Platform(_)) => Err(BridgeError::UnsupportedPlatform {
                chain: adapter.chain(),
                platform: Platform::Other,
            }),
        }
    }

    /// The account-model endpoint in use, resolving one on first call.
    pub async fn live_endpoint(&self) -> Result<LiveEndpoint> {
        match self {
            ChainAdapter::AccountModel(inner) => inner.live_endpoint().await,
            ChainAdapter::Other(inner) => Err(BridgeError::UnsupportedPlatform {
                chain: inner.client.chain(),
                platform: Platform::Other,
            }),
        }
    }

    /// Messages emitted by a confirmed transaction on this chain.
    pub async fn parse_transaction(&self, tx: &TxId) -> Result<Vec<MessageReference>> {
        match self {
            ChainAdapter::AccountModel(inner) => {
                let hash = tx.to_evm_hash()?;
                let live = inner.live_endpoint().await?;
                live.rpc.parse_transaction(hash).await
            }
            ChainAdapter::Other(inner) => inner.client.parse_transaction(tx).await,
        }
    }
}

impl AccountModelChain {
    /// The cached live endpoint, resolving one on first use.
    pub async fn live_endpoint(&self) -> Result<LiveEndpoint> {
        let mut live = self.live.lock().await;
        let resolved = self.resolver.resolve(&self.endpoint, live.as_ref()).await?;
        *live = Some(resolved.clone());
        Ok(resolved)
    }

    pub fn endpoint(&self) -> &ChainEndpoint {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{PlatformTransaction, TransactionIntent};
    use crate::testing::{FakeClock, FakeConnector, FakePlatform};
    use alloy_primitives::Bytes;
    use url::Url;

    fn sepolia_adapter(connector: &FakeConnector) -> ChainAdapter {
        let endpoint = ChainEndpoint::new(
            ChainName::Sepolia,
            vec![Url::parse("http://sepolia.test").unwrap()],
        );
        let submitter = TransactionSubmitter::builder()
            .clock(Arc::new(FakeClock::new()))
            .build();
        ChainAdapter::account_model(
            endpoint,
            Address::repeat_byte(0x11),
            EndpointResolver::new(Arc::new(connector.clone())),
            submitter,
        )
        .unwrap()
    }

    #[test]
    fn test_non_account_model_endpoint_rejected() {
        let endpoint = ChainEndpoint::new(ChainName::Solana, vec![]);
        let submitter = TransactionSubmitter::builder()
            .clock(Arc::new(FakeClock::new()))
            .build();
        let result = ChainAdapter::account_model(
            endpoint,
            Address::ZERO,
            EndpointResolver::new(Arc::new(FakeConnector::new())),
            submitter,
        );
        assert!(matches!(
            result,
            Err(BridgeError::UnsupportedPlatform {
                chain: ChainName::Solana,
                platform: Platform::Other
            })
        ));
    }

    #[tokio::test]
    async fn test_platform_tx_rejected_on_account_model_chain() {
        let connector = FakeConnector::new();
        let adapter = sepolia_adapter(&connector);

        let tx = UnsignedTransaction::Platform(PlatformTransaction {
            description: "post vaa".to_string(),
            payload: Bytes::new(),
        });
        let result = adapter.submit(&tx).await;
        assert!(matches!(
            result,
            Err(BridgeError::UnsupportedPlatform {
                platform: Platform::Other,
                ..
            })
        ));
        assert!(connector.connections().is_empty());
    }

    #[tokio::test]
    async fn test_account_model_tx_rejected_on_platform_chain() {
        let adapter = ChainAdapter::other(Arc::new(FakePlatform::new(ChainName::Solana)));
        let tx = UnsignedTransaction::AccountModel(TransactionIntent::call(Address::ZERO, vec![]));

        assert!(matches!(
            adapter.submit(&tx).await,
            Err(BridgeError::UnsupportedPlatform {
                chain: ChainName::Solana,
                platform: Platform::AccountModel
            })
        ));
    }

    #[tokio::test]
    async fn test_endpoint_resolved_once() {
        let connector = FakeConnector::new();
        let url = Url::parse("http://sepolia.test").unwrap();
        connector.add_endpoint(url, crate::testing::FakeChainRpc::new(11155111));
        let adapter = sepolia_adapter(&connector);

        let tx = UnsignedTransaction::AccountModel(TransactionIntent::call(Address::ZERO, vec![]));
        adapter.submit(&tx).await.unwrap();
        adapter.submit(&tx).await.unwrap();

        assert_eq!(connector.connections().len(), 1);
    }
}
