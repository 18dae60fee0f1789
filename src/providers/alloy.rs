// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Alloy-based account-model RPC.

use std::future::IntoFuture;
use std::sync::Arc;

use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, TxHash, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use tracing::{debug, instrument, trace, Instrument};
use url::Url;

use crate::contracts::token_bridge::CoreBridge::LogMessagePublished;
use crate::error::{BridgeError, Result};
use crate::protocol::{
    ChainName, MessageReference, ReceiptSummary, TransactionIntent, UniversalAddress,
};
use crate::spans;
use crate::traits::{ChainRpc, RpcConnector};

/// Opens wallet-backed alloy HTTP providers for one chain.
#[derive(Clone)]
pub struct AlloyConnector {
    chain: ChainName,
    wallet: EthereumWallet,
    core_bridge: Address,
}

impl AlloyConnector {
    /// # Errors
    ///
    /// [`BridgeError::UnsupportedPlatform`] if `chain` has no Wormhole EVM
    /// deployment.
    pub fn new(chain: ChainName, signer: PrivateKeySigner) -> Result<Self> {
        let contracts = chain
            .bridge_contracts()
            .ok_or(BridgeError::UnsupportedPlatform {
                chain,
                platform: chain.platform(),
            })?;
        Ok(Self {
            chain,
            wallet: EthereumWallet::from(signer),
            core_bridge: contracts.core,
        })
    }
}

#[async_trait]
impl RpcConnector for AlloyConnector {
    async fn connect(&self, url: &Url) -> Result<Arc<dyn ChainRpc>> {
        let provider = ProviderBuilder::new()
            .wallet(self.wallet.clone())
            .connect_http(url.clone())
            .erased();
        Ok(Arc::new(AlloyChainRpc::new(
            self.chain,
            provider,
            self.core_bridge,
            url.clone(),
        )))
    }
}

/// [`ChainRpc`] over an alloy provider.
///
/// Message parsing only considers `LogMessagePublished` events emitted by
/// the configured core bridge.
#[derive(Clone)]
pub struct AlloyChainRpc {
    chain: ChainName,
    provider: DynProvider,
    core_bridge: Address,
    url: Url,
}

impl AlloyChainRpc {
    pub fn new(chain: ChainName, provider: DynProvider, core_bridge: Address, url: Url) -> Self {
        Self {
            chain,
            provider,
            core_bridge,
            url,
        }
    }

    pub fn inner(&self) -> &DynProvider {
        &self.provider
    }
}

#[async_trait]
impl ChainRpc for AlloyChainRpc {
    async fn chain_id(&self) -> Result<u64> {
        let chain_id = self
            .provider
            .get_chain_id()
            .instrument(spans::rpc_call("eth_chainId", &self.url))
            .await?;
        Ok(chain_id)
    }

    async fn estimate_gas(&self, intent: &TransactionIntent) -> Result<U256> {
        let request = transaction_request(intent)?;
        let gas = self
            .provider
            .estimate_gas(request)
            .into_future()
            .instrument(spans::rpc_call("eth_estimateGas", &self.url))
            .await?;
        Ok(U256::from(gas))
    }

    async fn send_transaction(&self, intent: &TransactionIntent) -> Result<TxHash> {
        let request = transaction_request(intent)?;
        let pending = self
            .provider
            .send_transaction(request)
            .instrument(spans::rpc_call("eth_sendTransaction", &self.url))
            .await?;
        Ok(*pending.tx_hash())
    }

    #[instrument(skip(self), fields(chain = %self.chain, tx_hash = %hash))]
    async fn get_transaction_receipt(&self, hash: TxHash) -> Result<Option<ReceiptSummary>> {
        trace!("Fetching transaction receipt");
        let receipt = self.provider.get_transaction_receipt(hash).await?;

        Ok(receipt.map(|receipt| ReceiptSummary {
            status: u64::from(receipt.status()),
            gas_used: receipt.gas_used,
        }))
    }

    #[instrument(skip(self), fields(chain = %self.chain, tx_hash = %hash))]
    async fn parse_transaction(&self, hash: TxHash) -> Result<Vec<MessageReference>> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await?
            .ok_or(BridgeError::TransactionNotFound { tx: hash.into() })?;

        let mut messages = Vec::new();
        for log in receipt.inner.logs() {
            if log.address() != self.core_bridge {
                continue;
            }
            let Ok(decoded) = log.log_decode::<LogMessagePublished>() else {
                continue;
            };
            let event = decoded.inner.data;
            messages.push(MessageReference::new(
                self.chain.id(),
                UniversalAddress::from_evm(event.sender),
                event.sequence,
            ));
        }

        debug!(
            logs = receipt.inner.logs().len(),
            messages = messages.len(),
            event = "transaction_parsed"
        );
        Ok(messages)
    }
}

/// Converts an intent into an alloy request, narrowing gas fields.
pub(crate) fn transaction_request(intent: &TransactionIntent) -> Result<TransactionRequest> {
    let mut request = TransactionRequest::default()
        .with_to(intent.to)
        .with_input(intent.data.clone())
        .with_value(intent.value);

    if let Some(limit) = intent.gas.limit {
        request = request.with_gas_limit(narrow::<u64>(limit, "gas limit")?);
    }
    if let Some(price) = intent.gas.price {
        request = request.with_gas_price(narrow::<u128>(price, "gas price")?);
    }
    if let Some(max_fee) = intent.gas.max_fee_per_gas {
        request = request.with_max_fee_per_gas(narrow::<u128>(max_fee, "max fee per gas")?);
    }
    if let Some(priority) = intent.gas.max_priority_fee_per_gas {
        request = request
            .with_max_priority_fee_per_gas(narrow::<u128>(priority, "max priority fee per gas")?);
    }
    Ok(request)
}

fn narrow<T: TryFrom<U256>>(value: U256, field: &str) -> Result<T> {
    T::try_from(value)
        .map_err(|_| BridgeError::invalid_amount(value, format!("{field} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_request_carries_exact_fields() {
        let intent = TransactionIntent::call(
            address!("DB5492265f6038831E89f495670FF909aDe94bd9"),
            vec![0xde, 0xad],
        )
        .with_value(U256::from(10u64).pow(U256::from(20u64)))
        .with_gas_limit(U256::from(300_000u64));

        let request = transaction_request(&intent).unwrap();
        assert_eq!(request.gas, Some(300_000));
        assert_eq!(request.value, Some(U256::from(10u64).pow(U256::from(20u64))));
        assert_eq!(request.gas_price, None);
    }

    #[test]
    fn test_oversized_gas_limit_rejected() {
        let intent = TransactionIntent::call(Address::ZERO, vec![]).with_gas_limit(U256::MAX);
        assert!(matches!(
            transaction_request(&intent),
            Err(BridgeError::InvalidAmount { .. })
        ));
    }
}
