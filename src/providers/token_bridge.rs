// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Token bridge contract on an EVM chain.

use alloy_primitives::{Address, B256, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use tracing::{debug, info, instrument};
use url::Url;

use crate::contracts::erc20::{approve_intent, Erc20Contract};
use crate::contracts::token_bridge::{CoreBridge::CoreBridgeInstance, TokenBridge};
use crate::error::{BridgeError, Result};
use crate::protocol::{
    Attestation, BridgeContracts, ChainName, PayloadKind, TokenId, TransactionIntent,
    TransferRequest, UniversalAddress, UnsignedTransaction,
};
use crate::traits::BridgeContract;

use TokenBridge::TokenBridgeInstance;

/// Wormhole token bridge deployment on one EVM chain.
///
/// Transaction builders only read chain state (message fee, wrapped asset
/// addresses, allowances); nothing is signed here.
#[derive(Clone)]
pub struct EvmTokenBridge {
    chain: ChainName,
    contracts: BridgeContracts,
    provider: DynProvider,
}

impl EvmTokenBridge {
    /// # Errors
    ///
    /// [`BridgeError::UnsupportedPlatform`] when `chain` has no EVM
    /// deployment.
    pub fn new(chain: ChainName, provider: DynProvider) -> Result<Self> {
        let contracts = chain
            .bridge_contracts()
            .ok_or(BridgeError::UnsupportedPlatform {
                chain,
                platform: chain.platform(),
            })?;
        Ok(Self {
            chain,
            contracts,
            provider,
        })
    }

    /// Read-only bridge over a plain HTTP provider.
    pub fn connect(chain: ChainName, url: &Url) -> Result<Self> {
        let provider = ProviderBuilder::new().connect_http(url.clone()).erased();
        Self::new(chain, provider)
    }

    pub fn contracts(&self) -> BridgeContracts {
        self.contracts
    }

    fn token_bridge(&self) -> TokenBridgeInstance<DynProvider> {
        TokenBridgeInstance::new(self.contracts.token_bridge, self.provider.clone())
    }

    async fn message_fee(&self) -> Result<U256> {
        let fee = CoreBridgeInstance::new(self.contracts.core, self.provider.clone())
            .messageFee()
            .call()
            .await?;
        debug!(chain = %self.chain, fee = %fee, event = "message_fee_retrieved");
        Ok(fee)
    }

    fn evm_address(&self, address: &UniversalAddress) -> Result<Address> {
        address.to_evm().ok_or_else(|| {
            BridgeError::InvalidConfig(format!(
                "{address} is not an account-model address on {}",
                self.chain
            ))
        })
    }

    /// Address of `token` as deployed on this chain: the token itself on
    /// its origin chain, its wrapped representation elsewhere.
    async fn local_token(&self, token: &TokenId) -> Result<Address> {
        let local = self
            .get_wrapped_asset(token)
            .await?
            .ok_or(BridgeError::WrappedAssetNotFound {
                token: *token,
                chain: self.chain,
            })?;
        self.evm_address(&local)
    }
}

#[async_trait]
impl BridgeContract for EvmTokenBridge {
    fn chain(&self) -> ChainName {
        self.chain
    }

    #[instrument(skip(self, _payer), fields(chain = %self.chain, token = %token))]
    async fn build_attestation_tx(
        &self,
        token: &TokenId,
        _payer: &UniversalAddress,
    ) -> Result<Vec<UnsignedTransaction>> {
        if token.chain != self.chain || token.is_native() {
            return Err(BridgeError::InvalidConfig(format!(
                "{token} cannot be attested from {}",
                self.chain
            )));
        }
        let fee = self.message_fee().await?;
        let call = TokenBridge::attestTokenCall {
            tokenAddress: self.evm_address(&token.address)?,
            nonce: 0,
        };
        let intent = TransactionIntent::call(self.contracts.token_bridge, call.abi_encode())
            .with_value(fee);
        Ok(vec![intent.into()])
    }

    #[instrument(skip_all, fields(chain = %self.chain, reference = %attestation.reference()))]
    async fn build_submit_attestation_tx(
        &self,
        attestation: &Attestation,
        _payer: &UniversalAddress,
    ) -> Result<Vec<UnsignedTransaction>> {
        let meta = attestation.asset_meta()?;
        let encoded_vm = attestation.encode();

        let existing = self
            .token_bridge()
            .wrappedAsset(meta.token_chain.0, B256::from(meta.token_address.0))
            .call()
            .await?;

        let data = if existing.is_zero() {
            TokenBridge::createWrappedCall {
                encodedVm: encoded_vm,
            }
            .abi_encode()
        } else {
            debug!(wrapped = %existing, "Wrapped asset exists, updating metadata");
            TokenBridge::updateWrappedCall {
                encodedVm: encoded_vm,
            }
            .abi_encode()
        };
        Ok(vec![
            TransactionIntent::call(self.contracts.token_bridge, data).into(),
        ])
    }

    #[instrument(skip_all, fields(chain = %self.chain, token = %transfer.token, amount = %transfer.amount))]
    async fn build_transfer_tx(
        &self,
        transfer: &TransferRequest,
        payer: &UniversalAddress,
    ) -> Result<Vec<UnsignedTransaction>> {
        let fee = self.message_fee().await?;
        let recipient_chain = transfer.recipient_chain.id().0;
        let recipient = B256::from(transfer.recipient.0);

        if transfer.token.is_native() && transfer.token.chain == self.chain {
            let call = TokenBridge::wrapAndTransferETHCall {
                recipientChain: recipient_chain,
                recipient,
                arbiterFee: U256::ZERO,
                nonce: 0,
            };
            let intent = TransactionIntent::call(self.contracts.token_bridge, call.abi_encode())
                .with_value(transfer.amount.saturating_add(fee));
            return Ok(vec![intent.into()]);
        }

        let local = self.local_token(&transfer.token).await?;
        let mut txs: Vec<UnsignedTransaction> = Vec::with_capacity(2);

        let owner = self.evm_address(payer)?;
        let allowance = Erc20Contract::new(local, self.provider.clone())
            .allowance(owner, self.contracts.token_bridge)
            .await?;
        if allowance < transfer.amount {
            txs.push(approve_intent(local, self.contracts.token_bridge, transfer.amount).into());
        }

        let call = TokenBridge::transferTokensCall {
            token: local,
            amount: transfer.amount,
            recipientChain: recipient_chain,
            recipient,
            arbiterFee: U256::ZERO,
            nonce: 0,
        };
        txs.push(
            TransactionIntent::call(self.contracts.token_bridge, call.abi_encode())
                .with_value(fee)
                .into(),
        );

        info!(
            transactions = txs.len(),
            local_token = %local,
            event = "transfer_transactions_built"
        );
        Ok(txs)
    }

    async fn build_redeem_tx(
        &self,
        _payer: &UniversalAddress,
        attestation: &Attestation,
    ) -> Result<Vec<UnsignedTransaction>> {
        if attestation.payload_kind() != Some(PayloadKind::Transfer) {
            return Err(BridgeError::invalid_vaa(format!(
                "expected a transfer payload, got {:?}",
                attestation.payload_kind()
            )));
        }
        let call = TokenBridge::completeTransferCall {
            encodedVm: attestation.encode(),
        };
        Ok(vec![
            TransactionIntent::call(self.contracts.token_bridge, call.abi_encode()).into(),
        ])
    }

    async fn get_wrapped_asset(&self, token: &TokenId) -> Result<Option<UniversalAddress>> {
        if token.chain == self.chain {
            return Ok(Some(token.address));
        }
        let wrapped = self
            .token_bridge()
            .wrappedAsset(token.chain.id().0, B256::from(token.address.0))
            .call()
            .await?;
        if wrapped.is_zero() {
            Ok(None)
        } else {
            Ok(Some(UniversalAddress::from_evm(wrapped)))
        }
    }

    async fn get_decimals(&self, token: &UniversalAddress) -> Result<u8> {
        let address = self.evm_address(token)?;
        Ok(Erc20Contract::new(address, self.provider.clone())
            .decimals()
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sepolia() -> EvmTokenBridge {
        EvmTokenBridge::connect(
            ChainName::Sepolia,
            &Url::parse("http://127.0.0.1:1").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_chain_without_deployment_rejected() {
        let result = EvmTokenBridge::connect(
            ChainName::Solana,
            &Url::parse("http://127.0.0.1:1").unwrap(),
        );
        assert!(matches!(
            result,
            Err(BridgeError::UnsupportedPlatform {
                chain: ChainName::Solana,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_origin_token_is_its_own_wrapped_asset() {
        let token = TokenId::new(ChainName::Sepolia, Address::repeat_byte(0x42));
        let local = sepolia().get_wrapped_asset(&token).await.unwrap();
        assert_eq!(local, Some(token.address));
    }

    #[tokio::test]
    async fn test_redeem_rejects_metadata_vaa() {
        let reference = crate::protocol::MessageReference::new(
            ChainName::ArbitrumSepolia.id(),
            UniversalAddress::from_evm(Address::repeat_byte(0x01)),
            7,
        );
        let bytes = crate::testing::signed_vaa(&reference, PayloadKind::AttestMeta);
        let attestation = Attestation::from_bytes(&bytes).unwrap();

        let result = sepolia()
            .build_redeem_tx(&UniversalAddress::ZERO, &attestation)
            .await;
        assert!(matches!(result, Err(BridgeError::InvalidVaa { .. })));
    }

    #[tokio::test]
    async fn test_redeem_encodes_vaa() {
        let reference = crate::protocol::MessageReference::new(
            ChainName::ArbitrumSepolia.id(),
            UniversalAddress::from_evm(Address::repeat_byte(0x01)),
            8,
        );
        let bytes = crate::testing::signed_vaa(&reference, PayloadKind::Transfer);
        let attestation = Attestation::from_bytes(&bytes).unwrap();

        let txs = sepolia()
            .build_redeem_tx(&UniversalAddress::ZERO, &attestation)
            .await
            .unwrap();
        let [UnsignedTransaction::AccountModel(intent)] = txs.as_slice() else {
            panic!("expected one account-model transaction");
        };
        let decoded = TokenBridge::completeTransferCall::abi_decode(&intent.data).unwrap();
        assert_eq!(decoded.encodedVm, bytes);
        assert_eq!(intent.value, U256::ZERO);
    }
}
