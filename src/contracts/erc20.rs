// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! ERC20 bindings for approvals and precision lookups
//!
//! Locking or burning through the token bridge pulls tokens with
//! `transferFrom`, so every ERC20 transfer is preceded by an approval.

use alloy_network::Ethereum;
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use alloy_sol_types::{sol, SolCall};
use tracing::debug;

use crate::protocol::TransactionIntent;

use Erc20::Erc20Instance;

/// Read access to one ERC20 token plus approval intents.
pub struct Erc20Contract<P: Provider<Ethereum>> {
    instance: Erc20Instance<P>,
}

impl<P: Provider<Ethereum>> Erc20Contract<P> {
    pub fn new(address: Address, provider: P) -> Self {
        Self {
            instance: Erc20Instance::new(address, provider),
        }
    }

    pub async fn decimals(&self) -> Result<u8, alloy_contract::Error> {
        let decimals = self.instance.decimals().call().await?;
        debug!(
            contract_address = %self.instance.address(),
            decimals = decimals,
            event = "erc20_decimals_retrieved"
        );
        Ok(decimals)
    }

    pub async fn allowance(
        &self,
        owner: Address,
        spender: Address,
    ) -> Result<U256, alloy_contract::Error> {
        self.instance.allowance(owner, spender).call().await
    }

    pub fn address(&self) -> Address {
        *self.instance.address()
    }
}

/// Unsigned `approve(spender, amount)` on `token`.
pub fn approve_intent(token: Address, spender: Address, amount: U256) -> TransactionIntent {
    TransactionIntent::call(
        token,
        Erc20::approveCall { spender, amount }.abi_encode(),
    )
}

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract Erc20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function decimals() external view returns (uint8);
    }
);
