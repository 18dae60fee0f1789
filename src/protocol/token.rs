// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Token identity and lazily fetched precision

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use alloy_primitives::U256;
use tracing::debug;

use super::{ChainName, UniversalAddress};
use crate::error::Result;
use crate::traits::BridgeContract;

/// A token identified by its origin chain and native address.
///
/// The zero address denotes the chain's native gas token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId {
    pub chain: ChainName,
    pub address: UniversalAddress,
}

impl TokenId {
    pub fn new(chain: ChainName, address: impl Into<UniversalAddress>) -> Self {
        Self {
            chain,
            address: address.into(),
        }
    }

    pub fn native(chain: ChainName) -> Self {
        Self::new(chain, UniversalAddress::ZERO)
    }

    pub fn is_native(&self) -> bool {
        self.address.is_zero()
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            write!(f, "{}:native", self.chain)
        } else {
            write!(f, "{}:{}", self.chain, self.address)
        }
    }
}

/// A token together with its decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenDescriptor {
    pub id: TokenId,
    pub decimals: u8,
}

/// Parameters of a token transfer leaving the source chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub token: TokenId,
    /// Amount in base units.
    pub amount: U256,
    pub recipient_chain: ChainName,
    pub recipient: UniversalAddress,
}

/// Per-process cache of token precision.
///
/// Decimals never change for a deployed token, so each token is queried at
/// most once.
#[derive(Debug, Default)]
pub struct DecimalsCache {
    entries: Mutex<HashMap<TokenId, u8>>,
}

impl DecimalsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self, token: &TokenId) -> Option<u8> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .copied()
    }

    /// Returns the token's precision, querying `contract` on a cache miss.
    ///
    /// `contract` must be deployed on the token's origin chain.
    pub async fn describe(
        &self,
        token: &TokenId,
        contract: &dyn BridgeContract,
    ) -> Result<TokenDescriptor> {
        if let Some(decimals) = self.cached(token) {
            return Ok(TokenDescriptor {
                id: *token,
                decimals,
            });
        }

        let decimals = if token.is_native() {
            token.chain.native_decimals()
        } else {
            contract.get_decimals(&token.address).await?
        };

        debug!(
            token = %token,
            decimals = decimals,
            event = "token_decimals_cached"
        );
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(*token, decimals);

        Ok(TokenDescriptor {
            id: *token,
            decimals,
        })
    }
}
