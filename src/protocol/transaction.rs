// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Transaction intents, submissions and receipts
//!
//! Bridge contracts hand back loosely typed transactions. Every numeric field
//! is normalized into an exact [`U256`] when a [`TransactionIntent`] is built,
//! so nothing downstream ever sees a float or a decimal string.

use std::fmt;

use alloy_primitives::{Address, Bytes, TxHash, U256};
use serde::Deserialize;

use super::ChainName;
use crate::error::Result;
use crate::numeric::NumericValue;

/// Chain-agnostic transaction identifier.
///
/// EVM hashes are stored in their `0x`-prefixed hex form; other platforms use
/// whatever string their explorers accept.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TxId(String);

impl TxId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_evm_hash(&self) -> Result<TxHash> {
        Ok(self.0.trim().parse::<TxHash>()?)
    }
}

impl From<&str> for TxId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TxId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<TxHash> for TxId {
    fn from(hash: TxHash) -> Self {
        Self(hash.to_string())
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A transaction as emitted by bridge tooling, before normalization.
///
/// Numbers may arrive as JSON numbers, decimal strings or hex strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub to: Address,
    #[serde(default)]
    pub data: Bytes,
    #[serde(default)]
    pub value: Option<NumericValue>,
    #[serde(default, alias = "gas")]
    pub gas_limit: Option<NumericValue>,
    #[serde(default)]
    pub gas_price: Option<NumericValue>,
    #[serde(default)]
    pub max_fee_per_gas: Option<NumericValue>,
    #[serde(default)]
    pub max_priority_fee_per_gas: Option<NumericValue>,
}

/// Optional fee and limit fields. `None` leaves the choice to the node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GasFields {
    pub limit: Option<U256>,
    pub price: Option<U256>,
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
}

/// An unsigned account-model call with exact integer fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIntent {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub gas: GasFields,
}

impl TransactionIntent {
    pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: data.into(),
            value: U256::ZERO,
            gas: GasFields::default(),
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_gas_limit(mut self, limit: U256) -> Self {
        self.gas.limit = Some(limit);
        self
    }

    /// Normalizes a loosely typed transaction.
    ///
    /// An absent value means zero. Gas fields that are absent or zero are left
    /// unset.
    pub fn from_raw(raw: &RawTransaction) -> Result<Self> {
        let value = match &raw.value {
            Some(value) => value.to_u256()?,
            None => U256::ZERO,
        };

        Ok(Self {
            to: raw.to,
            data: raw.data.clone(),
            value,
            gas: GasFields {
                limit: nonzero(&raw.gas_limit)?,
                price: nonzero(&raw.gas_price)?,
                max_fee_per_gas: nonzero(&raw.max_fee_per_gas)?,
                max_priority_fee_per_gas: nonzero(&raw.max_priority_fee_per_gas)?,
            },
        })
    }
}

fn nonzero(field: &Option<NumericValue>) -> Result<Option<U256>> {
    match field {
        Some(value) => {
            let value = value.to_u256()?;
            Ok((!value.is_zero()).then_some(value))
        }
        None => Ok(None),
    }
}

/// A transaction signed by a platform-specific client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformTransaction {
    /// Human-readable label used in logs.
    pub description: String,
    /// Serialized instruction set understood by the platform client.
    pub payload: Bytes,
}

/// One entry of the ordered sequence a bridge contract produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsignedTransaction {
    AccountModel(TransactionIntent),
    Platform(PlatformTransaction),
}

impl From<TransactionIntent> for UnsignedTransaction {
    fn from(intent: TransactionIntent) -> Self {
        UnsignedTransaction::AccountModel(intent)
    }
}

impl From<PlatformTransaction> for UnsignedTransaction {
    fn from(tx: PlatformTransaction) -> Self {
        UnsignedTransaction::Platform(tx)
    }
}

/// Status and gas reported by a confirmation receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub status: u64,
    pub gas_used: u64,
}

impl ReceiptSummary {
    pub fn succeeded(&self) -> bool {
        self.status != 0
    }
}

/// A transaction confirmed on chain with a successful receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTransaction {
    pub chain: ChainName,
    pub hash: TxId,
    pub status: u64,
    pub gas_used: u64,
}

/// A recoverable problem observed while submitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionWarning {
    /// Submitted without an explicit gas limit.
    GasEstimationFailed { chain: ChainName, reason: String },
}

impl fmt::Display for SubmissionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionWarning::GasEstimationFailed { chain, reason } => {
                write!(f, "gas estimation failed on {chain}: {reason}")
            }
        }
    }
}
