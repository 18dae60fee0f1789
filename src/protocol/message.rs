// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Cross-chain message identity
//!
//! Every message published through the Wormhole core bridge is identified by
//! the triple `(emitter chain, emitter address, sequence)`. Guardians index
//! signed VAAs by the same triple.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{hex, Address, FixedBytes};

use super::ChainId;
use crate::error::{BridgeError, Result};

/// A 32-byte chain-agnostic address.
///
/// EVM addresses are left-padded with 12 zero bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UniversalAddress(pub FixedBytes<32>);

impl UniversalAddress {
    pub const ZERO: UniversalAddress = UniversalAddress(FixedBytes::ZERO);

    pub fn from_evm(address: Address) -> Self {
        Self(address.into_word())
    }

    /// The EVM address, if the upper 12 bytes are zero.
    pub fn to_evm(&self) -> Option<Address> {
        if self.0[..12].iter().all(|b| *b == 0) {
            Some(Address::from_word(self.0))
        } else {
            None
        }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0 .0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == FixedBytes::ZERO
    }
}

impl From<Address> for UniversalAddress {
    fn from(address: Address) -> Self {
        Self::from_evm(address)
    }
}

impl From<[u8; 32]> for UniversalAddress {
    fn from(bytes: [u8; 32]) -> Self {
        Self(FixedBytes::from(bytes))
    }
}

impl FromStr for UniversalAddress {
    type Err = BridgeError;

    /// Accepts a 20-byte EVM address or a full 32-byte hex string.
    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim())?;
        match bytes.len() {
            20 => Ok(Self::from_evm(Address::from_slice(&bytes))),
            32 => Ok(Self(FixedBytes::from_slice(&bytes))),
            n => Err(BridgeError::InvalidConfig(format!(
                "address must be 20 or 32 bytes, got {n}"
            ))),
        }
    }
}

impl fmt::Display for UniversalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_evm() {
            Some(address) => write!(f, "{address}"),
            None => write!(f, "0x{}", hex::encode(self.0)),
        }
    }
}

/// Identifies one emitted cross-chain message.
///
/// Produced by parsing exactly one confirmed source transaction and never
/// modified afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageReference {
    pub emitter_chain: ChainId,
    pub emitter_address: UniversalAddress,
    pub sequence: u64,
}

impl MessageReference {
    pub fn new(emitter_chain: ChainId, emitter_address: UniversalAddress, sequence: u64) -> Self {
        Self {
            emitter_chain,
            emitter_address,
            sequence,
        }
    }

    /// Emitter as 64 lowercase hex characters without prefix, the form
    /// guardian APIs expect in URL paths.
    pub fn emitter_hex(&self) -> String {
        hex::encode(self.emitter_address.0)
    }
}

impl fmt::Display for MessageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.emitter_chain,
            self.emitter_hex(),
            self.sequence
        )
    }
}
