// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Alloy-generated contract bindings
//!
//! - [`token_bridge`]: Wormhole core bridge (`messageFee`, `LogMessagePublished`)
//!   and token bridge (attest, wrap, transfer, redeem)
//! - [`erc20`]: approvals and precision lookups

pub mod erc20;
pub mod token_bridge;
