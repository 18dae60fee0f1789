// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Production implementations of the [`crate::traits`] seams.
//!
//! These talk to real EVM nodes through alloy, to the guardian network
//! through the Wormholescan REST API, and to the system clock. Tests use
//! the fakes in [`crate::testing`] instead.

mod alloy;
mod guardian;
mod token_bridge;
mod tokio_clock;

pub use self::alloy::{AlloyChainRpc, AlloyConnector};
pub use self::guardian::GuardianApi;
pub use self::token_bridge::EvmTokenBridge;
pub use self::tokio_clock::TokioClock;
