// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Tokio-backed [`Clock`].

use async_trait::async_trait;
use std::time::{Duration, Instant};

use crate::traits::Clock;

/// Wall clock and Tokio sleep, used by receipt and attestation polling.
///
/// Tests swap in [`FakeClock`](crate::testing::FakeClock) to skip waits.
///
/// ```rust
/// use std::sync::Arc;
/// use token_bridge_rs::providers::TokioClock;
/// use token_bridge_rs::Clock;
///
/// let clock: Arc<dyn Clock> = Arc::new(TokioClock);
/// let _started = clock.now();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now(&self) -> Instant {
        Instant::now()
    }
}
