// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::protocol::{ChainName, UniversalAddress};

/// One submission lock per (chain, signer).
///
/// Two operations signing with the same key on the same chain would otherwise
/// race on the account nonce.
#[derive(Debug, Default)]
pub struct SignerLocks {
    locks: Mutex<HashMap<(ChainName, UniversalAddress), Arc<AsyncMutex<()>>>>,
}

impl SignerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other submission from `signer` on `chain` is in flight.
    pub async fn acquire(&self, chain: ChainName, signer: UniversalAddress) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry((chain, signer)).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_signer_is_serialized() {
        let locks = Arc::new(SignerLocks::new());
        let signer = UniversalAddress::from([0x01; 32]);

        let guard = locks.acquire(ChainName::Sepolia, signer).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(ChainName::Sepolia, signer).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_distinct_signers_do_not_block() {
        let locks = SignerLocks::new();
        let _a = locks
            .acquire(ChainName::Sepolia, UniversalAddress::from([0x01; 32]))
            .await;
        let _b = locks
            .acquire(ChainName::Sepolia, UniversalAddress::from([0x02; 32]))
            .await;
        let _c = locks
            .acquire(ChainName::BaseSepolia, UniversalAddress::from([0x01; 32]))
            .await;
        assert_eq!(locks.len(), 3);
    }
}
