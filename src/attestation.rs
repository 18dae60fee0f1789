// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Deadline-bounded polling of the guardian service

use std::time::Duration;

use tracing::{debug, error, info, trace, warn, Instrument};

use crate::error::{BridgeError, Result};
use crate::protocol::{Attestation, MessageReference, PayloadKind};
use crate::spans;
use crate::traits::{Clock, GuardianService};

const MAX_CONSECUTIVE_ERRORS: u32 = 5;

/// Polls a [`GuardianService`] until a signed VAA for one message appears.
///
/// The only suspension point is the clock's sleep, so any number of waits can
/// be outstanding on one runtime.
#[derive(Debug, Clone)]
pub struct AttestationWaiter<G, C> {
    guardian: G,
    clock: C,
    poll_interval: Duration,
}

impl<G: GuardianService, C: Clock> AttestationWaiter<G, C> {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

    pub fn new(guardian: G, clock: C) -> Self {
        Self {
            guardian,
            clock,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn guardian(&self) -> &G {
        &self.guardian
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Waits for the VAA of `reference`, carrying a payload of `kind`.
    ///
    /// The guardian is always queried at least once, even with a zero
    /// deadline. Rate-limit backoffs are clipped to the remaining time.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::AttestationTimeout`] once `deadline` has elapsed
    /// - [`BridgeError::AttestationMismatch`] if the returned VAA belongs to a
    ///   different message
    /// - [`BridgeError::InvalidVaa`] if it cannot be decoded or carries the
    ///   wrong payload kind
    /// - [`BridgeError::AttestationFailed`] after repeated service errors
    pub async fn wait(
        &self,
        reference: &MessageReference,
        kind: PayloadKind,
        deadline: Duration,
    ) -> Result<Attestation> {
        let span = spans::wait_for_attestation(reference, kind, deadline, self.poll_interval);
        self.wait_inner(reference, kind, deadline)
            .instrument(span)
            .await
    }

    async fn wait_inner(
        &self,
        reference: &MessageReference,
        kind: PayloadKind,
        deadline: Duration,
    ) -> Result<Attestation> {
        let started = self.clock.now();
        let mut attempt: u32 = 0;
        let mut consecutive_errors: u32 = 0;

        info!(
            reference = %reference,
            deadline_secs = deadline.as_secs(),
            poll_interval_secs = self.poll_interval.as_secs(),
            event = "attestation_polling_started"
        );

        loop {
            attempt += 1;
            trace!(attempt = attempt, event = "attestation_attempt");

            let mut backoff = self.poll_interval;

            match self.guardian.get_attestation(reference).await {
                Ok(Some(bytes)) if !bytes.is_empty() => {
                    let attestation = Attestation::from_bytes(&bytes)
                        .inspect_err(|e| spans::record_error(e))?;
                    self.check_binding(reference, kind, &attestation)?;

                    info!(
                        reference = %reference,
                        attempt = attempt,
                        attestation_length_bytes = bytes.len(),
                        event = "attestation_complete"
                    );
                    return Ok(attestation);
                }
                Ok(_) => {
                    consecutive_errors = 0;
                    debug!(attempt = attempt, event = "attestation_pending");
                }
                Err(BridgeError::RateLimitExceeded {
                    retry_after_seconds,
                }) => {
                    consecutive_errors = 0;
                    debug!(
                        retry_after_seconds = retry_after_seconds,
                        event = "rate_limit_exceeded"
                    );
                    backoff = Duration::from_secs(retry_after_seconds);
                }
                Err(e) => {
                    consecutive_errors += 1;
                    warn!(
                        error = %e,
                        attempt = attempt,
                        consecutive_errors = consecutive_errors,
                        event = "attestation_request_failed"
                    );

                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        error!(
                            consecutive_errors = consecutive_errors,
                            event = "circuit_breaker_triggered"
                        );
                        let failure = BridgeError::AttestationFailed {
                            reason: format!(
                                "Circuit breaker triggered after {consecutive_errors} consecutive errors: {e}"
                            ),
                        };
                        spans::record_error(&failure);
                        return Err(failure);
                    }
                }
            }

            let elapsed = self.clock.now().saturating_duration_since(started);
            if elapsed >= deadline {
                spans::record_error_with_context(
                    "AttestationTimeout",
                    &format!("No attestation for {reference}"),
                    Some(&format!("{attempt} attempts over {} seconds", elapsed.as_secs())),
                );
                error!(
                    reference = %reference,
                    attempts = attempt,
                    waited_secs = elapsed.as_secs(),
                    event = "attestation_timeout"
                );
                return Err(BridgeError::AttestationTimeout {
                    reference: *reference,
                    waited: elapsed,
                });
            }

            self.clock.sleep(backoff.min(deadline - elapsed)).await;
        }
    }

    fn check_binding(
        &self,
        expected: &MessageReference,
        kind: PayloadKind,
        attestation: &Attestation,
    ) -> Result<()> {
        let actual = attestation.reference();
        if actual != *expected {
            error!(
                expected = %expected,
                actual = %actual,
                event = "attestation_mismatch"
            );
            return Err(BridgeError::AttestationMismatch {
                expected: *expected,
                actual,
            });
        }

        match attestation.payload_kind() {
            Some(actual_kind) if kind.accepts(actual_kind) => Ok(()),
            actual_kind => Err(BridgeError::invalid_vaa(format!(
                "expected {kind:?} payload, found {actual_kind:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ChainId, UniversalAddress};
    use crate::testing::{signed_vaa, FakeClock, FakeGuardian};

    fn reference() -> MessageReference {
        MessageReference::new(ChainId::SEPOLIA, UniversalAddress::from([0x0a; 32]), 17)
    }

    #[tokio::test]
    async fn test_returns_attestation_after_pending_polls() {
        let guardian = FakeGuardian::new();
        let clock = FakeClock::new();
        guardian.sign_after(reference(), 3, signed_vaa(&reference(), PayloadKind::AttestMeta));

        let waiter = AttestationWaiter::new(guardian.clone(), clock.clone());
        let attestation = waiter
            .wait(&reference(), PayloadKind::AttestMeta, Duration::from_secs(300))
            .await
            .unwrap();

        assert_eq!(attestation.reference(), reference());
        assert_eq!(guardian.call_count(&reference()), 4);
        assert_eq!(clock.sleep_count(), 3);
        assert_eq!(clock.total_sleep_time(), Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_deadline_yields_timeout() {
        let guardian = FakeGuardian::new();
        let clock = FakeClock::new();

        let waiter = AttestationWaiter::new(guardian, clock.clone());
        let result = waiter
            .wait(&reference(), PayloadKind::AttestMeta, Duration::from_secs(300))
            .await;

        match result {
            Err(BridgeError::AttestationTimeout { reference: r, waited }) => {
                assert_eq!(r, reference());
                assert_eq!(waited, Duration::from_secs(300));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert_eq!(clock.total_sleep_time(), Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_zero_deadline_still_queries_once() {
        let guardian = FakeGuardian::new();
        let waiter = AttestationWaiter::new(guardian.clone(), FakeClock::new());

        let result = waiter
            .wait(&reference(), PayloadKind::Transfer, Duration::ZERO)
            .await;

        assert!(matches!(result, Err(BridgeError::AttestationTimeout { .. })));
        assert_eq!(guardian.call_count(&reference()), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_backoff_clipped_to_deadline() {
        let guardian = FakeGuardian::new();
        let clock = FakeClock::new();
        guardian.rate_limit(reference(), 600);

        let waiter = AttestationWaiter::new(guardian, clock.clone());
        let result = waiter
            .wait(&reference(), PayloadKind::AttestMeta, Duration::from_secs(60))
            .await;

        assert!(matches!(result, Err(BridgeError::AttestationTimeout { .. })));
        assert_eq!(clock.sleep_count(), 1);
        assert_eq!(clock.total_sleep_time(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_vaa_for_other_message_rejected() {
        let guardian = FakeGuardian::new();
        let other = MessageReference::new(ChainId::SEPOLIA, UniversalAddress::from([0x0a; 32]), 18);
        guardian.sign_after(reference(), 0, signed_vaa(&other, PayloadKind::AttestMeta));

        let waiter = AttestationWaiter::new(guardian, FakeClock::new());
        let result = waiter
            .wait(&reference(), PayloadKind::AttestMeta, Duration::from_secs(60))
            .await;

        assert!(matches!(
            result,
            Err(BridgeError::AttestationMismatch { actual, .. }) if actual == other
        ));
    }

    #[tokio::test]
    async fn test_wrong_payload_kind_rejected() {
        let guardian = FakeGuardian::new();
        guardian.sign_after(reference(), 0, signed_vaa(&reference(), PayloadKind::Transfer));

        let waiter = AttestationWaiter::new(guardian, FakeClock::new());
        let result = waiter
            .wait(&reference(), PayloadKind::AttestMeta, Duration::from_secs(60))
            .await;

        assert!(matches!(result, Err(BridgeError::InvalidVaa { .. })));
    }

    #[tokio::test]
    async fn test_circuit_breaker_after_consecutive_errors() {
        let guardian = FakeGuardian::new();
        guardian.fail_with_errors(reference());

        let waiter = AttestationWaiter::new(guardian.clone(), FakeClock::new());
        let result = waiter
            .wait(&reference(), PayloadKind::AttestMeta, Duration::from_secs(3600))
            .await;

        assert!(matches!(result, Err(BridgeError::AttestationFailed { .. })));
        assert_eq!(guardian.call_count(&reference()), MAX_CONSECUTIVE_ERRORS as usize);
    }
}
