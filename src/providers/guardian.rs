// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Wormholescan guardian REST client.

use std::time::Duration;

use alloy_primitives::Bytes;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, trace, Instrument};

use crate::config::{GUARDIAN_API_MAINNET, GUARDIAN_API_TESTNET};
use crate::error::{BridgeError, Result};
use crate::protocol::MessageReference;
use crate::spans;
use crate::traits::GuardianService;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

/// Fetches signed VAAs from `GET {base}/v1/signed_vaa/{chain}/{emitter}/{sequence}`.
///
/// # Examples
///
/// ```rust,no_run
/// use token_bridge_rs::providers::GuardianApi;
/// use token_bridge_rs::{GuardianService, MessageReference};
///
/// # async fn example(reference: MessageReference) -> token_bridge_rs::Result<()> {
/// let guardian = GuardianApi::testnet();
/// if let Some(vaa) = guardian.get_attestation(&reference).await? {
///     println!("signed: {} bytes", vaa.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GuardianApi {
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedVaaResponse {
    #[serde(default)]
    vaa_bytes: String,
}

impl GuardianApi {
    /// `base_url` without the `/v1/...` suffix, e.g. <https://api.wormholescan.io>.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn mainnet() -> Self {
        Self::new(GUARDIAN_API_MAINNET)
    }

    pub fn testnet() -> Self {
        Self::new(GUARDIAN_API_TESTNET)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn vaa_url(&self, reference: &MessageReference) -> String {
        format!(
            "{}/v1/signed_vaa/{}/{}/{}",
            self.base_url,
            reference.emitter_chain.0,
            reference.emitter_hex(),
            reference.sequence
        )
    }
}

#[async_trait]
impl GuardianService for GuardianApi {
    #[instrument(skip(self), fields(reference = %reference))]
    async fn get_attestation(&self, reference: &MessageReference) -> Result<Option<Bytes>> {
        let url = self.vaa_url(reference);
        let span = spans::guardian_request(&url);

        let response = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .instrument(span)
            .await?;

        let status_code = response.status();
        trace!(status_code = %status_code, "Received response from guardian API");

        if status_code == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

            debug!(retry_after_seconds = retry_after, "Rate limit exceeded");
            return Err(BridgeError::RateLimitExceeded {
                retry_after_seconds: retry_after,
            });
        }

        // Guardians have not reached quorum yet.
        if status_code == StatusCode::NOT_FOUND {
            debug!("VAA not signed yet");
            return Ok(None);
        }

        response.error_for_status_ref()?;

        let body: SignedVaaResponse = response.json().await?;
        if body.vaa_bytes.is_empty() {
            return Ok(None);
        }

        let bytes = STANDARD
            .decode(body.vaa_bytes.as_bytes())
            .map_err(|e| BridgeError::invalid_vaa(format!("base64: {e}")))?;
        debug!(vaa_len = bytes.len(), event = "vaa_fetched");
        Ok(Some(Bytes::from(bytes)))
    }
}
