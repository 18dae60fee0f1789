// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::{BridgeError, Result};
use crate::protocol::ChainEndpoint;
use crate::traits::{ChainRpc, RpcConnector};

/// A connected endpoint that answered the liveness probe.
#[derive(Clone)]
pub struct LiveEndpoint {
    pub url: Url,
    pub rpc: Arc<dyn ChainRpc>,
}

impl fmt::Debug for LiveEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveEndpoint")
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

/// Picks the first responsive RPC endpoint from an ordered candidate list.
#[derive(Clone)]
pub struct EndpointResolver {
    connector: Arc<dyn RpcConnector>,
    probe_timeout: Duration,
}

impl EndpointResolver {
    pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(connector: Arc<dyn RpcConnector>) -> Self {
        Self {
            connector,
            probe_timeout: Self::DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Resolves a live endpoint for `endpoint`.
    ///
    /// A `known` endpoint is returned as-is without probing. Otherwise
    /// candidates are probed strictly in list order and the first to answer
    /// with the expected chain ID wins.
    ///
    /// # Errors
    ///
    /// [`BridgeError::ProviderUnavailable`] when no candidate answers.
    #[instrument(skip(self, endpoint, known), fields(chain = %endpoint.chain, candidates = endpoint.rpc_urls.len()))]
    pub async fn resolve(
        &self,
        endpoint: &ChainEndpoint,
        known: Option<&LiveEndpoint>,
    ) -> Result<LiveEndpoint> {
        if let Some(live) = known {
            debug!(url = %live.url, event = "known_endpoint_reused");
            return Ok(live.clone());
        }

        let expected_chain_id = endpoint.chain.evm_chain_id();

        for url in &endpoint.rpc_urls {
            match self.probe(url, expected_chain_id).await {
                Ok(rpc) => {
                    info!(url = %url, event = "endpoint_resolved");
                    return Ok(LiveEndpoint {
                        url: url.clone(),
                        rpc,
                    });
                }
                Err(e) => {
                    warn!(url = %url, error = %e, event = "endpoint_probe_failed");
                }
            }
        }

        Err(BridgeError::ProviderUnavailable {
            candidates: endpoint.rpc_urls.len(),
        })
    }

    async fn probe(&self, url: &Url, expected_chain_id: Option<u64>) -> Result<Arc<dyn ChainRpc>> {
        let rpc = self.connector.connect(url).await?;

        let reported = tokio::time::timeout(self.probe_timeout, rpc.chain_id())
            .await
            .map_err(|_| {
                BridgeError::Provider(format!(
                    "no answer within {:?}",
                    self.probe_timeout
                ))
            })??;

        match expected_chain_id {
            Some(expected) if expected != reported => Err(BridgeError::Provider(format!(
                "endpoint serves chain {reported}, expected {expected}"
            ))),
            _ => Ok(rpc),
        }
    }
}
