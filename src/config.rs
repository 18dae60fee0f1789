// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Process-wide configuration
//!
//! [`BridgeConfig`] is built once at startup, either explicitly through its
//! builder or from the environment with [`BridgeConfig::from_env`], and then
//! passed by reference. Nothing else in the crate reads the environment.

use std::fmt;
use std::time::Duration;

use alloy_primitives::B256;
use alloy_signer_local::PrivateKeySigner;
use bon::Builder;
use tracing::debug;
use url::Url;

use crate::error::{BridgeError, Result};
use crate::operation::OperationKind;
use crate::protocol::{ChainEndpoint, ChainName, Network, Platform};

/// Guardian REST API for mainnet.
pub const GUARDIAN_API_MAINNET: &str = "https://api.wormholescan.io";
/// Guardian REST API for testnet.
pub const GUARDIAN_API_TESTNET: &str = "https://api.testnet.wormholescan.io";

/// Deadlines and poll cadence for attestation waits.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use token_bridge_rs::WaitConfig;
///
/// // 5 minute attestation deadline, 30 minute transfer deadline, 5 s polls
/// let config = WaitConfig::default();
///
/// let config = WaitConfig::default().with_attestation_timeout(Duration::from_secs(600));
/// assert_eq!(config.attestation_timeout, Duration::from_secs(600));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Deadline for the metadata VAA of an attest operation.
    pub attestation_timeout: Duration,
    /// Deadline for the transfer VAA, which waits for source finality.
    pub transfer_timeout: Duration,
    /// Delay between guardian queries.
    pub poll_interval: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            attestation_timeout: Duration::from_secs(5 * 60),
            transfer_timeout: Duration::from_secs(30 * 60),
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl WaitConfig {
    /// Short deadlines for local devnets where guardians sign instantly.
    pub fn devnet() -> Self {
        Self {
            attestation_timeout: Duration::from_secs(60),
            transfer_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
        }
    }

    pub fn with_attestation_timeout(mut self, timeout: Duration) -> Self {
        self.attestation_timeout = timeout;
        self
    }

    pub fn with_transfer_timeout(mut self, timeout: Duration) -> Self {
        self.transfer_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn deadline_for(&self, kind: OperationKind) -> Duration {
        match kind {
            OperationKind::Attest => self.attestation_timeout,
            OperationKind::Transfer => self.transfer_timeout,
        }
    }
}

/// A Solana keypair in whichever form it was supplied.
#[derive(Clone, PartialEq, Eq)]
pub enum SolanaKeypair {
    /// Base58 string, as printed by most wallets.
    Base58(String),
    /// 64 raw bytes, as stored by `solana-keygen`.
    Bytes(Vec<u8>),
}

/// Signing material. `Debug` never prints the key.
#[derive(Clone, PartialEq, Eq)]
pub enum SecretMaterial {
    EvmPrivateKey(B256),
    Solana(SolanaKeypair),
}

impl fmt::Debug for SecretMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretMaterial::EvmPrivateKey(_) => f.write_str("EvmPrivateKey(<redacted>)"),
            SecretMaterial::Solana(_) => f.write_str("Solana(<redacted>)"),
        }
    }
}

impl SecretMaterial {
    /// Parses a hex EVM private key, with or without `0x`.
    pub fn evm(hex_key: &str) -> Result<Self> {
        let key = hex_key
            .trim()
            .parse::<B256>()
            .map_err(|_| BridgeError::InvalidConfig("EVM private key must be 32 hex bytes".into()))?;
        Ok(SecretMaterial::EvmPrivateKey(key))
    }

    /// Parses a Solana keypair given as base58 or as a JSON byte array.
    pub fn solana(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.starts_with('[') {
            let bytes: Vec<u8> = serde_json::from_str(value)?;
            if bytes.len() != 64 {
                return Err(BridgeError::InvalidConfig(format!(
                    "Solana keypair must be 64 bytes, got {}",
                    bytes.len()
                )));
            }
            return Ok(SecretMaterial::Solana(SolanaKeypair::Bytes(bytes)));
        }

        const ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
        if value.is_empty() || !value.chars().all(|c| ALPHABET.contains(c)) {
            return Err(BridgeError::InvalidConfig(
                "Solana keypair must be base58 or a JSON byte array".into(),
            ));
        }
        Ok(SecretMaterial::Solana(SolanaKeypair::Base58(value.to_string())))
    }
}

/// Signing material bound to one platform family.
///
/// The EVM credential signs for every account-model chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    platform: Platform,
    material: SecretMaterial,
}

impl Credential {
    pub fn new(material: SecretMaterial) -> Self {
        let platform = match material {
            SecretMaterial::EvmPrivateKey(_) => Platform::AccountModel,
            SecretMaterial::Solana(_) => Platform::Other,
        };
        Self { platform, material }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn material(&self) -> &SecretMaterial {
        &self.material
    }

    /// Local signer for account-model chains.
    pub fn evm_signer(&self) -> Result<PrivateKeySigner> {
        match &self.material {
            SecretMaterial::EvmPrivateKey(key) => PrivateKeySigner::from_bytes(key)
                .map_err(|e| BridgeError::InvalidConfig(format!("invalid EVM private key: {e}"))),
            SecretMaterial::Solana(_) => Err(BridgeError::InvalidConfig(
                "a Solana keypair cannot sign EVM transactions".into(),
            )),
        }
    }
}

/// Everything a process needs to run bridge operations.
#[derive(Builder, Debug, Clone)]
pub struct BridgeConfig {
    #[builder(default)]
    network: Network,
    /// Per-chain RPC overrides. Chains without one use public defaults.
    #[builder(default)]
    endpoints: Vec<ChainEndpoint>,
    guardian_api_url: Option<Url>,
    #[builder(default)]
    wait: WaitConfig,
    #[builder(default)]
    credentials: Vec<Credential>,
}

impl BridgeConfig {
    /// Loads `.env` (if present) and reads the process environment.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `BRIDGE_NETWORK` | `mainnet` or `testnet` (default) |
    /// | `EVM_PRIVATE_KEY` | hex key for every EVM chain |
    /// | `SOLANA_PRIVATE_KEY` | base58 or JSON byte array |
    /// | `<CHAIN>_RPC_URLS` | comma-separated candidates, e.g. `SEPOLIA_RPC_URLS` |
    /// | `GUARDIAN_API_URL` | guardian REST base URL |
    /// | `ATTESTATION_TIMEOUT_SECS` | attest deadline |
    /// | `TRANSFER_TIMEOUT_SECS` | transfer deadline |
    /// | `POLL_INTERVAL_SECS` | guardian poll cadence |
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), event = "dotenv_loaded");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let network = get("BRIDGE_NETWORK")
            .map(|value| value.parse::<Network>())
            .transpose()?
            .unwrap_or_default();

        let mut credentials = Vec::new();
        if let Some(key) = get("EVM_PRIVATE_KEY") {
            credentials.push(Credential::new(SecretMaterial::evm(&key)?));
        }
        if let Some(key) = get("SOLANA_PRIVATE_KEY") {
            credentials.push(Credential::new(SecretMaterial::solana(&key)?));
        }

        let mut endpoints = Vec::new();
        for chain in ChainName::ALL {
            let var = format!("{}_RPC_URLS", chain.env_prefix());
            if let Some(list) = get(&var) {
                let urls = list
                    .split(',')
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(|url| {
                        Url::parse(url)
                            .map_err(|e| BridgeError::InvalidConfig(format!("{var}: {url}: {e}")))
                    })
                    .collect::<Result<Vec<_>>>()?;
                endpoints.push(ChainEndpoint::new(chain, urls));
            }
        }

        let guardian_api_url = get("GUARDIAN_API_URL")
            .map(|url| {
                Url::parse(&url)
                    .map_err(|e| BridgeError::InvalidConfig(format!("GUARDIAN_API_URL: {e}")))
            })
            .transpose()?;

        let mut wait = WaitConfig::default();
        if let Some(secs) = seconds(&get, "ATTESTATION_TIMEOUT_SECS")? {
            wait = wait.with_attestation_timeout(secs);
        }
        if let Some(secs) = seconds(&get, "TRANSFER_TIMEOUT_SECS")? {
            wait = wait.with_transfer_timeout(secs);
        }
        if let Some(secs) = seconds(&get, "POLL_INTERVAL_SECS")? {
            wait = wait.with_poll_interval(secs);
        }

        Ok(Self {
            network,
            endpoints,
            guardian_api_url,
            wait,
            credentials,
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn wait(&self) -> &WaitConfig {
        &self.wait
    }

    /// Candidate endpoints for `chain`: the configured override, else the
    /// chain's public defaults for this network.
    pub fn endpoint(&self, chain: ChainName) -> Result<ChainEndpoint> {
        match self.endpoints.iter().find(|endpoint| endpoint.chain == chain) {
            Some(endpoint) if !endpoint.rpc_urls.is_empty() => Ok(endpoint.clone()),
            _ => ChainEndpoint::with_defaults(chain, self.network),
        }
    }

    pub fn guardian_api_url(&self) -> Result<Url> {
        if let Some(url) = &self.guardian_api_url {
            return Ok(url.clone());
        }
        let default = match self.network {
            Network::Mainnet => GUARDIAN_API_MAINNET,
            Network::Testnet => GUARDIAN_API_TESTNET,
        };
        Url::parse(default).map_err(|e| BridgeError::InvalidConfig(e.to_string()))
    }

    /// The credential signing for `chain`'s platform family.
    pub fn credential_for(&self, chain: ChainName) -> Result<&Credential> {
        let platform = chain.platform();
        self.credentials
            .iter()
            .find(|credential| credential.platform() == platform)
            .ok_or_else(|| {
                BridgeError::InvalidConfig(format!("no credential configured for {chain}"))
            })
    }
}

fn seconds(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<Duration>> {
    get(key)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| BridgeError::InvalidConfig(format!("{key}: {e}")))
        })
        .transpose()
}
