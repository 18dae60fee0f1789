// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Chain identifiers, platform families and per-chain endpoint configuration
//!
//! Wormhole identifies chains with its own 16-bit chain IDs, independent of
//! EVM chain IDs. Reference: <https://wormhole.com/docs/products/reference/chain-ids/>

use std::fmt;
use std::str::FromStr;

use alloy_chains::NamedChain;
use alloy_primitives::{address, Address};
use url::Url;

use crate::error::{BridgeError, Result};

/// Wormhole chain ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(pub u16);

impl ChainId {
    pub const SOLANA: ChainId = ChainId(1);
    pub const ETHEREUM: ChainId = ChainId(2);
    pub const SEPOLIA: ChainId = ChainId(10002);
    pub const ARBITRUM_SEPOLIA: ChainId = ChainId(10003);
    pub const BASE_SEPOLIA: ChainId = ChainId(10004);

    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Execution model of a chain.
///
/// Only account-model (EVM-style) chains are driven by the built-in
/// transaction submitter; every other platform is reached through a
/// [`PlatformClient`](crate::traits::PlatformClient).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    AccountModel,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
}

impl FromStr for Network {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            other => Err(BridgeError::InvalidConfig(format!("unknown network {other:?}"))),
        }
    }
}

/// Chains known to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainName {
    Solana,
    Ethereum,
    Sepolia,
    ArbitrumSepolia,
    BaseSepolia,
}

impl ChainName {
    pub const ALL: [ChainName; 5] = [
        ChainName::Solana,
        ChainName::Ethereum,
        ChainName::Sepolia,
        ChainName::ArbitrumSepolia,
        ChainName::BaseSepolia,
    ];

    pub const fn id(self) -> ChainId {
        match self {
            ChainName::Solana => ChainId::SOLANA,
            ChainName::Ethereum => ChainId::ETHEREUM,
            ChainName::Sepolia => ChainId::SEPOLIA,
            ChainName::ArbitrumSepolia => ChainId::ARBITRUM_SEPOLIA,
            ChainName::BaseSepolia => ChainId::BASE_SEPOLIA,
        }
    }

    pub fn from_id(id: ChainId) -> Option<Self> {
        Self::ALL.into_iter().find(|chain| chain.id() == id)
    }

    pub const fn platform(self) -> Platform {
        match self {
            ChainName::Solana => Platform::Other,
            _ => Platform::AccountModel,
        }
    }

    /// The EVM chain this Wormhole chain maps onto, if any.
    pub const fn named_chain(self) -> Option<NamedChain> {
        match self {
            ChainName::Solana => None,
            ChainName::Ethereum => Some(NamedChain::Mainnet),
            ChainName::Sepolia => Some(NamedChain::Sepolia),
            ChainName::ArbitrumSepolia => Some(NamedChain::ArbitrumSepolia),
            ChainName::BaseSepolia => Some(NamedChain::BaseSepolia),
        }
    }

    /// EVM chain ID a live endpoint must report.
    pub fn evm_chain_id(self) -> Option<u64> {
        self.named_chain().map(|chain| chain as u64)
    }

    /// Network the chain belongs to. Solana serves both, resolved by config.
    pub fn network(self) -> Option<Network> {
        match self.named_chain() {
            Some(chain) if chain.is_testnet() => Some(Network::Testnet),
            Some(_) => Some(Network::Mainnet),
            None => None,
        }
    }

    pub const fn native_decimals(self) -> u8 {
        match self {
            ChainName::Solana => 9,
            _ => 18,
        }
    }

    /// Public RPC endpoints tried in order when no override is configured.
    pub fn default_rpc_urls(self, network: Network) -> Vec<&'static str> {
        match (self, network) {
            (ChainName::Solana, Network::Mainnet) => vec!["https://api.mainnet-beta.solana.com"],
            (ChainName::Solana, Network::Testnet) => vec!["https://api.devnet.solana.com"],
            (ChainName::Ethereum, _) => vec![
                "https://ethereum-rpc.publicnode.com",
                "https://eth.llamarpc.com",
            ],
            (ChainName::Sepolia, _) => vec![
                "https://ethereum-sepolia-rpc.publicnode.com",
                "https://rpc.sepolia.org",
                "https://sepolia.drpc.org",
            ],
            (ChainName::ArbitrumSepolia, _) => vec!["https://sepolia-rollup.arbitrum.io/rpc"],
            (ChainName::BaseSepolia, _) => vec!["https://sepolia.base.org"],
        }
    }

    /// Wormhole core bridge and token bridge contracts on EVM chains.
    pub fn bridge_contracts(self) -> Option<BridgeContracts> {
        let (core, token_bridge) = match self {
            ChainName::Solana => return None,
            ChainName::Ethereum => (
                address!("98f3c9e6E3fAce36bAAd05FE09d375Ef1464288B"),
                address!("3ee18B2214AFF97000D974cf647E7C347E8fa585"),
            ),
            ChainName::Sepolia => (
                address!("4a8bc80Ed5a4067f1CCf107057b8270E0cC11A78"),
                address!("DB5492265f6038831E89f495670FF909aDe94bd9"),
            ),
            ChainName::ArbitrumSepolia => (
                address!("6b9C8671cdDC8dEab9c719bB87cBd3e782bA6a35"),
                address!("C7A204bDBFe983FCD8d8E61D02b475D4073fF97e"),
            ),
            ChainName::BaseSepolia => (
                address!("79A1027a6A159502049F10906D333EC57E95F083"),
                address!("86F55A04690fd7815A3D802bD587e83eA888B239"),
            ),
        };
        Some(BridgeContracts { core, token_bridge })
    }

    /// Block explorer link for a transaction.
    pub fn explorer_tx_url(self, network: Network, tx: &str) -> String {
        match self {
            ChainName::Solana => format!(
                "https://explorer.solana.com/tx/{tx}{}",
                solana_cluster_suffix(network)
            ),
            _ => format!("{}/tx/{tx}", self.etherscan_base()),
        }
    }

    /// Block explorer link for an account or contract.
    pub fn explorer_address_url(self, network: Network, address: &str) -> String {
        match self {
            ChainName::Solana => format!(
                "https://explorer.solana.com/address/{address}{}",
                solana_cluster_suffix(network)
            ),
            _ => format!("{}/address/{address}", self.etherscan_base()),
        }
    }

    fn etherscan_base(self) -> &'static str {
        match self {
            ChainName::Ethereum | ChainName::Solana => "https://etherscan.io",
            ChainName::Sepolia => "https://sepolia.etherscan.io",
            ChainName::ArbitrumSepolia => "https://sepolia.arbiscan.io",
            ChainName::BaseSepolia => "https://sepolia.basescan.org",
        }
    }

    /// Environment variable prefix, e.g. `ARBITRUM_SEPOLIA`.
    pub fn env_prefix(self) -> &'static str {
        match self {
            ChainName::Solana => "SOLANA",
            ChainName::Ethereum => "ETHEREUM",
            ChainName::Sepolia => "SEPOLIA",
            ChainName::ArbitrumSepolia => "ARBITRUM_SEPOLIA",
            ChainName::BaseSepolia => "BASE_SEPOLIA",
        }
    }
}

fn solana_cluster_suffix(network: Network) -> &'static str {
    match network {
        Network::Mainnet => "",
        Network::Testnet => "?cluster=devnet",
    }
}

impl fmt::Display for ChainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChainName::Solana => "Solana",
            ChainName::Ethereum => "Ethereum",
            ChainName::Sepolia => "Sepolia",
            ChainName::ArbitrumSepolia => "ArbitrumSepolia",
            ChainName::BaseSepolia => "BaseSepolia",
        };
        f.write_str(name)
    }
}

impl FromStr for ChainName {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        Self::ALL
            .into_iter()
            .find(|chain| chain.to_string().to_ascii_lowercase() == normalized)
            .ok_or_else(|| BridgeError::InvalidConfig(format!("unknown chain {s:?}")))
    }
}

/// Wormhole contract addresses on an account-model chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeContracts {
    pub core: Address,
    pub token_bridge: Address,
}

/// A chain plus the ordered RPC endpoints to try for it.
///
/// Loaded once per process and shared read-only between operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEndpoint {
    pub chain: ChainName,
    pub platform: Platform,
    pub rpc_urls: Vec<Url>,
}

impl ChainEndpoint {
    pub fn new(chain: ChainName, rpc_urls: Vec<Url>) -> Self {
        Self {
            chain,
            platform: chain.platform(),
            rpc_urls,
        }
    }

    /// Endpoint with the chain's built-in public RPC list.
    pub fn with_defaults(chain: ChainName, network: Network) -> Result<Self> {
        let urls = chain
            .default_rpc_urls(network)
            .into_iter()
            .map(|url| {
                Url::parse(url)
                    .map_err(|e| BridgeError::InvalidConfig(format!("invalid RPC URL {url}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(chain, urls))
    }
}
