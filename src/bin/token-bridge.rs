// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Command line entry points: `attest`, `transfer` and `resume`.
//!
//! Configuration comes from the environment (see [`BridgeConfig::from_env`]).
//! On success the final artifact is printed and the process exits 0; any
//! failure prints the error, plus the reverted transaction or the source
//! transaction to resume from when known, and exits 1.
//!
//! ```bash
//! EVM_PRIVATE_KEY=0x... token-bridge attest --source sepolia --destination base-sepolia \
//!     --token 0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238
//! RUST_LOG=token_bridge_rs=debug token-bridge resume --kind transfer ... --tx 0xabc...
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use token_bridge_rs::providers::{AlloyConnector, EvmTokenBridge, GuardianApi, TokioClock};
use token_bridge_rs::{
    parse_units, AttestationWaiter, Bridge, BridgeConfig, BridgeError, BridgeOperation,
    ChainAdapter, ChainHandle, ChainName, EndpointResolver, OperationArtifact, OperationKind,
    Platform, Result, SignerLocks, TokenId, TransactionSubmitter, TransferRequest, TxId,
    UniversalAddress,
};

#[derive(Debug, Parser)]
#[command(name = "token-bridge", version, about = "Wormhole token bridge operations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register a token's metadata on the destination chain.
    Attest {
        /// Token's origin chain.
        #[arg(long)]
        source: ChainName,
        #[arg(long)]
        destination: ChainName,
        /// Token address on its origin chain.
        #[arg(long, value_parser = parse_token_address)]
        token: UniversalAddress,
    },
    /// Move tokens to a recipient on the destination chain.
    Transfer {
        /// Chain the tokens are sent from.
        #[arg(long)]
        source: ChainName,
        #[arg(long)]
        destination: ChainName,
        /// Token address on its origin chain, or `native`.
        #[arg(long, value_parser = parse_token_address)]
        token: UniversalAddress,
        /// Token's origin chain; defaults to `--source`.
        #[arg(long)]
        token_chain: Option<ChainName>,
        /// Human-readable amount, e.g. `1.5`.
        #[arg(long)]
        amount: String,
        /// Defaults to the destination signer.
        #[arg(long, value_parser = parse_token_address)]
        recipient: Option<UniversalAddress>,
    },
    /// Continue an operation from a confirmed source transaction.
    Resume {
        #[arg(long, value_enum)]
        kind: Kind,
        #[arg(long)]
        source: ChainName,
        #[arg(long)]
        destination: ChainName,
        #[arg(long, value_parser = parse_token_address)]
        token: UniversalAddress,
        /// Token's origin chain; defaults to `--source`.
        #[arg(long)]
        token_chain: Option<ChainName>,
        /// Source transaction hash or signature.
        #[arg(long)]
        tx: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Attest,
    Transfer,
}

impl From<Kind> for OperationKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Attest => OperationKind::Attest,
            Kind::Transfer => OperationKind::Transfer,
        }
    }
}

fn parse_token_address(value: &str) -> Result<UniversalAddress> {
    if value.eq_ignore_ascii_case("native") {
        return Ok(UniversalAddress::ZERO);
    }
    value.parse()
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, event = "command_failed");
            eprintln!("error: {e}");
            if let Some((hash, status)) = e.revert_details() {
                eprintln!("reverted transaction: {hash} (receipt status {status})");
            }
            if let Some(tx) = e.resumable_from() {
                eprintln!("resume with: --tx {tx}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = BridgeConfig::from_env()?;

    let (source, destination) = match &cli.command {
        Command::Attest {
            source,
            destination,
            ..
        }
        | Command::Transfer {
            source,
            destination,
            ..
        }
        | Command::Resume {
            source,
            destination,
            ..
        } => (*source, *destination),
    };

    let locks = Arc::new(SignerLocks::default());
    let source_handle = chain_handle(&config, source, &locks).await?;
    let destination_handle = chain_handle(&config, destination, &locks).await?;
    let recipient_default = destination_handle.adapter().signer_address();

    let guardian = GuardianApi::new(config.guardian_api_url()?.as_str());
    let waiter = AttestationWaiter::new(guardian, TokioClock)
        .with_poll_interval(config.wait().poll_interval);

    let bridge = Bridge::builder()
        .chains(vec![source_handle, destination_handle])
        .waiter(waiter)
        .wait_config(*config.wait())
        .build();

    let mut op = match cli.command {
        Command::Attest { token, .. } => {
            BridgeOperation::attest(TokenId::new(source, token), destination)?
        }
        Command::Transfer {
            token,
            token_chain,
            amount,
            recipient,
            ..
        } => {
            let token = TokenId::new(token_chain.unwrap_or(source), token);
            let descriptor = bridge.token_descriptor(&token).await?;
            let amount = parse_units(&amount, descriptor.decimals)?;
            BridgeOperation::transfer(
                source,
                TransferRequest {
                    token,
                    amount,
                    recipient_chain: destination,
                    recipient: recipient.unwrap_or(recipient_default),
                },
            )?
        }
        Command::Resume {
            kind,
            token,
            token_chain,
            tx,
            ..
        } => BridgeOperation::resume(
            kind.into(),
            source,
            destination,
            TokenId::new(token_chain.unwrap_or(source), token),
            TxId::from(tx),
        )?,
    };

    let artifact = bridge.execute(&mut op).await?;

    let network = config.network();
    println!("{artifact}");
    match &artifact {
        OperationArtifact::WrappedAsset(address) => {
            println!(
                "{}",
                destination.explorer_address_url(network, &address.to_string())
            );
        }
        OperationArtifact::DestinationTx(tx) => {
            println!("{}", destination.explorer_tx_url(network, tx.as_str()));
        }
    }
    for tx in op.transactions() {
        info!(
            chain = %tx.chain,
            tx_hash = %tx.hash,
            explorer = %tx.chain.explorer_tx_url(network, tx.hash.as_str()),
            event = "transaction_recorded"
        );
    }
    for warning in op.warnings() {
        println!("warning: {warning}");
    }
    Ok(())
}

/// Adapter and bridge contract for one chain, both bound to the same live
/// endpoint.
async fn chain_handle(
    config: &BridgeConfig,
    chain: ChainName,
    locks: &Arc<SignerLocks>,
) -> Result<ChainHandle> {
    if chain.platform() != Platform::AccountModel {
        return Err(BridgeError::UnsupportedPlatform {
            chain,
            platform: chain.platform(),
        });
    }

    let signer = config.credential_for(chain)?.evm_signer()?;
    let signer_address = signer.address();
    let connector = AlloyConnector::new(chain, signer)?;

    let submitter = TransactionSubmitter::builder()
        .clock(Arc::new(TokioClock))
        .locks(Arc::clone(locks))
        .build();
    let adapter = ChainAdapter::account_model(
        config.endpoint(chain)?,
        signer_address,
        EndpointResolver::new(Arc::new(connector)),
        submitter,
    )?;

    let live = adapter.live_endpoint().await?;
    let contract = EvmTokenBridge::connect(chain, &live.url)?;
    info!(chain = %chain, url = %live.url, event = "chain_ready");

    ChainHandle::new(Arc::new(adapter), Arc::new(contract))
}
