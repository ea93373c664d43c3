//! unstake-monitor: unstakes a time-locked position the block its lock expires.
//!
//! Polls the staking contract's unlock time and the chain head. Once the
//! head block's timestamp reaches a non-zero unlock time, a transaction is
//! sent from the account to itself whose data designates the WalletLogic
//! contract and calls `executeUnstake(staking)` through it. The monitor
//! then waits for the receipt and exits.
//!
//! Exit codes: 0 unstaked, 1 failed, 130 stopped by the operator.

mod config;
mod identity;
mod monitor;
mod report;
mod submit;

#[cfg(test)]
mod fake;

use anyhow::Context as _;
use clap::Parser;
use tokio::sync::watch;

use unstake_chain_client::{ChainClient, RpcChainClient};
use unstake_protocol::AddressBook;

use config::Cli;
use monitor::{MonitorOutcome, UnstakeMonitor};

const DEFAULT_LOG_FILTER: &str = "unstake_monitor=info,unstake_chain_client=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let env_file = config::load_env_file(None);
    let cli = Cli::parse();
    if let Some(ref path) = env_file {
        tracing::info!("Loaded environment from {}", path.display());
    }

    let signer = identity::load_signer(cli.private_key.as_deref())?;
    let book = AddressBook::load(&cli.addresses)
        .with_context(|| format!("loading addresses from {}", cli.addresses.display()))?;

    if let Some(ref dir) = cli.report_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating report directory {}", dir.display()))?;
    }

    let client = RpcChainClient::with_timeout(&cli.rpc_url, cli.rpc_timeout())?;

    let chain_id = match client.chain_id().await {
        Ok(id) => id.to_string(),
        Err(e) => {
            tracing::warn!("Could not read chain id: {e}");
            "unknown".to_owned()
        }
    };
    tracing::info!(
        "unstake-monitor starting. EOA: {} | staking: {} | walletLogic: {} | network: {} | chain id: {} | rpc: {}",
        signer.address(),
        book.staking,
        book.wallet_logic,
        book.network.as_deref().unwrap_or("-"),
        chain_id,
        client.url(),
    );

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown requested; stopping monitor");
        let _ = cancel_tx.send(true);
    });

    let mut monitor = UnstakeMonitor::new(client, book, signer, cli.monitor_config());
    let outcome = monitor.run(cancel_rx).await;
    tracing::debug!(
        polls = monitor.polls(),
        tx = ?monitor.tx_hash(),
        history = ?monitor.history(),
        "Monitor finished in {}",
        monitor.state(),
    );

    match &outcome {
        MonitorOutcome::Done(receipt) => {
            tracing::info!(
                "Unstaked in block {} (tx {})",
                receipt.block_number,
                receipt.transaction_hash
            );
        }
        MonitorOutcome::Failed(report) | MonitorOutcome::Cancelled(report) => {
            eprintln!("unstake-monitor: {}", report.error);
            report::emit(report, cli.report_dir.as_deref());
        }
    }

    std::process::exit(outcome.exit_code());
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Ctrl-C handler unavailable: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
