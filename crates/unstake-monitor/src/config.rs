use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use unstake_protocol::{
    DEFAULT_ADDRESS_FILE, DEFAULT_POLL_INTERVAL_MS, DEFAULT_RPC_URL, UNSTAKE_GAS_LIMIT,
};

use crate::monitor::MonitorConfig;

#[derive(Parser, Debug)]
#[command(
    name = "unstake-monitor",
    about = "Watches a stake lock and unstakes through account delegation the block it expires"
)]
pub struct Cli {
    /// JSON-RPC endpoint of the chain.
    #[arg(long, default_value = DEFAULT_RPC_URL, env = "UNSTAKE_RPC_URL")]
    pub rpc_url: String,

    /// Address file written by the deployment (token, staking, walletLogic).
    #[arg(long, default_value = DEFAULT_ADDRESS_FILE, env = "UNSTAKE_ADDRESSES")]
    pub addresses: PathBuf,

    /// Hex private key of the staking account.
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Milliseconds between polls while waiting for the lock to expire.
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,

    /// Gas limit of the unstake transaction.
    #[arg(long, default_value_t = UNSTAKE_GAS_LIMIT)]
    pub gas_limit: u64,

    /// Milliseconds between receipt polls once the transaction is sent.
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    pub confirmation_poll_ms: u64,

    /// Give up on the receipt after this many seconds. Unset waits forever.
    #[arg(long)]
    pub confirmation_timeout_secs: Option<u64>,

    /// Per-request HTTP timeout.
    #[arg(long, default_value_t = 30)]
    pub rpc_timeout_secs: u64,

    /// Fail after this many consecutive failed reads while waiting.
    /// Unset retries forever.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_read_failures: Option<u32>,

    /// Read the unlock time a second time before acting on an expiry.
    #[arg(long)]
    pub confirm_unlock_read: bool,

    /// Directory for JSON failure reports. If unset, reports only go to stdout.
    #[arg(long)]
    pub report_dir: Option<PathBuf>,
}

/// Load `KEY=value` pairs from `path`, or from the first `.env` found in the
/// working directory and its parents. Variables already set in the process
/// environment win. Returns the file that was read.
pub fn load_env_file(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(path) => dotenvy::from_path(path).ok().map(|()| path.to_path_buf()),
        None => dotenvy::dotenv().ok(),
    }
}

impl Cli {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            gas_limit: self.gas_limit,
            confirmation_poll_interval: Duration::from_millis(self.confirmation_poll_ms),
            confirmation_timeout: self.confirmation_timeout_secs.map(Duration::from_secs),
            max_read_failures: self.max_read_failures,
            confirm_unlock_read: self.confirm_unlock_read,
        }
    }
}
