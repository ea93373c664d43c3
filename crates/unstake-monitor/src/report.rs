//! Failure report written when the monitor does not reach `DONE`.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use alloy::primitives::{Address, B256};
use serde::Serialize;

use unstake_chain_client::BlockSnapshot;
use unstake_protocol::LockStatus;

use crate::monitor::MonitorState;

/// Everything an operator needs to pick up after a failed or cancelled run.
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub account: Address,
    pub staking: Address,
    pub wallet_logic: Address,
    /// State the monitor was in when it gave up.
    pub state: MonitorState,
    pub cancelled: bool,
    pub last_block: Option<BlockSnapshot>,
    pub last_unlock: Option<LockStatus>,
    /// Set once the transaction was signed, whether or not it was accepted.
    pub tx_hash: Option<B256>,
    pub polls: u64,
    pub error: String,
    pub generated_at_unix: u64,
}

impl FailureReport {
    pub fn file_name(&self) -> String {
        format!(
            "unstake-failure-{}-{}.json",
            hex::encode(self.account),
            self.generated_at_unix
        )
    }
}

/// Print the report to stdout and, with `dir`, write it there as well.
/// Returns the written path.
pub fn emit(report: &FailureReport, dir: Option<&Path>) -> Option<PathBuf> {
    let json = match serde_json::to_string_pretty(report) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!("Failed to serialize failure report: {e}");
            return None;
        }
    };
    println!("{json}");

    let path = dir?.join(report.file_name());
    match std::fs::write(&path, &json) {
        Ok(()) => {
            tracing::info!("Failure report written to {}", path.display());
            Some(path)
        }
        Err(e) => {
            tracing::warn!("Failed to write failure report {}: {e}", path.display());
            None
        }
    }
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
