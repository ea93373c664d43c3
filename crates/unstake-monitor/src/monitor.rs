//! Unstake monitor state machine.
//!
//! ```text
//! WAITING ──expired──▶ EXPIRED_DETECTED ──▶ SUBMITTING ──sent──▶ CONFIRMING ──included──▶ DONE
//!    │                                          │                    │
//!    └─────────(read cap / cancel)──────────────┴───(error/cancel)───┴──────────────────▶ FAILED
//! ```
//!
//! Only `WAITING` loops. Every other state is entered once and left forward.

use std::future::Future;
use std::time::Duration;

use alloy::primitives::{Address, B256};
use alloy::signers::local::PrivateKeySigner;
use serde::Serialize;
use tokio::sync::watch;

use unstake_chain_client::{BlockSnapshot, ChainClient, ChainClientError, LockOracle, TxReceipt};
use unstake_protocol::{
    AddressBook, DelegationPayload, LockStatus, DEFAULT_POLL_INTERVAL_MS, UNSTAKE_GAS_LIMIT,
};

use crate::report::{unix_now, FailureReport};
use crate::submit::{broadcast, prepare, UnstakeTransaction};

// ============================================================================
// States and outcomes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorState {
    Waiting,
    ExpiredDetected,
    Submitting,
    Confirming,
    Done,
    Failed,
}

impl MonitorState {
    fn rank(self) -> u8 {
        match self {
            Self::Waiting => 0,
            Self::ExpiredDetected => 1,
            Self::Submitting => 2,
            Self::Confirming => 3,
            Self::Done => 4,
            Self::Failed => 5,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::ExpiredDetected => "EXPIRED_DETECTED",
            Self::Submitting => "SUBMITTING",
            Self::Confirming => "CONFIRMING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for MonitorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    pub gas_limit: u64,
    pub confirmation_poll_interval: Duration,
    /// `None` waits for the receipt indefinitely.
    pub confirmation_timeout: Option<Duration>,
    /// Consecutive failed `WAITING` reads tolerated before giving up.
    pub max_read_failures: Option<u32>,
    /// Re-read the unlock time before acting on an expiry.
    pub confirm_unlock_read: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            gas_limit: UNSTAKE_GAS_LIMIT,
            confirmation_poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            confirmation_timeout: None,
            max_read_failures: None,
            confirm_unlock_read: false,
        }
    }
}

/// Result of one `WAITING` iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    Waiting { block: BlockSnapshot, status: LockStatus },
    Expired { block: BlockSnapshot, status: LockStatus },
}

#[derive(Debug)]
pub enum MonitorOutcome {
    Done(TxReceipt),
    Failed(FailureReport),
    /// Operator asked to stop; the monitor ended in `FAILED`.
    Cancelled(FailureReport),
}

impl MonitorOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Done(_) => 0,
            Self::Failed(_) => 1,
            Self::Cancelled(_) => 130,
        }
    }
}

// ============================================================================
// Monitor
// ============================================================================

/// Watches one account and unstakes it once, the block its lock expires.
pub struct UnstakeMonitor<C> {
    client: C,
    oracle: LockOracle,
    book: AddressBook,
    signer: PrivateKeySigner,
    config: MonitorConfig,

    state: MonitorState,
    history: Vec<MonitorState>,
    polls: u64,
    read_failures: u32,
    last_block: Option<BlockSnapshot>,
    last_unlock: Option<LockStatus>,
    tx_hash: Option<B256>,
}

impl<C: ChainClient> UnstakeMonitor<C> {
    pub fn new(
        client: C,
        book: AddressBook,
        signer: PrivateKeySigner,
        config: MonitorConfig,
    ) -> Self {
        Self {
            client,
            oracle: LockOracle::new(book.staking),
            book,
            signer,
            config,
            state: MonitorState::Waiting,
            history: vec![MonitorState::Waiting],
            polls: 0,
            read_failures: 0,
            last_block: None,
            last_unlock: None,
            tx_hash: None,
        }
    }

    /// The monitored EOA; also the transaction's recipient.
    pub fn account(&self) -> Address {
        self.signer.address()
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Every state entered so far, starting with `WAITING`.
    pub fn history(&self) -> &[MonitorState] {
        &self.history
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }

    pub fn tx_hash(&self) -> Option<B256> {
        self.tx_hash
    }

    /// One `WAITING` iteration: unlock time, then head block, then the rule.
    ///
    /// The two reads are not atomic. Unlock time only moves forward, so a
    /// stale read can only delay detection by one cycle.
    pub async fn poll_once(&mut self) -> Result<Poll, ChainClientError> {
        let account = self.account();
        self.polls += 1;

        let status = self.oracle.lock_status(&self.client, account).await?;
        self.last_unlock = Some(status);

        let block = self.client.latest_block().await?;
        self.last_block = Some(block);

        let mut expired = status.is_expired_at(block.timestamp);

        if expired && self.config.confirm_unlock_read {
            let again = self.oracle.lock_status(&self.client, account).await?;
            if again != status {
                tracing::warn!(
                    block = block.number,
                    first = %status.unlock_time(),
                    second = %again.unlock_time(),
                    "Unlock time changed between reads; staying in WAITING",
                );
                self.last_unlock = Some(again);
                expired = false;
            }
        }

        tracing::info!(
            block = block.number,
            block_ts = block.timestamp,
            unlock = %status.unlock_time(),
            expired,
            "poll #{}",
            self.polls,
        );

        Ok(if expired {
            Poll::Expired { block, status }
        } else {
            Poll::Waiting { block, status }
        })
    }

    /// Drive the monitor to a terminal state.
    ///
    /// `cancel` flipping to `true` stops the poll loop and the preparation
    /// reads. A broadcast in flight is always allowed to finish; once a
    /// transaction is out, cancellation only abandons the receipt wait.
    pub async fn run(&mut self, mut cancel: watch::Receiver<bool>) -> MonitorOutcome {
        tracing::info!(
            account = %self.account(),
            staking = %self.book.staking,
            wallet_logic = %self.book.wallet_logic,
            interval_ms = self.config.poll_interval.as_millis() as u64,
            "Monitoring stake lock",
        );

        let block = match self.wait_for_expiry(&mut cancel).await {
            Ok(Some(block)) => block,
            Ok(None) => return self.cancel("cancelled while waiting for the lock to expire"),
            Err(e) => return self.fail(e),
        };

        self.transition(MonitorState::ExpiredDetected);
        tracing::info!(block = block.number, "Building delegated unstake");

        let encoded = DelegationPayload::execute_unstake(self.book.wallet_logic, self.book.staking);
        let payload = match encoded {
            Ok(p) => p,
            Err(e) => return self.fail(anyhow::Error::new(e).context("encoding executeUnstake")),
        };
        let tx = UnstakeTransaction::new(self.account(), &payload, self.config.gas_limit);

        self.transition(MonitorState::Submitting);

        let prepared = until_cancelled(&mut cancel, prepare(&self.client, &self.signer, &tx)).await;
        let signed = match prepared {
            None => return self.cancel("cancelled before the unstake transaction was sent"),
            Some(Err(e)) => return self.fail(e),
            Some(Ok(signed)) => signed,
        };
        self.tx_hash = Some(signed.hash);

        tracing::info!(tx = %signed.hash, nonce = signed.nonce, "Sending unstake transaction");

        let sent = broadcast(&self.client, &signed).await;
        let tx_hash = match sent {
            Ok(hash) => hash,
            Err(e) => {
                return self.fail(anyhow::Error::new(e).context("sending unstake transaction"))
            }
        };
        self.tx_hash = Some(tx_hash);

        self.transition(MonitorState::Confirming);

        let confirmed = until_cancelled(
            &mut cancel,
            self.client.wait_for_confirmation(
                tx_hash,
                self.config.confirmation_poll_interval,
                self.config.confirmation_timeout,
            ),
        )
        .await;

        match confirmed {
            None => self.cancel(
                "cancelled while waiting for confirmation; the transaction may still land",
            ),
            Some(Err(e)) => {
                self.fail(anyhow::Error::new(e).context("confirming unstake transaction"))
            }
            Some(Ok(receipt)) => {
                self.transition(MonitorState::Done);
                tracing::info!(
                    tx = %receipt.transaction_hash,
                    block = receipt.block_number,
                    gas_used = receipt.gas_used,
                    "Unstake confirmed",
                );
                MonitorOutcome::Done(receipt)
            }
        }
    }

    /// Poll until expiry. `Ok(None)` on cancellation.
    async fn wait_for_expiry(
        &mut self,
        cancel: &mut watch::Receiver<bool>,
    ) -> anyhow::Result<Option<BlockSnapshot>> {
        loop {
            let polled = until_cancelled(cancel, self.poll_once()).await;
            match polled {
                None => return Ok(None),
                Some(Ok(Poll::Expired { block, status })) => {
                    tracing::info!(
                        block = block.number,
                        block_ts = block.timestamp,
                        unlock = %status.unlock_time(),
                        "Lock expired",
                    );
                    return Ok(Some(block));
                }
                Some(Ok(Poll::Waiting { .. })) => self.read_failures = 0,
                Some(Err(e)) => {
                    self.read_failures += 1;
                    if let Some(max) = self.config.max_read_failures {
                        if self.read_failures >= max {
                            let failures = self.read_failures;
                            return Err(anyhow::Error::new(e).context(format!(
                                "{failures} consecutive reads failed while waiting"
                            )));
                        }
                    }
                    tracing::warn!(
                        failures = self.read_failures,
                        transient = e.is_transient(),
                        "Read failed, retrying after poll interval: {e}",
                    );
                }
            }

            let sleep = tokio::time::sleep(self.config.poll_interval);
            let slept = until_cancelled(cancel, sleep).await;
            if slept.is_none() {
                return Ok(None);
            }
        }
    }

    fn transition(&mut self, next: MonitorState) {
        debug_assert!(
            !self.state.is_terminal() && next.rank() > self.state.rank(),
            "illegal transition {} -> {}",
            self.state,
            next,
        );
        tracing::info!(from = %self.state, to = %next, "state transition");
        self.state = next;
        self.history.push(next);
    }

    fn report(&self, at: MonitorState, cancelled: bool, error: String) -> FailureReport {
        FailureReport {
            account: self.account(),
            staking: self.book.staking,
            wallet_logic: self.book.wallet_logic,
            state: at,
            cancelled,
            last_block: self.last_block,
            last_unlock: self.last_unlock,
            tx_hash: self.tx_hash,
            polls: self.polls,
            error,
            generated_at_unix: unix_now(),
        }
    }

    fn fail(&mut self, error: anyhow::Error) -> MonitorOutcome {
        let at = self.state;
        tracing::error!(state = %at, tx = ?self.tx_hash, "Unstake failed: {error:#}");
        let report = self.report(at, false, format!("{error:#}"));
        self.transition(MonitorState::Failed);
        MonitorOutcome::Failed(report)
    }

    fn cancel(&mut self, reason: &str) -> MonitorOutcome {
        let at = self.state;
        tracing::warn!(state = %at, tx = ?self.tx_hash, "{reason}");
        let report = self.report(at, true, reason.to_owned());
        self.transition(MonitorState::Failed);
        MonitorOutcome::Cancelled(report)
    }
}

/// `None` if `cancel` is raised before `fut` completes.
async fn until_cancelled<F: Future>(
    cancel: &mut watch::Receiver<bool>,
    fut: F,
) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancelled(cancel) => None,
        out = fut => Some(out),
    }
}

/// Resolves once the flag is `true`. A dropped sender never cancels.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let closed = cancel.wait_for(|stop| *stop).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}
