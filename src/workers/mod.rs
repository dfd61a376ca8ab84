// Background pollers. One repeating timer per worker; ticks within one
// worker are serialized, timers across workers are independent.
pub mod pending;
pub mod pow;
pub mod wallet;

pub use pending::{PendingPoller, TwinKind};
pub use pow::{meets_difficulty, solve_challenge, PowWorker};
pub use wallet::WalletPoller;

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::constants::WORKER_COMMAND_BUFFER;
use crate::models::{
    Balance, CertifiedData, ChainTransaction, MinterInfo, PendingEthDeposit, PendingUtxo,
    PowProtectionState, TokenId,
};

/// Message a wallet poller posts back after each tick.
#[derive(Debug, Clone)]
pub enum WalletSyncMessage {
    Wallet {
        token: TokenId,
        balance: CertifiedData<Balance>,
        /// `None` means the ledger exposes no history capability; the
        /// listener nullifies the slot instead of appending.
        new_transactions: Option<Vec<ChainTransaction>>,
    },
    Error {
        token: TokenId,
        message: String,
    },
}

/// Message a pending-events poller posts back after each tick.
#[derive(Debug, Clone)]
pub enum PendingSyncMessage {
    Utxos {
        token: TokenId,
        minter: CertifiedData<MinterInfo>,
        utxos: Vec<PendingUtxo>,
    },
    Deposits {
        token: TokenId,
        minter: CertifiedData<MinterInfo>,
        deposits: Vec<PendingEthDeposit>,
    },
    Error {
        token: TokenId,
        message: String,
    },
}

/// Message the proof-of-work worker posts after every state transition.
#[derive(Debug, Clone)]
pub enum PowProtectionMessage {
    Sync(PowProtectionState),
    Error(String),
}

#[derive(Debug)]
enum WorkerCommand {
    Trigger,
    Stop,
}

/// Work performed on every tick of a poller. Implementations catch their
/// own fetch errors and report them as messages; a failed tick never stops
/// the timer.
#[async_trait]
pub trait PollJob: Send + 'static {
    fn name(&self) -> &'static str;
    async fn tick(&mut self);
}

/// Process-lifetime handle to one background poller: start, stop, and an
/// out-of-band trigger for post-action refreshes. Not serializable; owned
/// by the session that created it.
pub struct WorkerHandle {
    commands: mpsc::Sender<WorkerCommand>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Spawn `job` on a repeating timer. The loop serializes ticks: a tick
    /// does not start until the previous one settled.
    pub fn start<J: PollJob>(mut job: J, period: Duration) -> Self {
        let (commands, mut rx) = mpsc::channel(WORKER_COMMAND_BUFFER);
        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(worker = job.name(), interval_secs = period.as_secs(), "Poller started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => job.tick().await,
                    command = rx.recv() => match command {
                        Some(WorkerCommand::Trigger) => job.tick().await,
                        Some(WorkerCommand::Stop) | None => break,
                    },
                }
            }
            tracing::info!(worker = job.name(), "Poller stopped");
        });
        Self { commands, task }
    }

    /// Force an immediate out-of-band tick (after a send/convert/stake)
    /// without disturbing the regular schedule.
    pub async fn trigger(&self) {
        let _ = self.commands.send(WorkerCommand::Trigger).await;
    }

    /// Cancel the timer and wait for the loop to wind down. An in-flight
    /// fetch dispatched before the stop completes first; its late message
    /// is dropped by the (possibly closed) listener channel.
    pub async fn stop(self) {
        let _ = self.commands.send(WorkerCommand::Stop).await;
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct CountingJob {
        ticks: Arc<AtomicU32>,
    }

    #[async_trait]
    impl PollJob for CountingJob {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn tick(&mut self) {
            self.ticks.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn trigger_runs_an_extra_tick() {
        let ticks = Arc::new(AtomicU32::new(0));
        let handle = WorkerHandle::start(
            CountingJob {
                ticks: ticks.clone(),
            },
            Duration::from_secs(3600),
        );

        // The first interval tick fires immediately; wait for it.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let after_start = ticks.load(Ordering::SeqCst);
        assert!(after_start >= 1);

        handle.trigger().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), after_start + 1);

        handle.stop().await;
    }

    #[tokio::test]
    async fn stop_halts_the_loop() {
        let ticks = Arc::new(AtomicU32::new(0));
        let handle = WorkerHandle::start(
            CountingJob {
                ticks: ticks.clone(),
            },
            Duration::from_millis(10),
        );
        tokio::time::sleep(Duration::from_millis(35)).await;
        handle.stop().await;

        let frozen = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), frozen);
    }
}
