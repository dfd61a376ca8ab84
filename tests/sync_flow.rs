// End-to-end flows: pollers feed listeners over channels, listeners fold
// messages into the shared context.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use wallet_sync::chains::{PowApi, TxCursor, WalletApi};
use wallet_sync::constants::SYNC_CHANNEL_BUFFER;
use wallet_sync::context::SyncContext;
use wallet_sync::error::Result;
use wallet_sync::models::{
    AllowSigningGrant, Balance, CertifiedData, ChainTransaction, IcpTransaction, PowChallenge,
    TokenId, TransactionDirection, TransactionStatus,
};
use wallet_sync::sync::{run_pow_listener, run_wallet_listener};
use wallet_sync::workers::{meets_difficulty, PowWorker, WalletPoller, WorkerHandle};

fn icp_tx(index: u64) -> ChainTransaction {
    ChainTransaction::Icp(IcpTransaction {
        index,
        direction: TransactionDirection::Incoming,
        status: TransactionStatus::Confirmed,
        value: 1,
        memo: None,
        timestamp: None,
    })
}

/// Ledger whose second snapshot overlaps the first; the listener must
/// dedup by id.
struct OverlappingLedger {
    fetches: AtomicU32,
}

#[async_trait]
impl WalletApi for OverlappingLedger {
    async fn fetch_balance(&self, _account: &str) -> Result<CertifiedData<Balance>> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(CertifiedData::certified(if n == 0 { 100 } else { 120 }))
    }

    async fn fetch_new_transactions(
        &self,
        _account: &str,
        _cursor: Option<&TxCursor>,
    ) -> Result<Option<Vec<ChainTransaction>>> {
        // First snapshot: just tx 1. Later snapshots: tx 2 plus tx 1 again.
        if self.fetches.load(Ordering::SeqCst) <= 1 {
            Ok(Some(vec![icp_tx(1)]))
        } else {
            Ok(Some(vec![icp_tx(2), icp_tx(1)]))
        }
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached within timeout");
}

#[tokio::test]
async fn poller_listener_roundtrip_merges_overlapping_batches() {
    let ctx = Arc::new(SyncContext::new());
    let token = TokenId::new("ICP");

    let (tx, rx) = mpsc::channel(SYNC_CHANNEL_BUFFER);
    tokio::spawn(run_wallet_listener(ctx.clone(), rx));

    let poller = WalletPoller::new(
        "icp-wallet",
        token.clone(),
        "account-1",
        OverlappingLedger {
            fetches: AtomicU32::new(0),
        },
        tx,
    );
    // Long period: the immediate first tick plus explicit triggers drive
    // the test deterministically.
    let handle = WorkerHandle::start(poller, Duration::from_secs(3600));

    {
        let ctx = ctx.clone();
        let token = token.clone();
        wait_until(move || ctx.transactions.history(&token).transactions().len() == 1).await;
    }
    assert_eq!(ctx.balances.get(&token).loaded().unwrap().data, 100);

    handle.trigger().await;
    {
        let ctx = ctx.clone();
        let token = token.clone();
        wait_until(move || ctx.transactions.history(&token).transactions().len() == 2).await;
    }

    let history = ctx.transactions.history(&token);
    let ids: Vec<String> = history.transactions().iter().map(|t| t.id()).collect();
    assert_eq!(ids, vec!["2", "1"]);
    assert_eq!(ctx.balances.get(&token).loaded().unwrap().data, 120);

    handle.stop().await;
}

#[tokio::test]
async fn stopped_worker_messages_are_dropped_safely() {
    let token = TokenId::new("ICP");
    let (tx, rx) = mpsc::channel(SYNC_CHANNEL_BUFFER);
    // Listener torn down before the worker.
    drop(rx);

    let poller = WalletPoller::new(
        "icp-wallet",
        token,
        "account-1",
        OverlappingLedger {
            fetches: AtomicU32::new(0),
        },
        tx,
    );
    let handle = WorkerHandle::start(poller, Duration::from_millis(10));
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Ticks against a closed channel must not panic or wedge the loop.
    handle.trigger().await;
    handle.stop().await;
}

struct InstantGateway;

#[async_trait]
impl PowApi for InstantGateway {
    async fn create_challenge(&self) -> Result<PowChallenge> {
        Ok(PowChallenge {
            seed: "integration-seed".to_string(),
            difficulty: 4,
            expires_at: None,
        })
    }

    async fn allow_signing(&self, seed: &str, nonce: u64) -> Result<AllowSigningGrant> {
        assert!(meets_difficulty(seed, nonce, 4));
        Ok(AllowSigningGrant {
            allowed_cycles: 30_000_000_000,
            next_allowance_ms: 60_000,
            next_difficulty: 5,
        })
    }
}

#[tokio::test]
async fn pow_gate_opens_after_full_cycle() {
    let ctx = Arc::new(SyncContext::with_identity("principal-1"));
    assert!(ctx.ensure_signing_allowed().is_err());

    let (tx, rx) = mpsc::channel(SYNC_CHANNEL_BUFFER);
    tokio::spawn(run_pow_listener(ctx.clone(), rx));

    let worker = PowWorker::new(InstantGateway, Duration::from_secs(60), tx);
    let handle = WorkerHandle::start(worker, Duration::from_secs(3600));

    {
        let ctx = ctx.clone();
        wait_until(move || ctx.ensure_signing_allowed().is_ok()).await;
    }

    handle.stop().await;

    // Sign-out closes the gate again.
    ctx.sign_out();
    assert!(ctx.ensure_signing_allowed().is_err());
}
