use std::sync::Arc;

use tokio::sync::mpsc;

use crate::context::SyncContext;
use crate::models::{Balance, CertifiedData, ChainTransaction, TokenId};
use crate::workers::{PendingSyncMessage, PowProtectionMessage, WalletSyncMessage};

/// Overwrite the balance slot with the newly received value. The store's
/// certified-precedence rule is the only thing that can reject the write.
pub fn sync_balance(ctx: &SyncContext, token: &TokenId, balance: CertifiedData<Balance>) {
    ctx.balances.set(token, balance);
}

/// Merge a newest-first batch into the token's history, or nullify the
/// slot when the ledger reported no history capability.
pub fn sync_transactions(
    ctx: &SyncContext,
    token: &TokenId,
    new_transactions: Option<Vec<ChainTransaction>>,
) {
    match new_transactions {
        Some(transactions) => ctx.transactions.prepend_new(token, transactions),
        None => ctx.transactions.nullify(token),
    }
}

/// Apply one wallet-poller message. Pure state transition, no I/O; safe
/// under any interleaving of worker messages.
pub fn apply_wallet_message(ctx: &SyncContext, message: WalletSyncMessage) {
    match message {
        WalletSyncMessage::Wallet {
            token,
            balance,
            new_transactions,
        } => {
            sync_balance(ctx, &token, balance);
            sync_transactions(ctx, &token, new_transactions);
        }
        WalletSyncMessage::Error { token, message } => {
            // Last-known-good state stays; the next tick retries.
            tracing::error!(%token, "Wallet sync error: {message}");
        }
    }
}

/// Apply one pending-poller message: refresh minter info and replace the
/// raw pending observation.
pub fn apply_pending_message(ctx: &SyncContext, message: PendingSyncMessage) {
    match message {
        PendingSyncMessage::Utxos {
            token,
            minter,
            utxos,
        } => {
            ctx.minter_info.set(&token, minter);
            ctx.pending_utxos.set(&token, utxos);
        }
        PendingSyncMessage::Deposits {
            token,
            minter,
            deposits,
        } => {
            ctx.minter_info.set(&token, minter);
            ctx.pending_deposits.set(&token, deposits);
        }
        PendingSyncMessage::Error { token, message } => {
            tracing::error!(%token, "Pending sync error: {message}");
        }
    }
}

/// Mirror the PoW worker's reported state into the gate store.
pub fn apply_pow_message(ctx: &SyncContext, message: PowProtectionMessage) {
    match message {
        PowProtectionMessage::Sync(state) => ctx.pow.set(state),
        PowProtectionMessage::Error(message) => {
            // The worker already reset itself to idle and scheduled a
            // retry; surfacing is all that is left to do here.
            tracing::error!("PoW protection error: {message}");
        }
    }
}

/// Drain wallet-poller messages into the context until every sender is
/// dropped. Dropping the receiver instead makes late worker messages
/// silently discarded, which is the intended teardown behavior.
pub async fn run_wallet_listener(
    ctx: Arc<SyncContext>,
    mut rx: mpsc::Receiver<WalletSyncMessage>,
) {
    while let Some(message) = rx.recv().await {
        apply_wallet_message(&ctx, message);
    }
}

pub async fn run_pending_listener(
    ctx: Arc<SyncContext>,
    mut rx: mpsc::Receiver<PendingSyncMessage>,
) {
    while let Some(message) = rx.recv().await {
        apply_pending_message(&ctx, message);
    }
}

pub async fn run_pow_listener(
    ctx: Arc<SyncContext>,
    mut rx: mpsc::Receiver<PowProtectionMessage>,
) {
    while let Some(message) = rx.recv().await {
        apply_pow_message(&ctx, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        IcpTransaction, TransactionDirection, TransactionStatus,
    };
    use crate::stores::HistorySlot;

    fn token() -> TokenId {
        TokenId::new("X")
    }

    fn tx(id: u64) -> ChainTransaction {
        ChainTransaction::Icp(IcpTransaction {
            index: id,
            direction: TransactionDirection::Incoming,
            status: TransactionStatus::Confirmed,
            value: 1,
            memo: None,
            timestamp: None,
        })
    }

    #[test]
    fn wallet_message_updates_balance_and_history() {
        let ctx = SyncContext::new();
        apply_wallet_message(
            &ctx,
            WalletSyncMessage::Wallet {
                token: token(),
                balance: CertifiedData::certified(100),
                new_transactions: Some(vec![tx(1)]),
            },
        );

        let balance = ctx.balances.get(&token());
        assert_eq!(balance.loaded().unwrap().data, 100);
        assert!(balance.loaded().unwrap().certified);
        assert_eq!(ctx.transactions.history(&token()).transactions().len(), 1);
    }

    #[test]
    fn overlapping_batches_never_duplicate_ids() {
        let ctx = SyncContext::new();
        apply_wallet_message(
            &ctx,
            WalletSyncMessage::Wallet {
                token: token(),
                balance: CertifiedData::certified(100),
                new_transactions: Some(vec![tx(1)]),
            },
        );
        apply_wallet_message(
            &ctx,
            WalletSyncMessage::Wallet {
                token: token(),
                balance: CertifiedData::certified(120),
                new_transactions: Some(vec![tx(1), tx(2)]),
            },
        );

        let history = ctx.transactions.history(&token());
        let ids: Vec<String> = history.transactions().iter().map(|t| t.id()).collect();
        // Order preserved as newest-first per the new batch, no duplicate of "1".
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn missing_history_nullifies_instead_of_appending() {
        let ctx = SyncContext::new();
        apply_wallet_message(
            &ctx,
            WalletSyncMessage::Wallet {
                token: token(),
                balance: CertifiedData::certified(100),
                new_transactions: None,
            },
        );
        assert_eq!(ctx.transactions.history(&token()), HistorySlot::Unavailable);
    }

    #[test]
    fn error_message_preserves_last_known_good_state() {
        let ctx = SyncContext::new();
        apply_wallet_message(
            &ctx,
            WalletSyncMessage::Wallet {
                token: token(),
                balance: CertifiedData::certified(100),
                new_transactions: Some(vec![tx(1)]),
            },
        );
        apply_wallet_message(
            &ctx,
            WalletSyncMessage::Error {
                token: token(),
                message: "gateway 502".to_string(),
            },
        );

        assert_eq!(ctx.balances.get(&token()).loaded().unwrap().data, 100);
        assert_eq!(ctx.transactions.history(&token()).transactions().len(), 1);
    }

    #[test]
    fn merge_is_commutative_across_worker_interleavings() {
        let batch_a = vec![tx(3), tx(2)];
        let batch_b = vec![tx(2), tx(1)];

        let ab = SyncContext::new();
        sync_transactions(&ab, &token(), Some(batch_a.clone()));
        sync_transactions(&ab, &token(), Some(batch_b.clone()));

        let ba = SyncContext::new();
        sync_transactions(&ba, &token(), Some(batch_b));
        sync_transactions(&ba, &token(), Some(batch_a));

        let ids = |ctx: &SyncContext| {
            let mut ids: Vec<String> = ctx
                .transactions
                .history(&token())
                .transactions()
                .iter()
                .map(|t| t.id())
                .collect();
            ids.sort();
            ids
        };
        assert_eq!(ids(&ab), ids(&ba));
    }
}
