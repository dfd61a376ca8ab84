use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{PollJob, WalletSyncMessage};
use crate::chains::{TxCursor, WalletApi};
use crate::error::Result;
use crate::models::{
    Balance, CertifiedData, ChainTransaction, TokenId, TransactionStatus,
};

/// Periodic balance + incremental-history poller for one token/account.
///
/// The cursor advances only after a successful fetch, so a failed tick is
/// retried from the same position on the next one.
pub struct WalletPoller<A> {
    name: &'static str,
    token: TokenId,
    account: String,
    api: A,
    cursor: Option<TxCursor>,
    out: mpsc::Sender<WalletSyncMessage>,
}

struct WalletSnapshot {
    balance: CertifiedData<Balance>,
    new_transactions: Option<Vec<ChainTransaction>>,
}

impl<A: WalletApi> WalletPoller<A> {
    pub fn new(
        name: &'static str,
        token: TokenId,
        account: impl Into<String>,
        api: A,
        out: mpsc::Sender<WalletSyncMessage>,
    ) -> Self {
        Self {
            name,
            token,
            account: account.into(),
            api,
            cursor: None,
            out,
        }
    }

    async fn fetch(&mut self) -> Result<WalletSnapshot> {
        let balance = self.api.fetch_balance(&self.account).await?;
        let new_transactions = self
            .api
            .fetch_new_transactions(&self.account, self.cursor.as_ref())
            .await?;

        if let Some(transactions) = &new_transactions {
            // Advance only past settled entries. A pending transaction must
            // stay ahead of the cursor cut so its confirmed version can
            // still come through and supersede it in the store.
            if let Some(newest_settled) = transactions
                .iter()
                .find(|tx| tx.summary().status != TransactionStatus::Pending)
            {
                self.cursor = Some(TxCursor::new(newest_settled.id()));
            }
        }

        Ok(WalletSnapshot {
            balance,
            new_transactions,
        })
    }
}

#[async_trait]
impl<A: WalletApi + 'static> PollJob for WalletPoller<A> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn tick(&mut self) {
        match self.fetch().await {
            Ok(snapshot) => {
                let _ = self
                    .out
                    .send(WalletSyncMessage::Wallet {
                        token: self.token.clone(),
                        balance: snapshot.balance,
                        new_transactions: snapshot.new_transactions,
                    })
                    .await;
            }
            Err(err) => {
                // Non-fatal: log, report, and let the next tick retry.
                tracing::warn!(worker = self.name, token = %self.token, "Wallet fetch failed: {err}");
                let _ = self
                    .out
                    .send(WalletSyncMessage::Error {
                        token: self.token.clone(),
                        message: err.to_string(),
                    })
                    .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::models::{IcpTransaction, TransactionDirection, TransactionStatus};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedApi {
        responses: Mutex<VecDeque<Result<Option<Vec<ChainTransaction>>>>>,
        seen_cursors: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl WalletApi for ScriptedApi {
        async fn fetch_balance(&self, _account: &str) -> Result<CertifiedData<Balance>> {
            Ok(CertifiedData::certified(100))
        }

        async fn fetch_new_transactions(
            &self,
            _account: &str,
            cursor: Option<&TxCursor>,
        ) -> Result<Option<Vec<ChainTransaction>>> {
            self.seen_cursors
                .lock()
                .unwrap()
                .push(cursor.map(|c| c.last_seen.clone()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(Some(Vec::new())))
        }
    }

    fn tx(index: u64) -> ChainTransaction {
        ChainTransaction::Icp(IcpTransaction {
            index,
            direction: TransactionDirection::Incoming,
            status: TransactionStatus::Confirmed,
            value: 1,
            memo: None,
            timestamp: None,
        })
    }

    fn poller(
        responses: Vec<Result<Option<Vec<ChainTransaction>>>>,
    ) -> (WalletPoller<ScriptedApi>, mpsc::Receiver<WalletSyncMessage>) {
        let (out, rx) = mpsc::channel(8);
        let api = ScriptedApi {
            responses: Mutex::new(responses.into()),
            seen_cursors: Mutex::new(Vec::new()),
        };
        (
            WalletPoller::new("test-wallet", TokenId::new("ICP"), "acct-1", api, out),
            rx,
        )
    }

    #[tokio::test]
    async fn cursor_advances_to_newest_id_on_success() {
        let (mut poller, mut rx) = poller(vec![
            Ok(Some(vec![tx(5), tx(4)])),
            Ok(Some(Vec::new())),
        ]);

        poller.tick().await;
        poller.tick().await;

        let cursors = poller.api.seen_cursors.lock().unwrap().clone();
        assert_eq!(cursors, vec![None, Some("5".to_string())]);
        assert!(matches!(
            rx.recv().await,
            Some(WalletSyncMessage::Wallet { .. })
        ));
    }

    fn btc(txid: &str, status: TransactionStatus) -> ChainTransaction {
        ChainTransaction::Btc(crate::models::BtcTransaction {
            txid: txid.to_string(),
            direction: TransactionDirection::Incoming,
            status,
            value: 1,
            fee: None,
            block_height: None,
            timestamp: None,
        })
    }

    #[tokio::test]
    async fn cursor_waits_for_confirmation_before_advancing() {
        // A mempool transaction must not become the cursor: its confirmed
        // version would then be cut off and the store would keep the
        // pending entry forever.
        let (mut poller, mut rx) = poller(vec![
            Ok(Some(vec![btc("A", TransactionStatus::Pending)])),
            Ok(Some(vec![btc("A", TransactionStatus::Confirmed)])),
            Ok(Some(Vec::new())),
        ]);

        poller.tick().await;
        poller.tick().await;
        poller.tick().await;

        let cursors = poller.api.seen_cursors.lock().unwrap().clone();
        assert_eq!(cursors, vec![None, None, Some("A".to_string())]);

        let _ = rx.recv().await;
        match rx.recv().await {
            Some(WalletSyncMessage::Wallet {
                new_transactions: Some(batch),
                ..
            }) => {
                assert_eq!(batch.len(), 1);
                assert_eq!(
                    batch[0].summary().status,
                    TransactionStatus::Confirmed
                );
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_fetch_reports_error_and_keeps_cursor() {
        let (mut poller, mut rx) = poller(vec![
            Ok(Some(vec![tx(5)])),
            Err(SyncError::Rpc("boom".into())),
            Ok(Some(Vec::new())),
        ]);

        poller.tick().await;
        poller.tick().await;
        poller.tick().await;

        let cursors = poller.api.seen_cursors.lock().unwrap().clone();
        // The failed tick does not move the cursor.
        assert_eq!(
            cursors,
            vec![None, Some("5".to_string()), Some("5".to_string())]
        );

        let _ = rx.recv().await;
        assert!(matches!(
            rx.recv().await,
            Some(WalletSyncMessage::Error { .. })
        ));
    }

    #[tokio::test]
    async fn missing_history_capability_is_forwarded_as_none() {
        let (mut poller, mut rx) = poller(vec![Ok(None)]);
        poller.tick().await;

        match rx.recv().await {
            Some(WalletSyncMessage::Wallet {
                new_transactions, ..
            }) => assert!(new_transactions.is_none()),
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
