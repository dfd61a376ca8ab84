use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::{PendingSyncMessage, PollJob};
use crate::chains::{MinterApi, PendingSourceApi};
use crate::error::Result;
use crate::models::TokenId;

/// Which twin-token family this poller watches: BTC deposits pending a
/// ckBTC mint, or ETH helper-contract deposits pending a ckETH mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwinKind {
    CkBtc,
    CkEth,
}

/// Periodic refresh of minter info plus the raw pending events for one
/// twin token. The merger combines both with confirmed history; this
/// poller only observes and reports.
pub struct PendingPoller {
    token: TokenId,
    address: String,
    kind: TwinKind,
    minter: Arc<dyn MinterApi>,
    source: Arc<dyn PendingSourceApi>,
    out: mpsc::Sender<PendingSyncMessage>,
}

impl PendingPoller {
    pub fn new(
        token: TokenId,
        address: impl Into<String>,
        kind: TwinKind,
        minter: Arc<dyn MinterApi>,
        source: Arc<dyn PendingSourceApi>,
        out: mpsc::Sender<PendingSyncMessage>,
    ) -> Self {
        Self {
            token,
            address: address.into(),
            kind,
            minter,
            source,
            out,
        }
    }

    async fn fetch(&self) -> Result<PendingSyncMessage> {
        let minter = self.minter.minter_info().await?;
        if let Some(height) = minter.data.scraped_block_height {
            tracing::debug!(token = %self.token, scraped_height = height, "Minter checkpoint");
        }

        let message = match self.kind {
            TwinKind::CkBtc => PendingSyncMessage::Utxos {
                token: self.token.clone(),
                utxos: self.source.pending_utxos(&self.address).await?,
                minter,
            },
            TwinKind::CkEth => PendingSyncMessage::Deposits {
                token: self.token.clone(),
                deposits: self.source.pending_deposits(&self.address).await?,
                minter,
            },
        };
        Ok(message)
    }
}

#[async_trait]
impl PollJob for PendingPoller {
    fn name(&self) -> &'static str {
        match self.kind {
            TwinKind::CkBtc => "ckbtc-pending",
            TwinKind::CkEth => "cketh-pending",
        }
    }

    async fn tick(&mut self) {
        match self.fetch().await {
            Ok(message) => {
                let _ = self.out.send(message).await;
            }
            Err(err) => {
                tracing::warn!(worker = self.name(), token = %self.token, "Pending fetch failed: {err}");
                let _ = self
                    .out
                    .send(PendingSyncMessage::Error {
                        token: self.token.clone(),
                        message: err.to_string(),
                    })
                    .await;
            }
        }
    }
}
