use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::icp::{fetch_gateway_balance, fetch_gateway_transactions};
use super::{parse_dec_quantity, TxCursor, WalletApi};
use crate::error::Result;
use crate::models::{
    Balance, CertifiedData, ChainTransaction, IcrcTransaction, TransactionStatus,
};

/// ICRC ledger client. Balance always comes from the ledger gateway; the
/// index gateway is optional; many ICRC tokens deploy no index canister,
/// in which case history is reported as unavailable (`Ok(None)`), never as
/// an error.
pub struct IcrcClient {
    http: Client,
    ledger: Url,
    index: Option<Url>,
}

impl IcrcClient {
    pub fn new(ledger: Url, index: Option<Url>) -> Self {
        Self {
            http: Client::new(),
            ledger,
            index,
        }
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }
}

#[async_trait]
impl WalletApi for IcrcClient {
    async fn fetch_balance(&self, account: &str) -> Result<CertifiedData<Balance>> {
        let balance = fetch_gateway_balance(&self.http, &self.ledger, account).await?;
        Ok(CertifiedData::certified(balance))
    }

    async fn fetch_new_transactions(
        &self,
        account: &str,
        cursor: Option<&TxCursor>,
    ) -> Result<Option<Vec<ChainTransaction>>> {
        let Some(index) = self.index.as_ref() else {
            return Ok(None);
        };

        let records = fetch_gateway_transactions(&self.http, index, account, cursor).await?;
        let mut transactions = Vec::with_capacity(records.len());
        for record in &records {
            transactions.push(ChainTransaction::Icrc(IcrcTransaction {
                index: record.index,
                kind: record.kind.clone(),
                direction: record.direction_for(account),
                status: TransactionStatus::Confirmed,
                value: parse_dec_quantity(&record.amount)?,
                timestamp: record.utc_timestamp(),
            }));
        }
        Ok(Some(transactions))
    }
}
