use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{parse_dec_quantity, parse_hex_quantity, rpc_call, TxCursor, WalletApi};
use crate::error::{Result, SyncError};
use crate::models::{
    Balance, CertifiedData, ChainTransaction, EthTransaction, TransactionDirection,
    TransactionStatus,
};

/// Ethereum/EVM client: balance over JSON-RPC, history over an
/// Etherscan-style account indexer. Without an indexer URL the history
/// capability is absent and the listener nullifies the slot.
pub struct EthClient {
    http: Client,
    rpc: Url,
    index: Option<Url>,
}

#[derive(Debug, Deserialize)]
struct IndexListResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: Option<Vec<IndexTx>>,
}

#[derive(Debug, Deserialize)]
struct IndexTx {
    hash: String,
    from: String,
    to: Option<String>,
    value: String,
    #[serde(rename = "blockNumber")]
    block_number: Option<String>,
    #[serde(rename = "timeStamp")]
    time_stamp: Option<String>,
    #[serde(rename = "isError", default)]
    is_error: String,
}

impl EthClient {
    pub fn new(rpc: Url, index: Option<Url>) -> Self {
        Self {
            http: Client::new(),
            rpc,
            index,
        }
    }

    async fn fetch_tx_list(&self, index: &Url, account: &str) -> Result<Vec<IndexTx>> {
        let mut url = index.clone();
        url.query_pairs_mut()
            .append_pair("module", "account")
            .append_pair("action", "txlist")
            .append_pair("address", account)
            .append_pair("sort", "desc");

        let response: IndexListResponse = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // The indexer reports "no transactions found" as status 0 with an
        // empty result; only a missing result with another message is a
        // real failure.
        match response.result {
            Some(txs) => Ok(txs),
            None if response.status == "0" => Ok(Vec::new()),
            None => Err(SyncError::Rpc(format!(
                "Account indexer error: {}",
                response.message
            ))),
        }
    }
}

fn map_transaction(tx: &IndexTx, account: &str) -> Result<EthTransaction> {
    let value = parse_dec_quantity(&tx.value)?;
    let direction = if tx.from.eq_ignore_ascii_case(account) {
        TransactionDirection::Outgoing
    } else {
        TransactionDirection::Incoming
    };
    let status = if tx.is_error == "1" {
        TransactionStatus::Failed
    } else {
        TransactionStatus::Confirmed
    };

    Ok(EthTransaction {
        hash: tx.hash.clone(),
        direction,
        status,
        value,
        from_address: tx.from.clone(),
        to_address: tx.to.clone(),
        block_number: tx
            .block_number
            .as_deref()
            .and_then(|b| b.parse::<u64>().ok()),
        timestamp: tx
            .time_stamp
            .as_deref()
            .and_then(|t| t.parse::<i64>().ok())
            .and_then(|t| DateTime::from_timestamp(t, 0)),
    })
}

#[async_trait]
impl WalletApi for EthClient {
    async fn fetch_balance(&self, account: &str) -> Result<CertifiedData<Balance>> {
        let raw: String = rpc_call(
            &self.http,
            &self.rpc,
            "eth_getBalance",
            serde_json::json!([account, "latest"]),
        )
        .await?;
        Ok(CertifiedData::uncertified(parse_hex_quantity(&raw)?))
    }

    async fn fetch_new_transactions(
        &self,
        account: &str,
        cursor: Option<&TxCursor>,
    ) -> Result<Option<Vec<ChainTransaction>>> {
        let Some(index) = self.index.as_ref() else {
            return Ok(None);
        };

        let txs = self.fetch_tx_list(index, account).await?;
        let mut new_transactions = Vec::new();
        for tx in &txs {
            if cursor.is_some_and(|c| tx.hash == c.last_seen) {
                break;
            }
            new_transactions.push(ChainTransaction::Eth(map_transaction(tx, account)?));
        }

        Ok(Some(new_transactions))
    }
}
