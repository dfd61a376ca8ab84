use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{TxCursor, WalletApi};
use crate::error::Result;
use crate::models::{
    Balance, BtcTransaction, CertifiedData, ChainTransaction, TransactionDirection,
    TransactionStatus,
};

/// Esplora/Blockstream REST client for Bitcoin accounts.
///
/// Best-effort source: everything it reports is uncertified.
pub struct EsploraClient {
    http: Client,
    base: Url,
}

#[derive(Debug, Deserialize)]
struct AddressInfo {
    chain_stats: TxoStats,
    mempool_stats: TxoStats,
}

#[derive(Debug, Deserialize)]
struct TxoStats {
    funded_txo_sum: u64,
    spent_txo_sum: u64,
}

#[derive(Debug, Deserialize)]
struct EsploraTx {
    txid: String,
    status: EsploraTxStatus,
    #[serde(default)]
    vin: Vec<EsploraVin>,
    #[serde(default)]
    vout: Vec<EsploraVout>,
    fee: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct EsploraTxStatus {
    confirmed: bool,
    block_height: Option<u64>,
    block_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct EsploraVin {
    prevout: Option<EsploraVout>,
}

#[derive(Debug, Deserialize)]
struct EsploraVout {
    value: u64,
    scriptpubkey_address: Option<String>,
}

impl EsploraClient {
    pub fn new(base: Url) -> Self {
        Self {
            http: Client::new(),
            base,
        }
    }

    fn address_url(&self, address: &str, suffix: &str) -> Result<Url> {
        let path = format!("address/{address}{suffix}");
        Ok(self.base.join(&path)?)
    }

    async fn fetch_address_txs(&self, address: &str) -> Result<Vec<EsploraTx>> {
        let url = self.address_url(address, "/txs")?;
        let txs = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(txs)
    }
}

/// Sats received by `address` across a transaction's outputs.
fn received_sats(tx: &EsploraTx, address: &str) -> u64 {
    tx.vout
        .iter()
        .filter_map(|vout| {
            let addr = vout.scriptpubkey_address.as_ref()?;
            if addr.eq_ignore_ascii_case(address) {
                Some(vout.value)
            } else {
                None
            }
        })
        .sum()
}

/// Sats spent from `address` across a transaction's inputs.
fn spent_sats(tx: &EsploraTx, address: &str) -> u64 {
    tx.vin
        .iter()
        .filter_map(|vin| vin.prevout.as_ref())
        .filter_map(|prevout| {
            let addr = prevout.scriptpubkey_address.as_ref()?;
            if addr.eq_ignore_ascii_case(address) {
                Some(prevout.value)
            } else {
                None
            }
        })
        .sum()
}

fn map_transaction(tx: &EsploraTx, address: &str) -> BtcTransaction {
    let received = received_sats(tx, address);
    let spent = spent_sats(tx, address);

    // Net flow decides direction; change outputs back to the same address
    // cancel out against the spent inputs.
    let (direction, value) = if spent > received {
        (TransactionDirection::Outgoing, spent - received)
    } else {
        (TransactionDirection::Incoming, received - spent)
    };

    let status = if tx.status.confirmed {
        TransactionStatus::Confirmed
    } else {
        TransactionStatus::Pending
    };

    BtcTransaction {
        txid: tx.txid.clone(),
        direction,
        status,
        value: value as Balance,
        fee: tx.fee.map(|f| f as Balance),
        block_height: tx.status.block_height,
        timestamp: tx.status.block_time.and_then(|t| DateTime::from_timestamp(t, 0)),
    }
}

fn settled_sats(stats: &TxoStats) -> i128 {
    stats.funded_txo_sum as i128 - stats.spent_txo_sum as i128
}

#[async_trait]
impl WalletApi for EsploraClient {
    async fn fetch_balance(&self, account: &str) -> Result<CertifiedData<Balance>> {
        let url = self.address_url(account, "")?;
        let info: AddressInfo = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let total = settled_sats(&info.chain_stats) + settled_sats(&info.mempool_stats);
        Ok(CertifiedData::uncertified(total.max(0) as Balance))
    }

    async fn fetch_new_transactions(
        &self,
        account: &str,
        cursor: Option<&TxCursor>,
    ) -> Result<Option<Vec<ChainTransaction>>> {
        let txs = self.fetch_address_txs(account).await?;

        let new_transactions: Vec<ChainTransaction> = txs
            .iter()
            .take_while(|tx| cursor.map_or(true, |c| tx.txid != c.last_seen))
            .map(|tx| ChainTransaction::Btc(map_transaction(tx, account)))
            .collect();

        Ok(Some(new_transactions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx_json(confirmed: bool) -> EsploraTx {
        serde_json::from_value(serde_json::json!({
            "txid": "t1",
            "status": { "confirmed": confirmed, "block_height": 800000, "block_time": 1700000000 },
            "vin": [
                { "prevout": { "value": 5000, "scriptpubkey_address": "other" } }
            ],
            "vout": [
                { "value": 3000, "scriptpubkey_address": "mine" },
                { "value": 1900, "scriptpubkey_address": "other" }
            ],
            "fee": 100
        }))
        .unwrap()
    }

    #[test]
    fn incoming_value_sums_outputs_to_address() {
        let mapped = map_transaction(&tx_json(true), "mine");
        assert_eq!(mapped.direction, TransactionDirection::Incoming);
        assert_eq!(mapped.value, 3000);
        assert_eq!(mapped.status, TransactionStatus::Confirmed);
    }

    #[test]
    fn outgoing_value_nets_out_change() {
        let tx: EsploraTx = serde_json::from_value(serde_json::json!({
            "txid": "t2",
            "status": { "confirmed": true, "block_height": null, "block_time": null },
            "vin": [
                { "prevout": { "value": 5000, "scriptpubkey_address": "mine" } }
            ],
            "vout": [
                { "value": 3000, "scriptpubkey_address": "other" },
                { "value": 1900, "scriptpubkey_address": "mine" }
            ],
            "fee": 100
        }))
        .unwrap();

        let mapped = map_transaction(&tx, "mine");
        assert_eq!(mapped.direction, TransactionDirection::Outgoing);
        // 5000 spent, 1900 came back as change.
        assert_eq!(mapped.value, 3100);
    }

    #[test]
    fn unconfirmed_maps_to_pending() {
        let mapped = map_transaction(&tx_json(false), "mine");
        assert_eq!(mapped.status, TransactionStatus::Pending);
    }

    #[test]
    fn address_matching_ignores_case() {
        assert_eq!(received_sats(&tx_json(true), "MINE"), 3000);
    }
}
