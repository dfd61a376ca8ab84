use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{rpc_call, TxCursor, WalletApi};
use crate::constants::SOL_SIGNATURE_LIMIT;
use crate::error::Result;
use crate::models::{
    Balance, CertifiedData, ChainTransaction, SolTransaction, TransactionDirection,
    TransactionStatus,
};

/// Solana JSON-RPC client. Signatures are listed newest first with the
/// `until` cursor, then each new signature is resolved to a lamport delta
/// from the transaction's pre/post balances.
pub struct SolanaRpcClient {
    http: Client,
    rpc: Url,
}

#[derive(Debug, Deserialize)]
struct RpcContextValue<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct SignatureInfo {
    signature: String,
    slot: u64,
    err: Option<serde_json::Value>,
    #[serde(rename = "blockTime")]
    block_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RpcTransaction {
    meta: Option<TransactionMeta>,
    transaction: TransactionBody,
}

#[derive(Debug, Deserialize)]
struct TransactionMeta {
    #[serde(rename = "preBalances")]
    pre_balances: Vec<u64>,
    #[serde(rename = "postBalances")]
    post_balances: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct TransactionBody {
    message: TransactionMessage,
}

#[derive(Debug, Deserialize)]
struct TransactionMessage {
    #[serde(rename = "accountKeys")]
    account_keys: Vec<String>,
}

impl SolanaRpcClient {
    pub fn new(rpc: Url) -> Self {
        Self {
            http: Client::new(),
            rpc,
        }
    }

    async fn signatures_for(
        &self,
        account: &str,
        cursor: Option<&TxCursor>,
    ) -> Result<Vec<SignatureInfo>> {
        let mut options = serde_json::json!({ "limit": SOL_SIGNATURE_LIMIT });
        if let Some(cursor) = cursor {
            options["until"] = serde_json::Value::String(cursor.last_seen.clone());
        }
        rpc_call(
            &self.http,
            &self.rpc,
            "getSignaturesForAddress",
            serde_json::json!([account, options]),
        )
        .await
    }

    async fn lamport_delta(&self, signature: &str, account: &str) -> Result<Option<i128>> {
        let tx: Option<RpcTransaction> = rpc_call(
            &self.http,
            &self.rpc,
            "getTransaction",
            serde_json::json!([
                signature,
                { "encoding": "json", "maxSupportedTransactionVersion": 0 }
            ]),
        )
        .await?;

        let Some(tx) = tx else { return Ok(None) };
        let Some(meta) = tx.meta else { return Ok(None) };
        let Some(position) = tx
            .transaction
            .message
            .account_keys
            .iter()
            .position(|key| key == account)
        else {
            return Ok(None);
        };

        let pre = meta.pre_balances.get(position).copied().unwrap_or(0) as i128;
        let post = meta.post_balances.get(position).copied().unwrap_or(0) as i128;
        Ok(Some(post - pre))
    }
}

fn map_signature(info: &SignatureInfo, delta: Option<i128>) -> SolTransaction {
    let status = if info.err.is_some() {
        TransactionStatus::Failed
    } else {
        TransactionStatus::Confirmed
    };
    let (direction, value) = match delta {
        Some(d) if d < 0 => (TransactionDirection::Outgoing, d.unsigned_abs()),
        Some(d) => (TransactionDirection::Incoming, d.unsigned_abs()),
        None => (TransactionDirection::Incoming, 0),
    };

    SolTransaction {
        signature: info.signature.clone(),
        direction,
        status,
        value: value as Balance,
        slot: Some(info.slot),
        timestamp: info.block_time.and_then(|t| DateTime::from_timestamp(t, 0)),
    }
}

#[async_trait]
impl WalletApi for SolanaRpcClient {
    async fn fetch_balance(&self, account: &str) -> Result<CertifiedData<Balance>> {
        let balance: RpcContextValue<u64> = rpc_call(
            &self.http,
            &self.rpc,
            "getBalance",
            serde_json::json!([account]),
        )
        .await?;
        Ok(CertifiedData::uncertified(balance.value as Balance))
    }

    async fn fetch_new_transactions(
        &self,
        account: &str,
        cursor: Option<&TxCursor>,
    ) -> Result<Option<Vec<ChainTransaction>>> {
        let signatures = self.signatures_for(account, cursor).await?;

        let mut transactions = Vec::with_capacity(signatures.len());
        for info in &signatures {
            let delta = match self.lamport_delta(&info.signature, account).await {
                Ok(delta) => delta,
                Err(err) => {
                    // A single unresolvable transaction must not sink the
                    // whole batch; report it with a zero value instead.
                    tracing::warn!(signature = %info.signature, "Failed to resolve lamport delta: {err}");
                    None
                }
            };
            transactions.push(ChainTransaction::Sol(map_signature(info, delta)));
        }
        Ok(Some(transactions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(err: bool) -> SignatureInfo {
        SignatureInfo {
            signature: "sig1".to_string(),
            slot: 250_000_000,
            err: err.then(|| serde_json::json!({"InstructionError": []})),
            block_time: Some(1_700_000_000),
        }
    }

    #[test]
    fn negative_delta_is_outgoing() {
        let tx = map_signature(&info(false), Some(-5_000));
        assert_eq!(tx.direction, TransactionDirection::Outgoing);
        assert_eq!(tx.value, 5_000);
    }

    #[test]
    fn positive_delta_is_incoming() {
        let tx = map_signature(&info(false), Some(7_000));
        assert_eq!(tx.direction, TransactionDirection::Incoming);
        assert_eq!(tx.value, 7_000);
    }

    #[test]
    fn rpc_error_marks_failed() {
        let tx = map_signature(&info(true), None);
        assert_eq!(tx.status, TransactionStatus::Failed);
        assert_eq!(tx.value, 0);
    }
}
