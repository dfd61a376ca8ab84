use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::token::Balance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionDirection {
    Incoming,
    Outgoing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Executed,
    Confirmed,
    Failed,
    Reimbursed,
}

/// Chain component an entry originated from; drives icon/rendering choices
/// in the cross-network view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkFamily {
    Bitcoin,
    Ethereum,
    InternetComputer,
    Solana,
}

/// Common projection shared by every chain variant; all the aggregation
/// layer needs to order, classify and de-duplicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSummary {
    pub id: String,
    pub direction: TransactionDirection,
    pub status: TransactionStatus,
    pub value: Balance,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BtcTransaction {
    pub txid: String,
    pub direction: TransactionDirection,
    pub status: TransactionStatus,
    pub value: Balance,
    pub fee: Option<Balance>,
    pub block_height: Option<u64>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthTransaction {
    pub hash: String,
    pub direction: TransactionDirection,
    pub status: TransactionStatus,
    pub value: Balance,
    pub from_address: String,
    pub to_address: Option<String>,
    pub block_number: Option<u64>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcpTransaction {
    pub index: u64,
    pub direction: TransactionDirection,
    pub status: TransactionStatus,
    pub value: Balance,
    pub memo: Option<u64>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcrcTransaction {
    pub index: u64,
    pub kind: String,
    pub direction: TransactionDirection,
    pub status: TransactionStatus,
    pub value: Balance,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolTransaction {
    pub signature: String,
    pub direction: TransactionDirection,
    pub status: TransactionStatus,
    pub value: Balance,
    pub slot: Option<u64>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// One variant per chain transaction shape. Exhaustive matches keep the
/// per-chain fields available where they matter while the aggregation layer
/// works off [`TransactionSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "chain", rename_all = "snake_case")]
pub enum ChainTransaction {
    Btc(BtcTransaction),
    Eth(EthTransaction),
    Icp(IcpTransaction),
    Icrc(IcrcTransaction),
    Sol(SolTransaction),
}

impl ChainTransaction {
    /// Stable identifier used for de-duplication across sync batches.
    pub fn id(&self) -> String {
        match self {
            ChainTransaction::Btc(tx) => tx.txid.clone(),
            ChainTransaction::Eth(tx) => tx.hash.clone(),
            ChainTransaction::Icp(tx) => tx.index.to_string(),
            ChainTransaction::Icrc(tx) => tx.index.to_string(),
            ChainTransaction::Sol(tx) => tx.signature.clone(),
        }
    }

    pub fn network(&self) -> NetworkFamily {
        match self {
            ChainTransaction::Btc(_) => NetworkFamily::Bitcoin,
            ChainTransaction::Eth(_) => NetworkFamily::Ethereum,
            ChainTransaction::Icp(_) | ChainTransaction::Icrc(_) => {
                NetworkFamily::InternetComputer
            }
            ChainTransaction::Sol(_) => NetworkFamily::Solana,
        }
    }

    pub fn summary(&self) -> TransactionSummary {
        match self {
            ChainTransaction::Btc(tx) => TransactionSummary {
                id: tx.txid.clone(),
                direction: tx.direction,
                status: tx.status,
                value: tx.value,
                timestamp: tx.timestamp,
            },
            ChainTransaction::Eth(tx) => TransactionSummary {
                id: tx.hash.clone(),
                direction: tx.direction,
                status: tx.status,
                value: tx.value,
                timestamp: tx.timestamp,
            },
            ChainTransaction::Icp(tx) => TransactionSummary {
                id: tx.index.to_string(),
                direction: tx.direction,
                status: tx.status,
                value: tx.value,
                timestamp: tx.timestamp,
            },
            ChainTransaction::Icrc(tx) => TransactionSummary {
                id: tx.index.to_string(),
                direction: tx.direction,
                status: tx.status,
                value: tx.value,
                timestamp: tx.timestamp,
            },
            ChainTransaction::Sol(tx) => TransactionSummary {
                id: tx.signature.clone(),
                direction: tx.direction,
                status: tx.status,
                value: tx.value,
                timestamp: tx.timestamp,
            },
        }
    }
}
