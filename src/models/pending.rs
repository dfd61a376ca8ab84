use serde::{Deserialize, Serialize};

use super::token::Balance;

/// A Bitcoin deposit observed on the source chain but not yet reflected by
/// the twin ledger's own transaction history. Destroyed once the matching
/// minted transaction shows up in the confirmed set, or on reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUtxo {
    pub txid: String,
    pub vout: u32,
    pub value: Balance,
    pub confirmations: u32,
}

impl PendingUtxo {
    /// Id the minted twin transaction will carry, `{txid}-{vout}`.
    pub fn derived_id(&self) -> String {
        format!("{}-{}", self.txid, self.vout)
    }
}

/// An Ethereum helper-contract deposit awaiting its twin mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEthDeposit {
    pub tx_hash: String,
    pub log_index: u32,
    pub value: Balance,
    pub block_number: u64,
    pub from_address: String,
}

impl PendingEthDeposit {
    pub fn derived_id(&self) -> String {
        format!("{}-{}", self.tx_hash, self.log_index)
    }
}

/// Minter-reported operational parameters used to interpret pending events.
/// Refreshed periodically by the pending-events poller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinterInfo {
    /// Fee the minter withholds from each deposit (e.g. KYT checks).
    pub kyt_fee: Balance,
    /// Source-chain height the minter has scraped up to.
    pub scraped_block_height: Option<u64>,
    /// Helper contract deposits must go through, where applicable.
    pub helper_contract_address: Option<String>,
}
