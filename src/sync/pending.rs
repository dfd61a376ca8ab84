use std::collections::HashSet;

use super::aggregate::AggregatedTransaction;
use crate::models::{
    ChainTransaction, MinterInfo, NetworkFamily, PendingEthDeposit, PendingUtxo, TokenId,
    TransactionDirection, TransactionStatus,
};

/// Displayed amount for a pending event: the raw value minus the minter's
/// withheld fee, clamped at zero. An amount at or below the fee still shows
/// as a zero-valued pending entry rather than disappearing or going
/// negative.
fn displayed_value(raw: u128, minter: Option<&MinterInfo>) -> u128 {
    let fee = minter.map_or(0, |info| info.kyt_fee);
    raw.saturating_sub(fee)
}

fn confirmed_ids(confirmed: &[ChainTransaction]) -> HashSet<String> {
    confirmed.iter().map(|tx| tx.id()).collect()
}

/// Synthetic pending entries for BTC deposits awaiting their ckBTC mint.
///
/// A UTXO is resolved once a confirmed transaction with the derived id
/// `{txid}-{vout}` appears in the twin ledger's history; resolved events
/// are excluded. Entries are always uncertified: they are an inference,
/// not a ledger-confirmed fact.
pub fn pending_utxo_view(
    token: &TokenId,
    pending: &[PendingUtxo],
    minter: Option<&MinterInfo>,
    confirmed: &[ChainTransaction],
) -> Vec<AggregatedTransaction> {
    let resolved = confirmed_ids(confirmed);
    pending
        .iter()
        .filter(|utxo| !resolved.contains(&utxo.derived_id()))
        .map(|utxo| AggregatedTransaction {
            id: utxo.derived_id(),
            token: token.clone(),
            network: NetworkFamily::Bitcoin,
            direction: TransactionDirection::Incoming,
            status: TransactionStatus::Pending,
            value: displayed_value(utxo.value, minter),
            timestamp: None,
            certified: false,
        })
        .collect()
}

/// Synthetic pending entries for ETH helper-contract deposits awaiting
/// their ckETH mint. Same resolution and fee rules as the UTXO view.
pub fn pending_deposit_view(
    token: &TokenId,
    pending: &[PendingEthDeposit],
    minter: Option<&MinterInfo>,
    confirmed: &[ChainTransaction],
) -> Vec<AggregatedTransaction> {
    let resolved = confirmed_ids(confirmed);
    pending
        .iter()
        .filter(|deposit| !resolved.contains(&deposit.derived_id()))
        .map(|deposit| AggregatedTransaction {
            id: deposit.derived_id(),
            token: token.clone(),
            network: NetworkFamily::Ethereum,
            direction: TransactionDirection::Incoming,
            status: TransactionStatus::Pending,
            value: displayed_value(deposit.value, minter),
            timestamp: None,
            certified: false,
        })
        .collect()
}
