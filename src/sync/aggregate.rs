use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{
    Balance, ChainTransaction, NetworkFamily, TokenId, TransactionDirection, TransactionStatus,
};

/// One row of the merged transaction list the UI renders, regardless of
/// originating chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedTransaction {
    pub id: String,
    pub token: TokenId,
    pub network: NetworkFamily,
    pub direction: TransactionDirection,
    pub status: TransactionStatus,
    pub value: Balance,
    pub timestamp: Option<DateTime<Utc>>,
    pub certified: bool,
}

/// Project confirmed ledger history into aggregated rows. Confirmed
/// entries came through the ledger sync path and are rendered as such.
pub fn confirmed_view(token: &TokenId, confirmed: &[ChainTransaction]) -> Vec<AggregatedTransaction> {
    confirmed
        .iter()
        .map(|tx| {
            let summary = tx.summary();
            AggregatedTransaction {
                id: summary.id,
                token: token.clone(),
                network: tx.network(),
                direction: summary.direction,
                status: summary.status,
                value: summary.value,
                timestamp: summary.timestamp,
                certified: true,
            }
        })
        .collect()
}

/// Combine pending-synthetic entries with confirmed history for one token.
///
/// Pending entries go first, since they are by construction more recent
/// than anything already confirmed. No further re-sort happens, so each
/// contributing source must already be internally ordered newest-first.
/// Pure function: recombining unchanged inputs yields identical output.
pub fn merged_transactions(
    mut pending: Vec<AggregatedTransaction>,
    confirmed: Vec<AggregatedTransaction>,
) -> Vec<AggregatedTransaction> {
    pending.extend(confirmed);
    pending
}

/// Cross-network view: merge per-token lists into one sequence, pending
/// entries first, confirmed entries in newest-first timestamp order. The
/// sort is stable so same-timestamp entries keep their per-token order.
pub fn all_networks_view(
    per_token: Vec<Vec<AggregatedTransaction>>,
) -> Vec<AggregatedTransaction> {
    let mut merged: Vec<AggregatedTransaction> = per_token.into_iter().flatten().collect();
    merged.sort_by_key(|tx| {
        let pending_rank = u8::from(tx.status != TransactionStatus::Pending);
        // Newest first; entries without a timestamp sort after dated ones
        // within their rank.
        let recency = tx.timestamp.map(|t| -t.timestamp_millis()).unwrap_or(i64::MAX);
        (pending_rank, recency)
    });
    merged
}

/// Group a merged list by calendar day for display. Undated (pending)
/// entries come first under `None`. Stateless; relies on the input order.
pub fn group_by_day(
    transactions: &[AggregatedTransaction],
) -> Vec<(Option<NaiveDate>, Vec<AggregatedTransaction>)> {
    let mut groups: Vec<(Option<NaiveDate>, Vec<AggregatedTransaction>)> = Vec::new();
    for tx in transactions {
        let day = tx.timestamp.map(|t| t.date_naive());
        match groups.last_mut() {
            Some((current, bucket)) if *current == day => bucket.push(tx.clone()),
            _ => groups.push((day, vec![tx.clone()])),
        }
    }
    groups
}
