use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use tokio::sync::watch;

use crate::models::{ChainTransaction, TokenId};

/// Observable state of one token's transaction history.
///
/// `Unavailable` is the explicit "no index/history for this ledger" state,
/// distinct from both `NeverLoaded` and an empty list, so the UI can render
/// "history unavailable" instead of a spinner or an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistorySlot {
    NeverLoaded,
    Unavailable,
    Loaded(Vec<ChainTransaction>),
}

impl HistorySlot {
    pub fn transactions(&self) -> &[ChainTransaction] {
        match self {
            HistorySlot::Loaded(txs) => txs,
            _ => &[],
        }
    }
}

/// Per-token transaction lists, newest first.
///
/// Merging is by id, commutative and idempotent with respect to message
/// arrival order, so interleaved workers cannot corrupt a list.
pub struct TransactionStore {
    slots: RwLock<HashMap<TokenId, Option<Vec<ChainTransaction>>>>,
    revision: watch::Sender<u64>,
}

impl TransactionStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            slots: RwLock::new(HashMap::new()),
            revision,
        }
    }

    /// Merge a newest-first batch into the stored list.
    ///
    /// The batch is de-duplicated by id (first occurrence wins), stored
    /// entries superseded by the batch are dropped, and the batch is
    /// prepended. Resending the same id twice therefore never duplicates it,
    /// and the most recently synced version of an id wins.
    pub fn prepend_new(&self, token: &TokenId, new_transactions: Vec<ChainTransaction>) {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        let existing = match slots.remove(token) {
            Some(Some(txs)) => txs,
            _ => Vec::new(),
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut merged: Vec<ChainTransaction> = Vec::with_capacity(
            new_transactions.len() + existing.len(),
        );
        for tx in new_transactions {
            if seen.insert(tx.id()) {
                merged.push(tx);
            }
        }
        for tx in existing {
            if !seen.contains(&tx.id()) {
                merged.push(tx);
            }
        }

        slots.insert(token.clone(), Some(merged));
        drop(slots);
        self.bump();
    }

    /// Mark the token's history as unavailable (no index canister or
    /// equivalent). Not an error state.
    pub fn nullify(&self, token: &TokenId) {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots.insert(token.clone(), None);
        drop(slots);
        self.bump();
    }

    /// Forget the token entirely, back to `NeverLoaded`.
    pub fn reset(&self, token: &TokenId) {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots.remove(token);
        drop(slots);
        self.bump();
    }

    pub fn clear(&self) {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots.clear();
        drop(slots);
        self.bump();
    }

    pub fn history(&self, token: &TokenId) -> HistorySlot {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        match slots.get(token) {
            None => HistorySlot::NeverLoaded,
            Some(None) => HistorySlot::Unavailable,
            Some(Some(txs)) => HistorySlot::Loaded(txs.clone()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }
}

impl Default for TransactionStore {
    fn default() -> Self {
        Self::new()
    }
}
