use std::collections::HashMap;
use std::sync::RwLock;

use tokio::sync::watch;

use crate::models::TokenId;

/// Raw pending events per token (UTXOs awaiting mint, helper-contract
/// deposits awaiting their twin). Replaced wholesale on every poll; the
/// pending merger filters out entries already resolved by confirmed
/// history, this store just holds the latest raw observation.
pub struct PendingStore<E> {
    slots: RwLock<HashMap<TokenId, Vec<E>>>,
    revision: watch::Sender<u64>,
}

impl<E: Clone> PendingStore<E> {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            slots: RwLock::new(HashMap::new()),
            revision,
        }
    }

    pub fn set(&self, token: &TokenId, events: Vec<E>) {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots.insert(token.clone(), events);
        drop(slots);
        self.bump();
    }

    pub fn get(&self, token: &TokenId) -> Vec<E> {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        slots.get(token).cloned().unwrap_or_default()
    }

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

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }
}

impl<E: Clone> Default for PendingStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PendingUtxo;

    #[test]
    fn set_replaces_previous_observation() {
        let store: PendingStore<PendingUtxo> = PendingStore::new();
        let token = TokenId::new("ckBTC");
        let utxo = |txid: &str| PendingUtxo {
            txid: txid.to_string(),
            vout: 0,
            value: 1,
            confirmations: 1,
        };

        store.set(&token, vec![utxo("a"), utxo("b")]);
        store.set(&token, vec![utxo("c")]);
        let events = store.get(&token);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].txid, "c");

        store.reset(&token);
        assert!(store.get(&token).is_empty());
    }
}
