use std::collections::HashMap;
use std::sync::RwLock;

use tokio::sync::watch;

use crate::models::{CertifiedData, TokenId};

/// Observable state of one keyed slot.
///
/// `Reset` (explicitly cleared) is distinct from `NeverLoaded` so readers
/// can tell "signed out / reset" apart from "first fetch still in flight".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertifiedSlot<T> {
    NeverLoaded,
    Reset,
    Loaded(CertifiedData<T>),
}

impl<T> CertifiedSlot<T> {
    pub fn loaded(&self) -> Option<&CertifiedData<T>> {
        match self {
            CertifiedSlot::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

/// Generic keyed store distinguishing certified from best-effort data.
///
/// Writes are whole-slot replacements, so concurrent writers can never
/// interleave partial updates. An uncertified write over a certified slot
/// is dropped; the certified value stands until an explicit `reset`.
pub struct CertifiedStore<T> {
    slots: RwLock<HashMap<TokenId, Option<CertifiedData<T>>>>,
    revision: watch::Sender<u64>,
}

impl<T: Clone> CertifiedStore<T> {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            slots: RwLock::new(HashMap::new()),
            revision,
        }
    }

    /// Replace the slot for `token`. Returns whether the write was applied.
    pub fn set(&self, token: &TokenId, value: CertifiedData<T>) -> bool {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        if let Some(Some(current)) = slots.get(token) {
            if current.certified && !value.certified {
                tracing::debug!(%token, "Dropping uncertified write over certified slot");
                return false;
            }
        }
        slots.insert(token.clone(), Some(value));
        drop(slots);
        self.bump();
        true
    }

    /// Clear the slot to the `Reset` state.
    pub fn reset(&self, token: &TokenId) {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots.insert(token.clone(), None);
        drop(slots);
        self.bump();
    }

    /// Drop every slot back to `NeverLoaded`. Sign-out path.
    pub fn clear(&self) {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots.clear();
        drop(slots);
        self.bump();
    }

    pub fn get(&self, token: &TokenId) -> CertifiedSlot<T> {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        match slots.get(token) {
            None => CertifiedSlot::NeverLoaded,
            Some(None) => CertifiedSlot::Reset,
            Some(Some(value)) => CertifiedSlot::Loaded(value.clone()),
        }
    }

    /// Revision ticker readers can await to recompute derived views.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }
}

impl<T: Clone> Default for CertifiedStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> TokenId {
        TokenId::new("ICP")
    }

    #[test]
    fn never_loaded_differs_from_reset() {
        let store: CertifiedStore<u128> = CertifiedStore::new();
        assert_eq!(store.get(&token()), CertifiedSlot::NeverLoaded);
        store.reset(&token());
        assert_eq!(store.get(&token()), CertifiedSlot::Reset);
    }

    #[test]
    fn certified_is_not_downgraded_without_reset() {
        let store: CertifiedStore<u128> = CertifiedStore::new();
        assert!(store.set(&token(), CertifiedData::certified(100)));
        assert!(!store.set(&token(), CertifiedData::uncertified(50)));

        let slot = store.get(&token());
        let value = slot.loaded().unwrap();
        assert_eq!(value.data, 100);
        assert!(value.certified);
    }

    #[test]
    fn uncertified_write_applies_after_reset() {
        let store: CertifiedStore<u128> = CertifiedStore::new();
        store.set(&token(), CertifiedData::certified(100));
        store.reset(&token());
        assert!(store.set(&token(), CertifiedData::uncertified(50)));
        assert_eq!(store.get(&token()).loaded().unwrap().data, 50);
    }

    #[test]
    fn certified_supersedes_uncertified() {
        let store: CertifiedStore<u128> = CertifiedStore::new();
        store.set(&token(), CertifiedData::uncertified(10));
        assert!(store.set(&token(), CertifiedData::certified(20)));
        assert_eq!(store.get(&token()).loaded().unwrap().data, 20);
    }

    #[test]
    fn subscribers_see_revision_changes() {
        let store: CertifiedStore<u128> = CertifiedStore::new();
        let rx = store.subscribe();
        let before = *rx.borrow();
        store.set(&token(), CertifiedData::certified(1));
        assert_ne!(*rx.borrow(), before);
    }
}
