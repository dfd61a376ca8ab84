use std::sync::RwLock;

use crate::error::{Result, SyncError};
use crate::models::{Balance, MinterInfo, PendingEthDeposit, PendingUtxo};
use crate::stores::{CertifiedStore, PendingStore, PowProtectionStore, TransactionStore};

/// Session-owned bundle of every store the engine writes to. Constructed at
/// startup, passed by reference and torn down (reset) on sign-out; there
/// are no module-level singletons.
pub struct SyncContext {
    identity: RwLock<Option<String>>,
    pub balances: CertifiedStore<Balance>,
    pub addresses: CertifiedStore<String>,
    pub transactions: TransactionStore,
    pub minter_info: CertifiedStore<MinterInfo>,
    pub pending_utxos: PendingStore<PendingUtxo>,
    pub pending_deposits: PendingStore<PendingEthDeposit>,
    pub pow: PowProtectionStore,
}

impl SyncContext {
    pub fn new() -> Self {
        Self {
            identity: RwLock::new(None),
            balances: CertifiedStore::new(),
            addresses: CertifiedStore::new(),
            transactions: TransactionStore::new(),
            minter_info: CertifiedStore::new(),
            pending_utxos: PendingStore::new(),
            pending_deposits: PendingStore::new(),
            pow: PowProtectionStore::new(),
        }
    }

    pub fn with_identity(principal: impl Into<String>) -> Self {
        let ctx = Self::new();
        ctx.set_identity(principal);
        ctx
    }

    pub fn set_identity(&self, principal: impl Into<String>) {
        let mut identity = self.identity.write().unwrap_or_else(|e| e.into_inner());
        *identity = Some(principal.into());
    }

    pub fn identity(&self) -> Option<String> {
        self.identity
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Clear the identity and every store. Workers should be stopped by the
    /// caller first; a late in-flight message would simply repopulate a
    /// fresh, empty slot.
    pub fn sign_out(&self) {
        {
            let mut identity = self.identity.write().unwrap_or_else(|e| e.into_inner());
            *identity = None;
        }
        self.reset_all();
    }

    pub fn reset_all(&self) {
        self.balances.clear();
        self.addresses.clear();
        self.transactions.clear();
        self.minter_info.clear();
        self.pending_utxos.clear();
        self.pending_deposits.clear();
        self.pow.reset();
    }

    /// Combined gate in front of a sign request: an identity must exist and
    /// the proof-of-work allowance must be active.
    pub fn ensure_signing_allowed(&self) -> Result<()> {
        if self.identity().is_none() {
            return Err(SyncError::Unauthenticated);
        }
        self.pow.ensure_signing_allowed()
    }
}

impl Default for SyncContext {
    fn default() -> Self {
        Self::new()
    }
}
