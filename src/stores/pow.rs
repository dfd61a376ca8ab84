use chrono::Utc;
use tokio::sync::watch;

use crate::error::{Result, SyncError};
use crate::models::{PowProtectionState, PowProtectionStatus};

/// Single-slot mirror of the PoW worker's reported state.
///
/// Only the worker writes here; the signing path reads a snapshot and the
/// UI can await changes through the watch channel.
pub struct PowProtectionStore {
    state: watch::Sender<PowProtectionState>,
}

impl PowProtectionStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(PowProtectionState::default());
        Self { state }
    }

    pub fn set(&self, state: PowProtectionState) {
        let _ = self.state.send_replace(state);
    }

    pub fn get(&self) -> PowProtectionState {
        self.state.borrow().clone()
    }

    pub fn reset(&self) {
        let _ = self.state.send_replace(PowProtectionState::default());
    }

    pub fn subscribe(&self) -> watch::Receiver<PowProtectionState> {
        self.state.subscribe()
    }

    /// Gate check in front of every sign request.
    pub fn ensure_signing_allowed(&self) -> Result<()> {
        let state = self.get();
        if state.is_allowed_at(Utc::now()) {
            return Ok(());
        }
        let reason = match state.status {
            PowProtectionStatus::Allowed => "allowance expired".to_string(),
            PowProtectionStatus::Idle => "no allowance granted yet".to_string(),
            status => format!("challenge cycle in progress ({status:?})"),
        };
        Err(SyncError::SigningNotAllowed(reason))
    }
}

impl Default for PowProtectionStore {
    fn default() -> Self {
        Self::new()
    }
}
