// Shared mutable state between workers and readers. Each slot has exactly
// one logical writer (one worker per chain/token); reads are snapshot reads.
pub mod certified;
pub mod pending;
pub mod pow;
pub mod transactions;

pub use certified::{CertifiedSlot, CertifiedStore};
pub use pending::PendingStore;
pub use pow::PowProtectionStore;
pub use transactions::{HistorySlot, TransactionStore};
