// Main-thread reconciliation: listener handlers, pending-state mergers,
// derived aggregation and the per-session address cache.
pub mod address;
pub mod aggregate;
pub mod listener;
pub mod pending;

pub use address::load_address;
pub use aggregate::{
    all_networks_view, confirmed_view, group_by_day, merged_transactions, AggregatedTransaction,
};
pub use listener::{
    apply_pending_message, apply_pow_message, apply_wallet_message, run_pending_listener,
    run_pow_listener, run_wallet_listener, sync_balance, sync_transactions,
};
pub use pending::{pending_deposit_view, pending_utxo_view};
