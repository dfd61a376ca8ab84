// Domain model shared by stores, workers and the reconciliation layer.
pub mod pending;
pub mod pow;
pub mod token;
pub mod transaction;

// Re-export for convenience
pub use pending::{MinterInfo, PendingEthDeposit, PendingUtxo};
pub use pow::{
    AllowSigningGrant, ChallengeCompletion, PowChallenge, PowProtectionState, PowProtectionStatus,
};
pub use token::{Balance, CertifiedData, TokenId};
pub use transaction::{
    BtcTransaction, ChainTransaction, EthTransaction, IcpTransaction, IcrcTransaction,
    NetworkFamily, SolTransaction, TransactionDirection, TransactionStatus, TransactionSummary,
};
