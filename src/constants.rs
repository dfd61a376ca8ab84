/// Application constants

// Poll intervals (seconds), one per worker family. Timers are independent;
// there is no ordering guarantee between two workers' messages.
pub const ICP_WALLET_INTERVAL_SECS: u64 = 10;
pub const ICRC_WALLET_INTERVAL_SECS: u64 = 10;
pub const SOL_WALLET_INTERVAL_SECS: u64 = 15;
pub const ETH_WALLET_INTERVAL_SECS: u64 = 30;
pub const BTC_WALLET_INTERVAL_SECS: u64 = 60;
pub const PENDING_EVENTS_INTERVAL_SECS: u64 = 60;
pub const POW_PROTECTION_INTERVAL_SECS: u64 = 60;

// Paging for incremental "new since cursor" queries.
pub const WALLET_PAGE_SIZE: usize = 100;

// Solana RPC caps signature listings well above this; kept small so a tick
// stays cheap.
pub const SOL_SIGNATURE_LIMIT: usize = 50;

// Proof-of-work defaults. Difficulty counts leading zero bits of the
// Keccak-256 digest over seed || nonce.
pub const POW_DEFAULT_DIFFICULTY: u32 = 12;
pub const POW_MAX_DIFFICULTY: u32 = 40;
pub const POW_SOLVE_TIMEOUT_SECS: u64 = 30;

// Transient-failure backoff cap shared by all pollers.
pub const TRANSIENT_BACKOFF_MAX_SECS: u64 = 300;

// Worker command channel depth; start/stop/trigger only, so tiny.
pub const WORKER_COMMAND_BUFFER: usize = 8;

// Listener channel depth; one slot per in-flight worker message.
pub const SYNC_CHANNEL_BUFFER: usize = 64;
