// Boundary clients for the ledgers/indexers this engine polls. Each client
// is a thin request/response wrapper; all interpretation happens in the
// sync layer.
pub mod btc;
pub mod eth;
pub mod icp;
pub mod icrc;
pub mod minter;
pub mod signer;
pub mod sol;

pub use btc::EsploraClient;
pub use eth::EthClient;
pub use icp::IcpIndexClient;
pub use icrc::IcrcClient;
pub use minter::MinterGatewayClient;
pub use signer::SignerGatewayClient;
pub use sol::SolanaRpcClient;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::models::{
    AllowSigningGrant, Balance, CertifiedData, ChainTransaction, MinterInfo, PendingEthDeposit,
    PendingUtxo, PowChallenge,
};

/// Incremental-sync cursor: the newest transaction id (or height) already
/// reported. Advanced by the poller only after a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxCursor {
    pub last_seen: String,
}

impl TxCursor {
    pub fn new(last_seen: impl Into<String>) -> Self {
        Self {
            last_seen: last_seen.into(),
        }
    }
}

/// Canonical balance + incremental history source for one chain family.
#[async_trait]
pub trait WalletApi: Send + Sync {
    /// Current balance of `account`, tagged with its certification path.
    async fn fetch_balance(&self, account: &str) -> Result<CertifiedData<Balance>>;

    /// Transactions newer than `cursor`, newest first.
    ///
    /// `Ok(None)` means this ledger has no index/history capability at all
    /// (e.g. an ICRC token without an index canister); the listener
    /// nullifies the history slot rather than treating it as an error.
    async fn fetch_new_transactions(
        &self,
        account: &str,
        cursor: Option<&TxCursor>,
    ) -> Result<Option<Vec<ChainTransaction>>>;
}

/// Raw pending events observed directly on a source chain.
#[async_trait]
pub trait PendingSourceApi: Send + Sync {
    async fn pending_utxos(&self, address: &str) -> Result<Vec<PendingUtxo>>;
    async fn pending_deposits(&self, address: &str) -> Result<Vec<PendingEthDeposit>>;
}

/// Minter-canister operational metadata.
#[async_trait]
pub trait MinterApi: Send + Sync {
    async fn minter_info(&self) -> Result<CertifiedData<MinterInfo>>;
}

/// Challenge issuance and cycle granting for the signing gate.
#[async_trait]
pub trait PowApi: Send + Sync {
    async fn create_challenge(&self) -> Result<PowChallenge>;
    async fn allow_signing(&self, seed: &str, nonce: u64) -> Result<AllowSigningGrant>;
}

/// Per-chain account address resolution, cached per session.
#[async_trait]
pub trait AddressApi: Send + Sync {
    async fn resolve_address(&self, network: &str) -> Result<CertifiedData<String>>;
}

// JSON-RPC 2.0 envelope shared by the Ethereum and Solana clients.

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u32,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

pub(crate) async fn rpc_call<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: &url::Url,
    method: &str,
    params: serde_json::Value,
) -> Result<T> {
    let request = RpcRequest {
        jsonrpc: "2.0",
        id: 1,
        method,
        params,
    };
    let response: RpcResponse<T> = http
        .post(url.clone())
        .json(&request)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if let Some(err) = response.error {
        return Err(SyncError::Rpc(format!(
            "{method} failed: {} (code {})",
            err.message, err.code
        )));
    }
    response
        .result
        .ok_or_else(|| SyncError::InvalidPayload(format!("{method} returned no result")))
}

/// Parse a `0x`-prefixed hex quantity into base units.
pub(crate) fn parse_hex_quantity(raw: &str) -> Result<u128> {
    let trimmed = raw.trim().trim_start_matches("0x");
    if trimmed.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(trimmed, 16)
        .map_err(|e| SyncError::InvalidPayload(format!("Invalid hex quantity '{raw}': {e}")))
}

/// Parse a decimal string amount into base units.
pub(crate) fn parse_dec_quantity(raw: &str) -> Result<u128> {
    raw.trim()
        .parse::<u128>()
        .map_err(|e| SyncError::InvalidPayload(format!("Invalid amount '{raw}': {e}")))
}
