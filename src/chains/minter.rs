use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{parse_dec_quantity, MinterApi, PendingSourceApi, PowApi};
use crate::constants::POW_DEFAULT_DIFFICULTY;
use crate::error::{Result, SyncError};
use crate::models::{
    AllowSigningGrant, Balance, CertifiedData, MinterInfo, PendingEthDeposit, PendingUtxo,
    PowChallenge,
};

/// Gateway in front of the twin-token minter canister: operational info,
/// raw pending events, and the proof-of-work allowance endpoints.
pub struct MinterGatewayClient {
    http: Client,
    base: Url,
}

#[derive(Debug, Deserialize)]
struct MinterInfoResponse {
    kyt_fee: String,
    scraped_block_height: Option<u64>,
    helper_contract_address: Option<String>,
    #[serde(default)]
    certified: bool,
}

#[derive(Debug, Deserialize)]
struct PendingUtxoRecord {
    txid: String,
    vout: u32,
    value: String,
    #[serde(default)]
    confirmations: u32,
}

#[derive(Debug, Deserialize)]
struct PendingDepositRecord {
    tx_hash: String,
    log_index: u32,
    value: String,
    block_number: u64,
    from_address: String,
}

#[derive(Debug, Deserialize)]
struct ChallengeResponse {
    seed: String,
    difficulty: Option<u32>,
    expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize)]
struct GrantResponse {
    allowed_cycles: String,
    next_allowance_ms: u64,
    next_difficulty: u32,
}

impl MinterGatewayClient {
    pub fn new(base: Url) -> Self {
        Self {
            http: Client::new(),
            base,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base.join(path)?;
        let value = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(value)
    }
}

#[async_trait]
impl MinterApi for MinterGatewayClient {
    async fn minter_info(&self) -> Result<CertifiedData<MinterInfo>> {
        let response: MinterInfoResponse = self.get_json("minter/info").await?;
        let info = MinterInfo {
            kyt_fee: parse_dec_quantity(&response.kyt_fee)?,
            scraped_block_height: response.scraped_block_height,
            helper_contract_address: response.helper_contract_address,
        };
        Ok(CertifiedData {
            data: info,
            certified: response.certified,
        })
    }
}

#[async_trait]
impl PendingSourceApi for MinterGatewayClient {
    async fn pending_utxos(&self, address: &str) -> Result<Vec<PendingUtxo>> {
        let records: Vec<PendingUtxoRecord> = self
            .get_json(&format!("minter/pending-utxos?address={address}"))
            .await?;
        records
            .into_iter()
            .map(|record| {
                Ok(PendingUtxo {
                    value: parse_dec_quantity(&record.value)?,
                    txid: record.txid,
                    vout: record.vout,
                    confirmations: record.confirmations,
                })
            })
            .collect()
    }

    async fn pending_deposits(&self, address: &str) -> Result<Vec<PendingEthDeposit>> {
        let records: Vec<PendingDepositRecord> = self
            .get_json(&format!("minter/pending-deposits?address={address}"))
            .await?;
        records
            .into_iter()
            .map(|record| {
                Ok(PendingEthDeposit {
                    value: parse_dec_quantity(&record.value)?,
                    tx_hash: record.tx_hash,
                    log_index: record.log_index,
                    block_number: record.block_number,
                    from_address: record.from_address,
                })
            })
            .collect()
    }
}

#[async_trait]
impl PowApi for MinterGatewayClient {
    async fn create_challenge(&self) -> Result<PowChallenge> {
        let response: ChallengeResponse = self.get_json("pow/challenge").await?;
        Ok(PowChallenge {
            seed: response.seed,
            difficulty: response.difficulty.unwrap_or(POW_DEFAULT_DIFFICULTY),
            expires_at: response.expires_at,
        })
    }

    async fn allow_signing(&self, seed: &str, nonce: u64) -> Result<AllowSigningGrant> {
        let url = self.base.join("pow/allow-signing")?;
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({ "seed": seed, "nonce": nonce }))
            .send()
            .await?;

        if response.status().as_u16() == 403 {
            return Err(SyncError::ChallengeFailed(
                "Gateway rejected the solution".to_string(),
            ));
        }
        let grant: GrantResponse = response.error_for_status()?.json().await?;
        let allowed_cycles: Balance = parse_dec_quantity(&grant.allowed_cycles)?;
        Ok(AllowSigningGrant {
            allowed_cycles,
            next_allowance_ms: grant.next_allowance_ms,
            next_difficulty: grant.next_difficulty,
        })
    }
}
