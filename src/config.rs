use serde::Deserialize;
use std::env;

use crate::constants::{
    BTC_WALLET_INTERVAL_SECS, ETH_WALLET_INTERVAL_SECS, ICP_WALLET_INTERVAL_SECS,
    ICRC_WALLET_INTERVAL_SECS, PENDING_EVENTS_INTERVAL_SECS, POW_PROTECTION_INTERVAL_SECS,
    SOL_WALLET_INTERVAL_SECS,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub environment: String,

    // Chain endpoints
    pub esplora_api_url: String,
    pub eth_rpc_url: String,
    pub eth_index_api_url: Option<String>,
    pub sol_rpc_url: String,
    pub icp_index_url: String,
    pub icrc_ledger_url: String,
    pub icrc_index_url: Option<String>,

    // Gateways
    pub minter_gateway_url: String,
    pub pow_gateway_url: String,
    pub signer_gateway_url: String,

    // Watched accounts. A missing address disables that chain's poller.
    pub btc_address: Option<String>,
    pub eth_address: Option<String>,
    pub sol_address: Option<String>,
    pub icp_account: Option<String>,
    pub icrc_account: Option<String>,

    // Poll intervals (seconds)
    pub icp_interval_secs: u64,
    pub icrc_interval_secs: u64,
    pub sol_interval_secs: u64,
    pub eth_interval_secs: u64,
    pub btc_interval_secs: u64,
    pub pending_interval_secs: u64,
    pub pow_interval_secs: u64,
}

fn interval_var(name: &str, default_secs: u64) -> anyhow::Result<u64> {
    match env::var(name) {
        Ok(raw) => Ok(raw.trim().parse()?),
        Err(_) => Ok(default_secs),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            esplora_api_url: env::var("ESPLORA_API_URL")
                .unwrap_or_else(|_| "https://blockstream.info/api".to_string()),
            eth_rpc_url: env::var("ETH_RPC_URL")?,
            eth_index_api_url: env::var("ETH_INDEX_API_URL").ok(),
            sol_rpc_url: env::var("SOL_RPC_URL")
                .unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".to_string()),
            icp_index_url: env::var("ICP_INDEX_URL")?,
            icrc_ledger_url: env::var("ICRC_LEDGER_URL")?,
            icrc_index_url: env::var("ICRC_INDEX_URL").ok(),

            minter_gateway_url: env::var("MINTER_GATEWAY_URL")?,
            pow_gateway_url: env::var("POW_GATEWAY_URL")?,
            signer_gateway_url: env::var("SIGNER_GATEWAY_URL")?,

            btc_address: env::var("BTC_ADDRESS").ok(),
            eth_address: env::var("ETH_ADDRESS").ok(),
            sol_address: env::var("SOL_ADDRESS").ok(),
            icp_account: env::var("ICP_ACCOUNT").ok(),
            icrc_account: env::var("ICRC_ACCOUNT").ok(),

            icp_interval_secs: interval_var("ICP_INTERVAL_SECS", ICP_WALLET_INTERVAL_SECS)?,
            icrc_interval_secs: interval_var("ICRC_INTERVAL_SECS", ICRC_WALLET_INTERVAL_SECS)?,
            sol_interval_secs: interval_var("SOL_INTERVAL_SECS", SOL_WALLET_INTERVAL_SECS)?,
            eth_interval_secs: interval_var("ETH_INTERVAL_SECS", ETH_WALLET_INTERVAL_SECS)?,
            btc_interval_secs: interval_var("BTC_INTERVAL_SECS", BTC_WALLET_INTERVAL_SECS)?,
            pending_interval_secs: interval_var(
                "PENDING_INTERVAL_SECS",
                PENDING_EVENTS_INTERVAL_SECS,
            )?,
            pow_interval_secs: interval_var("POW_INTERVAL_SECS", POW_PROTECTION_INTERVAL_SECS)?,
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.eth_rpc_url.trim().is_empty() {
            anyhow::bail!("ETH_RPC_URL is empty");
        }
        if self.icp_index_url.trim().is_empty() {
            anyhow::bail!("ICP_INDEX_URL is empty");
        }
        if self.minter_gateway_url.trim().is_empty() {
            anyhow::bail!("MINTER_GATEWAY_URL is empty");
        }
        if self.pow_gateway_url.trim().is_empty() {
            anyhow::bail!("POW_GATEWAY_URL is empty");
        }
        if self.signer_gateway_url.trim().is_empty() {
            anyhow::bail!("SIGNER_GATEWAY_URL is empty");
        }

        if self.eth_index_api_url.is_none() {
            tracing::warn!("ETH_INDEX_API_URL not set; ETH history will be unavailable");
        }
        if self.icrc_index_url.is_none() {
            tracing::warn!("ICRC_INDEX_URL not set; ICRC history will be unavailable");
        }

        if self.btc_address.is_none()
            && self.eth_address.is_none()
            && self.sol_address.is_none()
            && self.icp_account.is_none()
            && self.icrc_account.is_none()
        {
            tracing::warn!("No watched accounts configured; wallet pollers stay idle");
        }

        let intervals = [
            ("ICP_INTERVAL_SECS", self.icp_interval_secs),
            ("ICRC_INTERVAL_SECS", self.icrc_interval_secs),
            ("SOL_INTERVAL_SECS", self.sol_interval_secs),
            ("ETH_INTERVAL_SECS", self.eth_interval_secs),
            ("BTC_INTERVAL_SECS", self.btc_interval_secs),
            ("PENDING_INTERVAL_SECS", self.pending_interval_secs),
            ("POW_INTERVAL_SECS", self.pow_interval_secs),
        ];
        for (name, value) in intervals {
            if value == 0 {
                anyhow::bail!("{name} must be > 0");
            }
        }

        Ok(())
    }

    pub fn is_testnet(&self) -> bool {
        self.environment == "development" || self.environment == "testnet"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_var_falls_back_to_default() {
        assert_eq!(
            interval_var("DEFINITELY_UNSET_INTERVAL_VAR", 42).unwrap(),
            42
        );
    }

    #[test]
    fn zero_interval_fails_validation() {
        let config = Config {
            environment: "development".to_string(),
            esplora_api_url: "https://blockstream.info/api".to_string(),
            eth_rpc_url: "https://rpc.example".to_string(),
            eth_index_api_url: None,
            sol_rpc_url: "https://sol.example".to_string(),
            icp_index_url: "https://icp.example".to_string(),
            icrc_ledger_url: "https://icrc.example".to_string(),
            icrc_index_url: None,
            minter_gateway_url: "https://minter.example".to_string(),
            pow_gateway_url: "https://pow.example".to_string(),
            signer_gateway_url: "https://signer.example".to_string(),
            btc_address: None,
            eth_address: None,
            sol_address: None,
            icp_account: None,
            icrc_account: None,
            icp_interval_secs: 10,
            icrc_interval_secs: 10,
            sol_interval_secs: 15,
            eth_interval_secs: 0,
            btc_interval_secs: 60,
            pending_interval_secs: 60,
            pow_interval_secs: 60,
        };
        assert!(config.validate().is_err());
    }
}
