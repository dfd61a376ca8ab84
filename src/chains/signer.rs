use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::AddressApi;
use crate::error::Result;
use crate::models::CertifiedData;

/// Gateway in front of the signer service that derives the session's
/// per-network account addresses.
pub struct SignerGatewayClient {
    http: Client,
    base: Url,
}

#[derive(Debug, Deserialize)]
struct AddressResponse {
    address: String,
    #[serde(default)]
    certified: bool,
}

impl SignerGatewayClient {
    pub fn new(base: Url) -> Self {
        Self {
            http: Client::new(),
            base,
        }
    }
}

#[async_trait]
impl AddressApi for SignerGatewayClient {
    async fn resolve_address(&self, network: &str) -> Result<CertifiedData<String>> {
        let url = self.base.join(&format!("address/{network}"))?;
        let response: AddressResponse = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(CertifiedData {
            data: response.address,
            certified: response.certified,
        })
    }
}
