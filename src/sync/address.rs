use crate::chains::AddressApi;
use crate::context::SyncContext;
use crate::error::Result;
use crate::models::{CertifiedData, TokenId};

/// Resolve the account address for `token` on `network`, going to the
/// signer only on the first call of a session. Addresses never change for
/// a given identity, so a loaded slot is authoritative until sign-out
/// clears it.
pub async fn load_address(
    ctx: &SyncContext,
    token: &TokenId,
    api: &dyn AddressApi,
    network: &str,
) -> Result<CertifiedData<String>> {
    if let Some(cached) = ctx.addresses.get(token).loaded() {
        return Ok(cached.clone());
    }

    let address = api.resolve_address(network).await?;
    ctx.addresses.set(token, address.clone());
    tracing::debug!(%token, network, "Resolved account address");
    Ok(address)
}
