use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use wallet_sync::chains::{
    EsploraClient, EthClient, IcpIndexClient, IcrcClient, MinterGatewayClient,
    SignerGatewayClient, SolanaRpcClient,
};
use wallet_sync::config::Config;
use wallet_sync::constants::SYNC_CHANNEL_BUFFER;
use wallet_sync::context::SyncContext;
use wallet_sync::models::TokenId;
use wallet_sync::sync::{load_address, run_pending_listener, run_pow_listener, run_wallet_listener};
use wallet_sync::workers::{PendingPoller, PowWorker, TwinKind, WalletPoller, WorkerHandle};

/// Configured address wins; otherwise ask the signer gateway to derive one.
async fn account_for(
    ctx: &SyncContext,
    signer: &SignerGatewayClient,
    token: &TokenId,
    network: &str,
    configured: Option<&String>,
) -> Option<String> {
    if let Some(address) = configured {
        return Some(address.clone());
    }
    match load_address(ctx, token, signer, network).await {
        Ok(resolved) => Some(resolved.data),
        Err(e) => {
            tracing::warn!(%token, network, "Address resolution failed, poller disabled: {e}");
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wallet_sync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting wallet sync engine");
    tracing::info!("Environment: {}", config.environment);

    let ctx = Arc::new(SyncContext::new());

    let (wallet_tx, wallet_rx) = mpsc::channel(SYNC_CHANNEL_BUFFER);
    let (pending_tx, pending_rx) = mpsc::channel(SYNC_CHANNEL_BUFFER);
    let (pow_tx, pow_rx) = mpsc::channel(SYNC_CHANNEL_BUFFER);

    tokio::spawn(run_wallet_listener(ctx.clone(), wallet_rx));
    tokio::spawn(run_pending_listener(ctx.clone(), pending_rx));
    tokio::spawn(run_pow_listener(ctx.clone(), pow_rx));

    let signer = SignerGatewayClient::new(Url::parse(&config.signer_gateway_url)?);

    let mut handles: Vec<WorkerHandle> = Vec::new();

    let btc_token = TokenId::new("BTC");
    let btc_account = account_for(&ctx, &signer, &btc_token, "bitcoin", config.btc_address.as_ref()).await;
    if let Some(account) = &btc_account {
        let client = EsploraClient::new(Url::parse(&config.esplora_api_url)?);
        handles.push(WorkerHandle::start(
            WalletPoller::new("btc-wallet", btc_token, account.clone(), client, wallet_tx.clone()),
            Duration::from_secs(config.btc_interval_secs),
        ));
    }

    let eth_token = TokenId::new("ETH");
    let eth_account = account_for(&ctx, &signer, &eth_token, "ethereum", config.eth_address.as_ref()).await;
    if let Some(account) = &eth_account {
        let index = config
            .eth_index_api_url
            .as_deref()
            .map(Url::parse)
            .transpose()?;
        let client = EthClient::new(Url::parse(&config.eth_rpc_url)?, index);
        handles.push(WorkerHandle::start(
            WalletPoller::new("eth-wallet", eth_token, account.clone(), client, wallet_tx.clone()),
            Duration::from_secs(config.eth_interval_secs),
        ));
    }

    let sol_token = TokenId::new("SOL");
    if let Some(account) =
        account_for(&ctx, &signer, &sol_token, "solana", config.sol_address.as_ref()).await
    {
        let client = SolanaRpcClient::new(Url::parse(&config.sol_rpc_url)?);
        handles.push(WorkerHandle::start(
            WalletPoller::new("sol-wallet", sol_token, account, client, wallet_tx.clone()),
            Duration::from_secs(config.sol_interval_secs),
        ));
    }

    if let Some(account) = &config.icp_account {
        let client = IcpIndexClient::new(Url::parse(&config.icp_index_url)?);
        handles.push(WorkerHandle::start(
            WalletPoller::new(
                "icp-wallet",
                TokenId::new("ICP"),
                account.clone(),
                client,
                wallet_tx.clone(),
            ),
            Duration::from_secs(config.icp_interval_secs),
        ));
    }

    if let Some(account) = &config.icrc_account {
        let index = config
            .icrc_index_url
            .as_deref()
            .map(Url::parse)
            .transpose()?;
        let client = IcrcClient::new(Url::parse(&config.icrc_ledger_url)?, index);
        handles.push(WorkerHandle::start(
            WalletPoller::new(
                "icrc-wallet",
                TokenId::new("ICRC"),
                account.clone(),
                client,
                wallet_tx.clone(),
            ),
            Duration::from_secs(config.icrc_interval_secs),
        ));
    }

    // One minter gateway serves both pending-event pollers.
    let minter = Arc::new(MinterGatewayClient::new(Url::parse(
        &config.minter_gateway_url,
    )?));
    if let Some(account) = btc_account {
        handles.push(WorkerHandle::start(
            PendingPoller::new(
                TokenId::new("ckBTC"),
                account,
                TwinKind::CkBtc,
                minter.clone(),
                minter.clone(),
                pending_tx.clone(),
            ),
            Duration::from_secs(config.pending_interval_secs),
        ));
    }
    if let Some(account) = eth_account {
        handles.push(WorkerHandle::start(
            PendingPoller::new(
                TokenId::new("ckETH"),
                account,
                TwinKind::CkEth,
                minter.clone(),
                minter,
                pending_tx.clone(),
            ),
            Duration::from_secs(config.pending_interval_secs),
        ));
    }

    let pow_client = MinterGatewayClient::new(Url::parse(&config.pow_gateway_url)?);
    handles.push(WorkerHandle::start(
        PowWorker::new(
            pow_client,
            Duration::from_secs(config.pow_interval_secs),
            pow_tx,
        ),
        Duration::from_secs(config.pow_interval_secs),
    ));

    tracing::info!(pollers = handles.len(), "Sync engine running; Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down pollers");
    for handle in handles {
        handle.stop().await;
    }
    Ok(())
}
