use chrono::{DateTime, Utc};
use providers::{Address, RpcWalletReader, UpstreamError};
use serde::{Deserialize, Serialize};
use vouchers::{
    types::{AggregateStats, ChainBalance, ChainId},
    ControllerState, RefreshController, RefreshPhase, WalletAccount, WalletSession,
};

pub struct AppState {
    pub controller: RefreshController,
    pub session: WalletSession,
    pub rpc: Option<RpcWalletReader>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ConnectWalletRequest {
    pub address: Address,
    pub chain_id: Option<ChainId>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub phase: RefreshPhase,
    pub loading: bool,
    pub chains: Vec<ChainBalance>,
    pub stats: AggregateStats,
    pub last_updated: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub wallet: WalletAccount,
}

impl DashboardView {
    pub fn new(state: ControllerState, wallet: WalletAccount) -> Self {
        Self {
            stats: state.stats(),
            loading: state.is_loading(),
            phase: state.phase,
            chains: state.chains,
            last_updated: state.last_updated,
            error: state.error,
            wallet,
        }
    }
}

pub fn dashboard(app: &AppState) -> DashboardView {
    DashboardView::new(app.controller.state(), app.session.current())
}

/// Connects `request.address`, filling in chain and native balance over RPC
/// when a reader is configured.
pub async fn connect_wallet(
    app: &AppState,
    request: ConnectWalletRequest,
) -> Result<WalletAccount, UpstreamError> {
    let mut account = WalletAccount::new(request.address, request.chain_id);

    if let Some(rpc) = &app.rpc {
        match rpc.account(request.address).await {
            Ok(details) => {
                account.chain_id = request.chain_id.or(Some(details.chain_id));
                account.native_balance = Some(details.native_balance);
            }
            Err(e) if request.chain_id.is_some() => {
                log::warn!("wallet details unavailable: {e}");
            }
            Err(e) => return Err(e),
        }
    }

    app.session.connect(account.clone());

    Ok(account)
}
