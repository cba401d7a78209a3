use crate::UpstreamError;
use web3::{
    transports::Http,
    types::{Address, U256},
    Web3,
};

const ETHER_DECIMALS: usize = 18;

/// Formats a raw integer amount scaled by `decimals` as a plain decimal string.
/// Always keeps at least one fractional digit, e.g. `1.0` or `0.000123`.
pub fn format_units(value: U256, decimals: usize) -> String {
    if decimals == 0 {
        return format!("{value}.0");
    }

    let base = U256::exp10(decimals);
    let whole = value / base;
    let frac = format!("{:0>width$}", (value % base).to_string(), width = decimals);
    let frac = frac.trim_end_matches('0');

    format!("{whole}.{}", if frac.is_empty() { "0" } else { frac })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcAccount {
    pub address: Address,
    pub chain_id: u64,
    pub native_balance: String,
}

/// Reads account details of a connected wallet over EVM JSON-RPC.
pub struct RpcWalletReader {
    web3: Web3<Http>,
}

impl RpcWalletReader {
    pub fn new(rpc_url: &str) -> Result<Self, UpstreamError> {
        Ok(Self {
            web3: Web3::new(Http::new(rpc_url)?),
        })
    }

    pub async fn chain_id(&self) -> Result<u64, UpstreamError> {
        Ok(self.web3.eth().chain_id().await?.low_u64())
    }

    pub async fn native_balance(&self, address: Address) -> Result<String, UpstreamError> {
        let wei = self.web3.eth().balance(address, None).await?;

        Ok(format_units(wei, ETHER_DECIMALS))
    }

    pub async fn account(&self, address: Address) -> Result<RpcAccount, UpstreamError> {
        let (chain_id, native_balance) =
            futures::try_join!(self.chain_id(), self.native_balance(address))?;

        Ok(RpcAccount {
            address,
            chain_id,
            native_balance,
        })
    }
}
