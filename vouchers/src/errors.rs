use crate::types::ChainId;
use providers::UpstreamError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RefreshError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("Chain `{0}` is not supported")]
    UnsupportedChain(ChainId),
    #[error("Wallet is not on a known chain")]
    UnknownWalletChain,
    #[error("No wallet connected")]
    WalletNotConnected,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value `{value}` for `{var}`: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}
