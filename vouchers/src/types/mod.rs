use serde::Serialize;
use serde_with::skip_serializing_none;

pub use providers::{Address, ChainRegistryEntry, Pagination, RawBalanceRecord};

pub type ChainId = u64;
pub type Amount = f64;

/// USD value reported for every token until a price feed is wired in.
pub const UNPRICED_USD_VALUE: &str = "0";

#[derive(Serialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum BalanceStatus {
    Success,
    Error,
    Loading,
}

#[derive(Serialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub symbol: String,
    #[serde(rename = "balance")]
    pub raw_amount: String,
    pub decimals: u8,
    pub usd_value: String,
}

#[skip_serializing_none]
#[derive(Serialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChainBalance {
    #[serde(rename = "chain")]
    pub chain_name: String,
    pub chain_id: ChainId,
    pub status: BalanceStatus,
    pub tokens: Vec<TokenBalance>,
    pub error_message: Option<String>,
}

impl ChainBalance {
    pub fn success(chain_name: String, chain_id: ChainId, tokens: Vec<TokenBalance>) -> Self {
        Self {
            chain_name,
            chain_id,
            status: BalanceStatus::Success,
            tokens,
            error_message: None,
        }
    }

    pub fn loading(chain_name: String, chain_id: ChainId) -> Self {
        Self {
            chain_name,
            chain_id,
            status: BalanceStatus::Loading,
            tokens: vec![],
            error_message: None,
        }
    }

    pub fn failed(chain_name: String, chain_id: ChainId, message: impl Into<String>) -> Self {
        Self {
            chain_name,
            chain_id,
            status: BalanceStatus::Error,
            tokens: vec![],
            error_message: Some(message.into()),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.tokens.is_empty()
    }
}

#[derive(Serialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total_balance_usd: Amount,
    pub unique_token_count: usize,
    pub active_chain_count: usize,
}
