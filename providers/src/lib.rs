pub mod errors;
pub mod euclid;
pub mod evm;

use async_trait::async_trait;
use serde::Serialize;

pub use errors::UpstreamError;
pub use euclid::EuclidClient;
pub use evm::{RpcAccount, RpcWalletReader};
pub use web3::types::{Address, U256};

/// A chain the balance source knows about.
#[derive(Serialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChainRegistryEntry {
    pub chain_id: u64,
    pub display_name: String,
    pub chain_uid: String,
}

/// One token balance as reported by the balance source, unscaled.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RawBalanceRecord {
    pub chain_uid: String,
    pub denom: String,
    pub amount: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Pagination {
    pub skip: u32,
    pub limit: u32,
}

impl Pagination {
    pub fn first(limit: u32) -> Self {
        Self { skip: 0, limit }
    }

    pub fn next(self) -> Self {
        Self {
            skip: self.skip.saturating_add(self.limit),
            limit: self.limit,
        }
    }
}

#[async_trait]
pub trait ChainRegistry: Send + Sync {
    async fn list_chains(&self) -> Result<Vec<ChainRegistryEntry>, UpstreamError>;

    async fn get_router_address(&self) -> Result<String, UpstreamError>;
}

#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn query_balances(
        &self,
        contract_address: &str,
        chain_uid: &str,
        wallet_address: &str,
        pagination: Pagination,
    ) -> Result<Vec<RawBalanceRecord>, UpstreamError>;
}

#[macro_export]
macro_rules! address {
    ($addr:expr) => {{
        use std::str::FromStr;
        $crate::Address::from_str($addr).expect(&format!("Invalid address {}", $addr))
    }};
}

#[cfg(test)]
mod test {
    use super::Pagination;

    #[test]
    fn pages_advance_by_limit_and_saturate() {
        let page = Pagination::first(10).next().next();
        assert_eq!(page, Pagination { skip: 20, limit: 10 });

        let last = Pagination {
            skip: u32::MAX - 5,
            limit: u32::MAX,
        };
        assert_eq!(last.next().skip, u32::MAX);
    }
}
