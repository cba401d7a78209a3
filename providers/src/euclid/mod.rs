pub mod types;

use crate::{
    euclid::types::{
        evm_chains, user_balances, AllChainsData, GraphQlRequest, GraphQlResponse, MulticallData,
        RouterStateData,
    },
    BalanceSource, ChainRegistry, ChainRegistryEntry, Pagination, RawBalanceRecord,
    UpstreamError,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;

// Euclid
pub const DEFAULT_ENDPOINT: &str = "https://testnet.api.euclidprotocol.com/graphql";
const HUB_CHAIN_UID: &str = "neuron";

const ROUTER_STATE: &str = "query RouterState {
  router {
    state {
      virtual_balance_address
    }
  }
}";

const ALL_CHAINS: &str = "query AllChains($show_all_chains: Boolean) {
  chains {
    all_chains(show_all_chains: $show_all_chains) {
      chain_id
      chain_uid
      display_name
    }
  }
}";

const SMART_QUERIES: &str = "query SmartQueries($chain_uid: String!, $queries: [CwMulticallQuery!]!) {
  cw_multicall(chain_uid: $chain_uid) {
    smart_queries(queries: $queries) {
      results {
        data
      }
    }
  }
}";

lazy_static::lazy_static! {
    static ref CLIENT: reqwest::Client = reqwest::Client::new();
}

pub struct EuclidClient {
    endpoint: String,
}

impl Default for EuclidClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl EuclidClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute<V, T>(&self, query: &str, variables: V) -> Result<T, UpstreamError>
    where
        V: Serialize + Send,
        T: DeserializeOwned + Send,
    {
        let res = CLIENT
            .post(&self.endpoint)
            .json(&GraphQlRequest { query, variables })
            .send()
            .await?;

        let status = res.status();

        match status {
            StatusCode::OK => res.json::<GraphQlResponse<T>>().await?.into_data(),
            StatusCode::BAD_REQUEST => Err(UpstreamError::InvalidRequest(self.endpoint.clone())),
            StatusCode::TOO_MANY_REQUESTS => Err(UpstreamError::TooManyRequests),
            _ => Err(UpstreamError::Unknown(status.as_u16())),
        }
    }
}

#[async_trait]
impl ChainRegistry for EuclidClient {
    async fn list_chains(&self) -> Result<Vec<ChainRegistryEntry>, UpstreamError> {
        let data: AllChainsData = self
            .execute(ALL_CHAINS, json!({ "show_all_chains": true }))
            .await?;

        let chains = evm_chains(data.chains.all_chains);
        log::debug!("{} EVM chains listed by {}", chains.len(), self.endpoint);

        Ok(chains)
    }

    async fn get_router_address(&self) -> Result<String, UpstreamError> {
        let data: RouterStateData = self.execute(ROUTER_STATE, json!({})).await?;

        Ok(data.router.state.virtual_balance_address)
    }
}

#[async_trait]
impl BalanceSource for EuclidClient {
    async fn query_balances(
        &self,
        contract_address: &str,
        chain_uid: &str,
        wallet_address: &str,
        pagination: Pagination,
    ) -> Result<Vec<RawBalanceRecord>, UpstreamError> {
        let variables = json!({
            "chain_uid": HUB_CHAIN_UID,
            "queries": [{
                "contract_address": contract_address,
                "msg": {
                    "get_user_balances": {
                        "user": {
                            "chain_uid": chain_uid,
                            "address": wallet_address,
                        },
                        "pagination": {
                            "skip": pagination.skip,
                            "limit": pagination.limit,
                        },
                    },
                },
            }],
        });

        let data: MulticallData = self.execute(SMART_QUERIES, variables).await?;

        user_balances(data)
    }
}

#[cfg(test)]
mod test {
    use crate::{
        euclid::EuclidClient, BalanceSource, ChainRegistry, Pagination, UpstreamError,
    };

    #[tokio::test]
    async fn unreachable_endpoint_is_upstream_error() {
        let client = EuclidClient::new("http://127.0.0.1:9/graphql");

        assert!(matches!(
            client.list_chains().await,
            Err(UpstreamError::RequestFailed(_))
        ));
        assert!(matches!(
            client
                .query_balances("euclid1", "sepolia", "0x0", Pagination::first(10))
                .await,
            Err(UpstreamError::RequestFailed(_))
        ));
    }

    #[tokio::test]
    #[ignore = "hits the Euclid testnet"]
    async fn euclid_router_and_chains() {
        let client = EuclidClient::default();

        assert!(client.get_router_address().await.is_ok());
        assert!(!client.list_chains().await.unwrap().is_empty());
    }
}
