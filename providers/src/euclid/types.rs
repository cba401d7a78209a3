use crate::{ChainRegistryEntry, RawBalanceRecord, UpstreamError};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_string_from_number;
use serde_json::Value;
use std::collections::HashSet;

#[derive(Serialize, Debug)]
pub struct GraphQlRequest<'a, V> {
    pub query: &'a str,
    pub variables: V,
}

#[derive(Deserialize, Debug)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Deserialize, Debug)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

impl<T> GraphQlResponse<T> {
    pub fn into_data(self) -> Result<T, UpstreamError> {
        if !self.errors.is_empty() {
            return Err(UpstreamError::GraphQl(
                self.errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        self.data
            .ok_or_else(|| UpstreamError::MalformedResponse("missing `data`".into()))
    }
}

#[derive(Deserialize, Debug)]
pub struct RouterStateData {
    pub router: Router,
}

#[derive(Deserialize, Debug)]
pub struct Router {
    pub state: RouterState,
}

#[derive(Deserialize, Debug)]
pub struct RouterState {
    pub virtual_balance_address: String,
}

#[derive(Deserialize, Debug)]
pub struct AllChainsData {
    pub chains: Chains,
}

#[derive(Deserialize, Debug)]
pub struct Chains {
    pub all_chains: Vec<ChainInfo>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ChainInfo {
    pub chain_id: String,
    pub chain_uid: String,
    pub display_name: String,
}

/// Keeps the EVM chains (numeric chain id) and collapses repeated ids.
pub fn evm_chains(chains: Vec<ChainInfo>) -> Vec<ChainRegistryEntry> {
    let mut seen = HashSet::new();

    chains
        .into_iter()
        .filter_map(|chain| {
            let chain_id = chain.chain_id.trim().parse::<u64>().ok()?;

            seen.insert(chain_id).then(|| ChainRegistryEntry {
                chain_id,
                display_name: chain.display_name,
                chain_uid: chain.chain_uid,
            })
        })
        .collect()
}

#[derive(Deserialize, Debug)]
pub struct MulticallData {
    pub cw_multicall: CwMulticall,
}

#[derive(Deserialize, Debug)]
pub struct CwMulticall {
    pub smart_queries: SmartQueries,
}

#[derive(Deserialize, Debug)]
pub struct SmartQueries {
    pub results: Vec<SmartQueryResult>,
}

#[derive(Deserialize, Debug)]
pub struct SmartQueryResult {
    pub data: Value,
}

#[derive(Deserialize, Debug)]
pub struct UserBalances {
    pub balances: Vec<UserBalance>,
}

#[derive(Deserialize, Debug)]
pub struct UserBalance {
    pub chain_uid: String,
    #[serde(alias = "denom")]
    pub token_id: String,
    #[serde(deserialize_with = "deserialize_string_from_number")]
    pub amount: String,
}

impl From<UserBalance> for RawBalanceRecord {
    fn from(balance: UserBalance) -> Self {
        Self {
            chain_uid: balance.chain_uid,
            denom: balance.token_id,
            amount: balance.amount,
        }
    }
}

/// Smart query results arrive either as JSON objects or as JSON encoded strings.
pub fn user_balances(data: MulticallData) -> Result<Vec<RawBalanceRecord>, UpstreamError> {
    let mut records = vec![];

    for result in data.cw_multicall.smart_queries.results {
        let value = match result.data {
            Value::String(raw) => serde_json::from_str(&raw)
                .map_err(|e| UpstreamError::MalformedResponse(e.to_string()))?,
            value => value,
        };

        let value = match value {
            Value::Object(mut map) if map.contains_key("get_user_balances") => {
                map.remove("get_user_balances").unwrap_or_default()
            }
            value => value,
        };

        let balances: UserBalances = serde_json::from_value(value)
            .map_err(|e| UpstreamError::MalformedResponse(e.to_string()))?;

        records.extend(balances.balances.into_iter().map(RawBalanceRecord::from));
    }

    Ok(records)
}
