use crate::{aggregator::UnknownChainPolicy, errors::ConfigError};
use providers::euclid::DEFAULT_ENDPOINT;
use std::{str::FromStr, time::Duration};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_MAX_PAGES: u32 = 50;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct Config {
    pub graphql_endpoint: String,
    pub refresh_interval: Duration,
    pub page_size: u32,
    pub max_pages: u32,
    pub fetch_timeout: Option<Duration>,
    pub unknown_chains: UnknownChainPolicy,
    pub evm_rpc_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            graphql_endpoint: DEFAULT_ENDPOINT.into(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            fetch_timeout: Some(DEFAULT_FETCH_TIMEOUT),
            unknown_chains: UnknownChainPolicy::Drop,
            evm_rpc_url: None,
        }
    }
}

fn parse_var<T>(
    var: &'static str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                var,
                reason: e.to_string(),
                value,
            }),
    }
}

fn positive(var: &'static str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: "must be greater than zero".into(),
        })
    } else {
        Ok(value)
    }
}

impl Config {
    /// Reads the configuration from the environment, `.env` included.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let refresh_interval = match parse_var::<u64>("REFRESH_INTERVAL_SECS", &lookup)? {
            Some(secs) => Duration::from_secs(positive("REFRESH_INTERVAL_SECS", secs)?),
            None => defaults.refresh_interval,
        };
        let page_size = match parse_var::<u32>("BALANCES_PAGE_SIZE", &lookup)? {
            Some(size) => positive("BALANCES_PAGE_SIZE", size.into())? as u32,
            None => defaults.page_size,
        };
        let max_pages = match parse_var::<u32>("BALANCES_MAX_PAGES", &lookup)? {
            Some(pages) => positive("BALANCES_MAX_PAGES", pages.into())? as u32,
            None => defaults.max_pages,
        };
        // zero disables the timeout
        let fetch_timeout = match parse_var::<u64>("FETCH_TIMEOUT_SECS", &lookup)? {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.fetch_timeout,
        };

        Ok(Self {
            graphql_endpoint: lookup("EUCLID_GRAPHQL_ENDPOINT")
                .unwrap_or(defaults.graphql_endpoint),
            refresh_interval,
            page_size,
            max_pages,
            fetch_timeout,
            unknown_chains: parse_var("UNKNOWN_CHAIN_POLICY", &lookup)?
                .unwrap_or(defaults.unknown_chains),
            evm_rpc_url: lookup("EVM_RPC_URL").filter(|url| !url.is_empty()),
        })
    }
}
