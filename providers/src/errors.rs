use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("{0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Request rejected by `{0}`")]
    InvalidRequest(String),
    #[error("Too many requests, try again later")]
    TooManyRequests,
    #[error("Unexpected response status `{0}`")]
    Unknown(u16),
    #[error("GraphQL error: {}", .0.join("; "))]
    GraphQl(Vec<String>),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error(transparent)]
    Rpc(#[from] web3::Error),
    #[error("No response within {0:?}")]
    Timeout(Duration),
}
