use crate::{
    aggregator::compute_stats,
    types::{AggregateStats, ChainBalance},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_with::skip_serializing_none;

#[derive(Serialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum RefreshPhase {
    #[default]
    Idle,
    Fetching,
    Success,
    Failed,
}

/// Everything the presentation layer needs to draw the dashboard.
#[skip_serializing_none]
#[derive(Serialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ControllerState {
    pub phase: RefreshPhase,
    pub chains: Vec<ChainBalance>,
    pub last_updated: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl ControllerState {
    pub fn is_loading(&self) -> bool {
        self.phase == RefreshPhase::Fetching
    }

    pub fn stats(&self) -> AggregateStats {
        compute_stats(&self.chains)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum RefreshOutcome {
    Applied,
    Failed(String),
    /// Superseded by a newer refresh or torn down; nothing was written.
    Cancelled,
}
