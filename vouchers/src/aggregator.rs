use crate::types::{
    AggregateStats, Amount, ChainBalance, ChainRegistryEntry, RawBalanceRecord, TokenBalance,
    UNPRICED_USD_VALUE,
};
use std::collections::{HashMap, HashSet};

/// Voucher balances carry no decimals of their own.
pub const DEFAULT_DECIMALS: u8 = 18;

/// What to do with balance records whose chain uid matches no listed chain.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum UnknownChainPolicy {
    #[default]
    Drop,
    Warn,
}

impl std::str::FromStr for UnknownChainPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "warn" => Ok(Self::Warn),
            other => Err(format!("unknown chain policy `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceAggregator {
    unknown_chains: UnknownChainPolicy,
}

impl BalanceAggregator {
    pub fn new(unknown_chains: UnknownChainPolicy) -> Self {
        Self { unknown_chains }
    }

    /// Groups `raw_balances` under the chain they belong to. Every chain in
    /// `chains` yields exactly one successful entry, in input order, even when
    /// no record matches it. A repeated chain id keeps its first entry.
    pub fn aggregate(
        &self,
        chains: &[ChainRegistryEntry],
        raw_balances: Vec<RawBalanceRecord>,
    ) -> Vec<ChainBalance> {
        let mut groups: HashMap<String, Vec<TokenBalance>> = HashMap::new();

        for record in raw_balances {
            groups
                .entry(record.chain_uid)
                .or_default()
                .push(TokenBalance {
                    symbol: record.denom,
                    raw_amount: record.amount,
                    decimals: DEFAULT_DECIMALS,
                    usd_value: UNPRICED_USD_VALUE.into(),
                });
        }

        let mut seen = HashSet::new();
        let mut snapshot = Vec::with_capacity(chains.len());

        for chain in chains {
            if !seen.insert(chain.chain_id) {
                log::warn!(
                    "chain id {} listed twice, ignoring `{}`",
                    chain.chain_id,
                    chain.chain_uid
                );
                continue;
            }

            let tokens = groups.remove(&chain.chain_uid).unwrap_or_default();
            snapshot.push(ChainBalance::success(
                chain.display_name.clone(),
                chain.chain_id,
                tokens,
            ));
        }

        if self.unknown_chains == UnknownChainPolicy::Warn {
            for (chain_uid, tokens) in groups.iter() {
                log::warn!(
                    "dropped {} balance record(s) of unknown chain `{chain_uid}`",
                    tokens.len()
                );
            }
        }

        snapshot
    }
}

/// Parses a display USD value such as `1,234.50`. Anything that is not a
/// finite number counts as zero.
pub fn parse_usd(value: &str) -> Amount {
    value
        .replace(',', "")
        .trim()
        .parse::<Amount>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or_default()
}

pub fn compute_stats(chains: &[ChainBalance]) -> AggregateStats {
    let mut symbols = HashSet::new();
    let mut total_balance_usd = 0.0;

    for token in chains.iter().flat_map(|chain| chain.tokens.iter()) {
        symbols.insert(token.symbol.as_str());
        total_balance_usd += parse_usd(&token.usd_value);
    }

    AggregateStats {
        total_balance_usd,
        unique_token_count: symbols.len(),
        active_chain_count: chains.iter().filter(|c| c.is_active()).count(),
    }
}

#[cfg(test)]
mod test {
    use super::{compute_stats, parse_usd, BalanceAggregator, UnknownChainPolicy};
    use crate::types::{
        AggregateStats, BalanceStatus, ChainBalance, ChainRegistryEntry, RawBalanceRecord,
        TokenBalance,
    };
    use std::collections::HashSet;

    fn chain(chain_id: u64, chain_uid: &str) -> ChainRegistryEntry {
        ChainRegistryEntry {
            chain_id,
            display_name: chain_uid.to_uppercase(),
            chain_uid: chain_uid.into(),
        }
    }

    fn record(chain_uid: &str, denom: &str, amount: &str) -> RawBalanceRecord {
        RawBalanceRecord {
            chain_uid: chain_uid.into(),
            denom: denom.into(),
            amount: amount.into(),
        }
    }

    fn token(symbol: &str, usd_value: &str) -> TokenBalance {
        TokenBalance {
            symbol: symbol.into(),
            raw_amount: "1".into(),
            decimals: 6,
            usd_value: usd_value.into(),
        }
    }

    #[test]
    fn eth_and_polygon_example() {
        let chains = vec![chain(1, "eth"), chain(137, "polygon")];
        let raw = vec![record("eth", "USDC", "100")];

        let snapshot = BalanceAggregator::default().aggregate(&chains, raw);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].chain_id, 1);
        assert_eq!(snapshot[0].status, BalanceStatus::Success);
        assert_eq!(snapshot[0].tokens.len(), 1);
        assert_eq!(snapshot[0].tokens[0].symbol, "USDC");
        assert_eq!(snapshot[0].tokens[0].raw_amount, "100");
        assert_eq!(snapshot[0].tokens[0].usd_value, "0");
        assert_eq!(snapshot[1].chain_id, 137);
        assert!(snapshot[1].tokens.is_empty());

        assert_eq!(
            compute_stats(&snapshot),
            AggregateStats {
                total_balance_usd: 0.0,
                unique_token_count: 1,
                active_chain_count: 1,
            }
        );
    }

    #[test]
    fn one_entry_per_chain_whatever_the_records() {
        let chains: Vec<_> = (1..=5).map(|i| chain(i, &format!("c{i}"))).collect();
        let aggregator = BalanceAggregator::default();

        for records in [0, 1, 7, 40] {
            let raw = (0..records)
                .map(|i| record(&format!("c{}", i % 9), &format!("T{}", i % 3), "5"))
                .collect();

            let snapshot = aggregator.aggregate(&chains, raw);
            let ids: HashSet<_> = snapshot.iter().map(|c| c.chain_id).collect();

            assert_eq!(snapshot.len(), chains.len());
            assert_eq!(ids.len(), chains.len());
            assert!(snapshot
                .iter()
                .all(|c| c.status == BalanceStatus::Success && c.error_message.is_none()));
        }
    }

    #[test]
    fn record_order_is_kept_within_a_chain() {
        let chains = vec![chain(10, "optimism")];
        let raw = vec![
            record("optimism", "WETH", "3"),
            record("optimism", "EURC", "1"),
            record("optimism", "USDC", "2"),
        ];

        let snapshot = BalanceAggregator::default().aggregate(&chains, raw);

        assert_eq!(
            snapshot[0]
                .tokens
                .iter()
                .map(|t| t.symbol.as_str())
                .collect::<Vec<_>>(),
            vec!["WETH", "EURC", "USDC"]
        );
    }

    #[test]
    fn unknown_chain_records_are_dropped() {
        let chains = vec![chain(1, "eth")];
        let raw = vec![record("solana", "SOL", "9"), record("eth", "USDC", "1")];

        for policy in [UnknownChainPolicy::Drop, UnknownChainPolicy::Warn] {
            let snapshot = BalanceAggregator::new(policy).aggregate(&chains, raw.clone());

            assert_eq!(snapshot.len(), 1);
            assert_eq!(snapshot[0].tokens.len(), 1);
            assert_eq!(snapshot[0].tokens[0].symbol, "USDC");
        }
    }

    #[test]
    fn repeated_chain_id_keeps_first_entry() {
        let chains = vec![chain(1, "eth"), chain(1, "eth-dup")];

        let snapshot = BalanceAggregator::default().aggregate(&chains, vec![]);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].chain_name, "ETH");
    }

    #[test]
    fn policy_from_str() {
        assert_eq!("drop".parse::<UnknownChainPolicy>(), Ok(UnknownChainPolicy::Drop));
        assert_eq!(" WARN ".parse::<UnknownChainPolicy>(), Ok(UnknownChainPolicy::Warn));
        assert!("keep".parse::<UnknownChainPolicy>().is_err());
    }

    #[test]
    fn usd_parsing() {
        assert_eq!(parse_usd("1,234.50"), 1234.5);
        assert_eq!(parse_usd("0"), 0.0);
        assert_eq!(parse_usd("not-a-number"), 0.0);
        assert_eq!(parse_usd("NaN"), 0.0);
        assert_eq!(parse_usd("inf"), 0.0);
        assert_eq!(parse_usd(""), 0.0);
    }

    #[test]
    fn stats_of_empty_snapshot() {
        assert_eq!(compute_stats(&[]), AggregateStats::default());
    }

    #[test]
    fn stats_are_resilient_and_repeatable() {
        let chains = vec![
            ChainBalance::success(
                "Ethereum".into(),
                1,
                vec![token("EURC", "1,234.50"), token("USDC", "not-a-number")],
            ),
            ChainBalance::success(
                "Polygon".into(),
                137,
                vec![token("EURC", "2,500.00"), token("USDC", "3,200.00")],
            ),
            ChainBalance::success("Base".into(), 8453, vec![]),
            ChainBalance::failed("Arbitrum".into(), 42161, "down"),
        ];

        let first = compute_stats(&chains);

        assert_eq!(first.total_balance_usd, 6934.5);
        assert_eq!(first.unique_token_count, 2);
        assert_eq!(first.active_chain_count, 2);
        assert_eq!(compute_stats(&chains), first);
    }
}
