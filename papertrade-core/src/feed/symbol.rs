//! Symbol naming and normalization
//!
//! Trades are recorded against user-facing identifiers (`"BTC/USDT"`,
//! `"$ATOM"`, `"ETH"`) while the exchange subscribes streams by lowercase
//! concatenated pair (`btcusdt@trade`). The functions here translate in
//! both directions.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Quote currency appended when a symbol names only a base asset.
pub const DEFAULT_QUOTE: &str = "usdt";

/// Stream-type suffix for trade streams.
pub const TRADE_STREAM: &str = "@trade";

/// User-facing instrument identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lowercase concatenated pair for a symbol: leading `$` stripped, `/`
/// removed, default quote appended when absent.
pub fn pair_code(symbol: &Symbol) -> String {
    let raw = symbol.as_str().trim();
    let raw = raw.strip_prefix('$').unwrap_or(raw);
    let mut code: String = raw
        .chars()
        .filter(|c| *c != '/')
        .collect::<String>()
        .to_lowercase();
    if !code.ends_with(DEFAULT_QUOTE) {
        code.push_str(DEFAULT_QUOTE);
    }
    code
}

/// Full stream name for a symbol's trade stream.
pub fn stream_name(symbol: &Symbol) -> String {
    format!("{}{}", pair_code(symbol), TRADE_STREAM)
}

/// Resolve a wire-level symbol back to the subscribed symbol it came from.
///
/// The wire symbol arrives in the exchange's casing (`"BTCUSDT"`); matching
/// is case-insensitive. Returns the first candidate whose pair code matches,
/// so when two inputs normalize to the same pair the earlier one wins.
pub fn match_wire_symbol<'a>(wire: &str, candidates: &'a [Symbol]) -> Option<&'a Symbol> {
    let wire = wire.to_lowercase();
    candidates.iter().find(|candidate| pair_code(candidate) == wire)
}

/// Order-independent identity of a subscription set: the sorted,
/// de-duplicated stream names joined by the multiplex separator.
pub fn canonical_topic_key(symbols: &[Symbol]) -> String {
    let topics: BTreeSet<String> = symbols.iter().map(stream_name).collect();
    topics.into_iter().collect::<Vec<_>>().join("/")
}

/// De-duplicate symbols preserving first occurrence. Wire-symbol resolution
/// is first-match, so input order decides the winner for symbols that
/// normalize to the same pair.
pub fn dedup_symbols(symbols: &[Symbol]) -> Vec<Symbol> {
    let mut seen = HashSet::new();
    symbols
        .iter()
        .filter(|s| seen.insert((*s).clone()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_code_strips_marker_and_separator() {
        assert_eq!(pair_code(&Symbol::new("BTC/USDT")), "btcusdt");
        assert_eq!(pair_code(&Symbol::new("btc/usdt")), "btcusdt");
        assert_eq!(pair_code(&Symbol::new("$ATOM")), "atomusdt");
        assert_eq!(pair_code(&Symbol::new("ETH")), "ethusdt");
    }

    #[test]
    fn pair_code_is_lowercase_suffixed_and_clean() {
        for raw in ["BTC/USDT", "$ATOM", "ETH", "sol", "$doge/usdt"] {
            let code = pair_code(&Symbol::new(raw));
            assert_eq!(code, code.to_lowercase());
            assert!(!code.contains('/'));
            assert!(!code.starts_with('$'));
            assert!(code.ends_with(DEFAULT_QUOTE));
        }
    }

    #[test]
    fn stream_name_appends_trade_suffix() {
        assert_eq!(stream_name(&Symbol::new("BTC/USDT")), "btcusdt@trade");
    }

    #[test]
    fn wire_symbol_matching_is_case_insensitive() {
        let candidates = vec![Symbol::new("BTC/USDT"), Symbol::new("ETH")];
        assert_eq!(
            match_wire_symbol("BTCUSDT", &candidates),
            Some(&candidates[0])
        );
        assert_eq!(
            match_wire_symbol("ethusdt", &candidates),
            Some(&candidates[1])
        );
        assert_eq!(match_wire_symbol("SOLUSDT", &candidates), None);
    }

    #[test]
    fn first_candidate_wins_for_colliding_pairs() {
        // "ETH" and "ETH/USDT" both normalize to ethusdt.
        let candidates = vec![Symbol::new("ETH"), Symbol::new("ETH/USDT")];
        assert_eq!(
            match_wire_symbol("ETHUSDT", &candidates),
            Some(&candidates[0])
        );
    }

    #[test]
    fn topic_key_is_order_independent_and_deduplicated() {
        let a = Symbol::new("BTC/USDT");
        let b = Symbol::new("ETH");
        let key = canonical_topic_key(&[a.clone(), b.clone()]);
        assert_eq!(key, "btcusdt@trade/ethusdt@trade");
        assert_eq!(canonical_topic_key(&[b.clone(), a.clone()]), key);
        assert_eq!(canonical_topic_key(&[a.clone(), b.clone(), a.clone()]), key);
        assert_eq!(canonical_topic_key(&[]), "");
    }

    #[test]
    fn dedup_preserves_first_occurrence_order() {
        let symbols = vec![
            Symbol::new("ETH"),
            Symbol::new("BTC/USDT"),
            Symbol::new("ETH"),
        ];
        assert_eq!(
            dedup_symbols(&symbols),
            vec![Symbol::new("ETH"), Symbol::new("BTC/USDT")]
        );
    }
}
