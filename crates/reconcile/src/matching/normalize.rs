use lpscope_domain::TokenPair;

/// Symbol variants that collapse onto another symbol, keyed by uppercase
/// variant. No target appears as a key and no target ends in `0`.
const SYMBOL_ALIASES: &[(&str, &str)] = &[
    // Wrapped
    ("WETH", "ETH"),
    ("WSOL", "SOL"),
    ("WBTC", "BTC"),
    ("CBBTC", "BTC"),
    ("WBNB", "BNB"),
    ("WAVAX", "AVAX"),
    ("WHYPE", "HYPE"),
    // Staked
    ("STETH", "ETH"),
    ("WSTETH", "ETH"),
    ("MSOL", "SOL"),
    ("JITOSOL", "SOL"),
    ("BSOL", "SOL"),
    // Bridged
    ("USDC.E", "USDC"),
    ("USDBC", "USDC"),
    ("USDT.E", "USDT"),
    // OCR confusables
    ("JPL", "JLP"),
    ("USCD", "USDC"),
    ("UDSC", "USDC"),
    ("S0L", "SOL"),
    ("ETM", "ETH"),
];

/// Normalizes a single symbol: trim, uppercase, drop a trailing run of `0`
/// characters, then apply the alias table.
///
/// A symbol made only of zeros is kept as is.
pub fn canonical_symbol(symbol: &str) -> String {
    let upper = symbol.trim().to_uppercase();
    let stripped = upper.trim_end_matches(|c: char| c == '0' || c.is_whitespace());
    let stripped = if stripped.is_empty() {
        upper.as_str()
    } else {
        stripped
    };

    SYMBOL_ALIASES
        .iter()
        .find(|(variant, _)| *variant == stripped)
        .map_or_else(|| stripped.to_string(), |(_, base)| (*base).to_string())
}

/// Normalizes a pair label into `TOKEN0/TOKEN1` form.
///
/// A label without a separator normalizes to its trimmed, uppercased self.
pub fn normalize(label: &str) -> String {
    let upper = label.trim().to_uppercase();
    match TokenPair::split(&upper) {
        Some(pair) => TokenPair::new(
            canonical_symbol(&pair.token0),
            canonical_symbol(&pair.token1),
        )
        .to_string(),
        None => upper,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_trailing_zero_artifact() {
        assert_eq!(normalize("SOL/USDC0"), "SOL/USDC");
        assert_eq!(normalize("sol/usdc000"), "SOL/USDC");
        assert_eq!(normalize(" SOL / USDC "), "SOL/USDC");
    }

    #[test]
    fn test_aliases() {
        assert_eq!(normalize("JPL/USDC"), "JLP/USDC");
        assert_eq!(normalize("WETH/USDC"), "ETH/USDC");
        assert_eq!(normalize("cbBTC/USDC"), "BTC/USDC");
        assert_eq!(normalize("mSOL/USDC.e"), "SOL/USDC");
        assert_eq!(normalize("S0L/USDC"), "SOL/USDC");
    }

    #[test]
    fn test_zero_only_symbol_is_kept() {
        assert_eq!(canonical_symbol("000"), "000");
        assert_eq!(canonical_symbol("A 0 0"), "A");
    }

    #[test]
    fn test_label_without_separator() {
        assert_eq!(normalize("  jlp0 "), "JLP0");
        assert_eq!(normalize("hyperliquid"), "HYPERLIQUID");
    }

    #[test]
    fn test_alias_targets_are_fixed_points() {
        for (_, base) in SYMBOL_ALIASES {
            assert_eq!(canonical_symbol(base), *base);
        }
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(label in "[ a-zA-Z0-9./]{0,16}") {
            let once = normalize(&label);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_normalize_is_case_insensitive(label in "[a-zA-Z0-9/]{0,12}") {
            prop_assert_eq!(normalize(&label.to_lowercase()), normalize(&label.to_uppercase()));
        }
    }
}
