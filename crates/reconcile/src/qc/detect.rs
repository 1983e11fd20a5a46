use super::issues::{IssueType, QcIssue};
use crate::matching::normalize;
use lpscope_domain::{PriceRange, Section, Severity, StoredPosition, TokenPair};
use rust_decimal::Decimal;

/// Allowed distance of `p0 + p1` from 100.
pub const PERCENTAGE_TOLERANCE: Decimal = Decimal::from_parts(5, 0, 0, false, 1);
/// Allowed distance of `v0 + v1` from the balance, in the balance's unit.
pub const BALANCE_TOLERANCE: Decimal = Decimal::ONE;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Token names implied by the row's pair.
///
/// Taken from the key pair, which is already normalized, falling back to the
/// raw label.
pub(crate) fn derived_pair(position: &StoredPosition) -> Option<TokenPair> {
    let from_key = TokenPair::split(position.key.pair()).filter(TokenPair::is_complete);
    from_key.or_else(|| {
        TokenPair::split(&normalize(&position.observation.raw_pair_label))
            .filter(TokenPair::is_complete)
    })
}

fn blank(token: &Option<String>) -> bool {
    token.as_deref().is_none_or(|t| t.trim().is_empty())
}

/// Stage 2: every issue found in `positions`, in row order.
pub fn detect(positions: &[StoredPosition]) -> Vec<QcIssue> {
    positions.iter().flat_map(detect_position).collect()
}

/// Issues for a single row.
pub fn detect_position(position: &StoredPosition) -> Vec<QcIssue> {
    let obs = &position.observation;
    let fields = &obs.fields;
    let mut issues = Vec::new();

    if TokenPair::has_separator(&obs.raw_pair_label) && (blank(&obs.token0) || blank(&obs.token1)) {
        issues.push(QcIssue::new(
            IssueType::MissingTokenNames,
            Severity::Warning,
            position,
            format!("pair {:?} has no token names", obs.raw_pair_label),
            true,
        ));
    }

    if let Some(expected) = Section::for_protocol(&obs.protocol) {
        if expected != obs.section {
            issues.push(QcIssue::new(
                IssueType::WrongCategory,
                Severity::Error,
                position,
                format!(
                    "{} belongs under {expected}, filed under {}",
                    obs.protocol, obs.section
                ),
                false,
            ));
        }
    }

    if fields.balance.is_some_and(|b| b > Decimal::ZERO) && !fields.has_token_amounts() {
        issues.push(QcIssue::new(
            IssueType::MissingTokenData,
            Severity::Warning,
            position,
            "positive balance without token amounts",
            false,
        ));
    }

    if let (Some(p0), Some(p1)) = (fields.token0_percentage, fields.token1_percentage) {
        let sum = p0 + p1;
        if (sum - HUNDRED).abs() > PERCENTAGE_TOLERANCE {
            let fixable = match (fields.token0_value, fields.token1_value) {
                (Some(v0), Some(v1)) => v0 + v1 > Decimal::ZERO,
                _ => false,
            };
            issues.push(QcIssue::new(
                IssueType::InvalidPercentages,
                Severity::Warning,
                position,
                format!("token percentages sum to {sum}"),
                fixable,
            ));
        }
    }

    if let (Some(balance), Some(v0), Some(v1)) =
        (fields.balance, fields.token0_value, fields.token1_value)
    {
        let sum = v0 + v1;
        if (sum - balance).abs() > BALANCE_TOLERANCE {
            issues.push(QcIssue::new(
                IssueType::BalanceMismatch,
                Severity::Info,
                position,
                format!("token values sum to {sum}, balance is {balance}"),
                false,
            ));
        }
    }

    if let Some(range) = PriceRange::from_bounds(fields.range_min, fields.range_max) {
        if !range.is_ordered() {
            issues.push(QcIssue::new(
                IssueType::InvalidRange,
                Severity::Warning,
                position,
                format!(
                    "range lower bound {} exceeds upper bound {}",
                    range.lower_price, range.upper_price
                ),
                false,
            ));
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{complete_fields, obs, stored, ts};
    use lpscope_domain::PositionFields;
    use rust_decimal_macros::dec;

    fn types(issues: &[QcIssue]) -> Vec<IssueType> {
        issues.iter().map(|i| i.issue_type).collect()
    }

    fn named(position: StoredPosition) -> StoredPosition {
        let mut position = position;
        position.observation.token0 = Some("SOL".into());
        position.observation.token1 = Some("USDC".into());
        position
    }

    #[test]
    fn test_clean_position() {
        let position = named(stored(
            "orca",
            "SOL/USDC",
            obs("orca", "SOL/USDC", ts(0)).with_fields(complete_fields()),
        ));
        assert!(detect_position(&position).is_empty());
    }

    #[test]
    fn test_missing_token_names_is_fixable() {
        let position = stored(
            "orca",
            "SOL/USDC",
            obs("orca", "SOL/USDC0", ts(0)).with_fields(complete_fields()),
        );
        let issues = detect_position(&position);
        assert_eq!(types(&issues), vec![IssueType::MissingTokenNames]);
        assert!(issues[0].auto_fixable);
    }

    #[test]
    fn test_missing_token_names_is_fixable_even_without_a_pair() {
        let position = stored("orca", "SOL/", obs("orca", "SOL/", ts(0)));
        let issues = detect_position(&position);
        assert_eq!(types(&issues), vec![IssueType::MissingTokenNames]);
        assert!(issues[0].auto_fixable);
        assert!(derived_pair(&position).is_none());
    }

    #[test]
    fn test_label_without_separator_needs_no_names() {
        let position = stored("hyperliquid", "BTC-PERP", obs("hyperliquid", "BTC-PERP", ts(0)));
        assert!(detect_position(&position).is_empty());
    }

    #[test]
    fn test_wrong_category() {
        let mut observation = obs("kamino", "SOL/USDC", ts(0)).with_tokens("SOL", "USDC");
        observation.section = Section::Liquidity;
        let issues = detect_position(&stored("kamino", "SOL/USDC", observation));
        assert_eq!(types(&issues), vec![IssueType::WrongCategory]);
        assert!(!issues[0].auto_fixable);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_missing_token_data() {
        let observation = obs("orca", "SOL/USDC", ts(0))
            .with_tokens("SOL", "USDC")
            .with_fields(PositionFields {
                balance: Some(dec!(250)),
                token0_amount: Some(dec!(1)),
                ..PositionFields::default()
            });
        let issues = detect_position(&stored("orca", "SOL/USDC", observation));
        assert_eq!(types(&issues), vec![IssueType::MissingTokenData]);

        let empty = obs("orca", "SOL/USDC", ts(0))
            .with_tokens("SOL", "USDC")
            .with_fields(PositionFields {
                balance: Some(dec!(0)),
                ..PositionFields::default()
            });
        assert!(detect_position(&stored("orca", "SOL/USDC", empty)).is_empty());
    }

    #[test]
    fn test_invalid_percentages() {
        let mut fields = complete_fields();
        fields.token0_percentage = Some(dec!(60));
        fields.token1_percentage = Some(dec!(45));
        let position = named(stored(
            "orca",
            "SOL/USDC",
            obs("orca", "SOL/USDC", ts(0)).with_fields(fields.clone()),
        ));
        let issues = detect_position(&position);
        assert_eq!(types(&issues), vec![IssueType::InvalidPercentages]);
        assert!(issues[0].auto_fixable);

        fields.token1_value = None;
        fields.balance = None;
        let position = named(stored(
            "orca",
            "SOL/USDC",
            obs("orca", "SOL/USDC", ts(0)).with_fields(fields),
        ));
        let issues = detect_position(&position);
        assert_eq!(types(&issues), vec![IssueType::InvalidPercentages]);
        assert!(!issues[0].auto_fixable);
    }

    #[test]
    fn test_percentages_within_tolerance() {
        let mut fields = complete_fields();
        fields.token0_percentage = Some(dec!(60.3));
        fields.token1_percentage = Some(dec!(40.2));
        let position = named(stored(
            "orca",
            "SOL/USDC",
            obs("orca", "SOL/USDC", ts(0)).with_fields(fields),
        ));
        assert!(detect_position(&position).is_empty());
    }

    #[test]
    fn test_balance_mismatch_and_invalid_range() {
        let mut fields = complete_fields();
        fields.balance = Some(dec!(1002));
        fields.range_min = Some(dec!(120));
        let position = named(stored(
            "orca",
            "SOL/USDC",
            obs("orca", "SOL/USDC", ts(0)).with_fields(fields),
        ));
        let issues = detect_position(&position);
        assert_eq!(
            types(&issues),
            vec![IssueType::BalanceMismatch, IssueType::InvalidRange]
        );
        assert!(issues.iter().all(|i| !i.auto_fixable));
    }
}
