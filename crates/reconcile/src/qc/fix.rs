use super::detect::derived_pair;
use super::issues::{IssueType, PositionRef, QcIssue};
use lpscope_data::PositionPatch;
use lpscope_domain::{Percentage, StoredPosition};
use serde::Serialize;
use std::collections::HashMap;

/// A planned repair for one issue on one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixResult {
    pub position: PositionRef,
    pub issue_type: IssueType,
    #[serde(skip)]
    pub patch: PositionPatch,
    pub description: String,
}

/// A fix after the driver tried to persist it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixOutcome {
    pub fix: FixResult,
    pub persisted: bool,
    pub error: Option<String>,
}

fn name_patch(position: &StoredPosition) -> Option<(PositionPatch, String)> {
    let pair = derived_pair(position)?;
    let obs = &position.observation;
    let missing = |token: &Option<String>| token.as_deref().is_none_or(|t| t.trim().is_empty());

    let patch = PositionPatch {
        token0: missing(&obs.token0).then(|| pair.token0.clone()),
        token1: missing(&obs.token1).then(|| pair.token1.clone()),
        ..PositionPatch::default()
    };
    let description = format!("token names set from pair {pair}");
    Some((patch, description))
}

fn percentage_patch(position: &StoredPosition) -> Option<(PositionPatch, String)> {
    let fields = position.fields();
    let (v0, v1) = (fields.token0_value?, fields.token1_value?);
    let total = v0 + v1;
    let p0 = Percentage::share_of(v0, total)?.value();
    let p1 = Percentage::share_of(v1, total)?.value();

    let patch = PositionPatch {
        token0_percentage: Some(p0),
        token1_percentage: Some(p1),
        ..PositionPatch::default()
    };
    let description = format!("percentages recomputed from token values as {p0}/{p1}");
    Some((patch, description))
}

/// Stage 3 planning: one fix per auto-fixable issue that has a non-empty
/// repair. Issues whose row is not in `positions` are skipped.
pub fn plan_fixes(issues: &[QcIssue], positions: &[StoredPosition]) -> Vec<FixResult> {
    let by_id: HashMap<_, _> = positions.iter().map(|p| (p.id, p)).collect();

    issues
        .iter()
        .filter(|issue| issue.auto_fixable)
        .filter_map(|issue| {
            let position = by_id.get(&issue.position.id)?;
            let (patch, description) = match issue.issue_type {
                IssueType::MissingTokenNames => name_patch(position)?,
                IssueType::InvalidPercentages => percentage_patch(position)?,
                _ => return None,
            };
            if patch.is_empty() {
                return None;
            }
            Some(FixResult {
                position: issue.position.clone(),
                issue_type: issue.issue_type,
                patch,
                description,
            })
        })
        .collect()
}

/// Returns `position` as it reads once `patch` is persisted.
pub fn apply_patch(position: &StoredPosition, patch: &PositionPatch) -> StoredPosition {
    patch.apply_to(position)
}

/// Applies every fix to its row; rows without fixes are returned unchanged.
pub fn apply_fixes(positions: &[StoredPosition], fixes: &[FixResult]) -> Vec<StoredPosition> {
    positions
        .iter()
        .map(|position| {
            fixes
                .iter()
                .filter(|fix| fix.position.id == position.id)
                .fold(position.clone(), |acc, fix| apply_patch(&acc, &fix.patch))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qc::detect;
    use crate::test_support::{complete_fields, obs, stored, ts};
    use lpscope_domain::{Observation, PositionFields, Section, SourceKind};
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_percentages_recomputed_from_values() {
        let mut fields = complete_fields();
        fields.token0_percentage = Some(dec!(60));
        fields.token1_percentage = Some(dec!(45));
        let position = stored(
            "orca",
            "SOL/USDC",
            obs("orca", "SOL/USDC", ts(0))
                .with_tokens("SOL", "USDC")
                .with_fields(fields),
        );
        let positions = vec![position];

        let fixes = plan_fixes(&detect(&positions), &positions);
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].patch.token0_percentage, Some(dec!(60.0)));
        assert_eq!(fixes[0].patch.token1_percentage, Some(dec!(40.0)));

        let fixed = apply_fixes(&positions, &fixes);
        assert!(detect(&fixed).is_empty());
    }

    #[test]
    fn test_names_fill_only_missing_side() {
        let mut observation = obs("orca", "WETH/USDC", ts(0));
        observation.token0 = Some("Wrapped Ether".into());
        let position = stored("orca", "ETH/USDC", observation);
        let positions = vec![position];

        let fixes = plan_fixes(&detect(&positions), &positions);
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].patch.token0, None);
        assert_eq!(fixes[0].patch.token1.as_deref(), Some("USDC"));

        let fixed = apply_fixes(&positions, &fixes);
        assert_eq!(fixed[0].observation.token0.as_deref(), Some("Wrapped Ether"));
        assert_eq!(fixed[0].token_pair().unwrap().token1, "USDC");
    }

    #[test]
    fn test_report_only_issues_get_no_fix() {
        let observation = obs("orca", "SOL/USDC", ts(0))
            .with_tokens("SOL", "USDC")
            .with_fields(PositionFields {
                balance: Some(dec!(10)),
                ..PositionFields::default()
            });
        let positions = vec![stored("orca", "SOL/USDC", observation)];
        let issues = detect(&positions);
        assert_eq!(issues.len(), 1);
        assert!(plan_fixes(&issues, &positions).is_empty());
    }

    fn arb_position() -> impl Strategy<Value = StoredPosition> {
        (
            proptest::option::of(0u32..100_000),
            proptest::option::of(0u32..100_000),
            proptest::option::of(0u32..1000),
            proptest::option::of(0u32..1000),
            any::<bool>(),
        )
            .prop_map(|(v0, v1, p0, p1, named)| {
                let fields = PositionFields {
                    token0_value: v0.map(|v| Decimal::new(v.into(), 2)),
                    token1_value: v1.map(|v| Decimal::new(v.into(), 2)),
                    token0_percentage: p0.map(|p| Decimal::new(p.into(), 1)),
                    token1_percentage: p1.map(|p| Decimal::new(p.into(), 1)),
                    ..PositionFields::default()
                };
                let mut observation = Observation::new(
                    "orca",
                    "sol/usdc0",
                    ts(0),
                    Section::Liquidity,
                    SourceKind::TextPattern,
                )
                .with_fields(fields);
                if named {
                    observation = observation.with_tokens("SOL", "USDC");
                }
                stored("orca", "SOL/USDC", observation)
            })
    }

    proptest! {
        #[test]
        fn prop_fixing_is_idempotent(
            positions in proptest::collection::vec(arb_position(), 0..6),
        ) {
            let fixes = plan_fixes(&detect(&positions), &positions);
            let once = apply_fixes(&positions, &fixes);

            let again = plan_fixes(&detect(&once), &once);
            prop_assert!(again.is_empty());
            prop_assert_eq!(apply_fixes(&once, &again), once.clone());
            prop_assert!(detect(&once).iter().all(|issue| !issue.auto_fixable));
        }
    }
}
