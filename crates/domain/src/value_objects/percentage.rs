use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A share expressed in percent (0-100), held to one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Percentage(pub Decimal);

impl Percentage {
    /// Decimal places kept for recomputed shares.
    pub const SCALE: u32 = 1;

    /// Computes `part / total * 100`, rounded half away from zero to one
    /// decimal. Returns `None` when `total` is not positive.
    pub fn share_of(part: Decimal, total: Decimal) -> Option<Self> {
        if total <= Decimal::ZERO {
            return None;
        }
        let raw = part / total * Decimal::ONE_HUNDRED;
        Some(Self(raw.round_dp_with_strategy(
            Self::SCALE,
            RoundingStrategy::MidpointAwayFromZero,
        )))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_share_of() {
        assert_eq!(Percentage::share_of(dec!(600), dec!(1000)), Some(Percentage(dec!(60.0))));
        assert_eq!(Percentage::share_of(dec!(1), dec!(3)).unwrap().value(), dec!(33.3));
        assert_eq!(Percentage::share_of(dec!(2), dec!(3)).unwrap().value(), dec!(66.7));
    }

    #[test]
    fn test_share_of_rounds_half_away_from_zero() {
        // 1 / 16 * 100 = 6.25
        assert_eq!(Percentage::share_of(dec!(1), dec!(16)).unwrap().value(), dec!(6.3));
    }

    #[test]
    fn test_share_of_zero_total() {
        assert!(Percentage::share_of(dec!(0), dec!(0)).is_none());
        assert!(Percentage::share_of(dec!(5), dec!(-5)).is_none());
    }
}
