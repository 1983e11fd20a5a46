use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lower and upper bound of a concentrated-liquidity position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub lower_price: Decimal,
    pub upper_price: Decimal,
}

impl PriceRange {
    pub fn new(lower: Decimal, upper: Decimal) -> Self {
        Self {
            lower_price: lower,
            upper_price: upper,
        }
    }

    /// Builds a range when both bounds were extracted.
    pub fn from_bounds(lower: Option<Decimal>, upper: Option<Decimal>) -> Option<Self> {
        Some(Self::new(lower?, upper?))
    }

    /// `lower <= upper`.
    pub fn is_ordered(&self) -> bool {
        self.lower_price <= self.upper_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_bounds_requires_both() {
        assert!(PriceRange::from_bounds(Some(dec!(1)), None).is_none());
        let range = PriceRange::from_bounds(Some(dec!(90)), Some(dec!(110))).unwrap();
        assert!(range.is_ordered());
    }

    #[test]
    fn test_inverted_range() {
        assert!(!PriceRange::new(dec!(2), dec!(1)).is_ordered());
    }
}
