use crate::enums::{Section, SourceKind};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObservationId(pub Uuid);

impl ObservationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObservationId {
    fn default() -> Self {
        Self::new()
    }
}

/// Numeric readings of a position. Every field is optional because both
/// extractors routinely resolve only part of a position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionFields {
    pub balance: Option<Decimal>,
    pub pending_yield: Option<Decimal>,
    pub apy: Option<Decimal>,

    pub range_min: Option<Decimal>,
    pub range_max: Option<Decimal>,
    pub current_price: Option<Decimal>,

    pub token0_amount: Option<Decimal>,
    pub token1_amount: Option<Decimal>,
    pub token0_value: Option<Decimal>,
    pub token1_value: Option<Decimal>,
    pub token0_percentage: Option<Decimal>,
    pub token1_percentage: Option<Decimal>,
}

impl PositionFields {
    /// Both token amounts are present.
    pub fn has_token_amounts(&self) -> bool {
        self.token0_amount.is_some() && self.token1_amount.is_some()
    }

    /// Number of populated fields.
    pub fn populated_count(&self) -> usize {
        [
            self.balance,
            self.pending_yield,
            self.apy,
            self.range_min,
            self.range_max,
            self.current_price,
            self.token0_amount,
            self.token1_amount,
            self.token0_value,
            self.token1_value,
            self.token0_percentage,
            self.token1_percentage,
        ]
        .iter()
        .filter(|v| v.is_some())
        .count()
    }
}

/// One extractor's reading of a position at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub id: ObservationId,
    pub protocol: String,
    pub raw_pair_label: String,
    pub captured_at: DateTime<Utc>,
    /// Section the extractor filed the position under.
    pub section: Section,
    /// Symbols as extracted, when the extractor resolved them.
    #[serde(default)]
    pub token0: Option<String>,
    #[serde(default)]
    pub token1: Option<String>,
    #[serde(default)]
    pub fields: PositionFields,
    pub source: SourceKind,
}

impl Observation {
    pub fn new(
        protocol: impl Into<String>,
        raw_pair_label: impl Into<String>,
        captured_at: DateTime<Utc>,
        section: Section,
        source: SourceKind,
    ) -> Self {
        Self {
            id: ObservationId::new(),
            protocol: protocol.into(),
            raw_pair_label: raw_pair_label.into(),
            captured_at,
            section,
            token0: None,
            token1: None,
            fields: PositionFields::default(),
            source,
        }
    }

    #[must_use]
    pub fn with_fields(mut self, fields: PositionFields) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub fn with_tokens(mut self, token0: impl Into<String>, token1: impl Into<String>) -> Self {
        self.token0 = Some(token0.into());
        self.token1 = Some(token1.into());
        self
    }

    /// Both sides of the token breakdown are populated.
    pub fn is_complete(&self) -> bool {
        self.fields.has_token_amounts()
    }
}

impl AsRef<Observation> for Observation {
    fn as_ref(&self) -> &Observation {
        self
    }
}
