use lpscope_domain::{CanonicalKey, PositionRowId, Severity, StoredPosition};
use serde::Serialize;
use std::fmt;

/// Kind of quality-control finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    /// Pair label has a separator but a token name is empty.
    MissingTokenNames,
    /// Filed under a section the protocol does not belong to.
    WrongCategory,
    /// Positive balance without a token breakdown.
    MissingTokenData,
    /// Token percentages do not add up to 100.
    InvalidPercentages,
    /// Token values do not add up to the balance.
    BalanceMismatch,
    /// Range lower bound above the upper bound.
    InvalidRange,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::MissingTokenNames => "MISSING_TOKEN_NAMES",
            IssueType::WrongCategory => "WRONG_CATEGORY",
            IssueType::MissingTokenData => "MISSING_TOKEN_DATA",
            IssueType::InvalidPercentages => "INVALID_PERCENTAGES",
            IssueType::BalanceMismatch => "BALANCE_MISMATCH",
            IssueType::InvalidRange => "INVALID_RANGE",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row an issue refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionRef {
    pub id: PositionRowId,
    pub key: CanonicalKey,
}

impl From<&StoredPosition> for PositionRef {
    fn from(position: &StoredPosition) -> Self {
        Self {
            id: position.id,
            key: position.key.clone(),
        }
    }
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QcIssue {
    pub issue_type: IssueType,
    pub severity: Severity,
    pub position: PositionRef,
    pub message: String,
    /// Stage 3 knows how to repair it.
    pub auto_fixable: bool,
}

impl QcIssue {
    pub fn new(
        issue_type: IssueType,
        severity: Severity,
        position: &StoredPosition,
        message: impl Into<String>,
        auto_fixable: bool,
    ) -> Self {
        Self {
            issue_type,
            severity,
            position: PositionRef::from(position),
            message: message.into(),
            auto_fixable,
        }
    }
}
