use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the two symbols of a pair label.
pub const PAIR_SEPARATOR: char = '/';

/// The two sides of a pair label such as `SOL/USDC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenPair {
    pub token0: String,
    pub token1: String,
}

impl TokenPair {
    pub fn new(token0: impl Into<String>, token1: impl Into<String>) -> Self {
        Self {
            token0: token0.into(),
            token1: token1.into(),
        }
    }

    /// Splits a label on the first separator, trimming each side.
    ///
    /// Returns `None` when the label has no separator. Either side may be
    /// empty (`"SOL/"` splits into `SOL` and an empty symbol).
    pub fn split(label: &str) -> Option<Self> {
        let (token0, token1) = label.split_once(PAIR_SEPARATOR)?;
        Some(Self::new(token0.trim(), token1.trim()))
    }

    /// Returns `true` if the label contains a pair separator.
    pub fn has_separator(label: &str) -> bool {
        label.contains(PAIR_SEPARATOR)
    }

    #[must_use]
    pub fn reversed(&self) -> Self {
        Self::new(self.token1.clone(), self.token0.clone())
    }

    /// Both symbols are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.token0.is_empty() && !self.token1.is_empty()
    }
}

impl fmt::Display for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.token0, PAIR_SEPARATOR, self.token1)
    }
}
