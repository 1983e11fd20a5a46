use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a logical position: protocol plus normalized pair.
///
/// The protocol is folded to trimmed lowercase on construction so that
/// `"Aerodrome"` and `"aerodrome "` name the same position. The pair must
/// already be normalized by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalKey {
    protocol: String,
    pair: String,
}

impl CanonicalKey {
    pub fn new(protocol: &str, normalized_pair: impl Into<String>) -> Self {
        Self {
            protocol: Self::fold_protocol(protocol),
            pair: normalized_pair.into(),
        }
    }

    /// Folds a protocol name into its key form.
    pub fn fold_protocol(protocol: &str) -> String {
        protocol.trim().to_lowercase()
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.protocol, self.pair)
    }
}
