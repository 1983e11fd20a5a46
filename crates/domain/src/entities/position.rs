use crate::entities::capture::CaptureId;
use crate::entities::observation::{Observation, PositionFields};
use crate::value_objects::{CanonicalKey, TokenPair};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionRowId(pub Uuid);

impl PositionRowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PositionRowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PositionRowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A persisted row of the `positions` table.
///
/// The canonical key is resolved once at write time and stored with the row,
/// so later reads never need to re-run matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPosition {
    pub id: PositionRowId,
    pub capture_id: CaptureId,
    pub key: CanonicalKey,
    pub observation: Observation,
}

impl StoredPosition {
    pub fn new(capture_id: CaptureId, key: CanonicalKey, observation: Observation) -> Self {
        Self {
            id: PositionRowId::new(),
            capture_id,
            key,
            observation,
        }
    }

    pub fn fields(&self) -> &PositionFields {
        &self.observation.fields
    }

    pub fn is_complete(&self) -> bool {
        self.observation.is_complete()
    }

    /// The two symbols, when both were stored and are non-empty.
    pub fn token_pair(&self) -> Option<TokenPair> {
        let pair = TokenPair::new(
            self.observation.token0.clone()?,
            self.observation.token1.clone()?,
        );
        pair.is_complete().then_some(pair)
    }
}

impl AsRef<Observation> for StoredPosition {
    fn as_ref(&self) -> &Observation {
        &self.observation
    }
}

/// The position currently surfaced for a canonical key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub key: CanonicalKey,
    pub position: StoredPosition,
    /// Both token amounts are present.
    pub complete: bool,
}

impl PositionRecord {
    pub fn new(position: StoredPosition) -> Self {
        Self {
            key: position.key.clone(),
            complete: position.is_complete(),
            position,
        }
    }

    pub fn observation(&self) -> &Observation {
        &self.position.observation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{Section, SourceKind};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_token_pair_requires_both_symbols() {
        let obs = Observation::new(
            "Orca",
            "SOL/USDC",
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            Section::Liquidity,
            SourceKind::TextPattern,
        );
        let key = CanonicalKey::new("Orca", "SOL/USDC");

        let bare = StoredPosition::new(CaptureId::new(), key.clone(), obs.clone());
        assert!(bare.token_pair().is_none());

        let blank = StoredPosition::new(CaptureId::new(), key.clone(), obs.clone().with_tokens("SOL", ""));
        assert!(blank.token_pair().is_none());

        let named = StoredPosition::new(CaptureId::new(), key, obs.with_tokens("SOL", "USDC"));
        assert_eq!(named.token_pair(), Some(TokenPair::new("SOL", "USDC")));

        let record = PositionRecord::new(named);
        assert!(!record.complete);
        assert_eq!(record.key.protocol(), "orca");
    }
}
