use super::normalize::normalize;
use crate::error::{EngineError, EngineResult};
use lpscope_domain::TokenPair;

/// Maximum edit distance accepted by the fuzzy step.
pub const MAX_FUZZY_DISTANCE: usize = 2;

/// Unit-cost Levenshtein distance between two strings.
pub fn levenshtein(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// How a label was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Normalized labels are equal.
    Exact,
    /// Normalized candidate equals the extracted pair with its sides swapped.
    Reversed,
    /// Normalized labels are within the fuzzy threshold.
    Fuzzy {
        /// Edit distance between the normalized labels.
        distance: usize,
    },
}

/// A successful match against a candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairMatch {
    /// Position of the candidate in the input list.
    pub index: usize,
    /// The candidate as given.
    pub candidate: String,
    /// The candidate's normalized form, used as the resolved pair.
    pub normalized: String,
    /// Which step produced the match.
    pub kind: MatchKind,
}

/// Resolves extracted pair labels against known ones.
#[derive(Debug, Clone)]
pub struct PairMatcher {
    max_distance: usize,
}

impl Default for PairMatcher {
    fn default() -> Self {
        Self {
            max_distance: MAX_FUZZY_DISTANCE,
        }
    }
}

impl PairMatcher {
    /// Creates a matcher with the fixed fuzzy threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes a label. See [`normalize`].
    pub fn normalize(&self, label: &str) -> String {
        normalize(label)
    }

    /// Matches `extracted` against `candidates`.
    ///
    /// Tried in order, first hit wins: exact, reversed, then the closest
    /// candidate with `0 < distance <= 2` (earliest candidate on ties).
    /// Labels without a separator only ever match exactly.
    pub fn match_label<S: AsRef<str>>(&self, extracted: &str, candidates: &[S]) -> Option<PairMatch> {
        let target = normalize(extracted);
        let normalized: Vec<String> = candidates.iter().map(|c| normalize(c.as_ref())).collect();

        let hit = |index: usize, kind: MatchKind| PairMatch {
            index,
            candidate: candidates[index].as_ref().to_string(),
            normalized: normalized[index].clone(),
            kind,
        };

        if let Some(index) = normalized.iter().position(|c| *c == target) {
            return Some(hit(index, MatchKind::Exact));
        }

        let pair = TokenPair::split(&target)?;

        let reversed = pair.reversed().to_string();
        if let Some(index) = normalized.iter().position(|c| *c == reversed) {
            return Some(hit(index, MatchKind::Reversed));
        }

        normalized
            .iter()
            .enumerate()
            .filter(|(_, candidate)| TokenPair::has_separator(candidate))
            .map(|(index, candidate)| (index, levenshtein(&target, candidate)))
            .filter(|(_, distance)| *distance > 0 && *distance <= self.max_distance)
            .min_by_key(|(index, distance)| (*distance, *index))
            .map(|(index, distance)| hit(index, MatchKind::Fuzzy { distance }))
    }

    /// Like [`match_label`](Self::match_label) but reports a miss as
    /// [`EngineError::UnresolvedMatch`].
    ///
    /// # Errors
    /// Returns `UnresolvedMatch` when no candidate is acceptable.
    pub fn resolve<S: AsRef<str>>(&self, extracted: &str, candidates: &[S]) -> EngineResult<PairMatch> {
        self.match_label(extracted, candidates)
            .ok_or_else(|| EngineError::UnresolvedMatch {
                label: extracted.to_string(),
            })
    }
}
