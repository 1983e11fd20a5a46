use chrono::{DateTime, Utc};
use lpscope_domain::{CanonicalKey, Observation, PositionRecord, StoredPosition};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Anything the merger can rank.
pub trait Ranked {
    /// The observation carrying the data.
    fn observation(&self) -> &Observation;
    /// Final tiebreak; the smallest value wins.
    fn tiebreak(&self) -> Uuid;
}

impl Ranked for Observation {
    fn observation(&self) -> &Observation {
        self
    }

    fn tiebreak(&self) -> Uuid {
        self.id.0
    }
}

impl Ranked for StoredPosition {
    fn observation(&self) -> &Observation {
        &self.observation
    }

    fn tiebreak(&self) -> Uuid {
        self.id.0
    }
}

type RankKey = (bool, DateTime<Utc>, usize, Reverse<Uuid>);

fn rank_key<R: Ranked>(item: &R) -> RankKey {
    let obs = item.observation();
    (
        obs.is_complete(),
        obs.captured_at,
        obs.fields.populated_count(),
        Reverse(item.tiebreak()),
    )
}

/// Picks the observation to keep for one key.
///
/// Ordering, highest first: complete token breakdown, latest capture, more
/// populated fields, smallest id. The key is a total order so the result
/// does not depend on input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordMerger;

impl RecordMerger {
    /// Selects the winner among `items`, or `None` when empty.
    pub fn select<'a, R, I>(items: I) -> Option<&'a R>
    where
        R: Ranked + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        items.into_iter().max_by_key(|item| rank_key(*item))
    }

    /// Groups stored rows by key and selects one record per key.
    pub fn select_per_key(rows: &[StoredPosition]) -> BTreeMap<CanonicalKey, PositionRecord> {
        let mut best: BTreeMap<CanonicalKey, &StoredPosition> = BTreeMap::new();
        for row in rows {
            best.entry(row.key.clone())
                .and_modify(|current| {
                    if rank_key(row) > rank_key(*current) {
                        *current = row;
                    }
                })
                .or_insert(row);
        }

        best.into_iter()
            .map(|(key, row)| (key, PositionRecord::new(row.clone())))
            .collect()
    }

    /// Like [`select_per_key`](Self::select_per_key), as a list ordered by key.
    pub fn group_and_select(rows: &[StoredPosition]) -> Vec<PositionRecord> {
        Self::select_per_key(rows).into_values().collect()
    }
}
