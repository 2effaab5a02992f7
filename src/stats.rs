//! Word usage statistics

use crate::{MatchCount, Token};
use serde::Serialize;
use std::cmp::Ordering;

/// Summed occurence count of a token, as handed over by a data file worker
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TokenCount {
    /// Canonical (lowercase, untagged) token
    pub token: Token,

    /// Number of matches across the years of interest
    pub count: MatchCount,
}

/// Relative usage frequency of a word
///
/// This is also the row format of the output CSV.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WordStat {
    /// Canonical word
    #[serde(rename = "word")]
    pub token: Token,

    /// Number of occurences divided by the total number of words in the
    /// dataset over the years of interest
    pub frequency: f64,
}
//
impl WordStat {
    /// Turn a summed occurence count into a relative frequency
    pub fn new(count: TokenCount, total_words: MatchCount) -> Self {
        debug_assert!(total_words > 0, "total word count should have been checked");
        Self {
            token: count.token,
            frequency: count.count as f64 / total_words as f64,
        }
    }

    /// Ranking order: most frequent word first, then alphabetical order
    ///
    /// This is a total order over well-formed stats, so rankings are
    /// reproducible no matter in which order the data files were processed.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .frequency
            .total_cmp(&self.frequency)
            .then_with(|| self.token.cmp(&other.token))
    }
}

/// [`WordStat`] wrapper whose [`Ord`] impl follows [`WordStat::rank_cmp()`]
///
/// Lesser values are better ranked, so a [`BinaryHeap`] of these is a
/// max-heap whose top is the worst-ranked word.
///
/// [`BinaryHeap`]: std::collections::BinaryHeap
#[derive(Clone, Debug)]
pub struct Ranked(pub WordStat);
//
impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.rank_cmp(&other.0)
    }
}
//
impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
//
impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
//
impl Eq for Ranked {}
