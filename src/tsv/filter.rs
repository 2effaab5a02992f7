//! Early rejection and normalization of data file entries

use crate::{Token, Year};
use std::fmt;

/// Reasons why a data file entry could be discarded
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RejectCause {
    /// Ngram contains a period, which in this dataset is an artifact of
    /// tokenization (abbreviations, initials, numbers...) rather than a word
    Punctuated,

    /// Entry is too old, may not reflect modern language usage
    Old,

    /// Nothing is left of the ngram once its grammar tag is removed
    Empty,
}
//
impl fmt::Display for RejectCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Punctuated => "it contains a period",
            Self::Old => "it's too old",
            Self::Empty => "it's only a grammar tag",
        })
    }
}

/// Check if an ngram can be rejected before its yearly data is even parsed
pub fn reject_ngram(ngram: &str) -> Option<RejectCause> {
    ngram.contains('.').then_some(RejectCause::Punctuated)
}

/// Check if an entry's publication year is in the period of interest
pub fn reject_year(year: Year, min_year: Year) -> Option<RejectCause> {
    (year < min_year).then_some(RejectCause::Old)
}

/// Canonical form of an ngram
///
/// Underscores separate a word from its part-of-speech tag (`dog_NOUN`), so
/// only the part before the first underscore is kept, then it is lowercased.
pub fn normalize(ngram: &str) -> Result<Token, RejectCause> {
    let word = ngram.split_once('_').map_or(ngram, |(word, _tag)| word);
    if word.is_empty() {
        return Err(RejectCause::Empty);
    }
    Ok(word.to_lowercase().into())
}
