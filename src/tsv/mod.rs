//! Aggregation of the TSV data files from Google
//!
//! Each data file is aggregated independently: rows are filtered, their ngram
//! is normalized, and occurence counts are summed per normalized token over
//! the whole file before any cutoff is applied. This way, a word that is
//! split across many rows (years, casings, grammar tags) is judged on its
//! total popularity within the file.

pub mod filter;

use self::filter::RejectCause;
use crate::{
    config::InputConfig, error::IngestError, stats::TokenCount, MatchCount, Result, Token, Year,
};
use anyhow::Context;
use csv_async::{AsyncReaderBuilder, ByteRecord};
use futures::StreamExt;
use std::{
    collections::{hash_map, HashMap},
    str::FromStr,
};
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

/// Number of tab-separated fields in a data file row
const NUM_FIELDS: usize = 4;

/// Aggregate a data file
///
/// Rows are read until the end of the file or until `cancel` is triggered. In
/// the latter case, no aggregate is produced.
pub async fn aggregate(
    tsv_bytes: impl AsyncRead + Send + Unpin,
    input: InputConfig,
    cancel: &CancellationToken,
) -> Result<Option<FileAggregate>> {
    // Quotes have no special meaning in the dataset, and appear as words.
    // Ngrams are not guaranteed to be valid UTF-8, so rows are read as bytes.
    let mut records = AsyncReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .create_reader(tsv_bytes)
        .into_byte_records();

    let mut aggregate = FileAggregate::new(input);
    loop {
        let record = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                log::debug!("Stopped aggregating data file after {} rows", aggregate.num_rows);
                return Ok(None);
            }
            record = records.next() => record,
        };
        let Some(record) = record else {
            break;
        };
        let record = record.map_err(IngestError::from)?;
        let line = record.position().map_or(0, |pos| pos.line());
        aggregate
            .add_record(&record)
            .with_context(|| format!("processing line {line}"))?;
    }
    log::debug!(
        "Aggregated {} rows ({} rejected) into {} distinct tokens",
        aggregate.num_rows,
        aggregate.num_rejected,
        aggregate.counts.len()
    );
    Ok(Some(aggregate))
}

/// Occurence counts accumulated from a single data file
#[derive(Debug)]
pub struct FileAggregate {
    /// Data collection configuration
    input: InputConfig,

    /// Total occurence count of each normalized token so far
    counts: HashMap<Token, MatchCount>,

    /// Number of rows seen so far
    num_rows: usize,

    /// Number of rows that were rejected
    num_rejected: usize,
}
//
impl FileAggregate {
    /// Set up the accumulator
    pub fn new(input: InputConfig) -> Self {
        Self {
            input,
            counts: HashMap::new(),
            num_rows: 0,
            num_rejected: 0,
        }
    }

    /// Integrate a data file row
    ///
    /// Rows are `ngram, year, match_count, volume_count`. Only the first three
    /// fields are used, and they are checked in this order, so that a row that
    /// is rejected early is not required to be otherwise well-formed.
    ///
    /// Invalid UTF-8 sequences in the ngram are replaced with U+FFFD.
    pub fn add_record(&mut self, record: &ByteRecord) -> Result<(), IngestError> {
        self.num_rows += 1;
        if record.len() != NUM_FIELDS {
            return Err(IngestError::parse(
                "row",
                &record
                    .iter()
                    .map(String::from_utf8_lossy)
                    .collect::<Vec<_>>()
                    .join("\t"),
                format!("expected {NUM_FIELDS} fields, found {}", record.len()),
            ));
        }
        let ngram = String::from_utf8_lossy(&record[0]);

        if let Some(cause) = filter::reject_ngram(&ngram) {
            self.reject(record, cause);
            return Ok(());
        }

        let year = parse_field::<Year>("year", &record[1])?;
        if let Some(cause) = filter::reject_year(year, self.input.min_year) {
            self.reject(record, cause);
            return Ok(());
        }

        let token = filter::normalize(&ngram);

        let match_count = parse_field::<i64>("match count", &record[2]).and_then(|count| {
            MatchCount::try_from(count)
                .map_err(|e| IngestError::parse("match count", &count.to_string(), e))
        })?;

        match token {
            Ok(token) => self.add_matches(token, match_count, &ngram),
            Err(cause) => {
                self.reject(record, cause);
                Ok(())
            }
        }
    }

    /// Add occurences to a normalized token
    fn add_matches(
        &mut self,
        token: Token,
        match_count: MatchCount,
        ngram: &str,
    ) -> Result<(), IngestError> {
        let overflow = || IngestError::parse("match count", ngram, "occurence count overflow");
        match self.counts.entry(token) {
            hash_map::Entry::Occupied(o) => {
                let total = o.into_mut();
                *total = total.checked_add(match_count).ok_or_else(overflow)?;
            }
            hash_map::Entry::Vacant(v) => {
                v.insert(match_count);
            }
        }
        Ok(())
    }

    /// Record that a row was rejected
    fn reject(&mut self, record: &ByteRecord, cause: RejectCause) {
        self.num_rejected += 1;
        log::trace!("Rejected {record:?} because {cause}");
    }

    /// Total occurence count of a normalized token so far
    #[cfg(test)]
    pub fn count(&self, token: &str) -> Option<MatchCount> {
        self.counts.get(token).copied()
    }

    /// Emit the tokens whose total occurence count strictly exceeds
    /// `threshold`, in unspecified order
    pub fn finish(self, threshold: MatchCount) -> impl Iterator<Item = TokenCount> {
        self.counts.into_iter().filter_map(move |(token, count)| {
            if count > threshold {
                Some(TokenCount { token, count })
            } else {
                log::trace!("Dropped token {token:?} with only {count} occurences");
                None
            }
        })
    }
}

/// Parse a numeric field of a data file row
fn parse_field<T>(what: &'static str, field: &[u8]) -> Result<T, IngestError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let text = std::str::from_utf8(field)
        .map_err(|e| IngestError::parse(what, &String::from_utf8_lossy(field), e))?;
    text.parse().map_err(|e| IngestError::parse(what, text, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThresholdScope;

    fn input(min_year: Year) -> InputConfig {
        InputConfig {
            min_year,
            min_matches: 100,
            threshold_scope: ThresholdScope::PerFile,
        }
    }

    async fn aggregate_str(tsv: &str) -> Result<FileAggregate> {
        aggregate_bytes(tsv.as_bytes()).await
    }

    async fn aggregate_bytes(tsv: &[u8]) -> Result<FileAggregate> {
        let cancel = CancellationToken::new();
        Ok(aggregate(tsv, input(1960), &cancel)
            .await?
            .expect("aggregation was not cancelled"))
    }

    fn sorted(aggregate: FileAggregate, threshold: MatchCount) -> Vec<(String, MatchCount)> {
        let mut counts = aggregate
            .finish(threshold)
            .map(|TokenCount { token, count }| (String::from(token), count))
            .collect::<Vec<_>>();
        counts.sort();
        counts
    }

    #[tokio::test]
    async fn sums_counts_across_years() {
        let aggregate = aggregate_str("dog\t1960\t60\t1\ndog\t1961\t50\t1\n")
            .await
            .unwrap();
        assert_eq!(aggregate.count("dog"), Some(110));
        assert_eq!(sorted(aggregate, 100), [("dog".to_owned(), 110)]);
    }

    #[tokio::test]
    async fn merges_tags_and_casings() {
        let aggregate = aggregate_str(
            "Dog\t1970\t1\t1\nDog_NOUN\t1970\t10\t1\ndog\t1970\t100\t1\ndog_VERB\t1980\t1000\t1\n",
        )
        .await
        .unwrap();
        assert_eq!(aggregate.count("dog"), Some(1111));
        assert_eq!(aggregate.count("Dog"), None);
    }

    #[tokio::test]
    async fn skips_old_and_punctuated_rows() {
        let aggregate = aggregate_str(
            "cat\t1959\t1000\t1\ncat\t1960\t1\t1\nc.a.t\t1990\t1000\t1\ncat.\t1990\t1000\t1\n",
        )
        .await
        .unwrap();
        assert_eq!(aggregate.count("cat"), Some(1));
        assert_eq!(aggregate.count("c"), None);
        assert_eq!(aggregate.num_rejected, 3);
    }

    #[tokio::test]
    async fn punctuated_rows_are_not_parsed_further() {
        let aggregate = aggregate_str("U.S.\tlast year\tmany\t1\n").await.unwrap();
        assert_eq!(aggregate.num_rejected, 1);
    }

    #[tokio::test]
    async fn old_rows_are_not_parsed_past_the_year() {
        let aggregate = aggregate_str("owl\t1800\tmany\t1\n").await.unwrap();
        assert_eq!(aggregate.count("owl"), None);
    }

    #[tokio::test]
    async fn keeps_quotes_as_words() {
        let aggregate = aggregate_str("\"\t1990\t5\t1\n\"quoted\t1990\t7\t1\n")
            .await
            .unwrap();
        assert_eq!(aggregate.count("\""), Some(5));
        assert_eq!(aggregate.count("\"quoted"), Some(7));
    }

    #[tokio::test]
    async fn threshold_is_exclusive() {
        let aggregate = aggregate_str("at\t1990\t100\t1\nabove\t1990\t101\t1\n")
            .await
            .unwrap();
        assert_eq!(sorted(aggregate, 100), [("above".to_owned(), 101)]);
    }

    #[tokio::test]
    async fn bad_year_fails() {
        let err = aggregate_str("dog\t1960\t60\t1\ndog\tnineteen\t60\t1\n")
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<IngestError>().unwrap().is_parse());
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[tokio::test]
    async fn bad_or_negative_match_count_fails() {
        for tsv in ["dog\t1960\tsixty\t1\n", "dog\t1960\t-60\t1\n"] {
            let err = aggregate_str(tsv).await.unwrap_err();
            assert!(err.downcast_ref::<IngestError>().unwrap().is_parse());
        }
    }

    #[tokio::test]
    async fn invalid_utf8_ngrams_are_still_counted() {
        let aggregate = aggregate_bytes(
            b"dog\t1990\t500\t1\ncaf\xe9\t1990\t500\t1\nCAF\xe9_NOUN\t1991\t1\t1\n",
        )
        .await
        .unwrap();
        assert_eq!(aggregate.count("dog"), Some(500));
        assert_eq!(aggregate.count("caf\u{FFFD}"), Some(501));
        assert_eq!(aggregate.num_rejected, 0);
    }

    #[tokio::test]
    async fn invalid_utf8_year_fails() {
        let err = aggregate_bytes(b"dog\t19\xe90\t500\t1\n")
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<IngestError>().unwrap().is_parse());
    }

    #[tokio::test]
    async fn wrong_field_count_fails() {
        let err = aggregate_str("dog\t1960\t60\n").await.unwrap_err();
        assert!(err.downcast_ref::<IngestError>().unwrap().is_parse());
    }

    #[tokio::test]
    async fn cancellation_stops_aggregation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = aggregate("dog\t1960\t60\t1\n".as_bytes(), input(1960), &cancel)
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
