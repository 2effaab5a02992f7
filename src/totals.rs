//! Total number of words in the dataset, used to normalize occurence counts

use crate::{
    error::IngestError,
    progress::{ProgressConfig, ProgressReport, Work},
    source::DataSource,
    MatchCount, Result, Year,
};
use anyhow::Context;
use csv_async::{AsyncReaderBuilder, Trim};
use futures::StreamExt;
use tokio::io::AsyncRead;

/// Compute the total number of words published on or after `min_year`, using
/// the dataset's total count file
pub async fn load(
    source: &DataSource,
    client: &reqwest::Client,
    min_year: Year,
    report: &ProgressReport,
) -> Result<MatchCount> {
    let bytes = report.add(
        "Reading total word counts",
        ProgressConfig::new(Work::Bytes(0)).allow_adding_work(),
    );
    let context = || format!("computing the total word count from {source}");
    let reader = source
        .open(client, bytes.clone())
        .await
        .with_context(context)?;
    bytes.done_adding_work();
    let total_words = count_total_words(reader, min_year)
        .await
        .with_context(context)?;
    log::info!("Dataset contains {total_words} words published since {min_year}");
    Ok(total_words)
}

/// Sum up the yearly word counts of a total count file, for years on or after
/// `min_year`
///
/// The total count file is a single line of tab-separated
/// `year,match_count,page_count,volume_count` groups. Groups with fewer than 4
/// comma-separated parts are ignored.
pub async fn count_total_words(
    reader: impl AsyncRead + Send + Unpin,
    min_year: Year,
) -> Result<MatchCount, IngestError> {
    let mut records = AsyncReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .create_reader(reader)
        .into_records();
    let record = records
        .next()
        .await
        .ok_or_else(|| IngestError::Configuration("total word count file is empty".into()))??;

    let mut total_words: MatchCount = 0;
    for group in record.iter() {
        let parts = group.split(',').map(str::trim).collect::<Vec<_>>();
        let [year, match_count, _page_count, _volume_count, ..] = parts[..] else {
            if !group.is_empty() {
                log::debug!("Ignoring malformed total count group {group:?}");
            }
            continue;
        };
        let year = year
            .parse::<Year>()
            .map_err(|e| IngestError::parse("year", year, e))?;
        if year < min_year {
            continue;
        }
        let year_total = match_count
            .parse::<i64>()
            .map_err(|e| IngestError::parse("yearly word count", match_count, e))?;
        let year_total = MatchCount::try_from(year_total)
            .map_err(|e| IngestError::parse("yearly word count", match_count, e))?;
        total_words = total_words.checked_add(year_total).ok_or_else(|| {
            IngestError::parse("yearly word count", match_count, "total word count overflow")
        })?;
    }
    if total_words == 0 {
        return Err(IngestError::Configuration(format!(
            "total word count file has no words for years {min_year} and later"
        )));
    }
    Ok(total_words)
}
