//! Concurrent aggregation of all data files into one set of word statistics

use crate::{
    config::{InputConfig, ThresholdScope},
    progress::{ProgressConfig, ProgressReport, ProgressTracker, Work},
    source::DataSource,
    stats::{TokenCount, WordStat},
    tsv, MatchCount, Result, Token,
};
use anyhow::Context;
use std::collections::{hash_map, HashMap};
use tokio::{sync::mpsc, task::JoinSet};
use tokio_util::sync::CancellationToken;

/// Number of token counts that can be in flight between the data file workers
/// and the collector
const CHANNEL_CAPACITY: usize = 4096;

/// Aggregate a set of data files concurrently, then merge their statistics
///
/// One task is spawned per data file. If any of them fails, the others are
/// cancelled and the first error that was observed is returned. Which error
/// that is when several data files are broken is not deterministic.
///
/// The output is in unspecified order.
pub async fn collect_word_stats(
    input: InputConfig,
    total_words: MatchCount,
    sources: Vec<DataSource>,
    client: reqwest::Client,
    report: &ProgressReport,
) -> Result<Vec<WordStat>> {
    // Track data file reading
    let num_files = sources.len();
    let opened = report.add(
        "Opening data files",
        ProgressConfig::new(Work::Steps(num_files)),
    );
    let bytes = report.add(
        "Reading data files",
        ProgressConfig::new(Work::Bytes(0)).allow_adding_work(),
    );

    // Start processing all data files
    let (counts_tx, mut counts_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let cancel = CancellationToken::new();
    let mut workers = JoinSet::new();
    for source in sources {
        workers.spawn(aggregate_file(
            input,
            source,
            client.clone(),
            opened.clone(),
            bytes.clone(),
            counts_tx.clone(),
            cancel.clone(),
        ));
    }
    // Workers must hold the last senders, so that the channel closes once
    // they are all done
    drop(counts_tx);

    // Merge token counts as they come, until all workers are done and all their
    // output has been received, or one of them fails
    let mut merge = StatsMerge::new(input, total_words);
    loop {
        tokio::select! {
            Some(count) = counts_rx.recv() => merge.add(count)?,
            Some(outcome) = workers.join_next() => {
                let outcome = outcome
                    .context("collecting results from one data file")
                    .and_then(|result| result);
                if let Err(e) = outcome {
                    log::error!("Aborting after failure to aggregate a data file: {e:#}");
                    cancel.cancel();
                    workers.abort_all();
                    return Err(e);
                }
            }
            else => break,
        }
    }
    let stats = merge.finish();
    log::info!("Collected {} word statistics from {num_files} data files", stats.len());
    Ok(stats)
}

/// Aggregate a data file and send the resulting token counts to the collector
async fn aggregate_file(
    input: InputConfig,
    source: DataSource,
    client: reqwest::Client,
    opened: ProgressTracker,
    bytes: ProgressTracker,
    counts: mpsc::Sender<TokenCount>,
    cancel: CancellationToken,
) -> Result<()> {
    let context = || format!("aggregating {source}");
    let tsv_bytes = source
        .open(&client, bytes.clone())
        .await
        .with_context(context)?;
    if opened.make_progress(1) {
        bytes.done_adding_work();
    }

    let Some(aggregate) = tsv::aggregate(tsv_bytes, input, &cancel)
        .await
        .with_context(context)?
    else {
        return Ok(());
    };
    let mut num_sent = 0usize;
    for count in aggregate.finish(input.per_file_threshold()) {
        if counts.send(count).await.is_err() {
            // Collector is gone because another data file failed
            return Ok(());
        }
        num_sent += 1;
    }
    log::debug!("Done with {source}, which contributed {num_sent} tokens");
    Ok(())
}

/// Merging of the token counts from all data files
#[derive(Debug)]
enum StatsMerge {
    /// Counts were already thresholded per data file, so they can be turned
    /// into frequencies right away
    PerFile {
        total_words: MatchCount,
        stats: Vec<WordStat>,
    },

    /// Counts must be summed across data files before thresholding
    AllFiles {
        total_words: MatchCount,
        min_matches: MatchCount,
        counts: HashMap<Token, MatchCount>,
    },
}
//
impl StatsMerge {
    /// Prepare to merge token counts
    fn new(input: InputConfig, total_words: MatchCount) -> Self {
        match input.threshold_scope {
            ThresholdScope::PerFile => Self::PerFile {
                total_words,
                stats: Vec::new(),
            },
            ThresholdScope::AllFiles => Self::AllFiles {
                total_words,
                min_matches: input.min_matches,
                counts: HashMap::new(),
            },
        }
    }

    /// Integrate a token count from one data file
    fn add(&mut self, count: TokenCount) -> Result<()> {
        match self {
            Self::PerFile { total_words, stats } => stats.push(WordStat::new(count, *total_words)),
            Self::AllFiles { counts, .. } => match counts.entry(count.token) {
                hash_map::Entry::Occupied(mut o) => {
                    let Some(total) = o.get().checked_add(count.count) else {
                        anyhow::bail!("occurence count overflow for {:?}", o.key());
                    };
                    o.insert(total);
                }
                hash_map::Entry::Vacant(v) => {
                    v.insert(count.count);
                }
            },
        }
        Ok(())
    }

    /// Produce the final word statistics
    fn finish(self) -> Vec<WordStat> {
        match self {
            Self::PerFile { stats, .. } => stats,
            Self::AllFiles {
                total_words,
                min_matches,
                counts,
            } => counts
                .into_iter()
                .filter(|(_token, count)| *count > min_matches)
                .map(|(token, count)| WordStat::new(TokenCount { token, count }, total_words))
                .collect(),
        }
    }
}
