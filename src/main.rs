//! This program ranks words by relative usage frequency, based on the 1-grams
//! of the Google Books Ngram dataset, whose general documentation you can find
//! at <http://storage.googleapis.com/books/ngrams/books/datasetsv3.html>.

mod collect;
mod config;
mod error;
mod languages;
mod output;
mod progress;
mod source;
mod stats;
mod top;
mod totals;
mod tsv;

use crate::{
    config::{Config, DataLocation},
    error::IngestError,
    progress::ProgressReport,
};
use clap::Parser;
use log::LevelFilter;
use std::{num::NonZeroUsize, path::PathBuf};

/// Rank the words of a Google Books corpus by decreasing usage frequency
///
/// The frequency of a word is its number of occurences in books published
/// since the minimal year, divided by the total number of words published
/// over the same period. Ngrams are case-folded and stripped of grammar tags
/// before being counted, and ngrams with periods are ignored.
///
/// Results are written as CSV, most frequent word first.
#[derive(Parser, Debug)]
#[command(version, author)]
struct Args {
    /// Directory where the dataset files were downloaded
    ///
    /// This directory should contain the corpus' total word count file and
    /// its gzipped 1-gram files, named as on Google's servers. Must not be
    /// specified together with --download.
    data_dir: Option<PathBuf>,

    /// Short name of the Google Books Ngram corpus to be used, e.g.
    /// "eng-fiction"
    #[arg(short, long, default_value = "eng-us")]
    language: Box<str>,

    /// Stream the dataset from Google's servers instead of reading it from
    /// a local directory
    #[arg(long, default_value_t = false)]
    download: bool,

    /// Minimum accepted book publication year
    ///
    /// Our data set is based on books, many of which have been published a long
    /// time ago and may thus not represent modern language usage. You can
    /// compensate for this bias by ignoring books published before a certain
    /// year, at the cost of reducing the size of the dataset.
    #[arg(short = 'y', long, default_value = "1960")]
    min_year: Year,

    /// Minimum number of occurences for a word to be reported
    ///
    /// Words must occur strictly more often than this. By default the cutoff
    /// is applied separately to each data file, and a word that is frequent
    /// enough in several data files is reported once per data file.
    #[arg(short = 'm', long, default_value = "10000")]
    min_matches: MatchCount,

    /// Sum occurences across data files before applying the --min-matches
    /// cutoff, so that each word is reported at most once
    #[arg(long, default_value_t = false)]
    merge_sources: bool,

    /// Max number of output words
    ///
    /// Knowing the desired number of outputs right from the start allows this
    /// program to avoid sorting the full word list.
    #[arg(short = 'n', long)]
    max_outputs: Option<NonZeroUsize>,

    /// Output CSV file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}
//
impl Args {
    /// Decode and validate CLI arguments
    pub fn parse_and_check() -> Result<Self> {
        let args = Args::parse();
        args.check()?;
        Ok(args)
    }

    /// Check CLI arguments for basic sanity
    fn check(&self) -> Result<(), IngestError> {
        if self.min_year > DATASET_PUBLICATION_YEAR {
            return Err(IngestError::Configuration(
                "requested minimum publication year excludes all books from the dataset".into(),
            ));
        }
        match (&self.data_dir, self.download) {
            (Some(_), false) | (None, true) => Ok(()),
            (Some(_), true) => Err(IngestError::Configuration(
                "a data directory cannot be used together with --download".into(),
            )),
            (None, false) => Err(IngestError::Configuration(
                "either a data directory or --download must be specified".into(),
            )),
        }
    }

    /// Where the dataset should be read from
    pub fn data_location(&self) -> DataLocation {
        match &self.data_dir {
            Some(dir) => DataLocation::Directory(dir.clone()),
            None => DataLocation::Download,
        }
    }
}
//
#[tokio::main]
async fn main() -> Result<()> {
    // Set up logging
    setup_logging().map_err(|e| anyhow::format_err!("{e}"))?;

    // Decode CLI arguments and locate the dataset
    let args = Args::parse_and_check()?;
    let language = languages::get(&args.language)?;
    let config = Config::new(args, language);
    let sources = source::locate(&config)?;

    // Set up progress reporting
    let report = ProgressReport::new();

    // Compute the frequency denominator before touching any data file
    let client = reqwest::Client::new();
    let total_words =
        totals::load(&sources.totals, &client, config.input.min_year, &report).await?;

    // Aggregate all data files
    let stats = collect::collect_word_stats(
        config.input,
        total_words,
        sources.data_files,
        client,
        &report,
    )
    .await?;

    // Rank and emit the words
    let ranked = top::rank(stats, config.max_outputs);
    output::write_csv(&ranked, config.output.as_deref()).await?;
    Ok(())
}

/// Use anyhow for Result type erasure
pub use anyhow::Result;

/// Year where the dataset that we use was published
pub const DATASET_PUBLICATION_YEAR: Year = 2012;

/// Normalized word
pub type Token = Box<str>;

/// Year of Gregorian Calendar
pub type Year = i16;

/// Number of occurences of a word
///
/// According to
/// https://github.com/orgtre/google-books-ngram-frequency?tab=readme-ov-file#the-underlying-corpus,
/// English can have >283 billion matches over 10 years, so sums over many
/// years need 64 bits.
pub type MatchCount = u64;

/// Set up logging
fn setup_logging() -> syslog::Result<()> {
    syslog::init(
        syslog::Facility::LOG_USER,
        if cfg!(feature = "log-trace") {
            LevelFilter::Trace
        } else if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(cli: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("ngram-freq").chain(cli.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let args = args(&["/data"]);
        assert!(args.check().is_ok());
        assert_eq!(&*args.language, "eng-us");
        assert_eq!(args.min_year, 1960);
        assert_eq!(args.min_matches, 10_000);
        assert!(!args.merge_sources);
        assert_eq!(
            args.data_location(),
            DataLocation::Directory(PathBuf::from("/data"))
        );
    }

    #[test]
    fn config_from_args() {
        let args = args(&["--download", "-l", "fre", "-y", "1990", "-m", "50", "--merge-sources", "-n", "100"]);
        assert!(args.check().is_ok());
        let language = languages::get(&args.language).unwrap();
        let config = Config::new(args, language);
        assert_eq!(config.location, DataLocation::Download);
        assert_eq!(config.language.short_name, "fre");
        assert_eq!(config.input.min_year, 1990);
        assert_eq!(config.input.min_matches, 50);
        assert_eq!(
            config.input.threshold_scope,
            config::ThresholdScope::AllFiles
        );
        assert_eq!(config.max_outputs, NonZeroUsize::new(100));
    }

    #[test]
    fn data_source_must_be_unambiguous() {
        for cli in [&[][..], &["/data", "--download"][..]] {
            assert!(matches!(
                args(cli).check(),
                Err(IngestError::Configuration(_))
            ));
        }
    }

    #[test]
    fn future_cutoff_is_rejected() {
        assert!(args(&["/data", "-y", "2020"]).check().is_err());
    }

    #[tokio::test]
    async fn end_to_end() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path()
                .join("googlebooks-eng-us-all-totalcounts-20120701.txt"),
            "1960,100,5,2\t1950,50,3,1\n",
        )
        .unwrap();
        std::fs::write(
            dir.path()
                .join("googlebooks-eng-us-all-1gram-20120701-d.gz"),
            {
                use tokio::io::AsyncWriteExt;
                let mut encoder =
                    async_compression::tokio::write::GzipEncoder::new(Vec::new());
                encoder
                    .write_all(b"dog\t1960\t60\t1\ndog_NOUN\t1961\t50\t1\ndog\t1950\t900\t1\nd.o.g\t1990\t900\t1\n")
                    .await
                    .unwrap();
                encoder.shutdown().await.unwrap();
                encoder.into_inner()
            },
        )
        .unwrap();
        let out = dir.path().join("out.csv");
        let dir_arg = dir.path().to_str().unwrap();
        let out_arg = out.to_str().unwrap();
        let args = args(&[dir_arg, "-m", "100", "-o", out_arg]);
        let config = Config::new(args, languages::get("eng-us").unwrap());
        let sources = source::locate(&config).unwrap();
        let report = ProgressReport::hidden();
        let client = reqwest::Client::new();

        let total_words =
            totals::load(&sources.totals, &client, config.input.min_year, &report)
                .await
                .unwrap();
        assert_eq!(total_words, 100);
        let stats = collect::collect_word_stats(
            config.input,
            total_words,
            sources.data_files,
            client,
            &report,
        )
        .await
        .unwrap();
        let ranked = top::rank(stats, config.max_outputs);
        output::write_csv(&ranked, config.output.as_deref())
            .await
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "word,frequency\ndog,1.1\n"
        );
    }
}
