//! Supported Google Books Ngrams corpora

use crate::{error::IngestError, Result};
use std::sync::OnceLock;

/// Root of Google's public storage for the Ngrams dataset
const DATASET_ROOT_URL: &str = "http://storage.googleapis.com/books/ngrams/books";

/// Version tag of the dataset, as found in file names
const DATASET_VERSION: &str = "20120701";

/// Get information about a corpus
pub fn get(short_name: &str) -> Result<LanguageInfo> {
    supported_languages()
        .iter()
        .find(|(_long_name, lang)| lang.short_name == short_name)
        .map(|(_long, lang)| *lang)
        .ok_or_else(|| {
            let known = supported_languages()
                .iter()
                .map(|(long, lang)| format!("{} ({long})", lang.short_name))
                .collect::<Vec<_>>()
                .join(", ");
            IngestError::Configuration(format!(
                "unknown corpus {short_name:?}, supported corpora are {known}"
            ))
            .into()
        })
}

/// What we know about a corpus of the Google Books Ngrams dataset
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct LanguageInfo {
    /// Short name, as in dataset file names
    pub short_name: &'static str,

    /// Valid word prefixes
    // NOTE: We only care about words, so digit and punctuation files are left
    //       out of downloads
    pub word_prefixes: &'static [Box<str>],
}
//
impl LanguageInfo {
    /// Name of the 1-gram data file associated with a word prefix
    pub fn data_file_name(&self, word_prefix: &str) -> String {
        format!(
            "googlebooks-{}-all-1gram-{DATASET_VERSION}-{word_prefix}.gz",
            self.short_name
        )
    }

    /// Glob pattern matching all 1-gram data files in a local directory
    pub fn data_file_pattern(&self) -> String {
        format!("googlebooks-{}-all-1gram-*.gz", self.short_name)
    }

    /// Name of the file with the total number of words per year
    pub fn totals_file_name(&self) -> String {
        format!(
            "googlebooks-{}-all-totalcounts-{DATASET_VERSION}.txt",
            self.short_name
        )
    }

    /// Glob pattern matching the total word count file in a local directory
    pub fn totals_file_pattern(&self) -> String {
        format!("googlebooks-{}-all-totalcounts-*.txt", self.short_name)
    }

    /// Generate the URLs of the 1-gram data files
    pub fn dataset_urls(&self) -> impl Iterator<Item = Box<str>> + '_ {
        self.word_prefixes.iter().map(move |word_prefix| {
            format!("{DATASET_ROOT_URL}/{}", self.data_file_name(word_prefix)).into()
        })
    }

    /// Generate the URL of the total word count file
    pub fn totals_url(&self) -> Box<str> {
        format!("{DATASET_ROOT_URL}/{}", self.totals_file_name()).into()
    }
}

/// What we know about each corpus that is supported by this program, keyed by
/// the corpus' human-readable name
fn supported_languages() -> &'static [(&'static str, LanguageInfo)] {
    static LAZY: OnceLock<Box<[(&'static str, LanguageInfo)]>> = OnceLock::new();
    LAZY.get_or_init(|| {
        [
            ("English", "eng"),
            ("American English", "eng-us"),
            ("British English", "eng-gb"),
            ("English Fiction", "eng-fiction"),
            ("French", "fre"),
            ("German", "ger"),
            ("Italian", "ita"),
            ("Spanish", "spa"),
        ]
        .into_iter()
        .map(|(long_name, short_name)| {
            (
                long_name,
                LanguageInfo {
                    short_name,
                    word_prefixes: latin_word_prefixes(),
                },
            )
        })
        .collect()
    })
}

/// List of prefixes that are valid at the beginning of a word for all Latin
/// languages in the Google Books Ngrams v2 (20120701) dataset
fn latin_word_prefixes() -> &'static [Box<str>] {
    static LAZY: OnceLock<Box<[Box<str>]>> = OnceLock::new();
    LAZY.get_or_init(|| {
        ('a'..='z')
            .map(|c| c.to_string().into_boxed_str())
            .chain(std::iter::once("other".into()))
            .collect()
    })
}
