//! Processing pipeline configuration

use crate::{languages::LanguageInfo, Args, MatchCount, Year};
use std::{num::NonZeroUsize, path::PathBuf, sync::Arc};

/// Final process configuration
///
/// This is the result of combining digested [`Args`] with the selected
/// dataset. Please refer to [`Args`] to know more about common fields.
#[allow(missing_docs)]
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Config {
    /// Dataset that is being processed
    pub language: LanguageInfo,

    /// Where the dataset files come from
    pub location: DataLocation,

    /// Subset of the configuration that affects how data files are aggregated
    pub input: InputConfig,

    // Other fields have the same meaning as in Args
    pub max_outputs: Option<NonZeroUsize>,
    pub output: Option<PathBuf>,
}
//
impl Config {
    /// Determine process configuration from initialization products
    pub(crate) fn new(args: Args, language: LanguageInfo) -> Arc<Self> {
        let location = args.data_location();
        let Args {
            data_dir: _,
            language: _,
            download: _,
            min_year,
            min_matches,
            merge_sources,
            max_outputs,
            output,
        } = args;
        Arc::new(Self {
            language,
            location,
            input: InputConfig {
                min_year,
                min_matches,
                threshold_scope: if merge_sources {
                    ThresholdScope::AllFiles
                } else {
                    ThresholdScope::PerFile
                },
            },
            max_outputs,
            output,
        })
    }
}

/// Where the dataset files should be read from
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum DataLocation {
    /// Local directory where the dataset was previously downloaded
    Directory(PathBuf),

    /// Google's public storage bucket
    Download,
}

/// Subset of the configuration that affects how data files are aggregated
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct InputConfig {
    // Fields have the same meaning as in Args
    pub min_year: Year,
    pub min_matches: MatchCount,

    /// Level at which the `min_matches` cutoff is applied
    pub threshold_scope: ThresholdScope,
}
//
impl InputConfig {
    /// Occurence count that a token must strictly exceed within a single data
    /// file in order to be handed over by that file's worker
    pub fn per_file_threshold(&self) -> MatchCount {
        match self.threshold_scope {
            ThresholdScope::PerFile => self.min_matches,
            // Every token that occured at all must reach the global merge
            ThresholdScope::AllFiles => 0,
        }
    }
}

/// Level at which the minimal occurence count cutoff is applied
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ThresholdScope {
    /// Each data file is thresholded independently, and a word may thus be
    /// reported once per data file where it is frequent enough
    #[default]
    PerFile,

    /// Occurence counts are summed across all data files before thresholding,
    /// and each word is reported at most once
    AllFiles,
}
