//! Location and opening of dataset files

use crate::{
    config::{Config, DataLocation},
    error::IngestError,
    progress::ProgressTracker,
};
use async_compression::tokio::bufread::GzipDecoder;
use futures::StreamExt;
use reqwest::Response;
use std::{
    fmt,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use tokio::{
    fs::File,
    io::{AsyncBufRead, AsyncRead},
};
use tokio_util::io::{ReaderStream, StreamReader};

/// Decoded byte stream from a dataset file
pub type SourceReader = Box<dyn AsyncRead + Send + Unpin>;

/// Dataset file, either on disk or on a web server
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum DataSource {
    /// Local file
    File(PathBuf),

    /// Remote file, to be downloaded
    Url(Box<str>),
}
//
impl DataSource {
    /// Truth that the file is gzip-compressed
    pub fn is_gzipped(&self) -> bool {
        match self {
            Self::File(path) => path.extension().is_some_and(|ext| ext == "gz"),
            Self::Url(url) => url.ends_with(".gz"),
        }
    }

    /// Start reading the file
    ///
    /// The file size is added to `bytes` once known, and `bytes` then tracks
    /// how many raw (compressed) bytes have been read so far. Decompression is
    /// applied to gzipped files.
    pub async fn open(
        &self,
        client: &reqwest::Client,
        bytes: ProgressTracker,
    ) -> Result<SourceReader, IngestError> {
        // Slice the raw file into chunks of bytes
        let raw_bytes: Box<dyn AsyncBufRead + Send + Unpin> = match self {
            Self::File(path) => {
                let file = File::open(path).await?;
                bytes.add_work(file.metadata().await?.len());
                Box::new(StreamReader::new(ReaderStream::new(file).map(move |res| {
                    res.inspect(|bytes_block| {
                        bytes.make_progress(bytes_block.len() as u64);
                    })
                })))
            }
            Self::Url(url) => {
                let response = client
                    .get(&**url)
                    .send()
                    .await
                    .and_then(Response::error_for_status)
                    .map_err(translate_reqwest_error)?;
                if let Some(length) = response.content_length() {
                    bytes.add_work(length);
                }
                Box::new(StreamReader::new(Box::pin(response.bytes_stream().map(move |res| {
                    res
                        // Track how many input bytes have been downloaded so far
                        .inspect(|bytes_block| {
                            bytes.make_progress(bytes_block.len() as u64);
                        })
                        .map_err(translate_reqwest_error)
                }))))
            }
        };

        // Apply gzip decoder to compressed bytes
        if self.is_gzipped() {
            let mut decoder = GzipDecoder::new(raw_bytes);
            decoder.multiple_members(true);
            Ok(Box::new(decoder))
        } else {
            Ok(Box::new(raw_bytes))
        }
    }
}
//
impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Translate reqwest errors into I/O errors
fn translate_reqwest_error(e: reqwest::Error) -> io::Error {
    io::Error::new(ErrorKind::Other, Box::new(e))
}

/// Dataset files to be processed
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DatasetSources {
    /// File with the total number of words per year
    pub totals: DataSource,

    /// 1-gram data files
    pub data_files: Vec<DataSource>,
}

/// Find out which files make up the dataset
///
/// For local datasets, this checks that exactly one total word count file and
/// at least one data file are present.
pub fn locate(config: &Config) -> Result<DatasetSources, IngestError> {
    let language = &config.language;
    match &config.location {
        DataLocation::Download => Ok(DatasetSources {
            totals: DataSource::Url(language.totals_url()),
            data_files: language.dataset_urls().map(DataSource::Url).collect(),
        }),
        DataLocation::Directory(dir) => {
            let mut totals = glob_files(dir, &language.totals_file_pattern())?;
            let totals = match totals.len() {
                1 => totals.remove(0),
                0 => {
                    return Err(IngestError::Configuration(format!(
                        "no total word count file {} found in {}",
                        language.totals_file_name(),
                        dir.display()
                    )))
                }
                n => {
                    return Err(IngestError::Configuration(format!(
                        "expected one total word count file in {}, found {n}",
                        dir.display()
                    )))
                }
            };
            let data_files = glob_files(dir, &language.data_file_pattern())?;
            if data_files.is_empty() {
                return Err(IngestError::Configuration(format!(
                    "no 1-gram data file matching {} found in {}",
                    language.data_file_pattern(),
                    dir.display()
                )));
            }
            log::info!(
                "Found {} data files in {}",
                data_files.len(),
                dir.display()
            );
            Ok(DatasetSources {
                totals,
                data_files,
            })
        }
    }
}

/// List the files matching a glob pattern within a directory
fn glob_files(dir: &Path, file_pattern: &str) -> Result<Vec<DataSource>, IngestError> {
    let dir = dir.to_str().ok_or_else(|| {
        IngestError::Configuration(format!("data directory {dir:?} is not valid UTF-8"))
    })?;
    let pattern = format!("{}/{file_pattern}", glob::Pattern::escape(dir));
    let paths = glob::glob(&pattern)
        .map_err(|e| IngestError::Configuration(format!("bad file pattern {pattern:?}: {e}")))?;
    let mut files = Vec::new();
    for path in paths {
        let path = path.map_err(io::Error::from)?;
        if path.is_file() {
            files.push(DataSource::File(path));
        }
    }
    files.sort_unstable();
    Ok(files)
}
