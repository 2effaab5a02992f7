//! CSV output of the ranked word statistics

use crate::{stats::WordStat, Result};
use anyhow::Context;
use csv_async::AsyncWriterBuilder;
use std::path::Path;
use tokio::{
    fs::File,
    io::{AsyncWrite, BufWriter},
};

/// Column names of the output, matching the serialized [`WordStat`] fields
const HEADER: [&str; 2] = ["word", "frequency"];

/// Write word statistics as CSV to a file, or to stdout if no path is given
///
/// Frequencies are written with as many digits as needed to read back the
/// exact same floating-point value.
pub async fn write_csv(stats: &[WordStat], path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .await
                .with_context(|| format!("creating output file {}", path.display()))?;
            write_stats(BufWriter::new(file), stats)
                .await
                .with_context(|| format!("writing word statistics to {}", path.display()))
        }
        None => write_stats(BufWriter::new(tokio::io::stdout()), stats)
            .await
            .context("writing word statistics to stdout"),
    }
}

/// Serialize word statistics, with a header line even if there are none
async fn write_stats(writer: impl AsyncWrite + Send + Unpin, stats: &[WordStat]) -> Result<()> {
    let mut serializer = AsyncWriterBuilder::new()
        .has_headers(false)
        .create_serializer(writer);
    serializer.serialize(HEADER).await?;
    for stat in stats {
        serializer.serialize(stat).await?;
    }
    serializer.flush().await?;
    log::info!("Wrote {} word statistics", stats.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn csv_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("words.csv");
        let stats = [
            WordStat {
                token: "dog".into(),
                frequency: 1.1,
            },
            WordStat {
                token: "cat".into(),
                frequency: 0.25,
            },
        ];
        write_csv(&stats, Some(&path)).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "word,frequency\ndog,1.1\ncat,0.25\n"
        );
    }

    #[tokio::test]
    async fn empty_output_has_a_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("words.csv");
        write_csv(&[], Some(&path)).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "word,frequency\n"
        );
    }

    #[tokio::test]
    async fn frequencies_keep_full_precision() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("words.csv");
        let frequency = 1.0 / 3.0;
        let stats = [WordStat {
            token: "third".into(),
            frequency,
        }];
        write_csv(&stats, Some(&path)).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let written = text.lines().nth(1).unwrap().split_once(',').unwrap().1;
        assert_eq!(written.parse::<f64>().unwrap(), frequency);
    }
}
