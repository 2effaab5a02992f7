//! Failure taxonomy of the ingestion pipeline

use std::{fmt, io};

/// Error that stops the whole run
///
/// These are wrapped into [`anyhow::Error`] with a context message that names
/// the failing stage and source, so the variant only needs to describe what
/// went wrong, not where.
#[derive(Debug)]
pub enum IngestError {
    /// A field could not be decoded into the expected type, or a record does
    /// not have the expected shape
    Parse {
        /// Which field or record was being decoded
        what: &'static str,

        /// Offending input, if it can be singled out
        value: Option<Box<str>>,

        /// Why decoding failed
        reason: String,
    },

    /// Underlying read, download or decompression failure
    Io(io::Error),

    /// Missing or malformed external inputs, detected before any data file is
    /// processed
    Configuration(String),
}
//
impl IngestError {
    /// Build a parse error
    pub fn parse(what: &'static str, value: &str, reason: impl fmt::Display) -> Self {
        Self::Parse {
            what,
            value: Some(value.into()),
            reason: reason.to_string(),
        }
    }

    /// Build a parse error about a record as a whole
    pub fn malformed_record(reason: impl fmt::Display) -> Self {
        Self::Parse {
            what: "record",
            value: None,
            reason: reason.to_string(),
        }
    }

    /// Truth that this error comes from malformed data rather than from I/O
    /// or configuration
    #[cfg(test)]
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}
//
impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse {
                what,
                value: Some(value),
                reason,
            } => write!(f, "failed to parse {what} {value:?}: {reason}"),
            Self::Parse {
                what,
                value: None,
                reason,
            } => write!(f, "failed to parse {what}: {reason}"),
            Self::Io(e) => write!(f, "IO: {e}"),
            Self::Configuration(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}
//
impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse { .. } | Self::Configuration(_) => None,
        }
    }
}
//
impl From<io::Error> for IngestError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}
//
impl From<csv_async::Error> for IngestError {
    fn from(value: csv_async::Error) -> Self {
        // Display of the whole error carries the record position
        let reason = value.to_string();
        match value.into_kind() {
            csv_async::ErrorKind::Io(e) => Self::Io(e),
            _ => Self::malformed_record(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[test]
    fn display_parse() {
        let err = IngestError::parse("year", "19x0", "invalid digit found in string");
        assert_eq!(
            err.to_string(),
            "failed to parse year \"19x0\": invalid digit found in string"
        );
        assert!(err.is_parse());
    }

    #[test]
    fn display_io() {
        let err = IngestError::from(io::Error::new(ErrorKind::UnexpectedEof, "truncated"));
        assert!(err.to_string().starts_with("IO:"));
        assert!(!err.is_parse());
    }

    #[tokio::test]
    async fn csv_errors_are_readable() {
        use futures::StreamExt;

        let mut records = csv_async::AsyncReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .create_reader(&b"ok\t1\ncaf\xe9\t1\n"[..])
            .into_records();
        assert!(records.next().await.unwrap().is_ok());
        let err = IngestError::from(records.next().await.unwrap().unwrap_err());
        assert!(err.is_parse());
        let message = err.to_string();
        assert!(message.starts_with("failed to parse record: "));
        assert!(!message.contains("\"\""));
        assert!(!message.contains("Utf8 {"));
    }

    #[test]
    fn display_configuration() {
        let err = IngestError::Configuration("no data files".into());
        assert_eq!(err.to_string(), "invalid configuration: no data files");
    }
}
