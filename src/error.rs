use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("malformed verse record at position {index}: {reason}")]
    ParseRecord { index: usize, reason: String },

    #[error("book name list is empty")]
    EmptyBookList,

    #[error("book ordinal {ordinal} is out of range for {available} known books")]
    BookOrdinalOutOfRange { ordinal: usize, available: usize },

    #[error("{book}: chapter {found} is out of sequence after chapter {previous}")]
    ChapterSequence {
        book: String,
        previous: u32,
        found: u32,
    },

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("{what} out of range: {detail}")]
    OutOfRange { what: &'static str, detail: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Error::Json {
            path: path.into(),
            source,
        }
    }

    /// Query-time misses the serving layer reports as "not found" rather than a failure.
    pub fn is_miss(&self) -> bool {
        matches!(self, Error::NotFound { .. } | Error::OutOfRange { .. })
    }
}
