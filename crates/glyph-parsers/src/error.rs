//! Errors surfaced by the clang bridge and the components built on it.

/// Parse-time failures. Per the store's error policy, these are reported to
/// the caller but never abort a bulk run — a caller ingesting many files is
/// expected to log a [`ParseError`] for one file and continue with the rest.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("libclang could not be loaded: {0}")]
    LibraryLoad(String),

    #[error("failed to parse translation unit {file}: {reason}")]
    Parse { file: String, reason: String },

    #[error("I/O error reading {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ParseError>;
