//! Error types for the persistence layer.

use std::path::PathBuf;

use tracemotif_core::{ConstructionError, MotifError};

/// Failures while encoding or decoding trace and motif files.
///
/// `origin` names what was being decoded: the file path for on-disk reads,
/// otherwise the trace's `base_id` once it is known.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("{origin}: {field} is {len} bytes but the field holds at most {max}")]
    FieldTooLong {
        origin: String,
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{origin}: {field} ends in a zero byte and would not read back intact")]
    TrailingZeroByte { origin: String, field: &'static str },

    #[error("{origin}: truncated file: {field} needs {needed} bytes at offset {offset}, {available} remain")]
    TruncatedFile {
        origin: String,
        field: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("{origin}: {extra} unexpected bytes after the last record")]
    TrailingBytes { origin: String, extra: usize },

    #[error("{origin}: malformed header: {detail}")]
    MalformedHeader { origin: String, detail: String },

    #[error("{origin}: unknown motif encoding tag {tag}")]
    UnknownMotifEncoding { origin: String, tag: u8 },

    #[error("{origin}: invalid motif record {index}: {source}")]
    InvalidMotif {
        origin: String,
        index: usize,
        #[source]
        source: MotifError,
    },

    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CodecError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CodecError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for decode failures that mean "this file is unusable" rather than
    /// an environment problem.
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            CodecError::TruncatedFile { .. }
                | CodecError::TrailingBytes { .. }
                | CodecError::MalformedHeader { .. }
                | CodecError::UnknownMotifEncoding { .. }
                | CodecError::InvalidMotif { .. }
        )
    }
}

/// Failures of the [`ArtifactCache`](crate::cache::ArtifactCache).
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache index is unreadable: {0}")]
    Index(#[from] serde_json::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Failures loading `tracemotif.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid toml in '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("dataset '{dataset}': {field} must be positive")]
    ZeroWidth {
        dataset: String,
        field: &'static str,
    },
}
