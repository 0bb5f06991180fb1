//! Errors from loading profiles and traces. The gesture engine itself does
//! not fail.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("profile not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid profile: {0}")]
    Invalid(String),

    #[error("no home directory to keep profiles in")]
    NoConfigDir,
}

impl ProfileError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("failed to read trace {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("trace line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("trace line {line}: timestamp {t} is before the previous frame ({previous})")]
    OutOfOrder { line: usize, t: u64, previous: u64 },
}
