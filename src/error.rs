// src/error.rs
//! Error taxonomy.
//!
//! Only [`RunError`] aborts an ingestion run. Everything else is scoped to a
//! single hero (or a single query) and is logged and counted by the caller.

use std::path::PathBuf;

use thiserror::Error;

/// The hero index page could not be turned into a slug list.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("could not load hero index: {0}")]
    Fetch(#[from] FetchError),

    #[error("hero index has no links under {prefix:?}; page layout changed or request was blocked")]
    MarkerMissing { prefix: String },

    #[error("hero index links resolved to zero hero slugs")]
    Empty,
}

/// Navigation / transport failures. Always retried by the pipeline.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("structural marker {marker} did not appear within {secs}s on {url}")]
    MarkerTimeout { url: String, marker: &'static str, secs: u64 },

    #[error("no page loaded; navigate first")]
    NotNavigated,

    #[error("fetch session already closed")]
    Closed,

    #[error("could not start fetch session: {0}")]
    Startup(String),
}

/// Table extraction failures. `TableNotFound` is transient during ingestion.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no matchup table found in page markup")]
    TableNotFound,
}

/// Disk write/read failure for one record. Fatal for that hero only.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error on {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PersistenceError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json { path: path.into(), source }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("retries must be at least 1")]
    ZeroRetries,

    #[error("pacing interval is inverted: min {min:?} > max {max:?}")]
    InvertedPacing { min: std::time::Duration, max: std::time::Duration },

    #[error("patch label must not be empty")]
    EmptyPatch,

    #[error("patch label {0:?} must be a single directory name")]
    BadPatch(String),

    #[error("failure alert ratio must be within [0, 1], got {0}")]
    BadFailureRatio(f64),
}

/// Invalid enemy selection handed to the recommendation engine.
#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("at most {max} enemies may be selected, got {got}")]
    TooMany { max: usize, got: usize },

    #[error("weight for {hero} must be within [0, 1], got {weight}")]
    BadWeight { hero: String, weight: f64 },

    #[error("{0} was selected more than once")]
    Duplicate(String),

    #[error("{0:?} is not a valid hero slug")]
    BadSlug(String),

    #[error("no enemies selected")]
    Empty,

    #[error("{0} has no record in this patch")]
    Unknown(String),
}

/// The two conditions that abort an ingestion run outright.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("could not acquire page fetcher: {0}")]
    Acquire(FetchError),

    #[error("could not prepare output directory: {0}")]
    Output(#[from] PersistenceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("no saved pages matching *.{ext} in {}", .dir.display())]
    NoPages { dir: PathBuf, ext: String },
}

/// Per-hero failure cause, as recorded in the run summary.
#[derive(Debug, Error)]
pub enum HeroError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Persist(#[from] PersistenceError),
}

impl HeroError {
    /// Transient errors consume one attempt and are retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, HeroError::Fetch(_) | HeroError::Extract(_))
    }
}
