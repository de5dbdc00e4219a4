use thiserror::Error;

/// Errors surfaced by the shuffling core.
///
/// All of these are detected before any distance computation or solving
/// starts; the solver itself cannot fail.
#[derive(Debug, Error)]
pub enum ShuffleError {
    /// An option value is out of range or inconsistent (e.g. a feature
    /// minimum above its maximum, a negative weight, a bad weight token).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Filters or quotas reduced the candidate pool to zero songs.
    #[error("empty candidate pool: {0}")]
    EmptyPool(String),

    /// A song is missing a required attribute with no defined default.
    #[error("missing track data: {0}")]
    DataQuality(String),
}
