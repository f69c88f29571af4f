use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced at the dashboard's outer boundaries.
///
/// Empty selections and zero denominators are valid degenerate data and
/// never produce one of these.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// A yearly batch is missing or unreadable. Fatal at startup.
    #[error("exam batch for {year} at '{}' is unavailable: {reason}", path.display())]
    SourceUnavailable {
        year: i32,
        path: PathBuf,
        reason: String,
    },
    /// The boundary document could not be fetched or parsed. Only the map
    /// view depends on it.
    #[error("boundary document at '{url}' is unavailable: {reason}")]
    DependencyUnavailable { url: String, reason: String },
    #[error("configuration error: {0}")]
    Configuration(String),
}
