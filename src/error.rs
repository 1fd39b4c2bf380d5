//! Error types for the blink monitor library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A landmark index required by a computation is absent from the frame
    #[error("Missing landmark: index {0}")]
    MissingLandmark(usize),

    /// A landmark is present but carries non-finite coordinates
    #[error("Invalid landmark: index {0} has non-finite coordinates")]
    InvalidLandmark(usize),

    /// Landmark geometry cannot produce a meaningful measurement
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Advisory delivery to a notification sink failed
    #[error("Notification error: {0}")]
    Notification(String),

    /// Recorded landmark stream could not be parsed
    #[error("Replay format error: {0}")]
    ReplayFormat(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic I/O error with description
    #[error("I/O error: {0}")]
    IoError(String),
}

impl Error {
    /// Whether the error only affects the current frame's geometry.
    ///
    /// These are recovered locally with sentinel values and never abort the
    /// frame loop.
    #[must_use]
    pub fn is_transient_geometry(&self) -> bool {
        matches!(
            self,
            Self::MissingLandmark(_) | Self::InvalidLandmark(_) | Self::DegenerateGeometry(_)
        )
    }
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
