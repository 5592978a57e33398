//! Error types for the clock scheduler.

/// Top-level error type for clock scheduling and rendering.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Malformed or unrecognised configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Renderer failed to mount, paint, rebuild or patch.
    #[error("render error: {0}")]
    Render(String),

    /// Visibility source could not be observed or subscribed to.
    #[error("visibility error: {0}")]
    Visibility(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send/receive error (host loop gone).
    #[error("channel error: {0}")]
    Channel(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ClockError>;
