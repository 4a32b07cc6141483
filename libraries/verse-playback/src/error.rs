//! Error types for playback management

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Queue index outside the valid range
    #[error("Index out of range: {0}")]
    IndexOutOfRange(usize),

    /// Navigation attempted on an empty queue
    #[error("Queue is empty")]
    EmptyQueue,

    /// Transport command requires a loaded item
    #[error("No item loaded")]
    NoItemLoaded,

    /// Decode pipeline could not open the source
    #[error("Pipeline failed to load source: {0}")]
    PipelineLoad(String),

    /// Secondary pipeline failed during crossfade preparation
    #[error("Crossfade preload failed: {0}")]
    CrossfadePreload(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
