/// Error types for the audio playback queue
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlaybackError {
    #[error("Invalid audio payload: {0}")]
    Decode(String),
    #[error("Audio segment is empty")]
    EmptySegment,
    #[error("Audio output failed: {0}")]
    Sink(String),
    #[error("Playback queue is shut down")]
    Closed,
}

pub type PlaybackResult<T> = Result<T, PlaybackError>;
