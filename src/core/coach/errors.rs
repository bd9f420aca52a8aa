//! Error types for InterviewCoach operations

use crate::core::channel::ChannelError;
use crate::core::interview::{InterviewStatus, SessionError};
use crate::core::playback::PlaybackError;

/// Error types for InterviewCoach operations
#[derive(Debug, thiserror::Error)]
pub enum CoachError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),
    #[error("Interview is {0}, input is not accepted")]
    NotActive(InterviewStatus),
    #[error("Emotion channel is not configured")]
    EmotionDisabled,
}

/// Result type for InterviewCoach operations
pub type CoachResult<T> = Result<T, CoachError>;
