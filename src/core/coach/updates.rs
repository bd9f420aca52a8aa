//! Observer notifications emitted by the coach

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::core::channel::ConnectionState;
use crate::core::emotion::EmotionSummary;
use crate::core::interview::{InterviewMessage, InterviewStatus};

/// Something observers (a UI, a recorder) may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum CoachUpdate {
    Status(InterviewStatus),
    /// Connection state of one of the channels ("conversation" or "emotion")
    Connection {
        channel: &'static str,
        state: ConnectionState,
    },
    /// New transcript entry
    Message(InterviewMessage),
    /// The interviewer's last message was corrected after an interruption
    MessageCorrected { original: String, corrected: String },
    Emotion(EmotionSummary),
    /// Candidate interrupted the interviewer; queued audio was dropped
    Interrupted,
    Error(String),
}

/// Callback type for coach updates
pub type CoachUpdateCallback =
    Arc<dyn Fn(CoachUpdate) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;
