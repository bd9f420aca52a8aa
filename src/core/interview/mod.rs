//! Interview session model.

mod config;
mod errors;
mod session;

pub use config::{Difficulty, InterviewConfig, InterviewType, MAX_DURATION_MINUTES};
pub use errors::SessionError;
pub use session::{InterviewMessage, InterviewSession, InterviewStatus, MessageRole};
