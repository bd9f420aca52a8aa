use super::session::InterviewStatus;

/// Error types for the interview session state machine
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid interview configuration: {0}")]
    InvalidConfig(String),
    #[error("Cannot {action} while interview is {from}")]
    InvalidTransition {
        from: InterviewStatus,
        action: &'static str,
    },
}
