//! Interview session state and transcript.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::config::InterviewConfig;
use super::errors::SessionError;
use crate::core::emotion::now_ms;

/// Lifecycle of an interview.
///
/// ```text
/// Configuring ──▶ Starting ──▶ InProgress ◀──▶ Paused
///                    │             │              │
///                    └─────────────┴──────────────┴──▶ Completed
///
/// any non-terminal state ──▶ Error(reason)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum InterviewStatus {
    #[default]
    Configuring,
    Starting,
    InProgress,
    Paused,
    Completed,
    Error(String),
}

impl InterviewStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error(_))
    }

    /// Whether candidate input should be forwarded.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}

impl fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuring => write!(f, "configuring"),
            Self::Starting => write!(f, "starting"),
            Self::InProgress => write!(f, "in progress"),
            Self::Paused => write!(f, "paused"),
            Self::Completed => write!(f, "completed"),
            Self::Error(reason) => write!(f, "failed ({reason})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Interviewer,
    Candidate,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewMessage {
    pub id: Uuid,
    pub role: MessageRole,
    pub text: String,
    pub timestamp_ms: u64,
}

/// One practice interview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSession {
    pub id: Uuid,
    pub config: InterviewConfig,
    pub status: InterviewStatus,
    pub messages: Vec<InterviewMessage>,
    pub started_at_ms: Option<u64>,
    pub ended_at_ms: Option<u64>,
}

impl InterviewSession {
    pub fn new(config: InterviewConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            status: InterviewStatus::Configuring,
            messages: Vec::new(),
            started_at_ms: None,
            ended_at_ms: None,
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            from: self.status.clone(),
            action,
        }
    }

    fn transition(&mut self, next: InterviewStatus) {
        info!("Interview {}: {} -> {}", self.id, self.status, next);
        self.status = next;
    }

    /// Validate the configuration and enter `Starting`.
    pub fn begin(&mut self) -> Result<(), SessionError> {
        if self.status != InterviewStatus::Configuring {
            return Err(self.invalid("start"));
        }
        self.config.validate()?;
        self.transition(InterviewStatus::Starting);
        Ok(())
    }

    /// Channels are connected; the interview is live.
    pub fn mark_in_progress(&mut self) -> Result<(), SessionError> {
        if self.status != InterviewStatus::Starting {
            return Err(self.invalid("go live"));
        }
        self.started_at_ms = Some(now_ms());
        self.transition(InterviewStatus::InProgress);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), SessionError> {
        if self.status != InterviewStatus::InProgress {
            return Err(self.invalid("pause"));
        }
        self.transition(InterviewStatus::Paused);
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), SessionError> {
        if self.status != InterviewStatus::Paused {
            return Err(self.invalid("resume"));
        }
        self.transition(InterviewStatus::InProgress);
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), SessionError> {
        match self.status {
            InterviewStatus::Starting | InterviewStatus::InProgress | InterviewStatus::Paused => {
                self.ended_at_ms = Some(now_ms());
                self.transition(InterviewStatus::Completed);
                Ok(())
            }
            _ => Err(self.invalid("complete")),
        }
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), SessionError> {
        if self.status.is_terminal() {
            return Err(self.invalid("fail"));
        }
        self.ended_at_ms = Some(now_ms());
        self.transition(InterviewStatus::Error(reason.into()));
        Ok(())
    }

    pub fn push_message(&mut self, role: MessageRole, text: impl Into<String>) -> &InterviewMessage {
        self.messages.push(InterviewMessage {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            timestamp_ms: now_ms(),
        });
        &self.messages[self.messages.len() - 1]
    }

    /// Apply an agent correction to the most recent interviewer message.
    ///
    /// Returns false when the last interviewer message does not contain
    /// `original`.
    pub fn apply_correction(&mut self, original: &str, corrected: &str) -> bool {
        let Some(message) = self
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.role == MessageRole::Interviewer)
        else {
            return false;
        };

        let original = original.trim();
        if message.text.trim() == original {
            message.text = corrected.to_string();
            true
        } else if !original.is_empty() && message.text.contains(original) {
            message.text = message.text.replacen(original, corrected, 1);
            true
        } else {
            false
        }
    }

    /// Milliseconds since the interview went live, up to `now_ms` or the end time.
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        match self.started_at_ms {
            Some(start) => self.ended_at_ms.unwrap_or(now_ms).saturating_sub(start),
            None => 0,
        }
    }
}
