use serde::{Deserialize, Serialize};

use super::errors::SessionError;

pub const MAX_DURATION_MINUTES: u32 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewType {
    #[default]
    Behavioral,
    Technical,
    SystemDesign,
    Mixed,
}

impl InterviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Behavioral => "behavioral",
            Self::Technical => "technical",
            Self::SystemDesign => "system_design",
            Self::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

/// What the candidate is practising for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewConfig {
    /// Target job title
    pub role: String,
    #[serde(default)]
    pub interview_type: InterviewType,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_duration() -> u32 {
    30
}

fn default_language() -> String {
    "en".to_string()
}

impl InterviewConfig {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            interview_type: InterviewType::default(),
            difficulty: Difficulty::default(),
            duration_minutes: default_duration(),
            language: default_language(),
        }
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.role.trim().is_empty() {
            return Err(SessionError::InvalidConfig("role must not be empty".to_string()));
        }
        if self.duration_minutes == 0 || self.duration_minutes > MAX_DURATION_MINUTES {
            return Err(SessionError::InvalidConfig(format!(
                "duration must be between 1 and {MAX_DURATION_MINUTES} minutes, got {}",
                self.duration_minutes
            )));
        }
        if self.language.trim().is_empty() {
            return Err(SessionError::InvalidConfig(
                "language must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Dynamic variables made available to the conversational agent's prompt.
    pub fn agent_variables(&self) -> Vec<(&'static str, String)> {
        vec![
            ("role", self.role.clone()),
            ("interview_type", self.interview_type.as_str().to_string()),
            ("difficulty", self.difficulty.as_str().to_string()),
            ("duration_minutes", self.duration_minutes.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        assert!(InterviewConfig::new("Backend Engineer").validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_role_and_bad_duration() {
        assert!(InterviewConfig::new("  ").validate().is_err());

        let mut config = InterviewConfig::new("SRE");
        config.duration_minutes = 0;
        assert!(config.validate().is_err());
        config.duration_minutes = 181;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: InterviewConfig =
            serde_json::from_str(r#"{"role": "PM", "interview_type": "system_design"}"#).unwrap();
        assert_eq!(config.interview_type, InterviewType::SystemDesign);
        assert_eq!(config.difficulty, Difficulty::Medium);
        assert_eq!(config.duration_minutes, 30);
        assert_eq!(config.language, "en");
    }
}
