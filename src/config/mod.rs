//! Configuration module for the parley server
//!
//! This module handles server configuration from various sources: YAML files and
//! environment variables. Environment variables always override YAML values.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use parley::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::core::channel::{BackoffStrategy, ChannelConfig, ReconnectPolicy};
use crate::core::coach::CoachConfig;
use crate::core::elevenlabs::ConversationConfig;
use crate::core::gemini::GeminiEmotionConfig;
use crate::core::interview::InterviewConfig;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

pub use utils::parse_bool;

/// Server configuration
///
/// Contains everything needed to run the credential proxy and the realtime
/// channels:
/// - Server settings (host, port)
/// - ElevenLabs agent credentials
/// - Gemini emotion model credentials
/// - Reconnect and timeout policy shared by both channels
/// - Emotion aggregation window
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // ElevenLabs Conversational AI
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_agent_id: Option<String>,
    pub elevenlabs_api_base_url: String,

    // Gemini Live emotion channel
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,

    // Realtime channel policy
    pub reconnect_max_attempts: u32,
    pub reconnect_base_delay_ms: u64,
    pub reconnect_max_delay_ms: u64,
    pub reconnect_backoff: BackoffStrategy,
    pub reconnect_jitter: bool,
    pub connect_timeout_secs: u64,

    // Emotion aggregation
    pub emotion_window_secs: u64,
    pub emotion_max_samples: usize,
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable overrides
    ///
    /// Priority order (highest to lowest):
    /// 1. Environment variables
    /// 2. YAML file values
    /// 3. Default values
    ///
    /// After loading and merging, performs validation on the final configuration.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // .env is not loaded here: the YAML file is the source of truth and only
        // real environment variables override it.
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reconnect policy shared by the conversation and emotion channels.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            enabled: self.reconnect_max_attempts > 0,
            max_attempts: self.reconnect_max_attempts,
            base_delay: Duration::from_millis(self.reconnect_base_delay_ms),
            max_delay: Duration::from_millis(self.reconnect_max_delay_ms),
            strategy: self.reconnect_backoff,
            jitter: self.reconnect_jitter,
            ..Default::default()
        }
    }

    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            reconnect: self.reconnect_policy(),
            ..Default::default()
        }
    }

    pub fn emotion_window(&self) -> Duration {
        Duration::from_secs(self.emotion_window_secs)
    }

    /// Resolve the agent id to use: the explicit one, else the configured default.
    pub fn resolve_agent_id(&self, agent_id: Option<&str>) -> Option<String> {
        agent_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .or_else(|| self.elevenlabs_agent_id.clone())
    }

    /// Conversation settings for a server-side connection to an agent.
    ///
    /// # Returns
    /// * `Result<ConversationConfig, String>` - The config, or an error message
    ///   when no agent id is available
    pub fn conversation_config(&self, agent_id: Option<&str>) -> Result<ConversationConfig, String> {
        let agent_id = self
            .resolve_agent_id(agent_id)
            .ok_or_else(|| "No ElevenLabs agent id configured".to_string())?;

        let mut config = ConversationConfig::new(agent_id);
        config.api_base_url = self.elevenlabs_api_base_url.clone();
        config.api_key = self.elevenlabs_api_key.clone();
        Ok(config)
    }

    /// Gemini settings, if an API key is configured.
    pub fn emotion_config(&self) -> Option<GeminiEmotionConfig> {
        self.gemini_api_key
            .as_ref()
            .map(|key| GeminiEmotionConfig::new(key.clone()).with_model(self.gemini_model.clone()))
    }

    /// Everything an interview coach needs, built from this configuration.
    ///
    /// The emotion channel is enabled only when a Gemini API key is set.
    pub fn coach_config(
        &self,
        interview: InterviewConfig,
        agent_id: Option<&str>,
    ) -> Result<CoachConfig, String> {
        let mut config = CoachConfig::new(interview, self.conversation_config(agent_id)?)
            .with_channel_config(self.channel_config());
        if let Some(emotion) = self.emotion_config() {
            config = config.with_emotion(emotion);
        }
        config.emotion_window = self.emotion_window();
        config.emotion_max_samples = self.emotion_max_samples;
        Ok(config)
    }
}
