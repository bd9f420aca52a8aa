use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Environment
/// variables override any values specified here.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3001
///
/// elevenlabs:
///   api_key: "your-elevenlabs-key"
///   agent_id: "your-agent-id"
///   api_base_url: "https://api.elevenlabs.io"
///
/// gemini:
///   api_key: "your-gemini-key"
///   model: "gemini-2.0-flash-exp"
///
/// reconnect:
///   max_attempts: 3
///   base_delay_ms: 1000
///   max_delay_ms: 30000
///   backoff: "exponential"
///   jitter: true
///   connect_timeout_secs: 10
///
/// emotion:
///   window_secs: 30
///   max_samples: 120
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub elevenlabs: Option<ElevenLabsYaml>,
    pub gemini: Option<GeminiYaml>,
    pub reconnect: Option<ReconnectYaml>,
    pub emotion: Option<EmotionYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// ElevenLabs agent settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ElevenLabsYaml {
    pub api_key: Option<String>,
    pub agent_id: Option<String>,
    pub api_base_url: Option<String>,
}

/// Gemini emotion model settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeminiYaml {
    pub api_key: Option<String>,
    pub model: Option<String>,
}

/// Realtime channel reconnect settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ReconnectYaml {
    pub max_attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    /// "linear" or "exponential"
    pub backoff: Option<String>,
    pub jitter: Option<bool>,
    pub connect_timeout_secs: Option<u64>,
}

/// Emotion aggregation settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EmotionYaml {
    pub window_secs: Option<u64>,
    pub max_samples: Option<usize>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
