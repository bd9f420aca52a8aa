use std::env;

use super::ServerConfig;
use super::utils::{env_with_fallback, parse_bool, parse_env_number};
use super::yaml::YamlConfig;
use crate::core::channel::BackoffStrategy;
use crate::core::elevenlabs::DEFAULT_API_BASE_URL;
use crate::core::gemini::DEFAULT_GEMINI_MODEL;

/// Merge YAML configuration with environment variables
///
/// Priority order (highest to lowest):
/// 1. Environment variables
/// 2. YAML configuration values
/// 3. Default values
///
/// # Arguments
/// * `yaml_config` - Optional YAML configuration providing base values
///
/// # Returns
/// * `Result<ServerConfig, Box<dyn std::error::Error>>` - The merged configuration or an error
pub fn merge_config(
    yaml_config: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml_config.unwrap_or_default();

    // Helper macro for string values: ENV > YAML > Default
    macro_rules! get_value {
        ($env_vars:expr, $yaml_value:expr, $default:expr) => {
            env_with_fallback($env_vars)
                .or($yaml_value)
                .unwrap_or_else(|| $default.to_string())
        };
    }

    // Helper macro for optional values: ENV > YAML
    macro_rules! get_optional {
        ($env_vars:expr, $yaml_value:expr) => {
            env_with_fallback($env_vars).or($yaml_value)
        };
    }

    // Helper macro for numbers: ENV > YAML > Default
    macro_rules! get_number {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            parse_env_number($env_var)?
                .or($yaml_value)
                .unwrap_or($default)
        };
    }

    let server = yaml.server.unwrap_or_default();
    let elevenlabs = yaml.elevenlabs.unwrap_or_default();
    let gemini = yaml.gemini.unwrap_or_default();
    let reconnect = yaml.reconnect.unwrap_or_default();
    let emotion = yaml.emotion.unwrap_or_default();

    // Server configuration
    let host = get_value!(&["HOST"], server.host, "0.0.0.0");
    let port = get_number!("PORT", server.port, 3001u16);

    // ElevenLabs configuration
    let elevenlabs_api_key = get_optional!(
        &["ELEVENLABS_API_KEY", "NEXT_PUBLIC_ELEVENLABS_API_KEY"],
        elevenlabs.api_key
    );
    let elevenlabs_agent_id = get_optional!(
        &["ELEVENLABS_AGENT_ID", "NEXT_PUBLIC_ELEVENLABS_AGENT_ID"],
        elevenlabs.agent_id
    );
    let elevenlabs_api_base_url = get_value!(
        &["ELEVENLABS_API_BASE_URL"],
        elevenlabs.api_base_url,
        DEFAULT_API_BASE_URL
    );

    // Gemini configuration
    let gemini_api_key = get_optional!(
        &["GEMINI_API_KEY", "NEXT_PUBLIC_GEMINI_API_KEY"],
        gemini.api_key
    );
    let gemini_model = get_value!(&["GEMINI_MODEL"], gemini.model, DEFAULT_GEMINI_MODEL);

    // Reconnect configuration
    let reconnect_max_attempts = get_number!("RECONNECT_MAX_ATTEMPTS", reconnect.max_attempts, 3);
    let reconnect_base_delay_ms =
        get_number!("RECONNECT_BASE_DELAY_MS", reconnect.base_delay_ms, 1000);
    let reconnect_max_delay_ms =
        get_number!("RECONNECT_MAX_DELAY_MS", reconnect.max_delay_ms, 30_000);
    let connect_timeout_secs =
        get_number!("CONNECT_TIMEOUT_SECS", reconnect.connect_timeout_secs, 10);

    let reconnect_backoff = match env::var("RECONNECT_BACKOFF").ok().or(reconnect.backoff) {
        Some(name) => BackoffStrategy::parse(&name).ok_or_else(|| {
            format!("Invalid RECONNECT_BACKOFF '{name}'. Must be 'linear' or 'exponential'")
        })?,
        None => BackoffStrategy::Exponential,
    };

    let reconnect_jitter = match env::var("RECONNECT_JITTER") {
        Ok(value) => parse_bool(&value)
            .ok_or_else(|| format!("Invalid RECONNECT_JITTER value '{value}'"))?,
        Err(_) => reconnect.jitter.unwrap_or(true),
    };

    // Emotion aggregation
    let emotion_window_secs = get_number!("EMOTION_WINDOW_SECS", emotion.window_secs, 30);
    let emotion_max_samples = get_number!("EMOTION_MAX_SAMPLES", emotion.max_samples, 120);

    Ok(ServerConfig {
        host,
        port,
        elevenlabs_api_key,
        elevenlabs_agent_id,
        elevenlabs_api_base_url,
        gemini_api_key,
        gemini_model,
        reconnect_max_attempts,
        reconnect_base_delay_ms,
        reconnect_max_delay_ms,
        reconnect_backoff,
        reconnect_jitter,
        connect_timeout_secs,
        emotion_window_secs,
        emotion_max_samples,
    })
}
