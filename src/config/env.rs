use super::ServerConfig;
use super::merge::merge_config;
use super::validation::validate;

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Reads configuration from environment variables, with sensible defaults.
    /// Also loads from .env file if present using dotenvy.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Environment variables are malformed
    /// - Reconnect or emotion settings fail validation
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config = merge_config(None)?;
        validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::cleanup_env_vars;
    use crate::core::channel::BackoffStrategy;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        cleanup_env_vars();

        let config = ServerConfig::from_env().expect("Should load config");
        assert_eq!(config.address(), "0.0.0.0:3001");
        assert_eq!(config.reconnect_max_attempts, 3);
        assert_eq!(config.reconnect_backoff, BackoffStrategy::Exponential);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_custom_values() {
        cleanup_env_vars();

        unsafe {
            env::set_var("HOST", "127.0.0.1");
            env::set_var("PORT", "4000");
            env::set_var("ELEVENLABS_AGENT_ID", "agent-from-env");
            env::set_var("RECONNECT_MAX_ATTEMPTS", "5");
            env::set_var("RECONNECT_BACKOFF", "linear");
            env::set_var("EMOTION_WINDOW_SECS", "10");
        }

        let config = ServerConfig::from_env().expect("Should load config");
        assert_eq!(config.address(), "127.0.0.1:4000");
        assert_eq!(config.elevenlabs_agent_id, Some("agent-from-env".to_string()));
        assert_eq!(config.reconnect_max_attempts, 5);
        assert_eq!(config.reconnect_backoff, BackoffStrategy::Linear);
        assert_eq!(config.emotion_window_secs, 10);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_zero_window() {
        cleanup_env_vars();

        unsafe {
            env::set_var("EMOTION_WINDOW_SECS", "0");
        }

        let result = ServerConfig::from_env();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("EMOTION_WINDOW_SECS")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_inverted_delays() {
        cleanup_env_vars();

        unsafe {
            env::set_var("RECONNECT_BASE_DELAY_MS", "10000");
            env::set_var("RECONNECT_MAX_DELAY_MS", "500");
        }

        assert!(ServerConfig::from_env().is_err());

        cleanup_env_vars();
    }
}
