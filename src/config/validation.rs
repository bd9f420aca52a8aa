use super::ServerConfig;

/// Validate reconnect delays
///
/// The cap must not be below the first delay.
pub fn validate_reconnect(
    base_delay_ms: u64,
    max_delay_ms: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    if max_delay_ms < base_delay_ms {
        return Err(format!(
            "RECONNECT_MAX_DELAY_MS ({max_delay_ms}) must be >= RECONNECT_BASE_DELAY_MS ({base_delay_ms})"
        )
        .into());
    }
    Ok(())
}

/// Validate the emotion aggregation window
pub fn validate_emotion_window(
    window_secs: u64,
    max_samples: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    if window_secs == 0 {
        return Err("EMOTION_WINDOW_SECS must be greater than 0".into());
    }
    if max_samples == 0 {
        return Err("EMOTION_MAX_SAMPLES must be greater than 0".into());
    }
    Ok(())
}

/// Run every check on a merged configuration.
pub fn validate(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    validate_reconnect(config.reconnect_base_delay_ms, config.reconnect_max_delay_ms)?;
    validate_emotion_window(config.emotion_window_secs, config.emotion_max_samples)?;

    if config.connect_timeout_secs == 0 {
        return Err("CONNECT_TIMEOUT_SECS must be greater than 0".into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_reconnect() {
        assert!(validate_reconnect(1000, 30_000).is_ok());
        assert!(validate_reconnect(1000, 1000).is_ok());

        let err = validate_reconnect(5000, 1000).unwrap_err();
        assert!(err.to_string().contains("RECONNECT_MAX_DELAY_MS"));
    }

    #[test]
    fn test_validate_emotion_window() {
        assert!(validate_emotion_window(30, 120).is_ok());
        assert!(
            validate_emotion_window(0, 120)
                .unwrap_err()
                .to_string()
                .contains("EMOTION_WINDOW_SECS")
        );
        assert!(
            validate_emotion_window(30, 0)
                .unwrap_err()
                .to_string()
                .contains("EMOTION_MAX_SAMPLES")
        );
    }
}
