//! Reconnect policy for realtime channels.
//!
//! Decides whether a lost connection is retried and how long to wait before
//! each attempt. Supports linear and exponential backoff, optional jitter,
//! and separates terminal close codes from transient ones.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the delay grows between reconnect attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    /// `attempt * base_delay`
    Linear,
    /// `base_delay * multiplier^(attempt - 1)`
    #[default]
    Exponential,
}

impl BackoffStrategy {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Exponential => "exponential",
        }
    }

    /// Parse a strategy name (case insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "linear" => Some(Self::Linear),
            "exponential" | "exp" => Some(Self::Exponential),
            _ => None,
        }
    }
}

/// Reconnect configuration for a realtime channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Whether lost connections are retried at all
    pub enabled: bool,
    /// Maximum retries per outage (0 = never retry)
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    pub strategy: BackoffStrategy,
    /// Growth factor for exponential backoff
    pub multiplier: f64,
    pub jitter: bool,
    /// Maximum fraction of the delay removed by jitter (0.25 = up to 25% shorter)
    pub jitter_factor: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            strategy: BackoffStrategy::Exponential,
            multiplier: 2.0,
            jitter: true,
            jitter_factor: 0.25,
        }
    }
}

impl ReconnectPolicy {
    /// A policy that never reconnects.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            max_attempts: 0,
            ..Default::default()
        }
    }

    /// Linear backoff without jitter: `attempt * base_delay`.
    pub fn linear(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            strategy: BackoffStrategy::Linear,
            jitter: false,
            ..Default::default()
        }
    }

    /// Exponential backoff with the default multiplier and jitter.
    pub fn exponential(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            strategy: BackoffStrategy::Exponential,
            ..Default::default()
        }
    }

    /// Whether another attempt is allowed after `attempts_made` retries.
    #[inline]
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        self.enabled && attempts_made < self.max_attempts
    }

    /// Delay for the given 1-based attempt before jitter is applied.
    pub fn base_delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let base_ms = self.base_delay.as_millis() as f64;
        let delay_ms = match self.strategy {
            BackoffStrategy::Linear => base_ms * attempt as f64,
            BackoffStrategy::Exponential => {
                base_ms * self.multiplier.max(1.0).powi(attempt as i32 - 1)
            }
        };
        let capped = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Delay for the given 1-based attempt, with jitter when enabled.
    ///
    /// Jitter only shortens the delay, so the result never exceeds
    /// `base_delay_for(attempt)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = self.base_delay_for(attempt);
        if !self.jitter || self.jitter_factor <= 0.0 {
            return delay;
        }
        let factor = self.jitter_factor.min(1.0) * rand::random::<f64>();
        delay.mul_f64(1.0 - factor)
    }
}

/// Whether a closed connection should be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDisposition {
    /// Retrying cannot succeed (normal end, policy/auth rejection, bad payload)
    Terminal,
    /// Network or server hiccup
    Transient,
}

/// Classify a WebSocket close code.
pub fn classify_close_code(code: u16) -> CloseDisposition {
    match code {
        1000 | 1002 | 1003 | 1007 | 1008 | 1009 | 1010 => CloseDisposition::Terminal,
        4000..=4999 => CloseDisposition::Terminal,
        _ => CloseDisposition::Transient,
    }
}

/// Classify an HTTP status returned during the WebSocket handshake.
pub fn classify_handshake_status(status: u16) -> CloseDisposition {
    match status {
        400 | 401 | 403 | 404 => CloseDisposition::Terminal,
        _ => CloseDisposition::Transient,
    }
}
