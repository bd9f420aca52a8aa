//! Interview coach: orchestrates the conversation channel, the emotion
//! channel, agent audio playback and the session transcript.
//!
//! # Example
//!
//! ```rust,ignore
//! use parley::core::coach::{CoachConfig, InterviewCoach};
//! use parley::core::elevenlabs::ConversationConfig;
//! use parley::core::interview::InterviewConfig;
//!
//! let config = CoachConfig::new(
//!     InterviewConfig::new("Backend Engineer"),
//!     ConversationConfig::new("agent_id").with_api_key("key"),
//! );
//! let coach = InterviewCoach::new(config, speaker)?;
//! coach.on_update(|update| async move { println!("{update:?}") });
//! coach.start().await?;
//! coach.send_audio_f32(&mic_samples).await?;
//! coach.finish().await?;
//! ```

mod config;
mod context;
mod errors;
mod manager;
mod updates;

#[cfg(test)]
mod tests;

pub use config::CoachConfig;
pub use errors::{CoachError, CoachResult};
pub use manager::InterviewCoach;
pub use updates::{CoachUpdate, CoachUpdateCallback};
