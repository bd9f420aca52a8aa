pub mod audio;
pub mod channel;
pub mod coach;
pub mod elevenlabs;
pub mod emotion;
pub mod gemini;
pub mod interview;
pub mod playback;

// Re-export commonly used types for convenience
pub use audio::{AudioChunker, f32_to_pcm16};

pub use channel::{
    ChannelConfig, ChannelError, ChannelProtocol, ChannelResult, ConnectionState,
    RealtimeChannel, ReconnectPolicy,
};

pub use coach::{CoachConfig, CoachError, CoachResult, CoachUpdate, InterviewCoach};

pub use elevenlabs::{ConversationConfig, ElevenLabsProtocol, fetch_signed_url};

pub use emotion::{Emotion, EmotionAggregator, EmotionSample, EmotionSummary};

pub use gemini::{GeminiEmotionConfig, GeminiEmotionProtocol};

pub use interview::{InterviewConfig, InterviewSession, InterviewStatus};

pub use playback::{AudioSegment, AudioSink, PlaybackError, PlaybackQueue};
