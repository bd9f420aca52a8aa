use async_trait::async_trait;
use bytes::Bytes;

use super::errors::PlaybackError;

/// One queued piece of agent audio.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    /// Monotonic id assigned at enqueue time
    pub id: u64,
    pub data: Bytes,
    /// Queue generation at enqueue time; stale after a `clear()`
    pub generation: u64,
}

/// Output device for decoded agent audio.
///
/// `play` resolves when the segment has finished playing or failed. The
/// queue drops the future to stop playback early, so implementations must
/// stop output when their future is dropped.
#[async_trait]
pub trait AudioSink: Send + Sync + 'static {
    async fn play(&self, segment: AudioSegment) -> Result<(), PlaybackError>;
}
