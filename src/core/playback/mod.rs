//! Agent audio playback.

mod errors;
mod queue;
mod sink;

pub use errors::{PlaybackError, PlaybackResult};
pub use queue::{PlaybackErrorCallback, PlaybackQueue};
pub use sink::{AudioSegment, AudioSink};
