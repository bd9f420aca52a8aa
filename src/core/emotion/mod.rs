//! Emotion samples and the rolling aggregator.

mod aggregator;
mod expressions;
mod types;

pub use aggregator::{EmotionAggregator, SIGNIFICANT_LEVEL_DELTA, is_significant_change, summarize};
pub use expressions::{EXPRESSION_FLOOR, context_update_text, samples_from_expressions};
pub use types::{Emotion, EmotionSample, EmotionSource, EmotionSummary, now_ms};
