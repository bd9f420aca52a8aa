//! Rolling emotion window.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use super::types::{Emotion, EmotionSample, EmotionSummary, clamp_unit, now_ms};

/// Minimum movement in stress or engagement that counts as a change
pub const SIGNIFICANT_LEVEL_DELTA: f32 = 0.15;

/// Aggregates recent samples into an [`EmotionSummary`].
///
/// The window is bounded both by sample age and by sample count, so the
/// summary always reflects the last few seconds of input regardless of how
/// fast samples arrive.
#[derive(Debug)]
pub struct EmotionAggregator {
    window: Duration,
    max_samples: usize,
    samples: VecDeque<EmotionSample>,
    last_summary: EmotionSummary,
}

impl EmotionAggregator {
    pub fn new(window: Duration, max_samples: usize) -> Self {
        Self {
            window,
            max_samples: max_samples.max(1),
            samples: VecDeque::new(),
            last_summary: EmotionSummary::default(),
        }
    }

    pub fn push(&mut self, sample: EmotionSample) {
        if self.samples.len() >= self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn extend(&mut self, samples: impl IntoIterator<Item = EmotionSample>) {
        for sample in samples {
            self.push(sample);
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Summarize the window as of now.
    pub fn summarize(&mut self) -> EmotionSummary {
        self.summarize_at(now_ms())
    }

    /// Summarize the window as of `now_ms`, dropping samples older than the window.
    pub fn summarize_at(&mut self, now_ms: u64) -> EmotionSummary {
        let window_ms = self.window.as_millis() as u64;
        let cutoff = now_ms.saturating_sub(window_ms);
        self.samples.retain(|s| s.timestamp_ms >= cutoff);

        let summary = summarize(self.samples.iter());
        self.last_summary = summary.clone();
        summary
    }

    /// The summary produced by the last call to [`summarize`](Self::summarize).
    pub fn last_summary(&self) -> &EmotionSummary {
        &self.last_summary
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.last_summary = EmotionSummary::default();
    }
}

/// Summarize a batch of samples. An empty batch yields the default summary.
pub fn summarize<'a>(samples: impl IntoIterator<Item = &'a EmotionSample>) -> EmotionSummary {
    let mut totals: HashMap<Emotion, f32> = HashMap::new();
    let mut confidence_sum = 0.0f32;
    let mut stress_sum = 0.0f32;
    let mut engagement_sum = 0.0f32;
    let mut count = 0usize;

    for sample in samples {
        count += 1;
        *totals.entry(sample.emotion).or_default() += sample.weight();
        confidence_sum += sample.confidence;
        stress_sum += sample.confidence * sample.intensity * sample.emotion.stress_weight();
        engagement_sum +=
            sample.confidence * sample.intensity * sample.emotion.engagement_weight();
    }

    if count == 0 {
        return EmotionSummary::default();
    }

    // Ties resolve to the earliest variant so the result is deterministic
    let overall_mood = Emotion::ALL
        .iter()
        .filter_map(|e| totals.get(e).map(|w| (*e, *w)))
        .filter(|(e, _)| *e != Emotion::Unknown)
        .fold(None::<(Emotion, f32)>, |best, (e, w)| match best {
            Some((_, bw)) if bw >= w => best,
            _ => Some((e, w)),
        })
        .map(|(e, _)| e)
        .unwrap_or(Emotion::Unknown);

    let (stress_level, engagement_level) = if confidence_sum > 0.0 {
        (
            clamp_unit(stress_sum / confidence_sum),
            clamp_unit(engagement_sum / confidence_sum),
        )
    } else {
        (0.0, 0.0)
    };

    EmotionSummary {
        overall_mood,
        stress_level,
        engagement_level,
        sample_count: count,
    }
}

/// Whether `next` differs enough from `previous` to tell the agent about it.
pub fn is_significant_change(previous: &EmotionSummary, next: &EmotionSummary) -> bool {
    if next.sample_count == 0 {
        return false;
    }
    previous.overall_mood != next.overall_mood
        || (previous.stress_level - next.stress_level).abs() >= SIGNIFICANT_LEVEL_DELTA
        || (previous.engagement_level - next.engagement_level).abs() >= SIGNIFICANT_LEVEL_DELTA
}
