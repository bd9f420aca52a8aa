//! Face-expression input and agent context text.

use std::collections::HashMap;

use super::types::{Emotion, EmotionSample, EmotionSource, EmotionSummary};

/// Expression probabilities below this are treated as noise
pub const EXPRESSION_FLOOR: f32 = 0.05;

/// Convert face-expression probabilities (label to probability) into samples.
///
/// The probability is used as both intensity and confidence. Labels are
/// parsed with [`Emotion::parse`]; unrecognised labels are dropped.
pub fn samples_from_expressions(
    expressions: &HashMap<String, f32>,
    timestamp_ms: u64,
) -> Vec<EmotionSample> {
    let mut samples: Vec<EmotionSample> = expressions
        .iter()
        .filter(|(_, p)| p.is_finite() && **p >= EXPRESSION_FLOOR)
        .filter_map(|(label, p)| {
            let emotion = Emotion::parse(label);
            (emotion != Emotion::Unknown).then(|| {
                EmotionSample::new(emotion, *p, *p, timestamp_ms, EmotionSource::FaceExpression)
            })
        })
        .collect();

    // HashMap order is arbitrary
    samples.sort_by(|a, b| b.intensity.total_cmp(&a.intensity));
    samples
}

fn level_word(level: f32) -> &'static str {
    if level >= 0.66 {
        "high"
    } else if level >= 0.33 {
        "moderate"
    } else {
        "low"
    }
}

/// Background note for the conversational agent describing the candidate's state.
pub fn context_update_text(summary: &EmotionSummary) -> String {
    format!(
        "Candidate emotional state: mostly {}, stress {} ({:.2}), engagement {} ({:.2}). \
         Adapt your tone accordingly without mentioning this note.",
        summary.overall_mood,
        level_word(summary.stress_level),
        summary.stress_level,
        level_word(summary.engagement_level),
        summary.engagement_level,
    )
}
