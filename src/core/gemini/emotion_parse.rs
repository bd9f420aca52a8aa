//! Extract emotion samples from model text.

use serde_json::Value;

use crate::core::emotion::{Emotion, EmotionSample, EmotionSource};

const DEFAULT_SCORE: f32 = 0.5;

/// Parse model output into emotion samples.
///
/// Accepts a JSON array of `{emotion, intensity, confidence}` objects, a
/// single such object, or an object wrapping the array under `emotions`.
/// Markdown code fences and surrounding prose are tolerated. Returns `None`
/// when no sample can be extracted.
pub fn parse_emotion_text(text: &str, timestamp_ms: u64) -> Option<Vec<EmotionSample>> {
    let value = extract_json(text)?;

    let items: Vec<&Value> = match &value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get("emotions") {
            Some(Value::Array(items)) => items.iter().collect(),
            _ => vec![&value],
        },
        _ => return None,
    };

    let samples: Vec<EmotionSample> = items
        .into_iter()
        .filter_map(|item| sample_from_value(item, timestamp_ms))
        .collect();

    (!samples.is_empty()).then_some(samples)
}

fn sample_from_value(item: &Value, timestamp_ms: u64) -> Option<EmotionSample> {
    let label = item
        .get("emotion")
        .or_else(|| item.get("label"))
        .and_then(Value::as_str)?;

    let score = |key: &str| {
        item.get(key)
            .and_then(Value::as_f64)
            .map(|v| v as f32)
            .unwrap_or(DEFAULT_SCORE)
    };

    Some(EmotionSample::new(
        Emotion::parse(label),
        score("intensity"),
        score("confidence"),
        timestamp_ms,
        EmotionSource::Gemini,
    ))
}

fn extract_json(text: &str) -> Option<Value> {
    let stripped = strip_code_fence(text.trim());
    if let Ok(value) = serde_json::from_str::<Value>(stripped) {
        return Some(value);
    }

    // Fall back to the outermost bracketed region
    let start = stripped.find(['[', '{'])?;
    let open = stripped.as_bytes()[start];
    let close = if open == b'[' { ']' } else { '}' };
    let end = stripped.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&stripped[start..=end]).ok()
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag line
    let body = match rest.find('\n') {
        Some(i) => &rest[i + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_array() {
        let text = r#"[{"emotion":"nervous","intensity":0.6,"confidence":0.8},{"emotion":"engaged","intensity":0.4,"confidence":0.9}]"#;
        let samples = parse_emotion_text(text, 10).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].emotion, Emotion::Nervous);
        assert_eq!(samples[0].intensity, 0.6);
        assert_eq!(samples[1].emotion, Emotion::Engaged);
        assert!(samples.iter().all(|s| s.source == EmotionSource::Gemini));
    }

    #[test]
    fn test_parses_fenced_single_object() {
        let text = "```json\n{\"emotion\": \"Confident\", \"intensity\": 0.9}\n```";
        let samples = parse_emotion_text(text, 0).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].emotion, Emotion::Confident);
        assert_eq!(samples[0].confidence, DEFAULT_SCORE);
    }

    #[test]
    fn test_parses_wrapped_array_with_prose() {
        let text = "Here you go: {\"emotions\": [{\"emotion\": \"sad\", \"intensity\": 0.3, \"confidence\": 0.7}]} hope that helps";
        let samples = parse_emotion_text(text, 0).unwrap();
        assert_eq!(samples[0].emotion, Emotion::Sad);
    }

    #[test]
    fn test_plain_text_is_not_emotion() {
        assert!(parse_emotion_text("The candidate seems fine.", 0).is_none());
        assert!(parse_emotion_text("[]", 0).is_none());
        assert!(parse_emotion_text("[1, 2]", 0).is_none());
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        let samples =
            parse_emotion_text(r#"[{"emotion":"angry","intensity":3,"confidence":-1}]"#, 0).unwrap();
        assert_eq!(samples[0].intensity, 1.0);
        assert_eq!(samples[0].confidence, 0.0);
    }
}
