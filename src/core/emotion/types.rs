use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Emotion categories recognised from either inference path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    #[default]
    Neutral,
    Happy,
    Confident,
    Engaged,
    Surprised,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Nervous,
    Confused,
    Unknown,
}

impl Emotion {
    pub const ALL: [Emotion; 12] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Confident,
        Emotion::Engaged,
        Emotion::Surprised,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Fearful,
        Emotion::Disgusted,
        Emotion::Nervous,
        Emotion::Confused,
        Emotion::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Confident => "confident",
            Emotion::Engaged => "engaged",
            Emotion::Surprised => "surprised",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Fearful => "fearful",
            Emotion::Disgusted => "disgusted",
            Emotion::Nervous => "nervous",
            Emotion::Confused => "confused",
            Emotion::Unknown => "unknown",
        }
    }

    /// Parse a label from a model response or a face-expression detector.
    ///
    /// Matching is case-insensitive and accepts common synonyms. Anything
    /// unrecognised maps to [`Emotion::Unknown`].
    pub fn parse(label: &str) -> Emotion {
        match label.trim().to_ascii_lowercase().as_str() {
            "neutral" | "calm" => Emotion::Neutral,
            "happy" | "happiness" | "joy" => Emotion::Happy,
            "confident" | "confidence" => Emotion::Confident,
            "engaged" | "interested" | "focused" => Emotion::Engaged,
            "surprised" | "surprise" => Emotion::Surprised,
            "sad" | "sadness" => Emotion::Sad,
            "angry" | "anger" | "frustrated" => Emotion::Angry,
            "fearful" | "fear" | "afraid" => Emotion::Fearful,
            "disgusted" | "disgust" => Emotion::Disgusted,
            "nervous" | "anxious" | "stressed" => Emotion::Nervous,
            "confused" | "confusion" | "uncertain" => Emotion::Confused,
            _ => Emotion::Unknown,
        }
    }

    /// Contribution of this emotion to the stress level, in 0..1.
    pub(crate) fn stress_weight(&self) -> f32 {
        match self {
            Emotion::Neutral => 0.1,
            Emotion::Happy => 0.1,
            Emotion::Confident => 0.0,
            Emotion::Engaged => 0.2,
            Emotion::Surprised => 0.4,
            Emotion::Sad => 0.5,
            Emotion::Angry => 0.8,
            Emotion::Fearful => 0.9,
            Emotion::Disgusted => 0.6,
            Emotion::Nervous => 0.9,
            Emotion::Confused => 0.6,
            Emotion::Unknown => 0.0,
        }
    }

    /// Contribution of this emotion to the engagement level, in 0..1.
    pub(crate) fn engagement_weight(&self) -> f32 {
        match self {
            Emotion::Neutral => 0.3,
            Emotion::Happy => 0.8,
            Emotion::Confident => 0.9,
            Emotion::Engaged => 1.0,
            Emotion::Surprised => 0.7,
            Emotion::Sad => 0.2,
            Emotion::Angry => 0.6,
            Emotion::Fearful => 0.4,
            Emotion::Disgusted => 0.3,
            Emotion::Nervous => 0.5,
            Emotion::Confused => 0.4,
            Emotion::Unknown => 0.0,
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a sample came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionSource {
    /// Multimodal model inference over audio or video
    Gemini,
    /// Client-side face-expression classifier
    FaceExpression,
}

/// One emotion observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionSample {
    pub emotion: Emotion,
    /// 0..1
    pub intensity: f32,
    /// 0..1
    pub confidence: f32,
    pub timestamp_ms: u64,
    pub source: EmotionSource,
}

impl EmotionSample {
    /// Create a sample, clamping intensity and confidence into 0..1.
    pub fn new(
        emotion: Emotion,
        intensity: f32,
        confidence: f32,
        timestamp_ms: u64,
        source: EmotionSource,
    ) -> Self {
        Self {
            emotion,
            intensity: clamp_unit(intensity),
            confidence: clamp_unit(confidence),
            timestamp_ms,
            source,
        }
    }

    /// Weight of this sample when picking the dominant mood.
    #[inline]
    pub fn weight(&self) -> f32 {
        self.intensity * self.confidence
    }
}

/// Rolling summary over the current sample window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionSummary {
    pub overall_mood: Emotion,
    /// 0..1
    pub stress_level: f32,
    /// 0..1
    pub engagement_level: f32,
    pub sample_count: usize,
}

impl Default for EmotionSummary {
    fn default() -> Self {
        Self {
            overall_mood: Emotion::Neutral,
            stress_level: 0.0,
            engagement_level: 0.0,
            sample_count: 0,
        }
    }
}

/// Clamp into 0..1, mapping NaN to 0.
pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
