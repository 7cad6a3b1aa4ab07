//! Emotional state types.
//!
//! Defines [`EmotionLabel`] (the closed label set the classifier emits),
//! [`Emotion`] (a classified reading with intensity), and [`EmotionEntry`]
//! (one timestamped reading in a user's daily mood log).

pub mod classifier;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of emotion labels. Persisted data may carry labels from
/// older builds, so deserialization folds anything unrecognized into
/// [`EmotionLabel::Neutral`] instead of rejecting the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum EmotionLabel {
    Joy,
    Love,
    Excitement,
    Contentment,
    Gratitude,
    Sadness,
    Anger,
    Fear,
    Anxiety,
    Loneliness,
    Frustration,
    Disappointment,
    Neutral,
    Curious,
    Surprised,
    Confused,
}

impl EmotionLabel {
    /// Every label, in canonical order. Aggregation tie-breaks follow this
    /// order so results stay deterministic.
    pub const ALL: [EmotionLabel; 16] = [
        Self::Joy,
        Self::Love,
        Self::Excitement,
        Self::Contentment,
        Self::Gratitude,
        Self::Sadness,
        Self::Anger,
        Self::Fear,
        Self::Anxiety,
        Self::Loneliness,
        Self::Frustration,
        Self::Disappointment,
        Self::Neutral,
        Self::Curious,
        Self::Surprised,
        Self::Confused,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Joy => "joy",
            Self::Love => "love",
            Self::Excitement => "excitement",
            Self::Contentment => "contentment",
            Self::Gratitude => "gratitude",
            Self::Sadness => "sadness",
            Self::Anger => "anger",
            Self::Fear => "fear",
            Self::Anxiety => "anxiety",
            Self::Loneliness => "loneliness",
            Self::Frustration => "frustration",
            Self::Disappointment => "disappointment",
            Self::Neutral => "neutral",
            Self::Curious => "curious",
            Self::Surprised => "surprised",
            Self::Confused => "confused",
        }
    }
}

impl std::fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse for trusted input (CLI flags, query params). Persisted
/// data goes through the tolerant `From<String>` path instead.
impl std::str::FromStr for EmotionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|label| label.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown emotion label: {s}"))
    }
}

impl From<String> for EmotionLabel {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(Self::Neutral)
    }
}

/// One classified emotional reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emotion {
    pub primary: EmotionLabel,
    /// Strength of the reading in `[0.0, 1.0]`.
    pub intensity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<EmotionLabel>,
    /// Short free-text note on what prompted the reading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Emotion {
    pub fn new(primary: EmotionLabel, intensity: f64) -> Self {
        Self {
            primary,
            intensity: intensity.clamp(0.0, 1.0),
            secondary: None,
            context: None,
        }
    }

    /// The resting state every unreadable or absent signal collapses to.
    pub fn neutral() -> Self {
        Self::new(EmotionLabel::Neutral, 0.5)
    }
}

impl Default for Emotion {
    fn default() -> Self {
        Self::neutral()
    }
}

/// One row in the per-day mood log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionEntry {
    pub emotion: EmotionLabel,
    pub intensity: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}
