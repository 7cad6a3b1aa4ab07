//! Daily mood tracking.
//!
//! Mood is never stored as a value of its own. Each classified turn appends
//! an [`EmotionEntry`](crate::emotion::EmotionEntry) to that day's log, and
//! every aggregate view over it is derived on read by [`aggregate`].
//! Persistence lives in [`track`].

pub mod aggregate;
pub mod track;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::emotion::{Emotion, EmotionEntry, EmotionLabel};

/// One user's mood picture for a single UTC calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodTracking {
    pub user_id: String,
    pub date: NaiveDate,
    /// Recency-weighted aggregate over the day's entries.
    pub overall_mood: Emotion,
    /// The raw entries behind the aggregate, oldest first.
    pub mood_history: Vec<EmotionEntry>,
    pub triggers: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Declining => "declining",
            Self::Stable => "stable",
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Multi-day mood summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodTrends {
    pub trend: TrendDirection,
    /// Mean of the per-day overall intensities.
    pub average_mood: f64,
    /// Population standard deviation of the same series.
    pub variability: f64,
    /// Most frequent per-day primary labels, up to three.
    pub dominant_emotions: Vec<EmotionLabel>,
}
