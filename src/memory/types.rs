//! Core memory type definitions.
//!
//! Defines [`MemoryType`] (what kind of moment a memory captures) and
//! [`Memory`] (a full record as persisted in a user's memory list).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Categories a remembered moment can fall into. Stored data may carry
/// labels from older builds, so deserialization folds anything
/// unrecognized into [`MemoryType::Conversation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum MemoryType {
    /// General conversational moments, the catch-all.
    Conversation,
    /// Likes, dislikes, and habits worth honoring later.
    Preference,
    /// Dated occasions: birthdays, anniversaries, plans.
    Event,
    /// Gift ideas and gift-giving moments.
    Gift,
    /// Something the user accomplished.
    Achievement,
    /// Worries the companion should handle with care.
    Concern,
    /// Aspirations and long-range hopes.
    Dream,
    /// Explicit "remember this" moments.
    Memory,
}

impl MemoryType {
    pub const ALL: [MemoryType; 8] = [
        Self::Conversation,
        Self::Preference,
        Self::Event,
        Self::Gift,
        Self::Achievement,
        Self::Concern,
        Self::Dream,
        Self::Memory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conversation => "conversation",
            Self::Preference => "preference",
            Self::Event => "event",
            Self::Gift => "gift",
            Self::Achievement => "achievement",
            Self::Concern => "concern",
            Self::Dream => "dream",
            Self::Memory => "memory",
        }
    }
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse for trusted input (search type filters). Persisted data
/// goes through the tolerant `From<String>` path instead.
impl std::str::FromStr for MemoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|mt| mt.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown memory type: {s}"))
    }
}

impl From<String> for MemoryType {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(Self::Conversation)
    }
}

/// A remembered moment, one JSON document in the user's memory list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    /// UUID v7 (time-sortable) identifier.
    pub id: Uuid,
    pub user_id: String,
    /// The full text of the moment as the user said it.
    pub content: String,
    #[serde(rename = "type")]
    pub memory_type: MemoryType,
    /// Admission-time importance in `[0.0, 1.0]`; relevance scoring reads it.
    pub importance: f64,
    /// Emotional reading of the turn the memory came from.
    pub emotion: crate::emotion::Emotion,
    /// Topic tags; never empty (`general` when nothing matched).
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// Bumped by explicit touches, never by searches.
    pub last_accessed_at: DateTime<Utc>,
    /// Reserved for a future vector-recall path; currently always `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}
