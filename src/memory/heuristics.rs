//! Admission heuristics — which turns deserve to become memories, and
//! with what importance, type, and tags.
//!
//! All pure text-and-emotion rules. They run on every turn, so they stay
//! cheap: lowercase once, substring checks, no allocation beyond the tag
//! list.

use crate::emotion::{Emotion, EmotionLabel};
use crate::memory::types::MemoryType;

/// Minimum turn length (in chars) before anything is remembered.
const MIN_MEMORABLE_CHARS: usize = 10;
/// Above this length a turn is remembered regardless of content.
const LONG_TURN_CHARS: usize = 50;
/// Emotional readings above this intensity are always remembered.
const HIGH_INTENSITY: f64 = 0.7;

const REMEMBER_MARKERS: &[&str] = &[
    "remember", "important", "special", "love", "hate", "never", "always", "dream", "goal",
    "wish", "fear", "worry",
];

const IMPORTANCE_MARKERS: &[&str] = &[
    "love", "hate", "important", "special", "remember", "never forget", "birthday",
    "anniversary", "promotion", "achievement", "goal", "dream", "wish", "fear", "worry",
    "excited", "proud",
];

const POSITIVE_LABELS: &[EmotionLabel] = &[
    EmotionLabel::Love,
    EmotionLabel::Joy,
    EmotionLabel::Excitement,
    EmotionLabel::Gratitude,
];

const NEGATIVE_LABELS: &[EmotionLabel] = &[
    EmotionLabel::Sadness,
    EmotionLabel::Anger,
    EmotionLabel::Fear,
    EmotionLabel::Anxiety,
];

/// Ordered type rules; the first rule with a matching marker wins.
const TYPE_RULES: &[(MemoryType, &[&str])] = &[
    (MemoryType::Gift, &["gift", "present", "surprise"]),
    (MemoryType::Dream, &["dream", "wish", "goal"]),
    (MemoryType::Achievement, &["achievement", "accomplished", "proud"]),
    (MemoryType::Concern, &["worried", "concerned", "problem"]),
    (MemoryType::Event, &["birthday", "anniversary", "event"]),
    (MemoryType::Preference, &["like", "dislike", "prefer"]),
];

/// Topic tag table, checked in order; every matching topic tags the memory.
const TOPIC_TAGS: &[(&str, &[&str])] = &[
    ("work", &["work", "job", "office", "boss", "career", "meeting", "project"]),
    ("family", &["family", "mom", "dad", "mother", "father", "sister", "brother", "parents"]),
    ("relationships", &["friend", "girlfriend", "boyfriend", "partner", "relationship", "date"]),
    ("health", &["health", "doctor", "sick", "gym", "exercise", "sleep", "tired"]),
    ("food", &["food", "eat", "dinner", "lunch", "breakfast", "cook", "restaurant"]),
    ("travel", &["travel", "trip", "vacation", "flight", "visit", "abroad"]),
    ("hobbies", &["hobby", "music", "game", "movie", "book", "read", "paint", "sport"]),
    ("dreams", &["dream", "goal", "wish", "hope", "future", "plan"]),
];

/// Admission gate. Too-short turns never pass; past that, any of high
/// intensity, a marker word, a question, or sheer length admits.
pub fn should_remember(text: &str, emotion: &Emotion) -> bool {
    let chars = text.chars().count();
    if chars < MIN_MEMORABLE_CHARS {
        return false;
    }
    if emotion.intensity > HIGH_INTENSITY {
        return true;
    }
    let lower = text.to_lowercase();
    REMEMBER_MARKERS.iter().any(|marker| lower.contains(marker))
        || text.contains('?')
        || chars > LONG_TURN_CHARS
}

/// Importance estimate in `[0, 1]`: a base of `0.5 + 0.3·intensity`, then
/// stacked bonuses for emotional charge, marker words, length, and
/// questions. Every bonus only ever raises the score; the final clamp is
/// the only thing that pulls it back.
pub fn importance(text: &str, emotion: &Emotion) -> f64 {
    let mut score = 0.5 + emotion.intensity.clamp(0.0, 1.0) * 0.3;

    if POSITIVE_LABELS.contains(&emotion.primary) {
        score += 0.2;
    }
    if NEGATIVE_LABELS.contains(&emotion.primary) {
        score += 0.15;
    }

    let lower = text.to_lowercase();
    let marker_hits = IMPORTANCE_MARKERS
        .iter()
        .filter(|marker| lower.contains(*marker))
        .count();
    score += 0.1 * marker_hits as f64;

    let chars = text.chars().count();
    if chars > 100 {
        score += 0.1;
    }
    if chars > 200 {
        score += 0.1;
    }
    if text.contains('?') {
        score += 0.05;
    }

    score.clamp(0.0, 1.0)
}

/// Classify the kind of moment via the ordered rule table.
pub fn memory_type(text: &str) -> MemoryType {
    let lower = text.to_lowercase();
    for (memory_type, markers) in TYPE_RULES {
        if markers.iter().any(|marker| lower.contains(marker)) {
            return *memory_type;
        }
    }
    MemoryType::Conversation
}

/// Topic tags for the turn; `general` when nothing in the table matched.
pub fn extract_tags(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut tags: Vec<String> = TOPIC_TAGS
        .iter()
        .filter(|(_, markers)| markers.iter().any(|marker| lower.contains(marker)))
        .map(|(topic, _)| topic.to_string())
        .collect();
    if tags.is_empty() {
        tags.push("general".to_string());
    }
    tags
}
