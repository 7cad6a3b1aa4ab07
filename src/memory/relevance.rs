//! Relevance scoring — how memories are chosen for recall.
//!
//! Two deliberately different modes:
//!
//! * **Query mode** ([`rank_by_query`]): explicit searches. Normalized
//!   blend of importance, content overlap, and tag overlap; scores land in
//!   `[0, 1]` and an empty query degrades to importance ordering.
//! * **Context mode** ([`rank_for_context`]): ambient recall against the
//!   current turn. Additive and uncapped: every keyword hit counts, plus
//!   flat bonuses for emotional charge and recency. Only the top
//!   [`CONTEXT_RESULTS`] survive.
//!
//! Both sorts break ties by importance then creation time, so equal-scored
//! runs come back in a stable order.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::memory::types::{Memory, MemoryType};

/// How many memories ambient context recall returns, regardless of caller
/// limits.
pub const CONTEXT_RESULTS: usize = 5;

const QUERY_IMPORTANCE_WEIGHT: f64 = 0.4;
const QUERY_CONTENT_WEIGHT: f64 = 0.4;
const QUERY_TAG_WEIGHT: f64 = 0.2;

/// Flat bonus for memories whose emotion is anything but neutral.
const CONTEXT_EMOTION_BONUS: f64 = 0.5;
/// Days over which the context-mode recency term fades to zero.
const CONTEXT_RECENCY_WINDOW_DAYS: f64 = 30.0;
/// Keyword hits only count for tokens longer than this many characters.
const CONTEXT_MIN_TOKEN_CHARS: usize = 2;

/// Lowercased whitespace tokens.
pub fn tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Query-mode score:
/// `0.4·importance + 0.4·content_overlap + 0.2·tag_overlap`, where the
/// overlaps are fractions of the query's tokens. An empty query zeroes
/// both overlap terms.
pub fn query_score(memory: &Memory, query_tokens: &HashSet<String>) -> f64 {
    let importance_term = QUERY_IMPORTANCE_WEIGHT * memory.importance;
    if query_tokens.is_empty() {
        return importance_term;
    }

    let content_tokens = tokens(&memory.content);
    let content_hits = query_tokens
        .iter()
        .filter(|t| content_tokens.contains(*t))
        .count() as f64;
    let tag_hits = query_tokens
        .iter()
        .filter(|t| memory.tags.iter().any(|tag| tag == *t))
        .count() as f64;
    let denom = query_tokens.len() as f64;

    importance_term
        + QUERY_CONTENT_WEIGHT * (content_hits / denom)
        + QUERY_TAG_WEIGHT * (tag_hits / denom)
}

/// Context-mode score: uncapped keyword hits plus flat bonuses.
/// `hits + 0.5·non_neutral + importance + max(0, 1 − age_days/30)`.
pub fn context_score(memory: &Memory, context_tokens: &HashSet<String>, now: DateTime<Utc>) -> f64 {
    let content_tokens = tokens(&memory.content);
    let keyword_hits = context_tokens
        .iter()
        .filter(|t| t.chars().count() > CONTEXT_MIN_TOKEN_CHARS && content_tokens.contains(*t))
        .count() as f64;

    let emotion_bonus = if memory.emotion.primary == crate::emotion::EmotionLabel::Neutral {
        0.0
    } else {
        CONTEXT_EMOTION_BONUS
    };

    let age_days = ((now - memory.created_at).num_seconds() as f64 / 86_400.0).max(0.0);
    let recency = (1.0 - age_days / CONTEXT_RECENCY_WINDOW_DAYS).max(0.0);

    keyword_hits + emotion_bonus + memory.importance + recency
}

/// Rank for an explicit search: optional type filter, score, sort,
/// truncate to `limit`.
pub fn rank_by_query(
    mut memories: Vec<Memory>,
    query: &str,
    limit: usize,
    types: Option<&[MemoryType]>,
) -> Vec<Memory> {
    if let Some(types) = types {
        memories.retain(|m| types.contains(&m.memory_type));
    }
    let query_tokens = tokens(query);
    let mut scored: Vec<(f64, Memory)> = memories
        .into_iter()
        .map(|m| (query_score(&m, &query_tokens), m))
        .collect();
    sort_scored(&mut scored);
    scored.into_iter().take(limit).map(|(_, m)| m).collect()
}

/// Rank for ambient recall against the current turn text; the limit is
/// fixed at [`CONTEXT_RESULTS`].
pub fn rank_for_context(memories: Vec<Memory>, context: &str, now: DateTime<Utc>) -> Vec<Memory> {
    let context_tokens = tokens(context);
    let mut scored: Vec<(f64, Memory)> = memories
        .into_iter()
        .map(|m| (context_score(&m, &context_tokens, now), m))
        .collect();
    sort_scored(&mut scored);
    scored
        .into_iter()
        .take(CONTEXT_RESULTS)
        .map(|(_, m)| m)
        .collect()
}

fn sort_scored(scored: &mut [(f64, Memory)]) {
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.1.importance
                    .partial_cmp(&a.1.importance)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| b.1.created_at.cmp(&a.1.created_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::{Emotion, EmotionLabel};
    use chrono::Duration;
    use uuid::Uuid;

    fn mem(content: &str, importance: f64, tags: &[&str], age_days: i64) -> Memory {
        let created = Utc::now() - Duration::days(age_days);
        Memory {
            id: Uuid::now_v7(),
            user_id: "ava".into(),
            content: content.into(),
            memory_type: MemoryType::Conversation,
            importance,
            emotion: Emotion::neutral(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: created,
            last_accessed_at: created,
            embedding: None,
        }
    }

    // ── Query mode ───────────────────────────────────────────────────────

    #[test]
    fn query_score_blends_three_terms() {
        let memory = mem("the beach trip was wonderful", 0.5, &["travel"], 0);
        let q = tokens("beach trip travel");
        // importance 0.4*0.5, content 0.4*(2/3), tags 0.2*(1/3)
        let expected = 0.2 + 0.4 * (2.0 / 3.0) + 0.2 * (1.0 / 3.0);
        assert!((query_score(&memory, &q) - expected).abs() < 1e-9);
    }

    #[test]
    fn empty_query_scores_importance_only() {
        let memory = mem("anything at all", 0.7, &["general"], 0);
        let q = tokens("   ");
        assert!((query_score(&memory, &q) - 0.4 * 0.7).abs() < 1e-9);
    }

    #[test]
    fn overlapping_important_memory_outranks_unrelated() {
        let relevant = mem("planning the beach trip with mom", 0.8, &["travel"], 1);
        let unrelated = mem("groceries were expensive", 0.3, &["general"], 1);
        let ranked = rank_by_query(vec![unrelated, relevant], "beach trip", 10, None);
        assert_eq!(ranked[0].content, "planning the beach trip with mom");
    }

    #[test]
    fn content_overlap_decides_between_equally_important() {
        let close = mem("I adore my family", 0.9, &["general"], 1);
        let noise = mem("random unrelated text", 0.9, &["general"], 1);
        let ranked = rank_by_query(vec![noise, close], "I love my family", 10, None);
        assert_eq!(ranked[0].content, "I adore my family");
    }

    #[test]
    fn type_filter_and_limit_apply() {
        let mut gift = mem("wants the blue scarf as a present", 0.6, &["general"], 0);
        gift.memory_type = MemoryType::Gift;
        let chat = mem("talked about scarves", 0.9, &["general"], 0);

        let ranked = rank_by_query(
            vec![chat.clone(), gift.clone()],
            "scarf",
            10,
            Some(&[MemoryType::Gift]),
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].memory_type, MemoryType::Gift);

        let ranked = rank_by_query(vec![chat, gift], "scarf", 1, None);
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn query_matching_is_case_insensitive() {
        let memory = mem("Loves the Lake House", 0.1, &["general"], 0);
        let q = tokens("LAKE house");
        assert!(query_score(&memory, &q) > 0.4 * 0.1);
    }

    // ── Context mode ─────────────────────────────────────────────────────

    #[test]
    fn keyword_hits_are_uncapped() {
        let broad = mem("beach trip sunset photos", 0.1, &["general"], 0);
        let narrow = mem("one beach note", 0.1, &["general"], 0);
        let ctx = tokens("beach trip sunset photos");
        assert!(context_score(&broad, &ctx, Utc::now()) > context_score(&narrow, &ctx, Utc::now()));
    }

    #[test]
    fn short_tokens_do_not_count_as_hits() {
        let memory = mem("we sat by it at dusk", 0.0, &["general"], 40);
        // Every context token is <= 2 chars, so no hit despite overlap.
        let score = context_score(&memory, &tokens("we by it at"), Utc::now());
        assert!(score.abs() < 1e-9);
    }

    #[test]
    fn emotional_memories_get_a_flat_bonus() {
        let mut charged = mem("quiet tuesday evening", 0.2, &["general"], 40);
        charged.emotion = Emotion::new(EmotionLabel::Sadness, 0.6);
        let flat = mem("quiet tuesday evening", 0.2, &["general"], 40);

        let ctx = tokens("unrelated words");
        let diff = context_score(&charged, &ctx, Utc::now()) - context_score(&flat, &ctx, Utc::now());
        assert!((diff - 0.5).abs() < 1e-9);
    }

    #[test]
    fn recency_fades_over_thirty_days() {
        let ctx = tokens("nothing matching");
        let now = Utc::now();

        let fresh = mem("some moment", 0.0, &["general"], 0);
        let fading = mem("some moment", 0.0, &["general"], 15);
        let gone = mem("some moment", 0.0, &["general"], 45);

        let fresh_score = context_score(&fresh, &ctx, now);
        let fading_score = context_score(&fading, &ctx, now);
        let gone_score = context_score(&gone, &ctx, now);

        assert!(fresh_score > fading_score);
        assert!((fading_score - 0.5).abs() < 0.01);
        assert!(gone_score.abs() < 1e-9);
    }

    #[test]
    fn context_recall_caps_at_five() {
        let memories: Vec<Memory> = (0..8)
            .map(|i| mem(&format!("memory number {i}"), 0.5, &["general"], 0))
            .collect();
        let ranked = rank_for_context(memories, "memory", Utc::now());
        assert_eq!(ranked.len(), CONTEXT_RESULTS);
    }

    #[test]
    fn exact_ties_break_by_creation_time() {
        // Both are past the recency window with equal importance, so their
        // scores are identical; the newer record must come first.
        let older = mem("same words here", 0.5, &["general"], 40);
        let newer = mem("same words here", 0.5, &["general"], 35);

        let ranked = rank_for_context(vec![older.clone(), newer.clone()], "zzz", Utc::now());
        assert_eq!(ranked[0].id, newer.id);
        assert_eq!(ranked[1].id, older.id);
    }
}
