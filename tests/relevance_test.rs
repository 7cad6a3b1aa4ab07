mod helpers;

use helpers::{seed_memory, test_engine};
use rapport::emotion::EmotionLabel;
use rapport::memory::types::MemoryType;

#[tokio::test]
async fn query_ranking_prefers_content_overlap() {
    let (engine, store) = test_engine();

    seed_memory(
        &*store, "ava", "groceries were expensive", MemoryType::Conversation,
        0.3, EmotionLabel::Neutral, &["general"], 1,
    )
    .await;
    seed_memory(
        &*store, "ava", "planning the beach trip with mom", MemoryType::Event,
        0.8, EmotionLabel::Joy, &["travel", "family"], 1,
    )
    .await;

    let results = engine.search_memories("ava", "beach trip", None, None).await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].content, "planning the beach trip with mom");
}

#[tokio::test]
async fn tag_overlap_counts_toward_query_score() {
    let (engine, store) = test_engine();

    seed_memory(
        &*store, "ava", "a quiet morning walk", MemoryType::Conversation,
        0.5, EmotionLabel::Neutral, &["travel"], 1,
    )
    .await;
    seed_memory(
        &*store, "ava", "a quiet morning walk", MemoryType::Conversation,
        0.5, EmotionLabel::Neutral, &["general"], 1,
    )
    .await;

    let results = engine.search_memories("ava", "travel", None, None).await;
    assert_eq!(results[0].tags, vec!["travel"]);
}

#[tokio::test]
async fn type_filter_restricts_results() {
    let (engine, store) = test_engine();

    seed_memory(
        &*store, "ava", "wants the blue scarf as a present", MemoryType::Gift,
        0.6, EmotionLabel::Joy, &["general"], 0,
    )
    .await;
    seed_memory(
        &*store, "ava", "talked about scarves for an hour", MemoryType::Conversation,
        0.9, EmotionLabel::Neutral, &["general"], 0,
    )
    .await;

    let results = engine
        .search_memories("ava", "scarf", None, Some(&[MemoryType::Gift]))
        .await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].memory_type, MemoryType::Gift);
}

#[tokio::test]
async fn limit_defaults_to_config_and_caps_results() {
    let (engine, store) = test_engine();

    for i in 0..12 {
        seed_memory(
            &*store, "ava", &format!("note {i}"), MemoryType::Conversation,
            0.5, EmotionLabel::Neutral, &["general"], 0,
        )
        .await;
    }

    let results = engine.search_memories("ava", "", None, None).await;
    assert_eq!(results.len(), 10);

    let results = engine.search_memories("ava", "", Some(3), None).await;
    assert_eq!(results.len(), 3);
}

#[tokio::test]
async fn context_recall_caps_at_five() {
    let (engine, store) = test_engine();

    for i in 0..8 {
        seed_memory(
            &*store, "ava", &format!("shared memory {i}"), MemoryType::Conversation,
            0.5, EmotionLabel::Joy, &["general"], 0,
        )
        .await;
    }

    let context = engine.get_context("ava", "memory").await;
    assert_eq!(context.relevant_memories.len(), 5);
}

#[tokio::test]
async fn emotionally_charged_memories_surface_first() {
    // Charged one seeded first, so the neutral one is newer; the flat
    // emotion bonus still has to win.
    let (engine, store) = test_engine();

    seed_memory(
        &*store, "ava", "tuesday at the lake", MemoryType::Conversation,
        0.5, EmotionLabel::Sadness, &["general"], 2,
    )
    .await;
    seed_memory(
        &*store, "ava", "tuesday at the lake", MemoryType::Conversation,
        0.5, EmotionLabel::Neutral, &["general"], 2,
    )
    .await;

    let context = engine.get_context("ava", "nothing related").await;
    assert_eq!(context.relevant_memories[0].emotion.primary, EmotionLabel::Sadness);
}

#[tokio::test]
async fn fresh_keyword_match_outranks_stale_important() {
    let (engine, store) = test_engine();

    seed_memory(
        &*store, "ava", "an old treasured secret", MemoryType::Conversation,
        1.0, EmotionLabel::Love, &["general"], 60,
    )
    .await;
    seed_memory(
        &*store, "ava", "tickets for the concert friday", MemoryType::Event,
        0.4, EmotionLabel::Joy, &["hobbies"], 0,
    )
    .await;

    let context = engine.get_context("ava", "excited about the concert").await;
    assert_eq!(context.relevant_memories[0].content, "tickets for the concert friday");
}

#[tokio::test]
async fn empty_store_returns_empty_results() {
    let (engine, _store) = test_engine();

    assert!(engine.search_memories("ava", "anything", None, None).await.is_empty());

    let context = engine.get_context("ava", "hello").await;
    assert!(context.relevant_memories.is_empty());
    assert_eq!(context.current_mood.primary, EmotionLabel::Neutral);
}
