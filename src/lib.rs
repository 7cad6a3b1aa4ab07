//! Emotional memory for companion chat — per-user mood tracking, weighted
//! memory recall, and occasion reminders over a pluggable key-value store.
//!
//! Rapport sits between a chat frontend and its reply-composition layer.
//! Every user turn is classified into one of sixteen emotion labels, folded
//! into a per-day mood log, and, when it clears an admission gate, kept as
//! a typed memory that later turns can recall by relevance. Memories come in
//! eight types:
//!
//! | Type | Captures |
//! |------|----------|
//! | **Conversation** | Ordinary exchanges worth keeping |
//! | **Preference** | Likes, dislikes, favorites |
//! | **Event** | Things that happened or are planned |
//! | **Gift** | Presents given or wished for |
//! | **Achievement** | Wins the user shared |
//! | **Concern** | Worries and stressors |
//! | **Dream** | Hopes and aspirations |
//! | **Memory** | Explicit "remember this" requests |
//!
//! # Architecture
//!
//! - **Storage**: a Redis-shaped [`kv::KvStore`] trait with an in-process
//!   backend; lists for logs, hashes for records, sorted sets for schedules
//! - **Classification**: offline marker lexicon by default, optional HTTP
//!   completion provider with pacing and a per-minute cap
//! - **Mood**: exponential time-decay aggregation per day, trend detection
//!   over a sliding window
//! - **Transport**: REST over HTTP via axum
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`kv`] — Key-value store trait, key layout, and the in-memory backend
//! - [`emotion`] — Emotion labels, readings, and the classifier
//! - [`completion`] — Text-completion boundary used by the classifier
//! - [`mood`] — Per-day mood logs, weighted aggregation, and trends
//! - [`memory`] — Typed memories: admission heuristics, storage, relevance ranking
//! - [`history`] — Raw chat turn log
//! - [`reminders`] — Gift occasion reminders on a date-sorted index
//! - [`engine`] — The orchestrator every exposed operation funnels through
//! - [`server`] — axum REST surface

pub mod cli;
pub mod completion;
pub mod config;
pub mod emotion;
pub mod engine;
pub mod history;
pub mod kv;
pub mod memory;
pub mod mood;
pub mod reminders;
pub mod server;
