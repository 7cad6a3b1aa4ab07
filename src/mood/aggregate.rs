//! Pure mood math: recency-weighted daily aggregation and trend analysis.
//!
//! Nothing here touches the store or the clock; callers pass `now` in, which
//! keeps every function deterministic under test.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::{MoodTracking, MoodTrends, TrendDirection};
use crate::emotion::{Emotion, EmotionEntry, EmotionLabel};

/// Collapse a day's entries into one overall mood.
///
/// Each entry contributes `intensity * exp(-hours_since / decay_hours)` to
/// its label's bucket. The label with the largest bucket wins; the reported
/// intensity is that bucket over the total weight, so a lone entry passes
/// its intensity through unchanged. Ties fall to the earlier label in
/// [`EmotionLabel::ALL`].
///
/// The bucket/total ratio is shift-invariant: adding a constant offset to
/// every entry's age rescales all weights by the same factor, so one
/// reference instant works for any day, past or present.
pub fn weighted_mood(entries: &[EmotionEntry], now: DateTime<Utc>, decay_hours: f64) -> Emotion {
    if entries.is_empty() {
        return Emotion::neutral();
    }

    let mut buckets: HashMap<EmotionLabel, f64> = HashMap::new();
    let mut total = 0.0;
    for entry in entries {
        let hours = ((now - entry.timestamp).num_seconds() as f64 / 3600.0).max(0.0);
        let weight = (-hours / decay_hours).exp();
        *buckets.entry(entry.emotion).or_insert(0.0) += entry.intensity.clamp(0.0, 1.0) * weight;
        total += weight;
    }
    if total <= 0.0 || !total.is_finite() {
        return Emotion::neutral();
    }

    let mut best_label = EmotionLabel::Neutral;
    let mut best_mass = f64::NEG_INFINITY;
    for label in EmotionLabel::ALL {
        if let Some(mass) = buckets.get(&label) {
            if *mass > best_mass {
                best_mass = *mass;
                best_label = label;
            }
        }
    }

    Emotion::new(best_label, (best_mass / total).clamp(0.0, 1.0))
}

/// Summarize a chronological run of day summaries.
///
/// The trend compares the mean overall intensity of the most recent
/// `recent_days` against the mean of the rest; a gap above `threshold`
/// either way tips it from stable, and a run with no older days reads
/// stable. Fewer than two days is not enough signal and reports the
/// neutral defaults.
pub fn trend_summary(daily: &[MoodTracking], recent_days: usize, threshold: f64) -> MoodTrends {
    if daily.len() < 2 {
        return MoodTrends {
            trend: TrendDirection::Stable,
            average_mood: 0.5,
            variability: 0.0,
            dominant_emotions: vec![EmotionLabel::Neutral],
        };
    }

    let series: Vec<f64> = daily.iter().map(|day| day.overall_mood.intensity).collect();
    let split = series.len().saturating_sub(recent_days.max(1));
    let (older, recent) = series.split_at(split);

    let recent_avg = mean(recent);
    // Every day recent: nothing to compare against, which forces stable.
    let older_avg = if older.is_empty() { recent_avg } else { mean(older) };

    let trend = if recent_avg > older_avg + threshold {
        TrendDirection::Improving
    } else if recent_avg < older_avg - threshold {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    };

    MoodTrends {
        trend,
        average_mood: mean(&series),
        variability: std_dev(&series),
        dominant_emotions: dominant_emotions(daily, 3),
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    let mu = mean(values);
    let variance = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Most frequent per-day primary labels. Stable sort over the canonical
/// label order keeps ties deterministic.
fn dominant_emotions(daily: &[MoodTracking], limit: usize) -> Vec<EmotionLabel> {
    let mut counts: HashMap<EmotionLabel, usize> = HashMap::new();
    for day in daily {
        *counts.entry(day.overall_mood.primary).or_insert(0) += 1;
    }

    let mut ranked: Vec<(EmotionLabel, usize)> = EmotionLabel::ALL
        .iter()
        .filter_map(|label| counts.get(label).map(|count| (*label, *count)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.into_iter().take(limit).map(|(label, _)| label).collect()
}
