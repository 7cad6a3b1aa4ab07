//! Emotion classification pipeline.
//!
//! Two tiers. When a completion provider is configured, each message is
//! labeled by prompting it for a small JSON object; the call sits behind a
//! cooperative rate gate (pacing delay plus a per-minute cap). Any failure
//! on that path (cap reached, transport error, timeout, unparseable reply)
//! drops to the offline keyword lexicon, so classification always produces
//! an [`Emotion`]:
//!
//! 1. Rate gate: over the cap → lexicon.
//! 2. Provider call with timeout → on error or timeout, lexicon.
//! 3. Reply parse (strict label set) → on garbage, lexicon.
//! 4. Lexicon: first matching marker wins; no marker → neutral 0.5.

use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{Emotion, EmotionLabel};
use crate::completion::CompletionProvider;
use crate::config::ClassifierConfig;

const CLASSIFY_PROMPT: &str = r#"You label the emotional tone of one chat message from a user to their companion.

Respond with a single JSON object and nothing else:
{"primary": "<label>", "intensity": <number 0.0-1.0>, "secondary": "<label, optional>", "context": "<short phrase, optional>"}

Valid labels: joy, love, excitement, contentment, gratitude, sadness, anger, fear, anxiety, loneliness, frustration, disappointment, neutral, curious, surprised, confused.

Message:
"#;

/// Marker lists for the offline fallback, checked in order; the first
/// label with a matching marker wins.
const LEXICON: &[(EmotionLabel, f64, &[&str])] = &[
    (
        EmotionLabel::Love,
        0.8,
        &["love", "adore", "cherish", "in love"],
    ),
    (
        EmotionLabel::Joy,
        0.7,
        &["happy", "joy", "glad", "delighted", "wonderful"],
    ),
    (
        EmotionLabel::Sadness,
        0.6,
        &["sad", "unhappy", "crying", "heartbroken", "miss you"],
    ),
    (
        EmotionLabel::Anger,
        0.7,
        &["angry", "furious", "hate", "mad at", "irritated"],
    ),
    (
        EmotionLabel::Anxiety,
        0.6,
        &["anxious", "worried", "nervous", "stressed", "scared"],
    ),
    (
        EmotionLabel::Excitement,
        0.8,
        &["excited", "thrilled", "can't wait", "cant wait", "amazing"],
    ),
];

pub struct EmotionClassifier {
    provider: Option<Arc<dyn CompletionProvider>>,
    gate: Mutex<RateGate>,
    timeout: Duration,
}

impl EmotionClassifier {
    pub fn new(provider: Option<Arc<dyn CompletionProvider>>, config: &ClassifierConfig) -> Self {
        Self {
            provider,
            gate: Mutex::new(RateGate::new(
                Duration::from_millis(config.min_interval_ms),
                config.per_minute_cap,
            )),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Classify one message. Infallible: every failure path lands in the
    /// lexicon, and the lexicon always answers.
    pub async fn classify(&self, text: &str) -> Emotion {
        let Some(provider) = &self.provider else {
            return classify_with_lexicon(text);
        };

        let admission = match self.gate.lock() {
            Ok(mut gate) => gate.admit(Instant::now()),
            Err(_) => Admission::Degrade,
        };

        match admission {
            Admission::Degrade => {
                debug!("classifier minute cap reached, using lexicon");
            }
            Admission::Proceed(delay) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                let prompt = format!("{CLASSIFY_PROMPT}{text}");
                match tokio::time::timeout(self.timeout, provider.complete(&prompt)).await {
                    Ok(Ok(reply)) => match parse_reply(&reply) {
                        Some(emotion) => return emotion,
                        None => warn!("unparseable classifier reply, using lexicon"),
                    },
                    Ok(Err(err)) => warn!(error = %err, "classifier call failed, using lexicon"),
                    Err(_) => warn!("classifier call timed out, using lexicon"),
                }
            }
        }

        classify_with_lexicon(text)
    }
}

/// Keyword-marker classification. Deterministic and offline; this is the
/// floor the whole pipeline degrades to.
pub fn classify_with_lexicon(text: &str) -> Emotion {
    let lower = text.to_lowercase();
    for (label, intensity, markers) in LEXICON {
        if markers.iter().any(|marker| lower.contains(marker)) {
            return Emotion::new(*label, *intensity);
        }
    }
    Emotion::neutral()
}

#[derive(Debug, Deserialize)]
struct RawReading {
    primary: String,
    #[serde(default)]
    intensity: Option<f64>,
    #[serde(default)]
    secondary: Option<String>,
    #[serde(default)]
    context: Option<String>,
}

/// Extract an [`Emotion`] from a provider reply. Tolerates prose or code
/// fences around the JSON object; rejects replies whose primary label is
/// not in the closed set.
fn parse_reply(raw: &str) -> Option<Emotion> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    let reading: RawReading = serde_json::from_str(&raw[start..=end]).ok()?;
    let primary: EmotionLabel = reading.primary.parse().ok()?;

    let mut emotion = Emotion::new(primary, reading.intensity.unwrap_or(0.5));
    emotion.secondary = reading.secondary.and_then(|s| s.parse().ok());
    emotion.context = reading.context.filter(|c| !c.trim().is_empty());
    Some(emotion)
}

#[derive(Debug)]
struct RateGate {
    min_interval: Duration,
    per_minute_cap: u32,
    last_send: Option<Instant>,
    window_start: Option<Instant>,
    window_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    /// Make the call, optionally sleeping first to keep spacing.
    Proceed(Option<Duration>),
    /// Over the per-minute cap; skip the provider entirely.
    Degrade,
}

impl RateGate {
    fn new(min_interval: Duration, per_minute_cap: u32) -> Self {
        Self {
            min_interval,
            per_minute_cap,
            last_send: None,
            window_start: None,
            window_count: 0,
        }
    }

    fn admit(&mut self, now: Instant) -> Admission {
        const WINDOW: Duration = Duration::from_secs(60);

        match self.window_start {
            Some(start) if now.duration_since(start) < WINDOW => {}
            _ => {
                self.window_start = Some(now);
                self.window_count = 0;
            }
        }

        if self.window_count >= self.per_minute_cap {
            return Admission::Degrade;
        }
        self.window_count += 1;

        // Delay is measured against the previous scheduled send, so
        // back-to-back admissions stay spaced even before their sleeps run.
        let delay = self
            .last_send
            .map(|prev| prev + self.min_interval)
            .and_then(|target| target.checked_duration_since(now))
            .filter(|d| !d.is_zero());
        self.last_send = Some(now + delay.unwrap_or_default());
        Admission::Proceed(delay)
    }
}
