pub mod doctor;

use anyhow::Result;

use crate::completion;
use crate::config::RapportConfig;
use crate::emotion::classifier::EmotionClassifier;

/// Classify one line of text with the configured provider and print the
/// reading as JSON. With the default `lexicon` provider this runs fully
/// offline, which makes it handy for tuning marker lists.
pub async fn classify(config: &RapportConfig, text: &str) -> Result<()> {
    let provider = completion::create_provider(&config.classifier)?;
    let classifier = EmotionClassifier::new(provider, &config.classifier);

    let emotion = classifier.classify(text).await;
    println!("{}", serde_json::to_string_pretty(&emotion)?);

    Ok(())
}
