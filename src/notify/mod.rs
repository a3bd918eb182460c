//! Notification sink: digest rendering and outbound push.
//!
//! The engine hands over a [`Digest`]; this module renders it into a chat
//! message and pushes it to the configured channel endpoint. Channel
//! identifiers and the token come from the explicit [`NotifyConfig`].

use serde_json::json;
use tracing::{error, info};

use crate::config::NotifyConfig;
use crate::digest::Digest;
use crate::error::Error;

/// Render a digest as a plain-text chat message.
///
/// Deterministic: the same digest always renders to the same bytes. An
/// empty digest renders as "nothing to review", never as a failure.
pub fn render_digest(digest: &Digest) -> String {
    let date = digest.generated_at.format("%Y-%m-%d");

    if digest.is_empty() {
        return format!(
            "📚 English Review Digest\n\nDate: {}\n\nNothing to review today.\nKeep going tomorrow! 💪",
            date
        );
    }

    let mut message = format!("📚 English Review Digest\n\nDate: {}\n", date);

    if !digest.top_review_phrases.is_empty() {
        message.push_str(&format!(
            "\n⚠️ Phrases to review ({}):\n",
            digest.top_review_phrases.len()
        ));
        for entry in &digest.top_review_phrases {
            message.push_str(&format!(
                "\n• {}\n  → {}\n",
                entry.phrase.english, entry.phrase.japanese
            ));
            if !entry.phrase.context.is_empty() {
                message.push_str(&format!("  💡 {}\n", entry.phrase.context));
            }
        }
    }

    if !digest.top_weakness_patterns.is_empty() {
        message.push_str(&format!(
            "\n📉 Recurring weak points ({}):\n",
            digest.top_weakness_patterns.len()
        ));
        for summary in &digest.top_weakness_patterns {
            message.push_str(&format!(
                "\n• {} — {} corrections\n",
                summary.pattern, summary.count
            ));
            message.push_str(&format!(
                "  ❌ {}\n  ✅ {}\n",
                summary.most_recent_example.original_text,
                summary.most_recent_example.corrected_text
            ));
        }
    }

    if !digest.recent_corrections.is_empty() {
        message.push_str(&format!(
            "\n✏️ Recent corrections ({}):\n",
            digest.recent_corrections.len()
        ));
        for correction in &digest.recent_corrections {
            message.push_str(&format!(
                "\n❌ {}\n✅ {}\n",
                correction.original_text, correction.corrected_text
            ));
            if !correction.feedback.is_empty() {
                message.push_str(&format!("💬 {}\n", correction.feedback));
            }
        }
    }

    if digest.recent_corrections.len() >= 3 {
        message.push_str("\n👍 You're growing through corrections!");
    } else {
        message.push_str("\n💪 Keep going tomorrow!");
    }

    message
}

/// Push client for the configured chat channel.
pub struct Notifier {
    config: NotifyConfig,
    http: reqwest::Client,
}

impl Notifier {
    /// Create a new notifier.
    pub fn new(config: NotifyConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self { config, http })
    }

    /// Push a rendered message to the channel.
    pub async fn send(&self, text: &str) -> Result<(), Error> {
        if !self.config.is_configured() {
            return Err(Error::Notify(
                "notification channel is not configured".to_string(),
            ));
        }

        let body = json!({
            "to": self.config.to,
            "messages": [{ "type": "text", "text": text }],
        });

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("digest notification sent");
            Ok(())
        } else {
            let detail = response.text().await.unwrap_or_default();
            error!(status = %status, "push endpoint rejected the digest");
            Err(Error::Notify(format!(
                "push endpoint returned {}: {}",
                status, detail
            )))
        }
    }
}
