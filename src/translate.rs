//! Headline translation through an OpenAI-compatible chat completions API.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::UpdateConfig;

const PROMPT: &str = "Translate the following film news headline into Japanese, \
written like a concise one-line newspaper headline. Reply with the headline only.\n\n";

/// Hiragana, katakana or CJK unified ideographs anywhere in the text.
pub fn is_japanese(text: &str) -> bool {
    text.chars()
        .any(|ch| matches!(ch, '\u{3040}'..='\u{30ff}' | '\u{4e00}'..='\u{9fff}'))
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

pub struct Translator {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
    remaining: usize,
}

impl Translator {
    pub fn new(config: &UpdateConfig, api_key: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            client,
            api_key: api_key.filter(|key| !key.is_empty()),
            endpoint: config.translate_endpoint.clone(),
            model: config.translate_model.clone(),
            remaining: config.max_translations,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Translate a headline, falling back to the original on any failure.
    pub async fn translate(&mut self, title: &str) -> String {
        let Some(api_key) = self.api_key.clone() else {
            return title.to_string();
        };
        if self.remaining == 0 || is_japanese(title) || title.trim().is_empty() {
            return title.to_string();
        }
        self.remaining -= 1;

        match self.request(&api_key, title).await {
            Ok(translated) if !translated.is_empty() => {
                debug!("Translated '{}' -> '{}'", title, translated);
                translated
            }
            Ok(_) => title.to_string(),
            Err(e) => {
                warn!("Failed to translate '{}': {}", title, e);
                title.to_string()
            }
        }
    }

    async fn request(&self, api_key: &str, title: &str) -> reqwest::Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: format!("{}{}", PROMPT, title),
            }],
            max_tokens: 80,
        };

        let response: ChatResponse = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .unwrap_or_default())
    }
}
