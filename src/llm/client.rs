//! Chat-completions transport
//!
//! Single-shot call against an OpenRouter-compatible endpoint carrying the
//! session's full message history. Failures are reported to the caller;
//! there is no retry.

use anyhow::Result;
use serde::{Deserialize, Serialize};

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: String,
}

/// Send the chat history and return the assistant's reply text.
pub(crate) async fn chat(
    client: &reqwest::Client,
    api_key: &str,
    model: &str,
    messages: &[Message],
) -> Result<String> {
    let request = ChatRequest {
        model,
        messages,
        stream: false,
    };

    let response = client
        .post(OPENROUTER_URL)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {}", api_key))
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let message = match status.as_u16() {
            401 => "Invalid API key. Check OPENROUTER_API_KEY.".to_string(),
            429 => "Rate limited by the API. Try again in a few minutes.".to_string(),
            500..=599 => format!(
                "API server error ({}). The service may be temporarily unavailable.",
                status
            ),
            _ => format!("API error {}: {}", status, truncate_str(&text, 200)),
        };
        anyhow::bail!("{}", message);
    }

    let parsed: ChatResponse = serde_json::from_str(&text)
        .map_err(|e| anyhow::anyhow!("Failed to parse API response: {}\n{}", e, truncate_str(&text, 500)))?;

    Ok(parsed
        .choices
        .first()
        .map(|c| c.message.content.clone())
        .unwrap_or_default())
}

/// Truncate a string for display (Unicode-safe).
pub(crate) fn truncate_str(s: &str, max_chars: usize) -> &str {
    if s.chars().count() <= max_chars {
        s
    } else {
        let byte_idx = s
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        &s[..byte_idx]
    }
}
