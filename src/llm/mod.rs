//! Suggestion client
//!
//! Maintains one conversational session with the remote model for the whole
//! tuning run. The session is primed once (with the simulator codebase when
//! available), then asked once per iteration for attribute adjustments.
//! Communication and parse failures are non-fatal: the iteration proceeds
//! without a suggestion.

pub mod client;
pub mod parse;
pub mod prompts;

use crate::counts::CountMap;
use crate::report::TuningLog;
use anyhow::{Context, Result};
use self::client::Message;
use serde_json::Value;
use std::collections::BTreeMap;

/// Attribute adjustments proposed by the model for the next run.
///
/// Values stay loosely typed here; the patcher converts them to the routed
/// numeric type and decides what is fatal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Suggestion {
    pub attributes: BTreeMap<String, Value>,
    pub reasoning: Option<String>,
}

impl Suggestion {
    /// Non-reasoning attribute lines for logs and the next prompt.
    pub fn describe_attributes(&self) -> Vec<String> {
        self.attributes
            .iter()
            .map(|(key, value)| match value {
                // Strings print bare, not as JSON literals with quotes.
                Value::String(s) => format!("- {}: {}", key, s),
                other => format!("- {}: {}", key, other),
            })
            .collect()
    }
}

/// Source of attribute suggestions. The tuning loop is generic over this so
/// tests can drive it with a stub instead of a live session.
#[allow(async_fn_in_trait)]
pub trait SuggestionOracle {
    /// One-time priming exchange. A failure here aborts the run; there is
    /// no session worth continuing without it.
    async fn prime(&mut self, codebase: Option<&str>, log: &mut TuningLog) -> Result<()>;

    /// Ask for adjustments for this iteration. `None` means no usable
    /// suggestion (transport or parse failure, already logged).
    async fn request_adjustments(
        &mut self,
        iteration: u32,
        counts: &CountMap,
        previous: Option<&Suggestion>,
        log: &mut TuningLog,
    ) -> Option<Suggestion>;
}

/// Live chat session against an OpenRouter-style chat-completions endpoint.
pub struct OracleSession {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_history_messages: usize,
    history: Vec<Message>,
}

impl OracleSession {
    pub fn new(api_key: String, model: String, max_history_messages: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            max_history_messages,
            history: Vec::new(),
        }
    }

    async fn send(&mut self, prompt: String) -> Result<String> {
        self.history.push(Message::user(prompt));
        match client::chat(&self.client, &self.api_key, &self.model, &self.history).await {
            Ok(reply) => {
                self.history.push(Message::assistant(reply.clone()));
                self.trim_history();
                Ok(reply)
            }
            Err(err) => {
                // An unanswered prompt is not retained as context.
                self.history.pop();
                Err(err)
            }
        }
    }

    /// Drop the oldest iteration exchanges beyond the configured cap. The
    /// priming exchange (first two messages) is always retained; 0 keeps
    /// everything. Trimming happens in whole prompt/reply pairs so the
    /// re-sent history keeps alternating roles and no retained reply loses
    /// the prompt it answers.
    fn trim_history(&mut self) {
        if self.max_history_messages == 0 || self.history.len() <= 2 {
            return;
        }
        let excess = self.history.len().saturating_sub(2 + self.max_history_messages);
        let excess = excess + excess % 2;
        if excess > 0 {
            self.history.drain(2..2 + excess);
        }
    }

    #[cfg(test)]
    fn history_len(&self) -> usize {
        self.history.len()
    }
}

impl SuggestionOracle for OracleSession {
    async fn prime(&mut self, codebase: Option<&str>, log: &mut TuningLog) -> Result<()> {
        let prompt = match codebase {
            Some(dump) => prompts::codebase_priming(dump),
            None => prompts::NO_CODEBASE_PRIMING.to_string(),
        };
        let reply = self
            .send(prompt)
            .await
            .context("priming exchange with the suggestion service failed")?;
        log.note_quiet(&format!("Model initial response:\n{}\n", reply));
        Ok(())
    }

    async fn request_adjustments(
        &mut self,
        iteration: u32,
        counts: &CountMap,
        previous: Option<&Suggestion>,
        log: &mut TuningLog,
    ) -> Option<Suggestion> {
        let prompt = prompts::adjustment_prompt(iteration, counts, previous);
        let reply = match self.send(prompt).await {
            Ok(reply) => reply,
            Err(err) => {
                log.note(&format!("Error communicating with the model: {:#}", err));
                return None;
            }
        };

        match parse::parse_suggestion(&reply) {
            Ok(suggestion) => Some(suggestion),
            Err(err) => {
                log.note(&format!("Error parsing model response as JSON: {}", err));
                log.note_quiet(&format!("Raw model response:\n{}\n", reply));
                None
            }
        }
    }
}
