//! Blocking client for the streaming generate endpoint

use std::io::BufReader;

use serde::Serialize;

use super::stream::{StreamChunks, collect_answer};
use crate::config::GenerationConfig;
use crate::{Error, Result};

/// Spoken when the service finished without producing any text
pub const NO_ANSWER: &str = "No response generated.";

/// Prefix of every answer that stands in for a failed request
pub const FETCH_ERROR_PREFIX: &str = "Error contacting generation service";

/// Turns an utterance into something to say
///
/// Implementations never fail: problems are reported in the returned text so
/// a single bad request can't end the session.
pub trait AnswerFetcher {
    /// Produce a non-empty answer for `prompt`
    fn fetch_answer(&mut self, prompt: &str) -> String;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Streams completions from an Ollama-compatible `/api/generate` endpoint
pub struct GenerateClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
}

impl GenerateClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        tracing::debug!(
            endpoint = %config.endpoint,
            model = %config.model,
            "generation client initialized"
        );

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
        })
    }

    /// Model identifier sent with each request
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Request a completion and assemble it from the response stream
    ///
    /// May return an empty string if the service produced no text.
    ///
    /// # Errors
    ///
    /// Returns error on connection failure, timeout, non-success status,
    /// or an undecodable stream record
    pub fn generate(&self, prompt: &str) -> Result<String> {
        tracing::debug!(prompt_chars = prompt.len(), "sending generate request");

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: true,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| {
                tracing::error!(error = %e, "generate request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::error!(status = %status, body = %body, "generation API error");
            return Err(Error::Generation(format!("HTTP {status}: {}", body.trim())));
        }

        collect_answer(StreamChunks::new(BufReader::new(response)))
    }
}

impl AnswerFetcher for GenerateClient {
    fn fetch_answer(&mut self, prompt: &str) -> String {
        answer_or_report(self.generate(prompt))
    }
}

/// Collapse a generate outcome into speakable text
///
/// Empty answers become [`NO_ANSWER`]; failures become a description
/// starting with [`FETCH_ERROR_PREFIX`].
#[must_use]
pub fn answer_or_report(outcome: Result<String>) -> String {
    match outcome {
        Ok(answer) if answer.is_empty() => {
            tracing::warn!("generation returned no text");
            NO_ANSWER.to_string()
        }
        Ok(answer) => {
            tracing::info!(chars = answer.len(), "answer assembled");
            answer
        }
        Err(e) => {
            tracing::warn!(error = %e, "answer fetch failed");
            format!("{FETCH_ERROR_PREFIX}: {e}")
        }
    }
}
