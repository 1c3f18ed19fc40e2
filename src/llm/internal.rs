//! Internal HTTP client for the OpenAI chat completions API

use anyhow::{Context, Result};
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::{CompletionBackend, CompletionOutcome, CompletionRequest};

/// Blocking OpenAI client
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    http: HttpClient,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn chat(&self, request: &CompletionRequest<'_>) -> Result<(String, Option<Value>)> {
        let body = ChatRequest {
            model: request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system,
                },
                ChatMessage {
                    role: "user",
                    content: request.user,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .with_context(|| format!("Failed to reach {}", self.base_url))?;

        let status = response.status();
        let text = response.text().context("Failed to read response body")?;
        if !status.is_success() {
            anyhow::bail!("OpenAI API error {}: {}", status, text.trim());
        }

        parse_completion(&text)
    }
}

impl CompletionBackend for OpenAiClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> CompletionOutcome {
        match self.chat(request) {
            Ok((text, usage)) => CompletionOutcome::Success { text, usage },
            Err(err) => CompletionOutcome::Failure {
                reason: format!("{:#}", err),
            },
        }
    }
}

/// Extract the first choice and the usage block from a completion body.
fn parse_completion(body: &str) -> Result<(String, Option<Value>)> {
    let response: ChatResponse =
        serde_json::from_str(body).context("Failed to parse completion response")?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| anyhow::anyhow!("No response choices received"))?;

    let usage = response.usage.filter(|usage| !usage.is_null());
    Ok((content.trim().to_string(), usage))
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
