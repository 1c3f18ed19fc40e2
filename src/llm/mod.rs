//! LLM gateway
//!
//! Sends the system prompt and the user's question to a chat completion
//! backend and normalizes whatever comes back into an [`LlmResult`].
//!
//! Degradation policy:
//! - No credential configured → canned mock answer, no network call
//! - Backend failure of any kind → mock answer embedding the error text
//!
//! The HTTP endpoint therefore never fails because of the external API.

mod internal;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;

pub use internal::OpenAiClient;

/// Default completion budget per answer
pub const DEFAULT_MAX_TOKENS: u32 = 400;

/// Sampling temperature sent with every request
pub const TEMPERATURE: f32 = 0.2;

/// Where a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Mock,
}

impl Provider {
    /// Name as written to the interaction log
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Mock => "mock",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider metadata stored alongside every response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub provider: Provider,
    /// Token usage as reported by the provider, passed through verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
}

impl ResponseMeta {
    fn mock() -> Self {
        Self {
            provider: Provider::Mock,
            usage: None,
        }
    }
}

/// Normalized gateway output
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResult {
    pub text: String,
    pub meta: ResponseMeta,
}

/// One chat completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub model: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Tagged backend outcome; failures are data, not errors
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    Success { text: String, usage: Option<Value> },
    Failure { reason: String },
}

/// A chat completion provider
pub trait CompletionBackend: Send + Sync {
    fn complete(&self, request: &CompletionRequest<'_>) -> CompletionOutcome;
}

/// Prompt and question joined the way they are presented to the model.
pub fn compose_input(prompt: &str, question: &str) -> String {
    format!("{}\n\nPergunta: {}", prompt, question)
}

/// Canned answer used when no backend is configured.
pub fn mock_answer(question: &str) -> String {
    format!(
        "[MOCK] Assistente de Estudos - Resposta simples para: {}\n\nExplicação: ...\nExemplo: ...\nExercício: ...",
        question
    )
}

/// Canned answer used when the backend call failed.
pub fn fallback_answer(reason: &str, question: &str) -> String {
    format!(
        "[MOCK] Erro ao chamar API: {}\nResposta mock para: {}",
        reason, question
    )
}

/// Routes questions to a completion backend, or mocks them
pub struct Gateway {
    backend: Option<Box<dyn CompletionBackend>>,
    model: String,
}

impl Gateway {
    /// Gateway with an explicit backend (or none, for mock mode)
    pub fn new(backend: Option<Box<dyn CompletionBackend>>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    /// Mock-only gateway
    pub fn offline() -> Self {
        Self::new(None, crate::config::DEFAULT_MODEL)
    }

    /// Build from configuration.
    ///
    /// The OpenAI backend is only wired when a credential is present and the
    /// HTTP client can be constructed; otherwise every call is mocked.
    pub fn from_config(config: &Config) -> Self {
        let backend: Option<Box<dyn CompletionBackend>> = match config.api_key.as_deref() {
            Some(key) => match OpenAiClient::new(&config.api_base, key, config.timeout) {
                Ok(client) => {
                    info!(model = %config.model, api_base = %config.api_base, "OpenAI backend enabled");
                    Some(Box::new(client))
                }
                Err(err) => {
                    warn!(?err, "Failed to build OpenAI client; answering in mock mode");
                    None
                }
            },
            None => {
                info!("No API key configured (OPENAI_API_KEY / OPENAI_API_KEY_OPENAI); answering in mock mode");
                None
            }
        };
        Self::new(backend, config.model.clone())
    }

    pub fn is_live(&self) -> bool {
        self.backend.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Answer `question` under system `prompt`. Never fails.
    pub fn call(&self, prompt: &str, question: &str, max_tokens: u32) -> LlmResult {
        let input = compose_input(prompt, question);
        debug!(input_chars = input.chars().count(), "composed model input");

        let Some(backend) = self.backend.as_ref() else {
            return LlmResult {
                text: mock_answer(question),
                meta: ResponseMeta::mock(),
            };
        };

        let request = CompletionRequest {
            system: prompt,
            user: question,
            model: &self.model,
            max_tokens,
            temperature: TEMPERATURE,
        };

        match backend.complete(&request) {
            CompletionOutcome::Success { text, usage } => LlmResult {
                text: text.trim().to_owned(),
                meta: ResponseMeta {
                    provider: Provider::OpenAi,
                    usage,
                },
            },
            CompletionOutcome::Failure { reason } => {
                warn!(%reason, "completion failed; falling back to mock answer");
                LlmResult {
                    text: fallback_answer(&reason, question),
                    meta: ResponseMeta::mock(),
                }
            }
        }
    }
}
