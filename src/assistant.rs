//! The ask pipeline shared by the HTTP handler and the CLI.
//!
//! prompt → gateway → record → log. Holds no per-request state.

use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::interactions::{InteractionLog, InteractionRecord};
use crate::llm::{Gateway, DEFAULT_MAX_TOKENS};
use crate::prompt::PromptLoader;

/// Message returned for a missing or blank question.
pub const EMPTY_QUESTION: &str = "Pergunta vazia";

/// Trimmed question, or `None` when there is nothing to ask.
pub fn normalize_question(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Prompt loader, gateway and log wired together
pub struct Assistant {
    prompts: PromptLoader,
    gateway: Gateway,
    log: InteractionLog,
}

impl Assistant {
    pub fn new(prompts: PromptLoader, gateway: Gateway, log: InteractionLog) -> Self {
        Self {
            prompts,
            gateway,
            log,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            PromptLoader::new(config.prompt_pattern.clone()),
            Gateway::from_config(config),
            InteractionLog::new(config.log_path.clone()),
        )
    }

    pub fn prompts(&self) -> &PromptLoader {
        &self.prompts
    }

    pub fn log(&self) -> &InteractionLog {
        &self.log
    }

    /// Whether questions reach a real completion API
    pub fn is_live(&self) -> bool {
        self.gateway.is_live()
    }

    /// Answer an already-normalized question and log the exchange.
    ///
    /// Errors only on filesystem failures; API failures come back as mock answers.
    pub fn ask(&self, question: &str) -> Result<InteractionRecord> {
        let prompt = self.prompts.load_latest()?;
        let result = self.gateway.call(&prompt, question, DEFAULT_MAX_TOKENS);
        let record = InteractionRecord::new(question, &prompt, result);

        self.log.append(&record)?;
        info!(
            provider = ?record.meta.provider,
            prompt = %record.prompt_used,
            "question answered"
        );
        Ok(record)
    }
}
