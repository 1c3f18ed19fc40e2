//! Ask command - one question through the same pipeline as POST /api/ask

use anyhow::{bail, Result};

use study_assistant::assistant::{normalize_question, EMPTY_QUESTION};
use study_assistant::{Assistant, Config};

pub fn execute(config: &Config, raw_question: &str) -> Result<()> {
    let Some(question) = normalize_question(raw_question) else {
        bail!(EMPTY_QUESTION);
    };

    let record = Assistant::from_config(config).ask(question)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
