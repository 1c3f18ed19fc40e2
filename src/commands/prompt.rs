//! Prompt command - show the active system prompt

use anyhow::Result;

use study_assistant::prompt::{prompt_label, PromptLoader};
use study_assistant::Config;

pub fn execute(config: &Config) -> Result<()> {
    let loader = PromptLoader::new(config.prompt_pattern.clone());

    match loader.latest_path()? {
        Some(path) => println!("Active prompt: {}", path.display()),
        None => println!("No prompt_v*.txt in {}, using default", config.base_dir.display()),
    }

    let prompt = loader.load_latest()?;
    println!("Label: {}", prompt_label(&prompt));
    println!("\n{prompt}");
    Ok(())
}
