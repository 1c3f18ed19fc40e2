pub mod assistant;
pub mod config;
pub mod interactions;
pub mod llm;
pub mod paths;
pub mod prompt;
pub mod server;

// Re-export commonly used types
pub use assistant::Assistant;
pub use config::Config;
pub use interactions::{InteractionLog, InteractionRecord};
pub use llm::{Gateway, LlmResult, Provider};
pub use prompt::PromptLoader;
