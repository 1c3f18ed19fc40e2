//! Single source of truth for the study assistant's filesystem layout.
//!
//! This module defines WHERE data lives. It has no I/O and no validation.
//!
//! ```text
//! <base>/
//! ├── prompt_v1.txt            # Versioned system prompts (latest by name wins)
//! ├── prompt_v2.txt
//! ├── templates/
//! │   └── index.html           # Page served at GET /
//! └── logs/
//!     └── interactions.json    # Append-only interaction log (JSON array)
//! ```

use std::path::{Path, PathBuf};

/// Filename pattern for versioned prompts.
pub const PROMPT_FILE_PATTERN: &str = "prompt_v*.txt";

/// Glob pattern matching prompt files in `base`.
///
/// The base directory is escaped so `[` or `*` in it match literally.
pub fn prompt_glob(base: &Path) -> String {
    let escaped = glob::Pattern::escape(&base.to_string_lossy());
    Path::new(&escaped)
        .join(PROMPT_FILE_PATTERN)
        .to_string_lossy()
        .into_owned()
}

/// Log directory: `<base>/logs/`
pub fn logs_dir(base: &Path) -> PathBuf {
    base.join("logs")
}

/// Interaction log: `<base>/logs/interactions.json`
pub fn interactions_log(base: &Path) -> PathBuf {
    logs_dir(base).join("interactions.json")
}

/// Front page: `<base>/templates/index.html`
pub fn index_page(base: &Path) -> PathBuf {
    base.join("templates").join("index.html")
}
