//! Versioned system prompt loading.
//!
//! Operators drop `prompt_v*.txt` files next to the server; the file with the
//! greatest name wins. Ordering is plain string order, so `prompt_v10.txt`
//! sorts before `prompt_v2.txt`. Zero-pad version numbers.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

/// Prompt used when no prompt file exists.
pub const DEFAULT_PROMPT: &str = "You are an Assistant.";

/// Finds and reads the latest prompt file
#[derive(Debug, Clone)]
pub struct PromptLoader {
    pattern: String,
}

impl PromptLoader {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// Path of the prompt that [`load_latest`](Self::load_latest) would read.
    pub fn latest_path(&self) -> Result<Option<PathBuf>> {
        let entries = glob::glob(&self.pattern)
            .with_context(|| format!("Invalid prompt pattern {}", self.pattern))?;

        let mut files: Vec<PathBuf> = entries.filter_map(|entry| entry.ok()).collect();
        files.sort();
        Ok(files.pop())
    }

    /// Trimmed contents of the latest prompt, or [`DEFAULT_PROMPT`].
    pub fn load_latest(&self) -> Result<String> {
        let Some(path) = self.latest_path()? else {
            debug!(pattern = %self.pattern, "no prompt file found, using default prompt");
            return Ok(DEFAULT_PROMPT.to_owned());
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read prompt {}", path.display()))?;
        debug!(path = %path.display(), "loaded prompt");
        Ok(content.trim().to_owned())
    }
}

/// Characters that end a line, including bare `\r` and Unicode separators
const LINE_BREAKS: &[char] = &[
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}',
    '\u{2029}',
];

/// First line of a prompt, used to identify it in the interaction log.
pub fn prompt_label(prompt: &str) -> String {
    prompt
        .split(LINE_BREAKS)
        .next()
        .unwrap_or_default()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths;
    use std::fs;
    use tempfile::TempDir;

    fn loader_for(dir: &TempDir) -> PromptLoader {
        PromptLoader::new(paths::prompt_glob(dir.path()))
    }

    #[test]
    fn test_default_when_no_prompt_files() {
        let temp_dir = TempDir::new().unwrap();
        let loader = loader_for(&temp_dir);

        assert!(loader.latest_path().unwrap().is_none());
        assert_eq!(loader.load_latest().unwrap(), "You are an Assistant.");
    }

    #[test]
    fn test_selects_lexicographically_last() {
        let temp_dir = TempDir::new().unwrap();
        for (name, body) in [
            ("prompt_v1.txt", "first"),
            ("prompt_v2.txt", "second"),
            ("prompt_v10.txt", "tenth"),
        ] {
            fs::write(temp_dir.path().join(name), body).unwrap();
        }
        let loader = loader_for(&temp_dir);

        // String order, not numeric: v2 beats v10
        let latest = loader.latest_path().unwrap().unwrap();
        assert_eq!(latest.file_name().unwrap(), "prompt_v2.txt");
        assert_eq!(loader.load_latest().unwrap(), "second");
    }

    #[test]
    fn test_ignores_non_matching_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("prompt_v1.txt"), "one").unwrap();
        fs::write(temp_dir.path().join("prompt_z.txt"), "nope").unwrap();
        fs::write(temp_dir.path().join("notes_v9.txt"), "nope").unwrap();

        assert_eq!(loader_for(&temp_dir).load_latest().unwrap(), "one");
    }

    #[test]
    fn test_contents_are_trimmed() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("prompt_v01.txt"),
            "\n  Você é um tutor.\nSeja breve.  \n\n",
        )
        .unwrap();

        assert_eq!(
            loader_for(&temp_dir).load_latest().unwrap(),
            "Você é um tutor.\nSeja breve."
        );
    }

    #[test]
    fn test_unreadable_prompt_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("prompt_v1.txt"), [0xffu8, 0xfe, 0x00]).unwrap();

        let err = loader_for(&temp_dir).load_latest().unwrap_err();
        assert!(err.to_string().contains("Failed to read prompt"));
    }

    #[test]
    fn test_prompt_label() {
        assert_eq!(prompt_label("Tutor v3\nBe kind."), "Tutor v3");
        assert_eq!(prompt_label(DEFAULT_PROMPT), DEFAULT_PROMPT);
        assert_eq!(prompt_label(""), "");
        assert_eq!(prompt_label("Tutor v3\r\nBe kind."), "Tutor v3");
        assert_eq!(prompt_label("Tutor v3\rBe kind."), "Tutor v3");
        assert_eq!(prompt_label("Tutor v3\u{2028}Be kind."), "Tutor v3");
        assert_eq!(prompt_label("Tutor v3\u{0c}Be kind."), "Tutor v3");
    }
}
