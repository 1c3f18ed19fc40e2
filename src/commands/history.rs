//! History command - recent entries from the interaction log

use anyhow::Result;

use study_assistant::{Config, InteractionLog, InteractionRecord};

/// Longest response excerpt shown in human output
const PREVIEW_CHARS: usize = 120;

pub fn execute(config: &Config, limit: usize, json: bool) -> Result<()> {
    let records = InteractionLog::new(config.log_path.clone()).records()?;
    let recent = &records[records.len().saturating_sub(limit)..];

    if json {
        println!("{}", serde_json::to_string_pretty(recent)?);
        return Ok(());
    }

    if recent.is_empty() {
        println!("No interactions logged in {}", config.log_path.display());
        return Ok(());
    }

    for record in recent {
        println!("{}", summary_line(record));
        println!("  Q: {}", record.question);
        println!("  A: {}\n", preview(&record.response));
    }
    println!("{} of {} interactions", recent.len(), records.len());
    Ok(())
}

fn summary_line(record: &InteractionRecord) -> String {
    format!(
        "{}  [{}]  {}",
        record.timestamp, record.meta.provider, record.prompt_used
    )
}

fn preview(text: &str) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > PREVIEW_CHARS {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_assistant::Gateway;

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "é".repeat(PREVIEW_CHARS + 5);
        let shown = preview(&long);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), PREVIEW_CHARS + 3);
        assert_eq!(preview("a\nb"), "a b");
    }

    #[test]
    fn test_summary_line_uses_log_provider_name() {
        let result = Gateway::offline().call("Tutor\nSeja breve.", "O que é recursão?", 400);
        let record = InteractionRecord::new("O que é recursão?", "Tutor\nSeja breve.", result);

        let line = summary_line(&record);
        assert!(line.contains("  [mock]  Tutor"));
        assert!(!line.contains("Mock"));
    }
}
