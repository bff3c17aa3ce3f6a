//! Host command implementations.
//!
//! The binary parses arguments; the commands here do the work and return the
//! text to print, so they can be exercised without a terminal.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `inspect` | Summarize the loaded users, reports and groups |
//! | `view` | Print the projected lists as JSON |
//! | `apply` | Replay an action script and export the result |
//! | `export` | Re-export the loaded documents unchanged |
//!
//! # Example Usage
//!
//! ```bash
//! # Show what was loaded
//! access-settings inspect
//!
//! # Highlight everything connected to one report
//! access-settings view --focus-report r1
//!
//! # Apply edits and write users.json / reports.json to ./out
//! access-settings apply edits.json --out out
//! ```

mod apply;
mod export;
mod inspect;
mod view;

pub use apply::ApplyCommand;
pub use export::ExportCommand;
pub use inspect::InspectCommand;
pub use view::ViewCommand;

use crate::config::AccessConfig;
use crate::services::{AccessEditor, SourceState};
use serde_json::Value;
use std::path::Path;

/// Reads one source document.
///
/// Missing, unreadable and malformed files degrade to a failed source (an
/// empty collection downstream) with a warning.
#[must_use]
pub fn read_source(path: &Path) -> SourceState {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Source file unavailable");
            return SourceState::failed(format!("{}: {e}", path.display()));
        },
    };

    let parsed = serde_json::from_str::<Value>(&contents);
    match &parsed {
        Ok(value) if !value.is_array() => {
            tracing::warn!(path = %path.display(), "Source document is not an array");
        },
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Source document is not valid JSON");
        },
        Ok(_) => {},
    }
    SourceState::from_result(parsed)
}

/// Creates an editor loaded from the configured source files.
#[must_use]
pub fn load_editor(config: &AccessConfig) -> AccessEditor {
    let mut editor = AccessEditor::new(config.primary_keys.clone());
    editor.load(
        read_source(&config.data.users_path),
        read_source(&config.data.reports_path),
    );
    editor
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_degrades_to_failed() {
        let dir = tempfile::tempdir().unwrap();
        let state = read_source(&dir.path().join("nope.json"));
        assert!(matches!(state, SourceState::Failed(_)));
        assert!(state.records().is_empty());
    }

    #[test]
    fn test_malformed_file_degrades_to_failed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(read_source(&path), SourceState::Failed(_)));
    }

    #[test]
    fn test_non_array_has_no_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, r#"{"email":"a@x.com"}"#).unwrap();
        let state = read_source(&path);
        assert!(state.is_settled());
        assert!(state.records().is_empty());
    }

    #[test]
    fn test_load_editor_with_one_source_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_support::sample_config(dir.path());
        config.data.reports_path = dir.path().join("missing.json");

        let editor = load_editor(&config);

        assert_eq!(editor.settings().users().len(), 2);
        assert!(editor.settings().report_ids().is_empty());
    }
}
