//! Apply CLI command.

use super::load_editor;
use crate::config::AccessConfig;
use crate::services::Action;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Replays an action script and exports the result.
#[derive(Debug, Clone)]
pub struct ApplyCommand {
    /// JSON file holding an array of actions.
    pub script: PathBuf,
    /// Export directory; the configured one when unset.
    pub out: Option<PathBuf>,
}

impl ApplyCommand {
    /// Creates an apply command.
    #[must_use]
    pub const fn new(script: PathBuf, out: Option<PathBuf>) -> Self {
        Self { script, out }
    }

    /// Runs the script and writes `users.json` / `reports.json`.
    ///
    /// Nothing is written if any action is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if the script cannot be read or parsed, an action is
    /// rejected, or the export cannot be written.
    pub fn run(&self, config: &AccessConfig) -> Result<String> {
        let actions = read_script(&self.script)?;
        let mut editor = load_editor(config);
        let applied = editor.dispatch_all(actions)?;

        let dir = self.out.as_deref().unwrap_or(config.data.export_dir.as_path());
        let written = editor.export().write_to_dir(dir)?;

        let mut out = format!("applied {applied} actions\n");
        out.extend(written.iter().map(|path| format!("wrote {}\n", path.display())));
        Ok(out)
    }
}

/// Parses an action script.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the file cannot be read and
/// [`Error::InvalidInput`] if it is not a JSON array of actions.
pub fn read_script(path: &Path) -> Result<Vec<Action>> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
        operation: "read_script".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;
    serde_json::from_str(&contents)
        .map_err(|e| Error::InvalidInput(format!("{}: {e}", path.display())))
}
