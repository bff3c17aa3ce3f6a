//! Export CLI command.

use super::load_editor;
use crate::Result;
use crate::config::AccessConfig;
use std::path::PathBuf;

/// Re-exports the loaded documents without edits.
#[derive(Debug, Clone, Default)]
pub struct ExportCommand {
    /// Export directory; the configured one when unset.
    pub out: Option<PathBuf>,
}

impl ExportCommand {
    /// Creates an export command.
    #[must_use]
    pub const fn new(out: Option<PathBuf>) -> Self {
        Self { out }
    }

    /// Normalizes the sources and writes them back out.
    ///
    /// # Errors
    ///
    /// Returns an error if the export cannot be written.
    pub fn run(&self, config: &AccessConfig) -> Result<String> {
        let editor = load_editor(config);
        let dir = self.out.as_deref().unwrap_or(config.data.export_dir.as_path());
        let written = editor.export().write_to_dir(dir)?;

        Ok(written
            .iter()
            .map(|path| format!("wrote {}\n", path.display()))
            .collect())
    }
}
