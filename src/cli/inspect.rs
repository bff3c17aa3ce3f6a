//! Inspect CLI command.

use super::load_editor;
use crate::Result;
use crate::config::AccessConfig;

/// Summarizes the loaded documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct InspectCommand;

impl InspectCommand {
    /// Creates a new inspect command.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Loads the configured sources and renders the summary.
    ///
    /// # Errors
    ///
    /// Never fails for unreadable sources (they count as empty); the result
    /// type matches the other commands.
    pub fn run(&self, config: &AccessConfig) -> Result<String> {
        let editor = load_editor(config);
        let settings = editor.settings();

        let mut out = format!(
            "users:   {}\nreports: {}\ngroups:  {}\n",
            settings.users().len(),
            settings.report_ids().len(),
            settings.group_ids().len()
        );
        out.extend(settings.groups().map(|(group_id, group)| {
            format!(
                "  {group_id}: {} users, {} reports\n",
                group.user_ids.len(),
                group.report_ids.len()
            )
        }));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::test_support::sample_config;

    #[test]
    fn test_inspect_counts() {
        let dir = tempfile::tempdir().unwrap();
        let output = InspectCommand::new().run(&sample_config(dir.path())).unwrap();
        assert!(output.contains("users:   2"));
        assert!(output.contains("reports: 2"));
        assert!(output.contains("  G1: 1 users, 1 reports"));
    }

    #[test]
    fn test_inspect_without_sources() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AccessConfig::new();
        config.data.users_path = dir.path().join("u.json");
        config.data.reports_path = dir.path().join("r.json");
        let output = InspectCommand::new().run(&config).unwrap();
        assert!(output.starts_with("users:   0\n"));
    }
}
