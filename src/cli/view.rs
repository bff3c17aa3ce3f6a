//! View CLI command.

use super::load_editor;
use crate::config::AccessConfig;
use crate::models::{EntityKind, GroupId, Projection, ReportId, UserId};
use crate::services::{Action, Affordances};
use crate::{Error, Result};
use serde::Serialize;

/// Prints the projected lists for one selection.
#[derive(Debug, Clone, Default)]
pub struct ViewCommand {
    /// Group to select.
    pub group: Option<String>,
    /// User to focus.
    pub focus_user: Option<String>,
    /// Report to focus.
    pub focus_report: Option<String>,
    /// Groups list search text.
    pub search_groups: Option<String>,
    /// Users list search text.
    pub search_users: Option<String>,
    /// Reports list search text.
    pub search_reports: Option<String>,
}

#[derive(Serialize)]
struct ViewOutput {
    projection: Projection,
    affordances: Affordances,
}

impl ViewCommand {
    /// Actions reproducing the requested selection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if more than one item is selected.
    pub fn actions(&self) -> Result<Vec<Action>> {
        let selected = [&self.group, &self.focus_user, &self.focus_report]
            .iter()
            .filter(|item| item.is_some())
            .count();
        if selected > 1 {
            return Err(Error::InvalidInput(
                "select at most one of --group, --focus-user, --focus-report".to_string(),
            ));
        }

        let mut actions = Vec::new();
        if let Some(id) = &self.group {
            actions.push(Action::SelectGroup { id: GroupId::new(id.as_str()) });
        }
        if let Some(id) = &self.focus_user {
            actions.push(Action::FocusUser { id: UserId::new(id.as_str()) });
        }
        if let Some(id) = &self.focus_report {
            actions.push(Action::FocusReport { id: ReportId::new(id.as_str()) });
        }
        for (kind, text) in [
            (EntityKind::Group, &self.search_groups),
            (EntityKind::User, &self.search_users),
            (EntityKind::Report, &self.search_reports),
        ] {
            if let Some(text) = text {
                actions.push(Action::SetSearch {
                    kind,
                    text: text.clone(),
                });
            }
        }
        Ok(actions)
    }

    /// Renders the projection and affordances as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error for conflicting selections or if serialization fails.
    pub fn run(&self, config: &AccessConfig) -> Result<String> {
        let mut editor = load_editor(config);
        editor.dispatch_all(self.actions()?)?;

        let output = ViewOutput {
            projection: editor.projection(),
            affordances: editor.affordances("", ""),
        };
        serde_json::to_string_pretty(&output).map_err(|e| Error::OperationFailed {
            operation: "serialize_projection".to_string(),
            cause: e.to_string(),
        })
    }
}
