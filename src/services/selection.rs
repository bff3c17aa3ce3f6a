//! Selection and edit state machine.
//!
//! # States
//!
//! | State | Entered by | Left by |
//! |-------|------------|---------|
//! | `Viewing` | start, `cancel`, `save`, switching groups | `begin_edit` |
//! | `Editing` | `begin_edit` | `cancel`, `save`, switching groups |
//!
//! Either state may have no active group. Pending sets are reset to the
//! active group's committed membership whenever the active group changes,
//! whenever editing ends, and whenever the store changes underneath
//! (see [`SelectionMachine::sync`]).
//!
//! # Transitions
//!
//! | Operation | Legal in | Failure |
//! |-----------|----------|---------|
//! | `select_group` | any | never (implicitly cancels an edit) |
//! | `focus` (user/report) | `Viewing` | `InvalidStateTransition` while editing, `InvalidInput` for an unknown id |
//! | `begin_edit` | `Viewing` with an existing active group | `InvalidStateTransition` |
//! | `toggle_member` | `Editing` | `InvalidStateTransition`, `InvalidInput` for an unknown id |
//! | `toggle_all_*` | `Editing` | `InvalidStateTransition` |
//! | `cancel`, `save` | `Editing` | `InvalidStateTransition` |
//!
//! Refused transitions leave the state untouched.

use super::store::SettingsStore;
use crate::models::{EditMode, Focus, GroupId, Member, ReportId, SelectionState, Settings, UserId};
use crate::{Error, Result};
use std::collections::BTreeSet;

/// Drives [`SelectionState`] through its legal transitions.
#[derive(Debug, Clone, Default)]
pub struct SelectionMachine {
    state: SelectionState,
}

impl SelectionMachine {
    /// Creates a machine in `Viewing` with nothing selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &SelectionState {
        &self.state
    }

    // =========================================================================
    // Radio selection
    // =========================================================================

    /// Makes `group_id` the active group.
    ///
    /// Always legal. An edit in progress is cancelled first, so editing never
    /// carries over to another group.
    pub fn select_group(&mut self, group_id: GroupId, settings: &Settings) {
        if self.state.is_editing() {
            tracing::debug!(group_id = %group_id, "Group switch cancels edit in progress");
        }
        self.state.focus = Some(Focus::Group(group_id));
        self.end_edit(settings);
    }

    /// Radio-selects any item.
    ///
    /// Groups behave like [`Self::select_group`]. Users and reports enter
    /// connection highlighting, which is only available while viewing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] when focusing a user or
    /// report while editing, and [`Error::InvalidInput`] when the user or
    /// report does not exist.
    pub fn focus(&mut self, focus: Focus, settings: &Settings) -> Result<()> {
        match focus {
            Focus::Group(group_id) => {
                self.select_group(group_id, settings);
                Ok(())
            },
            other => {
                if self.state.is_editing() {
                    return Err(self.refuse("focus", "cannot focus a user or report while editing"));
                }
                match &other {
                    Focus::User(id) if !settings.contains_user(id.as_str()) => {
                        return Err(unknown_id("focus", "user", id.as_str()));
                    },
                    Focus::Report(id) if !settings.contains_report(id.as_str()) => {
                        return Err(unknown_id("focus", "report", id.as_str()));
                    },
                    _ => {},
                }
                self.state.focus = Some(other);
                self.end_edit(settings);
                Ok(())
            },
        }
    }

    /// Clears the radio selection, cancelling any edit.
    pub fn clear_focus(&mut self, settings: &Settings) {
        self.state.focus = None;
        self.end_edit(settings);
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Returns `true` if [`Self::begin_edit`] would succeed.
    #[must_use]
    pub fn can_begin_edit(&self, settings: &Settings) -> bool {
        !self.state.is_editing()
            && self
                .state
                .active_group_id()
                .is_some_and(|id| settings.contains_group(id.as_str()))
    }

    /// Enters `Editing` with pending sets copied from the committed ones.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] if already editing, if no
    /// group is active, or if the active group does not exist.
    pub fn begin_edit(&mut self, settings: &Settings) -> Result<()> {
        if self.state.is_editing() {
            return Err(self.refuse("begin_edit", "already editing"));
        }
        let Some(group_id) = self.state.active_group_id() else {
            return Err(self.refuse("begin_edit", "no active group"));
        };
        if !settings.contains_group(group_id.as_str()) {
            let reason = format!("active group '{group_id}' does not exist");
            return Err(self.refuse("begin_edit", reason));
        }

        self.mirror_committed(settings);
        self.state.mode = EditMode::Editing;
        tracing::debug!(group_id = ?self.state.active_group_id(), "Editing started");
        Ok(())
    }

    /// Flips one candidate in the pending sets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] while viewing, and
    /// [`Error::InvalidInput`] when the user or report does not exist.
    pub fn toggle_member(&mut self, member: Member, settings: &Settings) -> Result<()> {
        self.require_editing("toggle_member")?;
        match member {
            Member::User(id) if !settings.contains_user(id.as_str()) => {
                return Err(unknown_id("toggle_member", "user", id.as_str()));
            },
            Member::Report(id) if !settings.contains_report(id.as_str()) => {
                return Err(unknown_id("toggle_member", "report", id.as_str()));
            },
            Member::User(id) => toggle(&mut self.state.pending_user_ids, id),
            Member::Report(id) => toggle(&mut self.state.pending_report_ids, id),
        }
        Ok(())
    }

    /// Check-all / uncheck-all over the visible users.
    ///
    /// If every visible user is pending they are all removed; otherwise all
    /// are added. Users hidden by the search are left alone. Returns whether
    /// the visible users end up checked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] while viewing.
    pub fn toggle_all_users(&mut self, visible: &[UserId]) -> Result<bool> {
        self.require_editing("toggle_all")?;
        Ok(toggle_all(&mut self.state.pending_user_ids, visible))
    }

    /// Check-all / uncheck-all over the visible reports.
    ///
    /// Same rule as [`Self::toggle_all_users`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] while viewing.
    pub fn toggle_all_reports(&mut self, visible: &[ReportId]) -> Result<bool> {
        self.require_editing("toggle_all")?;
        Ok(toggle_all(&mut self.state.pending_report_ids, visible))
    }

    /// Discards pending changes and returns to `Viewing`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] while viewing.
    pub fn cancel(&mut self, settings: &Settings) -> Result<()> {
        self.require_editing("cancel")?;
        self.end_edit(settings);
        tracing::debug!("Edit cancelled");
        Ok(())
    }

    /// Commits the pending sets to the store and returns to `Viewing`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] while viewing.
    pub fn save(&mut self, store: &mut SettingsStore) -> Result<()> {
        self.require_editing("save")?;
        let Some(group_id) = self.state.active_group_id().cloned() else {
            return Err(self.refuse("save", "no active group"));
        };

        store.save_group_membership(
            &group_id,
            std::mem::take(&mut self.state.pending_user_ids),
            std::mem::take(&mut self.state.pending_report_ids),
        );
        self.end_edit(store.settings());
        Ok(())
    }

    // =========================================================================
    // Store changes
    // =========================================================================

    /// Re-mirrors committed membership after the store changed underneath.
    ///
    /// While editing, pending sets are kept unless the active group vanished,
    /// in which case the edit is abandoned.
    pub fn sync(&mut self, settings: &Settings) {
        if self.state.is_editing() {
            let group_exists = self
                .state
                .active_group_id()
                .is_some_and(|id| settings.contains_group(id.as_str()));
            if group_exists {
                return;
            }
            tracing::warn!(group_id = ?self.state.active_group_id(), "Active group vanished, edit abandoned");
        }
        self.end_edit(settings);
    }

    /// Abandons any edit (used when a new snapshot replaces the store).
    pub fn discard_edits(&mut self, settings: &Settings) {
        self.end_edit(settings);
    }

    fn end_edit(&mut self, settings: &Settings) {
        self.state.mode = EditMode::Viewing;
        self.mirror_committed(settings);
    }

    fn mirror_committed(&mut self, settings: &Settings) {
        let committed = self
            .state
            .active_group_id()
            .and_then(|id| settings.group(id.as_str()));
        match committed {
            Some(group) => {
                self.state.pending_user_ids.clone_from(&group.user_ids);
                self.state.pending_report_ids.clone_from(&group.report_ids);
            },
            None => {
                self.state.pending_user_ids.clear();
                self.state.pending_report_ids.clear();
            },
        }
    }

    fn require_editing(&self, operation: &'static str) -> Result<()> {
        if self.state.is_editing() {
            Ok(())
        } else {
            Err(self.refuse(operation, "not editing"))
        }
    }

    fn refuse(&self, operation: &'static str, reason: impl Into<String>) -> Error {
        let err = Error::invalid_transition(operation, reason);
        tracing::warn!(mode = self.state.mode().as_str(), error = %err, "Transition refused");
        err
    }
}

fn unknown_id(operation: &'static str, kind: &'static str, id: &str) -> Error {
    tracing::warn!(operation, kind, id, "Unknown id refused");
    Error::InvalidInput(format!("{operation}: unknown {kind} '{id}'"))
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, id: T) {
    if !set.remove(&id) {
        set.insert(id);
    }
}

fn toggle_all<T: Ord + Clone>(set: &mut BTreeSet<T>, visible: &[T]) -> bool {
    let all_checked = !visible.is_empty() && visible.iter().all(|id| set.contains(id));
    if all_checked {
        for id in visible {
            set.remove(id);
        }
        false
    } else {
        set.extend(visible.iter().cloned());
        !visible.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PrimaryKeys;
    use crate::services::Normalizer;
    use serde_json::json;
    use std::sync::Arc;

    fn store() -> SettingsStore {
        let users = json!([
            {"email": "a@x.com", "G1": 1, "G2": 0},
            {"email": "b@x.com", "G1": 0, "G2": 1}
        ]);
        let reports = json!([
            {"link": "r1", "title": "T1", "groups": ["G1"]},
            {"link": "r2", "groups": []}
        ]);
        let settings = Normalizer::new(PrimaryKeys::default()).normalize(
            users.as_array().unwrap(),
            reports.as_array().unwrap(),
        );
        SettingsStore::new(Arc::new(settings))
    }

    fn user(id: &str) -> UserId {
        UserId::from(id)
    }

    #[test]
    fn test_begin_edit_without_active_group_is_refused() {
        let store = store();
        let mut machine = SelectionMachine::new();
        let result = machine.begin_edit(store.settings());
        assert!(matches!(result, Err(Error::InvalidStateTransition { operation: "begin_edit", .. })));
        assert_eq!(machine.state().mode(), EditMode::Viewing);
    }

    #[test]
    fn test_begin_edit_missing_group_is_refused() {
        let store = store();
        let mut machine = SelectionMachine::new();
        machine.select_group(GroupId::from("Ghost"), store.settings());
        assert!(!machine.can_begin_edit(store.settings()));
        assert!(machine.begin_edit(store.settings()).is_err());
        assert!(!machine.state().is_editing());
    }

    #[test]
    fn test_select_group_mirrors_committed() {
        let store = store();
        let mut machine = SelectionMachine::new();
        machine.select_group(GroupId::from("G1"), store.settings());
        assert!(machine.state().pending_user_ids().contains("a@x.com"));
        assert!(machine.state().pending_report_ids().contains("r1"));
    }

    #[test]
    fn test_toggle_while_viewing_is_refused() {
        let store = store();
        let mut machine = SelectionMachine::new();
        machine.select_group(GroupId::from("G1"), store.settings());
        let before = machine.state().clone();
        assert!(machine.toggle_member(Member::User(user("a@x.com")), store.settings()).is_err());
        assert!(machine.toggle_all_users(&[user("a@x.com")]).is_err());
        assert!(machine.cancel(store.settings()).is_err());
        assert_eq!(machine.state(), &before);
    }

    #[test]
    fn test_pending_does_not_touch_store_until_save() {
        let mut store = store();
        let mut machine = SelectionMachine::new();
        machine.select_group(GroupId::from("G1"), store.settings());
        machine.begin_edit(store.settings()).unwrap();
        machine.toggle_member(Member::User(user("b@x.com")), store.settings()).unwrap();
        machine.toggle_member(Member::Report(ReportId::from("r1")), store.settings()).unwrap();

        assert!(!store.is_dirty());
        assert!(machine.state().pending_user_ids().contains("b@x.com"));

        machine.save(&mut store).unwrap();
        let g1 = store.settings().group("G1").unwrap();
        assert!(g1.has_user("a@x.com"));
        assert!(g1.has_user("b@x.com"));
        assert!(!g1.has_report("r1"));
        assert_eq!(machine.state().mode(), EditMode::Viewing);
        assert_eq!(machine.state().pending_user_ids(), &g1.user_ids);
    }

    #[test]
    fn test_cancel_restores_committed() {
        let store = store();
        let mut machine = SelectionMachine::new();
        machine.select_group(GroupId::from("G1"), store.settings());
        machine.begin_edit(store.settings()).unwrap();
        machine.toggle_member(Member::User(user("a@x.com")), store.settings()).unwrap();
        machine.cancel(store.settings()).unwrap();

        assert!(machine.state().pending_user_ids().contains("a@x.com"));
        assert!(machine.cancel(store.settings()).is_err());
    }

    #[test]
    fn test_group_switch_cancels_edit() {
        let store = store();
        let mut machine = SelectionMachine::new();
        machine.select_group(GroupId::from("G1"), store.settings());
        machine.begin_edit(store.settings()).unwrap();
        machine.toggle_member(Member::User(user("b@x.com")), store.settings()).unwrap();

        machine.select_group(GroupId::from("G2"), store.settings());

        assert!(!machine.state().is_editing());
        let pending: Vec<&str> = machine
            .state()
            .pending_user_ids()
            .iter()
            .map(UserId::as_str)
            .collect();
        assert_eq!(pending, vec!["b@x.com"]);
        assert!(machine.state().pending_report_ids().is_empty());
    }

    #[test]
    fn test_focus_user_refused_while_editing() {
        let store = store();
        let mut machine = SelectionMachine::new();
        machine.select_group(GroupId::from("G1"), store.settings());
        machine.begin_edit(store.settings()).unwrap();
        let result = machine.focus(Focus::User(user("a@x.com")), store.settings());
        assert!(result.is_err());
        assert!(machine.state().is_editing());
        assert_eq!(machine.state().active_group_id().map(GroupId::as_str), Some("G1"));
    }

    #[test]
    fn test_focus_user_clears_active_group() {
        let store = store();
        let mut machine = SelectionMachine::new();
        machine.select_group(GroupId::from("G1"), store.settings());
        machine
            .focus(Focus::User(user("a@x.com")), store.settings())
            .unwrap();
        assert!(machine.state().active_group_id().is_none());
        assert!(machine.state().pending_user_ids().is_empty());
        assert!(!machine.can_begin_edit(store.settings()));
    }

    #[test]
    fn test_toggle_all_semantics() {
        let store = store();
        let mut machine = SelectionMachine::new();
        machine.select_group(GroupId::from("G1"), store.settings());
        machine.begin_edit(store.settings()).unwrap();

        let visible = [user("a@x.com"), user("b@x.com")];
        assert!(machine.toggle_all_users(&visible).unwrap());
        assert_eq!(machine.state().pending_user_ids().len(), 2);

        assert!(!machine.toggle_all_users(&visible).unwrap());
        assert!(machine.state().pending_user_ids().is_empty());
    }

    #[test]
    fn test_toggle_all_leaves_hidden_candidates() {
        let store = store();
        let mut machine = SelectionMachine::new();
        machine.select_group(GroupId::from("G1"), store.settings());
        machine.begin_edit(store.settings()).unwrap();

        // a@x.com is pending; only b@x.com is visible.
        machine.toggle_all_users(&[user("b@x.com")]).unwrap();
        machine.toggle_all_users(&[user("b@x.com")]).unwrap();
        let pending: Vec<&str> = machine
            .state()
            .pending_user_ids()
            .iter()
            .map(UserId::as_str)
            .collect();
        assert_eq!(pending, vec!["a@x.com"]);
    }

    #[test]
    fn test_toggle_all_on_empty_visible_list() {
        let store = store();
        let mut machine = SelectionMachine::new();
        machine.select_group(GroupId::from("G1"), store.settings());
        machine.begin_edit(store.settings()).unwrap();
        let before = machine.state().clone();
        assert!(!machine.toggle_all_reports(&[]).unwrap());
        assert_eq!(machine.state(), &before);
    }

    #[test]
    fn test_sync_abandons_edit_when_group_vanishes() {
        let mut store = store();
        let mut machine = SelectionMachine::new();
        machine.select_group(GroupId::from("G1"), store.settings());
        machine.begin_edit(store.settings()).unwrap();

        store.snapshot(Arc::new(Settings::new()));
        machine.sync(store.settings());

        assert!(!machine.state().is_editing());
        assert!(machine.state().pending_user_ids().is_empty());
    }

    #[test]
    fn test_sync_keeps_pending_while_group_exists() {
        let mut store = store();
        let mut machine = SelectionMachine::new();
        machine.select_group(GroupId::from("G1"), store.settings());
        machine.begin_edit(store.settings()).unwrap();
        machine.toggle_member(Member::User(user("b@x.com")), store.settings()).unwrap();

        store.add_user("c@x.com").unwrap();
        machine.sync(store.settings());

        assert!(machine.state().is_editing());
        assert!(machine.state().pending_user_ids().contains("b@x.com"));
    }

    #[test]
    fn test_toggle_unknown_ids_is_refused() {
        let mut store = store();
        let mut machine = SelectionMachine::new();
        machine.select_group(GroupId::from("G1"), store.settings());
        machine.begin_edit(store.settings()).unwrap();
        let before = machine.state().clone();

        let ghost_user = machine.toggle_member(Member::User(user("ghost@x.com")), store.settings());
        let ghost_report =
            machine.toggle_member(Member::Report(ReportId::from("ghost-report")), store.settings());

        assert!(matches!(ghost_user, Err(Error::InvalidInput(_))));
        assert!(matches!(ghost_report, Err(Error::InvalidInput(_))));
        assert_eq!(machine.state(), &before);

        let committed = store.settings().clone();
        machine.save(&mut store).unwrap();
        assert_eq!(store.settings(), &committed);
        assert!(!store.settings().group("G1").unwrap().has_user("ghost@x.com"));
    }

    #[test]
    fn test_focus_unknown_ids_is_refused() {
        let store = store();
        let mut machine = SelectionMachine::new();
        machine.select_group(GroupId::from("G1"), store.settings());
        let before = machine.state().clone();

        let ghost_user = machine.focus(Focus::User(user("ghost@x.com")), store.settings());
        let ghost_report = machine.focus(Focus::Report(ReportId::from("ghost")), store.settings());

        assert!(matches!(ghost_user, Err(Error::InvalidInput(_))));
        assert!(matches!(ghost_report, Err(Error::InvalidInput(_))));
        assert_eq!(machine.state(), &before);
    }
}
