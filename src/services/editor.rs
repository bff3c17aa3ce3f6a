//! Access editor facade.
//!
//! [`AccessEditor`] owns every piece of state the host needs: the memoized
//! normalizer output, the settings store, the selection machine, the per-list
//! queries and the connection cache. Hosts feed it loaded sources and
//! [`Action`]s and read back projections, affordances and exports.
//!
//! # Actions
//!
//! | Action | Effect |
//! |--------|--------|
//! | `select_group` | Radio-select a group (cancels an edit) |
//! | `focus_user`, `focus_report` | Connection highlighting (viewing only) |
//! | `clear_focus` | Clear the radio selection |
//! | `begin_edit`, `cancel`, `save` | Edit lifecycle of the active group |
//! | `toggle_user`, `toggle_report` | Flip one pending member |
//! | `toggle_all` | Check-all / uncheck-all over the visible candidates |
//! | `add_user`, `add_group` | Insert a new identifier |
//! | `set_search`, `cycle_sort` | Per-list query changes |
//! | `reset` | Discard every change since the last load |

use super::connections::ConnectionCache;
use super::export::{ExportBundle, to_original_shape};
use super::normalizer::{MemoizedSettings, Normalizer};
use super::projection::project;
use super::selection::SelectionMachine;
use super::sources::{RawSources, SourceState};
use super::store::SettingsStore;
use crate::config::PrimaryKeys;
use crate::models::{
    EntityKind, Focus, GroupId, Member, Projection, ReportId, SelectionState, Settings, UserId,
    ViewState,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// One discrete user intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Radio-select a group.
    SelectGroup {
        /// Group to activate.
        id: GroupId,
    },
    /// Radio-select a user for connection highlighting.
    FocusUser {
        /// User to focus.
        id: UserId,
    },
    /// Radio-select a report for connection highlighting.
    FocusReport {
        /// Report to focus.
        id: ReportId,
    },
    /// Clear the radio selection.
    ClearFocus,
    /// Start editing the active group.
    BeginEdit,
    /// Flip a user in the pending set.
    ToggleUser {
        /// User to flip.
        id: UserId,
    },
    /// Flip a report in the pending set.
    ToggleReport {
        /// Report to flip.
        id: ReportId,
    },
    /// Check-all / uncheck-all over one list's visible items.
    ToggleAll {
        /// `user` or `report`.
        kind: EntityKind,
    },
    /// Discard pending changes.
    Cancel,
    /// Commit pending changes.
    Save,
    /// Insert a user.
    AddUser {
        /// Candidate identifier.
        id: String,
    },
    /// Insert an empty group.
    AddGroup {
        /// Candidate identifier.
        id: String,
    },
    /// Change one list's search text.
    SetSearch {
        /// Which list.
        kind: EntityKind,
        /// New search text.
        text: String,
    },
    /// Advance one list's sort direction.
    CycleSort {
        /// Which list.
        kind: EntityKind,
    },
    /// Revert to the last loaded snapshot.
    Reset,
}

impl Action {
    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SelectGroup { .. } => "select_group",
            Self::FocusUser { .. } => "focus_user",
            Self::FocusReport { .. } => "focus_report",
            Self::ClearFocus => "clear_focus",
            Self::BeginEdit => "begin_edit",
            Self::ToggleUser { .. } => "toggle_user",
            Self::ToggleReport { .. } => "toggle_report",
            Self::ToggleAll { .. } => "toggle_all",
            Self::Cancel => "cancel",
            Self::Save => "save",
            Self::AddUser { .. } => "add_user",
            Self::AddGroup { .. } => "add_group",
            Self::SetSearch { .. } => "set_search",
            Self::CycleSort { .. } => "cycle_sort",
            Self::Reset => "reset",
        }
    }
}

/// Which controls are currently enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affordances {
    /// The edit button.
    pub can_edit: bool,
    /// The cancel button.
    pub can_cancel: bool,
    /// The save button.
    pub can_save: bool,
    /// The users list check-all control.
    pub can_check_all_users: bool,
    /// The reports list check-all control.
    pub can_check_all_reports: bool,
    /// The add-user button for the current candidate.
    pub can_add_user: bool,
    /// The add-group button for the current candidate.
    pub can_add_group: bool,
}

/// Settings editor state with action dispatch.
#[derive(Debug)]
pub struct AccessEditor {
    normalizer: Normalizer,
    memo: MemoizedSettings,
    store: SettingsStore,
    selection: SelectionMachine,
    view: ViewState,
    connections: ConnectionCache,
}

impl AccessEditor {
    /// Creates an editor with empty settings.
    #[must_use]
    pub fn new(keys: PrimaryKeys) -> Self {
        let memo = MemoizedSettings::new();
        let store = SettingsStore::new(memo.current()).with_reserved_group_id(keys.users.clone());
        Self {
            normalizer: Normalizer::new(keys),
            memo,
            store,
            selection: SelectionMachine::new(),
            view: ViewState::default(),
            connections: ConnectionCache::new(),
        }
    }

    /// The primary-key fields this editor reads and writes.
    #[must_use]
    pub const fn keys(&self) -> &PrimaryKeys {
        self.normalizer.keys()
    }

    /// Hands over the current state of both sources.
    ///
    /// Settings are re-derived only when either source changed identity; a
    /// new snapshot discards all edits. Returns `true` if that happened.
    pub fn load(&mut self, users: SourceState, reports: SourceState) -> bool {
        let (settings, fresh) = self.memo.derive(&self.normalizer, RawSources::new(users, reports));
        if !fresh || !self.store.snapshot(settings) {
            return false;
        }
        self.selection.discard_edits(self.store.settings());
        self.connections.clear();
        tracing::info!(
            users = self.store.settings().users().len(),
            reports = self.store.settings().report_ids().len(),
            groups = self.store.settings().group_ids().len(),
            "Settings loaded"
        );
        true
    }

    /// Current working settings.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        self.store.settings()
    }

    /// Current selection state.
    #[must_use]
    pub const fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    /// Current per-list queries.
    #[must_use]
    pub const fn view(&self) -> &ViewState {
        &self.view
    }

    /// Returns `true` if the settings differ from the last load.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty()
    }

    /// Applies one action.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] for actions illegal in the
    /// current mode, [`Error::DuplicateIdentifier`] or
    /// [`Error::EmptyIdentifier`] for rejected insertions, and
    /// [`Error::InvalidInput`] for check-all on the groups list, for toggling
    /// or focusing an unknown user or report, and for a group named like the
    /// users primary key. A failed action changes nothing.
    #[instrument(skip_all, fields(action = action.name()))]
    pub fn dispatch(&mut self, action: Action) -> Result<()> {
        match action {
            Action::SelectGroup { id } => {
                self.selection.select_group(id, self.store.settings());
            },
            Action::FocusUser { id } => {
                self.selection.focus(Focus::User(id), self.store.settings())?;
            },
            Action::FocusReport { id } => {
                self.selection.focus(Focus::Report(id), self.store.settings())?;
            },
            Action::ClearFocus => self.selection.clear_focus(self.store.settings()),
            Action::BeginEdit => self.selection.begin_edit(self.store.settings())?,
            Action::ToggleUser { id } => {
                self.selection.toggle_member(Member::User(id), self.store.settings())?;
            },
            Action::ToggleReport { id } => {
                self.selection.toggle_member(Member::Report(id), self.store.settings())?;
            },
            Action::ToggleAll { kind } => self.toggle_all(kind)?,
            Action::Cancel => self.selection.cancel(self.store.settings())?,
            Action::Save => self.selection.save(&mut self.store)?,
            Action::AddUser { id } => {
                self.store.add_user(&id)?;
                self.selection.sync(self.store.settings());
            },
            Action::AddGroup { id } => {
                self.store.add_group(&id)?;
                self.selection.sync(self.store.settings());
            },
            Action::SetSearch { kind, text } => self.view.query_mut(kind).search = text,
            Action::CycleSort { kind } => {
                let query = self.view.query_mut(kind);
                query.sort = query.sort.next();
            },
            Action::Reset => {
                self.store.reset();
                self.selection.discard_edits(self.store.settings());
            },
        }
        tracing::debug!(mode = self.selection.state().mode().as_str(), "Action applied");
        Ok(())
    }

    /// Applies actions in order, stopping at the first failure. Returns the
    /// number of actions applied.
    ///
    /// # Errors
    ///
    /// Returns the error of the first rejected action.
    pub fn dispatch_all(&mut self, actions: impl IntoIterator<Item = Action>) -> Result<usize> {
        let mut applied = 0;
        for (index, action) in actions.into_iter().enumerate() {
            let name = action.name();
            if let Err(e) = self.dispatch(action) {
                tracing::warn!(index, action = name, error = %e, "Action rejected");
                return Err(e);
            }
            applied += 1;
        }
        Ok(applied)
    }

    /// Derives the three display lists.
    pub fn projection(&mut self) -> Projection {
        let settings = self.store.settings();
        let connections = match self.selection.state().connection_focus() {
            Some(focus) => Some(self.connections.get(settings, focus)),
            None => None,
        };
        project(settings, self.selection.state(), connections, &self.view)
    }

    /// Which controls are enabled, given the candidate text of the add-user
    /// and add-group inputs.
    #[must_use]
    pub fn affordances(&self, user_candidate: &str, group_candidate: &str) -> Affordances {
        let editing = self.selection.state().is_editing();
        Affordances {
            can_edit: self.selection.can_begin_edit(self.store.settings()),
            can_cancel: editing,
            can_save: editing,
            can_check_all_users: editing && !self.store.settings().users().is_empty(),
            can_check_all_reports: editing && !self.store.settings().report_ids().is_empty(),
            can_add_user: self.store.check_new_user(user_candidate).is_ok(),
            can_add_group: self.store.check_new_group(group_candidate).is_ok(),
        }
    }

    /// Exports the current settings in the source document shapes.
    #[must_use]
    pub fn export(&self) -> ExportBundle {
        to_original_shape(self.store.settings(), self.keys())
    }

    fn toggle_all(&mut self, kind: EntityKind) -> Result<()> {
        let projection = self.projection();
        let checked = match kind {
            EntityKind::User => {
                let visible: Vec<UserId> = projection.users.visible_ids().map(UserId::new).collect();
                self.selection.toggle_all_users(&visible)?
            },
            EntityKind::Report => {
                let visible: Vec<ReportId> =
                    projection.reports.visible_ids().map(ReportId::new).collect();
                self.selection.toggle_all_reports(&visible)?
            },
            EntityKind::Group => {
                return Err(Error::InvalidInput(
                    "check-all applies to the users and reports lists only".to_string(),
                ));
            },
        };
        tracing::debug!(kind = %kind, checked, "Visible candidates toggled");
        Ok(())
    }
}
