//! Selection and edit state.
//!
//! One item across all three lists can be radio-selected at a time. Selecting
//! a group makes it the active group (the one whose membership is viewed and
//! edited); selecting a user or report instead enters connection
//! highlighting. Pending sets hold the uncommitted membership while editing
//! and mirror the committed membership otherwise.

use super::ids::{EntityKind, GroupId, ReportId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Whether the active group's membership is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    /// Membership is displayed but not editable.
    #[default]
    Viewing,
    /// Pending sets are being edited.
    Editing,
}

impl EditMode {
    /// Returns the mode as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Viewing => "viewing",
            Self::Editing => "editing",
        }
    }
}

/// The single radio-selected item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Focus {
    /// A group is active.
    Group(GroupId),
    /// A user is focused for connection highlighting.
    User(UserId),
    /// A report is focused for connection highlighting.
    Report(ReportId),
}

impl Focus {
    /// Which list the focused item lives in.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Group(_) => EntityKind::Group,
            Self::User(_) => EntityKind::User,
            Self::Report(_) => EntityKind::Report,
        }
    }

    /// The focused item's id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Group(id) => id.as_str(),
            Self::User(id) => id.as_str(),
            Self::Report(id) => id.as_str(),
        }
    }

    /// Returns `true` for user and report focus (connection highlighting).
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::User(_) | Self::Report(_))
    }
}

/// A candidate member of the active group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Member {
    /// A user.
    User(UserId),
    /// A report.
    Report(ReportId),
}

impl Member {
    /// Which list the member lives in.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::User(_) => EntityKind::User,
            Self::Report(_) => EntityKind::Report,
        }
    }
}

/// Current selection, mode and pending membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub(crate) focus: Option<Focus>,
    pub(crate) mode: EditMode,
    pub(crate) pending_user_ids: BTreeSet<UserId>,
    pub(crate) pending_report_ids: BTreeSet<ReportId>,
}

impl SelectionState {
    /// Creates the initial state: nothing selected, viewing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The radio-selected item, if any.
    #[must_use]
    pub const fn focus(&self) -> Option<&Focus> {
        self.focus.as_ref()
    }

    /// The active group, if a group is selected.
    #[must_use]
    pub const fn active_group_id(&self) -> Option<&GroupId> {
        match &self.focus {
            Some(Focus::Group(id)) => Some(id),
            _ => None,
        }
    }

    /// The user or report driving connection highlighting, if any.
    #[must_use]
    pub fn connection_focus(&self) -> Option<&Focus> {
        self.focus.as_ref().filter(|focus| focus.is_connection())
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> EditMode {
        self.mode
    }

    /// Returns `true` while editing.
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        matches!(self.mode, EditMode::Editing)
    }

    /// Pending (or mirrored) users of the active group.
    #[must_use]
    pub const fn pending_user_ids(&self) -> &BTreeSet<UserId> {
        &self.pending_user_ids
    }

    /// Pending (or mirrored) reports of the active group.
    #[must_use]
    pub const fn pending_report_ids(&self) -> &BTreeSet<ReportId> {
        &self.pending_report_ids
    }
}
