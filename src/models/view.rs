//! Display-side types: list queries and the projected lists.

use super::ids::{EntityKind, GroupId, ReportId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Three-state sort cycle for a list.
///
/// Sorting only moves highlighted items; it never sorts alphabetically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Natural order.
    #[default]
    None,
    /// Highlighted items first.
    Ascending,
    /// Highlighted items last.
    Descending,
}

impl SortDirection {
    /// The next direction in the `none → ascending → descending → none` cycle.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::None => Self::Ascending,
            Self::Ascending => Self::Descending,
            Self::Descending => Self::None,
        }
    }

    /// Returns the direction as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }
}

/// Search text and sort direction of one list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive substring filter. Empty matches everything.
    pub search: String,
    /// Highlight sort direction.
    pub sort: SortDirection,
}

impl ListQuery {
    /// Returns `true` if `haystack` matches the search text.
    #[must_use]
    pub fn matches(&self, haystack: &str) -> bool {
        self.search.is_empty() || haystack.to_lowercase().contains(&self.search.to_lowercase())
    }
}

/// Per-list queries for all three lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    /// Groups list.
    pub groups: ListQuery,
    /// Users list.
    pub users: ListQuery,
    /// Reports list.
    pub reports: ListQuery,
}

impl ViewState {
    /// The query of one list.
    #[must_use]
    pub const fn query(&self, kind: EntityKind) -> &ListQuery {
        match kind {
            EntityKind::Group => &self.groups,
            EntityKind::User => &self.users,
            EntityKind::Report => &self.reports,
        }
    }

    /// Mutable query of one list.
    pub const fn query_mut(&mut self, kind: EntityKind) -> &mut ListQuery {
        match kind {
            EntityKind::Group => &mut self.groups,
            EntityKind::User => &mut self.users,
            EntityKind::Report => &mut self.reports,
        }
    }
}

/// Entities reachable from a focused user or report.
///
/// For a focused user, `report_ids` holds the reports reachable through its
/// groups and `user_ids` is empty; for a focused report it is the other way
/// around.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connections {
    /// Groups containing the focused item.
    pub group_ids: BTreeSet<GroupId>,
    /// Users reachable through those groups.
    pub user_ids: BTreeSet<UserId>,
    /// Reports reachable through those groups.
    pub report_ids: BTreeSet<ReportId>,
}

impl Connections {
    /// Returns `true` if nothing is connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.group_ids.is_empty() && self.user_ids.is_empty() && self.report_ids.is_empty()
    }
}

/// Highlight variant of a list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Not related to the current selection.
    #[default]
    Neutral,
    /// The active group itself.
    Active,
    /// Committed member (or connected item).
    Member,
    /// Pending but not yet committed.
    Added,
    /// Committed but unchecked in the pending set.
    Removed,
}

/// Small counter shown next to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "count", rename_all = "lowercase")]
pub enum Badge {
    /// Number of users in a group.
    Users(usize),
    /// Number of reports in a group.
    Reports(usize),
    /// Number of groups an item belongs to.
    Groups(usize),
}

/// One renderable row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    /// Entity id (the input's value).
    pub id: String,
    /// Display text.
    pub label: String,
    /// Secondary text (report descriptions).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_text: Option<String>,
    /// The item's input is disabled.
    pub disabled: bool,
    /// The item's input is checked.
    pub checked: bool,
    /// The item is a member of the highlighted set.
    pub highlighted: bool,
    /// The item is the radio-selected user or report.
    pub focused: bool,
    /// Highlight variant.
    pub variant: Variant,
    /// Counters.
    pub badges: Vec<Badge>,
}

/// One projected list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListView {
    /// Which list this is.
    pub kind: EntityKind,
    /// Visible items in display order.
    pub items: Vec<ListItem>,
    /// Number of items before filtering.
    pub total_count: usize,
    /// Every visible item is checked (and at least one is visible).
    pub all_visible_checked: bool,
    /// Sort direction applied.
    pub sort: SortDirection,
}

impl ListView {
    /// Number of visible items.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.items.len()
    }

    /// Ids of the visible items, in display order.
    pub fn visible_ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.id.as_str())
    }
}

/// The three projected lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    /// Groups list.
    pub groups: ListView,
    /// Users list.
    pub users: ListView,
    /// Reports list.
    pub reports: ListView,
}
