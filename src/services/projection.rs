//! View projection.
//!
//! Derives the three display lists from the settings, the selection state,
//! the connection closure (when a user or report is focused) and the per-list
//! search/sort queries. Nothing here mutates state.
//!
//! Each list goes through the same steps:
//!
//! 1. **Filter** by case-insensitive substring of the id (and report title).
//! 2. **Annotate** with checked/highlighted/focused flags, a variant and badges.
//! 3. **Disable** membership inputs when no group is active, and other groups
//!    while editing.
//! 4. **Sort** highlighted items first or last (stable), or keep natural order.

use crate::models::{
    Badge, Connections, EntityKind, Focus, Group, ListItem, ListQuery, ListView, Projection,
    ReportAttributes, SelectionState, Settings, SortDirection, Variant, ViewState,
};
use serde_json::Value;
use std::collections::BTreeSet;

/// Report attribute used as the display label.
pub const REPORT_TITLE_FIELD: &str = "title";
/// Report attribute used as support text.
pub const REPORT_DESCRIPTION_FIELD: &str = "description";

/// Projects all three lists.
///
/// `connections` is the closure for the selection's connection focus, if any;
/// it is ignored when the selection has no user or report focused.
#[must_use]
pub fn project(
    settings: &Settings,
    selection: &SelectionState,
    connections: Option<&Connections>,
    view: &ViewState,
) -> Projection {
    let connections = connections.filter(|_| selection.connection_focus().is_some());
    let context = Context::new(settings, selection, connections);

    let projection = Projection {
        groups: context.groups(&view.groups),
        users: context.users(&view.users),
        reports: context.reports(&view.reports),
    };

    tracing::debug!(
        groups = projection.groups.visible_count(),
        users = projection.users.visible_count(),
        reports = projection.reports.visible_count(),
        mode = selection.mode().as_str(),
        "Projection derived"
    );

    projection
}

/// Label of a report: its `title` when that is a string, else its id.
#[must_use]
pub fn report_label(id: &str, attributes: &ReportAttributes) -> String {
    string_attribute(attributes, REPORT_TITLE_FIELD).map_or_else(|| id.to_string(), str::to_string)
}

fn string_attribute<'a>(attributes: &'a ReportAttributes, field: &str) -> Option<&'a str> {
    attributes.get(field).and_then(Value::as_str)
}

/// Shared inputs of the three list derivations.
struct Context<'a> {
    settings: &'a Settings,
    selection: &'a SelectionState,
    committed: Option<&'a Group>,
    connections: Option<&'a Connections>,
}

impl<'a> Context<'a> {
    fn new(
        settings: &'a Settings,
        selection: &'a SelectionState,
        connections: Option<&'a Connections>,
    ) -> Self {
        let committed = selection
            .active_group_id()
            .and_then(|id| settings.group(id.as_str()));
        Self {
            settings,
            selection,
            committed,
            connections,
        }
    }

    fn groups(&self, query: &ListQuery) -> ListView {
        let active = self.selection.active_group_id();
        let editing = self.selection.is_editing();

        let items = self
            .settings
            .groups()
            .filter(|(id, _)| query.matches(id.as_str()))
            .map(|(id, group)| {
                let is_active = active == Some(id);
                let highlighted = self
                    .connections
                    .map_or(is_active, |c| c.group_ids.contains(id));
                let variant = if is_active {
                    Variant::Active
                } else if highlighted {
                    Variant::Member
                } else {
                    Variant::Neutral
                };
                ListItem {
                    id: id.to_string(),
                    label: id.to_string(),
                    support_text: None,
                    disabled: editing && !is_active,
                    checked: is_active,
                    highlighted,
                    focused: false,
                    variant,
                    badges: vec![
                        Badge::Users(group.user_ids.len()),
                        Badge::Reports(group.report_ids.len()),
                    ],
                }
            })
            .collect();

        finish(EntityKind::Group, items, self.settings.group_ids().len(), query.sort)
    }

    fn users(&self, query: &ListQuery) -> ListView {
        let committed = self.committed.map(|g| &g.user_ids);
        let closure = self.connections.map(|c| &c.user_ids);
        let focused = match self.selection.connection_focus() {
            Some(Focus::User(id)) => Some(id.as_str()),
            _ => None,
        };

        let items = self
            .settings
            .users()
            .iter()
            .filter(|id| query.matches(id.as_str()))
            .map(|id| {
                let flags = self.membership(
                    id.as_str(),
                    committed,
                    self.selection.pending_user_ids(),
                    closure,
                );
                ListItem {
                    id: id.to_string(),
                    label: id.to_string(),
                    support_text: None,
                    disabled: self.no_active_group(),
                    checked: flags.checked,
                    highlighted: flags.highlighted,
                    focused: focused == Some(id.as_str()),
                    variant: flags.variant,
                    badges: vec![Badge::Groups(self.settings.groups_of_user(id.as_str()).count())],
                }
            })
            .collect();

        finish(EntityKind::User, items, self.settings.users().len(), query.sort)
    }

    fn reports(&self, query: &ListQuery) -> ListView {
        let committed = self.committed.map(|g| &g.report_ids);
        let closure = self.connections.map(|c| &c.report_ids);
        let focused = match self.selection.connection_focus() {
            Some(Focus::Report(id)) => Some(id.as_str()),
            _ => None,
        };

        let items = self
            .settings
            .reports()
            .filter(|(id, attributes)| {
                query.matches(id.as_str())
                    || string_attribute(attributes, REPORT_TITLE_FIELD)
                        .is_some_and(|title| query.matches(title))
            })
            .map(|(id, attributes)| {
                let flags = self.membership(
                    id.as_str(),
                    committed,
                    self.selection.pending_report_ids(),
                    closure,
                );
                ListItem {
                    id: id.to_string(),
                    label: report_label(id.as_str(), attributes),
                    support_text: string_attribute(attributes, REPORT_DESCRIPTION_FIELD)
                        .map(str::to_string),
                    disabled: self.no_active_group(),
                    checked: flags.checked,
                    highlighted: flags.highlighted,
                    focused: focused == Some(id.as_str()),
                    variant: flags.variant,
                    badges: vec![Badge::Groups(
                        self.settings.groups_of_report(id.as_str()).count(),
                    )],
                }
            })
            .collect();

        finish(
            EntityKind::Report,
            items,
            self.settings.report_ids().len(),
            query.sort,
        )
    }

    /// Membership inputs are disabled unless a group is active.
    fn no_active_group(&self) -> bool {
        self.selection.active_group_id().is_none()
    }

    fn membership<T>(
        &self,
        id: &str,
        committed: Option<&BTreeSet<T>>,
        pending: &BTreeSet<T>,
        closure: Option<&BTreeSet<T>>,
    ) -> Flags
    where
        T: Ord + std::borrow::Borrow<str>,
    {
        let is_committed = committed.is_some_and(|set| set.contains(id));

        if self.selection.is_editing() {
            let is_pending = pending.contains(id);
            let variant = match (is_committed, is_pending) {
                (true, true) => Variant::Member,
                (false, true) => Variant::Added,
                (true, false) => Variant::Removed,
                (false, false) => Variant::Neutral,
            };
            return Flags {
                checked: is_pending,
                highlighted: is_pending,
                variant,
            };
        }

        let highlighted = closure.map_or(is_committed, |set| set.contains(id));
        Flags {
            checked: is_committed,
            highlighted,
            variant: if highlighted {
                Variant::Member
            } else {
                Variant::Neutral
            },
        }
    }
}

struct Flags {
    checked: bool,
    highlighted: bool,
    variant: Variant,
}

fn finish(
    kind: EntityKind,
    mut items: Vec<ListItem>,
    total_count: usize,
    sort: SortDirection,
) -> ListView {
    sort_by_highlight(&mut items, sort);
    let all_visible_checked = !items.is_empty() && items.iter().all(|item| item.checked);
    ListView {
        kind,
        items,
        total_count,
        all_visible_checked,
        sort,
    }
}

/// Stable sort on highlight membership only.
pub fn sort_by_highlight(items: &mut [ListItem], sort: SortDirection) {
    match sort {
        SortDirection::None => {},
        SortDirection::Ascending => items.sort_by_key(|item| !item.highlighted),
        SortDirection::Descending => items.sort_by_key(|item| item.highlighted),
    }
}
