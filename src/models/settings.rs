//! The normalized relational model.
//!
//! [`Settings`] is the single source of truth for the editor. Every list the
//! renderer shows is derived from it plus transient selection state.
//!
//! Membership lives on the group side only: a [`Group`] owns the set of users
//! and the set of reports it grants access to. Per-user and per-report views
//! are computed by scanning groups.
//!
//! Display order is tracked next to the maps (source order for records that
//! came from the documents, newest-first for inserted users and groups).
//! Equality ignores that order and the version counter; two values are equal
//! when they describe the same relations.

use super::ids::{GroupId, ReportId, UserId, same_ignoring_case};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Descriptive fields of a report, kept verbatim from the source record.
///
/// Everything but the `groups` array is kept, including the primary-key field.
pub type ReportAttributes = Map<String, Value>;

/// Committed membership of one group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Users granted by this group.
    pub user_ids: BTreeSet<UserId>,
    /// Reports granted by this group.
    pub report_ids: BTreeSet<ReportId>,
}

impl Group {
    /// Creates a group with both member sets empty.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            user_ids: BTreeSet::new(),
            report_ids: BTreeSet::new(),
        }
    }

    /// Creates a group with the given members.
    #[must_use]
    pub const fn with_members(user_ids: BTreeSet<UserId>, report_ids: BTreeSet<ReportId>) -> Self {
        Self {
            user_ids,
            report_ids,
        }
    }

    /// Returns `true` if the user is a member.
    #[must_use]
    pub fn has_user(&self, id: &str) -> bool {
        self.user_ids.contains(id)
    }

    /// Returns `true` if the report is a member.
    #[must_use]
    pub fn has_report(&self, id: &str) -> bool {
        self.report_ids.contains(id)
    }

    /// Returns `true` if neither users nor reports are members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty() && self.report_ids.is_empty()
    }
}

/// Users, reports and groups with their relations.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    users: Vec<UserId>,
    user_index: HashSet<UserId>,
    reports: Vec<ReportId>,
    report_attributes: HashMap<ReportId, ReportAttributes>,
    group_order: Vec<GroupId>,
    groups: HashMap<GroupId, Group>,
    version: u64,
}

impl Settings {
    /// Creates empty settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Structural version, bumped by every mutation.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Moves the version strictly past `version`.
    pub(crate) fn advance_version_past(&mut self, version: u64) {
        self.version = self.version.max(version) + 1;
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// User ids in display order.
    #[must_use]
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    /// Returns `true` if the user exists (exact match).
    #[must_use]
    pub fn contains_user(&self, id: &str) -> bool {
        self.user_index.contains(id)
    }

    /// Finds an existing user whose id matches ignoring case.
    #[must_use]
    pub fn find_user_ignore_case(&self, id: &str) -> Option<&UserId> {
        self.users.iter().find(|u| same_ignoring_case(u.as_str(), id))
    }

    /// Appends a user if absent. Returns `true` if inserted.
    pub(crate) fn insert_user(&mut self, id: UserId) -> bool {
        if !self.user_index.insert(id.clone()) {
            return false;
        }
        self.users.push(id);
        self.version += 1;
        true
    }

    /// Prepends a user if absent. Returns `true` if inserted.
    pub(crate) fn prepend_user(&mut self, id: UserId) -> bool {
        if !self.user_index.insert(id.clone()) {
            return false;
        }
        self.users.insert(0, id);
        self.version += 1;
        true
    }

    /// Groups the user belongs to, in group display order.
    pub fn groups_of_user<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GroupId> + 'a {
        self.groups()
            .filter(move |(_, group)| group.has_user(id))
            .map(|(group_id, _)| group_id)
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Report ids in display order.
    #[must_use]
    pub fn report_ids(&self) -> &[ReportId] {
        &self.reports
    }

    /// Reports with their attributes, in display order.
    pub fn reports(&self) -> impl Iterator<Item = (&ReportId, &ReportAttributes)> {
        self.reports
            .iter()
            .filter_map(|id| self.report_attributes.get(id).map(|attrs| (id, attrs)))
    }

    /// Attributes of one report.
    #[must_use]
    pub fn report(&self, id: &str) -> Option<&ReportAttributes> {
        self.report_attributes.get(id)
    }

    /// Returns `true` if the report exists.
    #[must_use]
    pub fn contains_report(&self, id: &str) -> bool {
        self.report_attributes.contains_key(id)
    }

    /// Stores a report. A repeated id replaces the attributes in place.
    pub(crate) fn insert_report(&mut self, id: ReportId, attributes: ReportAttributes) {
        if !self.report_attributes.contains_key(id.as_str()) {
            self.reports.push(id.clone());
        }
        self.report_attributes.insert(id, attributes);
        self.version += 1;
    }

    /// Groups the report belongs to, in group display order.
    pub fn groups_of_report<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GroupId> + 'a {
        self.groups()
            .filter(move |(_, group)| group.has_report(id))
            .map(|(group_id, _)| group_id)
    }

    // =========================================================================
    // Groups
    // =========================================================================

    /// Group ids in display order.
    #[must_use]
    pub fn group_ids(&self) -> &[GroupId] {
        &self.group_order
    }

    /// Groups in display order.
    pub fn groups(&self) -> impl Iterator<Item = (&GroupId, &Group)> {
        self.group_order
            .iter()
            .filter_map(|id| self.groups.get(id).map(|group| (id, group)))
    }

    /// One group's committed membership.
    #[must_use]
    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.get(id)
    }

    /// Returns `true` if the group exists.
    #[must_use]
    pub fn contains_group(&self, id: &str) -> bool {
        self.groups.contains_key(id)
    }

    /// Finds an existing group whose id matches ignoring case.
    #[must_use]
    pub fn find_group_ignore_case(&self, id: &str) -> Option<&GroupId> {
        self.group_order
            .iter()
            .find(|g| same_ignoring_case(g.as_str(), id))
    }

    /// Returns the group, creating it empty on first reference.
    pub(crate) fn ensure_group(&mut self, id: &str) -> &mut Group {
        if !self.groups.contains_key(id) {
            self.group_order.push(GroupId::new(id));
        }
        self.version += 1;
        self.groups.entry(GroupId::new(id)).or_default()
    }

    /// Prepends an empty group if absent. Returns `true` if inserted.
    pub(crate) fn prepend_group(&mut self, id: GroupId) -> bool {
        if self.groups.contains_key(id.as_str()) {
            return false;
        }
        self.group_order.insert(0, id.clone());
        self.groups.insert(id, Group::new());
        self.version += 1;
        true
    }

    /// Replaces one group's membership, creating the group if needed.
    pub(crate) fn replace_group(&mut self, id: &GroupId, group: Group) {
        *self.ensure_group(id.as_str()) = group;
    }
}

impl PartialEq for Settings {
    fn eq(&self, other: &Self) -> bool {
        self.user_index == other.user_index
            && self.report_attributes == other.report_attributes
            && self.groups == other.groups
    }
}

impl Eq for Settings {}
