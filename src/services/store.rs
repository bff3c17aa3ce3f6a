//! Settings store.
//!
//! Holds the mutable working copy of [`Settings`] next to the snapshot it was
//! last initialised from. A new snapshot (a new normalizer output) replaces
//! both and discards any edits; [`SettingsStore::reset`] reverts the working
//! copy to the snapshot.
//!
//! # Mutations
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | `save_group_membership` | Replaces one group's two sets (creates the group if missing) |
//! | `add_user` | Prepends a new user |
//! | `add_group` | Prepends a new, empty group |
//!
//! Reports are never inserted. A group may not take the name of the users
//! primary-key field, since the exported users rows carry one column per
//! group next to that field.

use crate::models::{EntityKind, Group, GroupId, ReportId, Settings, UserId};
use crate::{Error, Result};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Working copy of the settings plus the snapshot it derives from.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    initial: Arc<Settings>,
    current: Settings,
    reserved_group_id: Option<String>,
}

impl SettingsStore {
    /// Creates a store initialised from `initial`.
    #[must_use]
    pub fn new(initial: Arc<Settings>) -> Self {
        let current = (*initial).clone();
        Self {
            initial,
            current,
            reserved_group_id: None,
        }
    }

    /// Refuses `add_group` for `id`, normally the users primary-key field.
    #[must_use]
    pub fn with_reserved_group_id(mut self, id: impl Into<String>) -> Self {
        self.reserved_group_id = Some(id.into());
        self
    }

    /// The working copy.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.current
    }

    /// The snapshot the working copy started from.
    #[must_use]
    pub fn initial(&self) -> &Settings {
        &self.initial
    }

    /// Returns `true` if the working copy differs from the snapshot.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.current != *self.initial
    }

    /// Re-initialises the store from a new snapshot, discarding edits.
    ///
    /// Passing the snapshot the store already holds is a no-op; returns
    /// `true` if the store was re-initialised.
    pub fn snapshot(&mut self, initial: Arc<Settings>) -> bool {
        if Arc::ptr_eq(&self.initial, &initial) {
            return false;
        }
        self.initial = initial;
        self.reset();
        true
    }

    /// Reverts the working copy to the snapshot.
    pub fn reset(&mut self) {
        let version = self.current.version();
        self.current = (*self.initial).clone();
        // Structural versions never go backwards.
        self.current.advance_version_past(version);
        tracing::debug!(
            users = self.current.users().len(),
            groups = self.current.group_ids().len(),
            "Settings store reset to snapshot"
        );
    }

    /// Replaces exactly one group's membership.
    ///
    /// All other groups, the users and the reports are untouched. Unknown
    /// groups are created.
    pub fn save_group_membership(
        &mut self,
        group_id: &GroupId,
        user_ids: BTreeSet<UserId>,
        report_ids: BTreeSet<ReportId>,
    ) {
        tracing::info!(
            group_id = %group_id,
            users = user_ids.len(),
            reports = report_ids.len(),
            "Group membership saved"
        );
        self.current
            .replace_group(group_id, Group::with_members(user_ids, report_ids));
    }

    /// Checks whether `candidate` could be added as a user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyIdentifier`] or [`Error::DuplicateIdentifier`].
    pub fn check_new_user(&self, candidate: &str) -> Result<()> {
        check_candidate(EntityKind::User, candidate, |id| {
            self.current.find_user_ignore_case(id).is_some()
        })
    }

    /// Checks whether `candidate` could be added as a group.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyIdentifier`] or [`Error::DuplicateIdentifier`],
    /// and [`Error::InvalidInput`] for the reserved group id.
    pub fn check_new_group(&self, candidate: &str) -> Result<()> {
        check_candidate(EntityKind::Group, candidate, |id| {
            self.current.find_group_ignore_case(id).is_some()
        })?;
        if self.reserved_group_id.as_deref() == Some(candidate) {
            tracing::warn!(id = %candidate, "Rejected group named like the users primary key");
            return Err(Error::InvalidInput(format!(
                "group '{candidate}' would collide with the users primary-key column"
            )));
        }
        Ok(())
    }

    /// Adds a user at the front of the display order.
    ///
    /// # Errors
    ///
    /// Returns an error (and changes nothing) if the id is empty or already
    /// exists ignoring case.
    pub fn add_user(&mut self, candidate: &str) -> Result<UserId> {
        self.check_new_user(candidate)?;
        let id = UserId::new(candidate);
        self.current.prepend_user(id.clone());
        tracing::info!(user_id = %id, "User added");
        Ok(id)
    }

    /// Adds an empty group at the front of the display order.
    ///
    /// # Errors
    ///
    /// Returns an error (and changes nothing) if the id is empty, already
    /// exists ignoring case, or is the reserved group id.
    pub fn add_group(&mut self, candidate: &str) -> Result<GroupId> {
        self.check_new_group(candidate)?;
        let id = GroupId::new(candidate);
        self.current.prepend_group(id.clone());
        tracing::info!(group_id = %id, "Group added");
        Ok(id)
    }
}

fn check_candidate(kind: EntityKind, candidate: &str, exists: impl Fn(&str) -> bool) -> Result<()> {
    if candidate.trim().is_empty() {
        tracing::warn!(kind = %kind, "Rejected empty identifier");
        return Err(Error::EmptyIdentifier { kind });
    }
    if exists(candidate) {
        tracing::warn!(kind = %kind, id = %candidate, "Rejected duplicate identifier");
        return Err(Error::DuplicateIdentifier {
            kind,
            id: candidate.to_string(),
        });
    }
    Ok(())
}
