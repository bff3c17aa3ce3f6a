//! Normalization of raw user and report records.
//!
//! # Input shapes
//!
//! | Document | Record shape |
//! |----------|--------------|
//! | Users | `{ <users key>: id, <group>: truthy/falsy, ... }` |
//! | Reports | `{ <reports key>: id, groups?: [group, ...], <attr>: any, ... }` |
//!
//! Every non-key user field names a group. Truthy values grant membership;
//! falsy values only make sure the group exists. Report records keep every
//! field except `groups` as attributes.
//!
//! Groups are created lazily on first reference from either document, always
//! with both member sets empty, so the result does not depend on which side
//! mentions a group first.

use super::sources::{RawSources, SourceState};
use crate::config::PrimaryKeys;
use crate::models::{GroupId, ReportAttributes, ReportId, Settings, UserId};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

/// Field of a report record listing its groups.
pub const REPORT_GROUPS_FIELD: &str = "groups";

/// Converts raw documents into [`Settings`].
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    keys: PrimaryKeys,
}

impl Normalizer {
    /// Creates a normalizer for the given primary-key fields.
    #[must_use]
    pub const fn new(keys: PrimaryKeys) -> Self {
        Self { keys }
    }

    /// The primary-key fields.
    #[must_use]
    pub const fn keys(&self) -> &PrimaryKeys {
        &self.keys
    }

    /// Normalizes whatever the two sources currently hold.
    ///
    /// Pending or failed sources, and sources that did not resolve to an
    /// array, contribute nothing.
    #[must_use]
    pub fn normalize_sources(&self, sources: &RawSources) -> Settings {
        for (name, state) in [("users", &sources.users), ("reports", &sources.reports)] {
            match state {
                SourceState::Ready(value) if value.is_array() => {},
                SourceState::Failed(reason) => {
                    tracing::warn!(source = name, reason = %reason, "Source unavailable, using empty list");
                },
                other => {
                    tracing::debug!(source = name, state = other.label(), "Source has no records");
                },
            }
        }
        self.normalize(sources.users.records(), sources.reports.records())
    }

    /// Normalizes user and report records.
    #[must_use]
    #[instrument(skip_all, fields(users = users.len(), reports = reports.len()))]
    pub fn normalize(&self, users: &[Value], reports: &[Value]) -> Settings {
        let mut settings = Settings::new();

        for record in users {
            self.add_user_record(&mut settings, record);
        }
        for record in reports {
            self.add_report_record(&mut settings, record);
        }

        tracing::debug!(
            users = settings.users().len(),
            reports = settings.report_ids().len(),
            groups = settings.group_ids().len(),
            "Settings normalized"
        );

        settings
    }

    fn add_user_record(&self, settings: &mut Settings, record: &Value) {
        let Some(fields) = record.as_object() else {
            tracing::warn!(record = %record, "Skipping user record that is not an object");
            return;
        };
        let Some(user_id) = fields.get(&self.keys.users).and_then(identifier) else {
            tracing::warn!(key = %self.keys.users, "Skipping user record without a usable key");
            return;
        };
        let user_id = UserId::new(user_id);
        settings.insert_user(user_id.clone());

        for (group_id, access) in fields {
            if group_id == &self.keys.users {
                continue;
            }
            let group = settings.ensure_group(group_id);
            if is_truthy(access) {
                group.user_ids.insert(user_id.clone());
            }
        }
    }

    fn add_report_record(&self, settings: &mut Settings, record: &Value) {
        let Some(fields) = record.as_object() else {
            tracing::warn!(record = %record, "Skipping report record that is not an object");
            return;
        };

        let mut attributes: ReportAttributes = fields.clone();
        let groups = attributes.remove(REPORT_GROUPS_FIELD);

        let Some(report_id) = attributes.get(&self.keys.reports).and_then(identifier) else {
            tracing::warn!(key = %self.keys.reports, "Skipping report record without a usable key");
            return;
        };
        let report_id = ReportId::new(report_id);

        for group_id in group_names(groups.as_ref(), &report_id) {
            if group_id.as_str() == self.keys.users {
                tracing::warn!(
                    report = %report_id,
                    group = %group_id,
                    "Skipping group named like the users primary key"
                );
                continue;
            }
            settings
                .ensure_group(group_id.as_str())
                .report_ids
                .insert(report_id.clone());
        }
        settings.insert_report(report_id, attributes);
    }
}

/// Group names listed by a report. A missing or `null` list is empty.
fn group_names(groups: Option<&Value>, report_id: &ReportId) -> Vec<GroupId> {
    match groups {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|entry| {
                let name = identifier(entry);
                if name.is_none() {
                    tracing::warn!(report = %report_id, entry = %entry, "Skipping non-string group name");
                }
                name.map(GroupId::new)
            })
            .collect(),
        Some(other) => {
            tracing::warn!(report = %report_id, groups = %other, "Ignoring groups field that is not an array");
            Vec::new()
        },
    }
}

/// Reads an identifier: strings as-is, numbers in their JSON spelling.
fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Truthiness of a per-user group flag.
///
/// `null`, `false`, `0` and `""` are falsy; everything else is truthy.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Normalized settings memoized on the identity of both raw inputs.
///
/// Normalization reruns only when the host hands over a different loaded
/// value for either source.
#[derive(Debug, Default)]
pub struct MemoizedSettings {
    sources: Option<RawSources>,
    settings: Arc<Settings>,
}

impl MemoizedSettings {
    /// Creates an empty memo.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last derived settings.
    #[must_use]
    pub fn current(&self) -> Arc<Settings> {
        Arc::clone(&self.settings)
    }

    /// Returns settings for `sources`, renormalizing only if either input
    /// changed identity. The flag is `true` when a new value was derived.
    pub fn derive(&mut self, normalizer: &Normalizer, sources: RawSources) -> (Arc<Settings>, bool) {
        if let Some(previous) = &self.sources
            && previous.same_identity(&sources)
        {
            return (self.current(), false);
        }

        self.settings = Arc::new(normalizer.normalize_sources(&sources));
        self.sources = Some(sources);
        (self.current(), true)
    }
}
