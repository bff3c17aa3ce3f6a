//! Connection highlighting.
//!
//! Focusing a user yields the groups that contain it and every report those
//! groups grant; focusing a report yields its groups and every user in them.
//! The closure is a pure function of the settings and is recomputed on each
//! focus change, memoized on `(focus, settings version)`.

use crate::models::{Connections, Focus, Settings};

/// Computes the entities connected to `focus`.
///
/// A focused group has no connections (the active group is highlighted by
/// membership instead), and an unknown user or report yields an empty result.
#[must_use]
pub fn connections_of(settings: &Settings, focus: &Focus) -> Connections {
    let mut connections = Connections::default();

    match focus {
        Focus::Group(_) => {},
        Focus::User(user_id) => {
            for (group_id, group) in settings.groups() {
                if group.has_user(user_id.as_str()) {
                    connections.group_ids.insert(group_id.clone());
                    connections.report_ids.extend(group.report_ids.iter().cloned());
                }
            }
        },
        Focus::Report(report_id) => {
            for (group_id, group) in settings.groups() {
                if group.has_report(report_id.as_str()) {
                    connections.group_ids.insert(group_id.clone());
                    connections.user_ids.extend(group.user_ids.iter().cloned());
                }
            }
        },
    }

    tracing::debug!(
        focus = focus.id(),
        kind = %focus.kind(),
        groups = connections.group_ids.len(),
        users = connections.user_ids.len(),
        reports = connections.report_ids.len(),
        "Connections computed"
    );

    connections
}

/// Single-entry memo of the last computed closure.
#[derive(Debug, Clone, Default)]
pub struct ConnectionCache {
    entry: Option<(Focus, u64, Connections)>,
}

impl ConnectionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the closure for `focus`, recomputing only when the focus or
    /// the settings version changed.
    pub fn get(&mut self, settings: &Settings, focus: &Focus) -> &Connections {
        let fresh = self
            .entry
            .as_ref()
            .is_some_and(|(cached, version, _)| cached == focus && *version == settings.version());
        if !fresh {
            self.entry = None;
        }
        &self
            .entry
            .get_or_insert_with(|| {
                (
                    focus.clone(),
                    settings.version(),
                    connections_of(settings, focus),
                )
            })
            .2
    }

    /// Drops the cached closure.
    pub fn clear(&mut self) {
        self.entry = None;
    }
}
