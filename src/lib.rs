//! # Access Settings
//!
//! Relational state core for an access-settings editor.
//!
//! Two flat JSON documents (users with one flag per group, reports with a
//! `groups` array) are reconciled into a graph of Users, Groups and Reports.
//! The crate keeps that graph editable through a small selection/edit state
//! machine, derives the three display lists a renderer consumes, and turns
//! the graph back into the original document shapes for download.
//!
//! ## Features
//!
//! - Normalization of raw user and report records into [`Settings`]
//! - Snapshot/reset store with group membership saves and user/group insertion
//! - Viewing/Editing state machine with pending membership sets
//! - Connection highlighting (transitive closure from a focused user or report)
//! - Filtered, annotated, highlight-sorted list projections
//! - Lossless export back to `users.json` / `reports.json`
//!
//! ## Example
//!
//! ```rust,ignore
//! use access_settings::{AccessEditor, Action, PrimaryKeys, SourceState};
//!
//! let mut editor = AccessEditor::new(PrimaryKeys::default());
//! editor.load(SourceState::ready(users_json), SourceState::ready(reports_json));
//!
//! editor.dispatch(Action::SelectGroup { id: "G1".into() })?;
//! editor.dispatch(Action::BeginEdit)?;
//! editor.dispatch(Action::ToggleUser { id: "a@x.com".into() })?;
//! editor.dispatch(Action::Save)?;
//!
//! let bundle = editor.export();
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod cli;
pub mod config;
pub mod models;
pub mod observability;
pub mod services;

pub use config::{AccessConfig, DataPaths, PrimaryKeys};
pub use models::{
    EditMode, EntityKind, Focus, Group, GroupId, ListView, Member, Projection, ReportId,
    SelectionState, Settings, SortDirection, UserId, ViewState,
};
pub use services::{
    AccessEditor, Action, Affordances, ExportBundle, Normalizer, RawSources, SelectionMachine,
    SettingsStore, SourceState,
};

/// Error type for access-settings operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidStateTransition` | Edit operations outside `Editing`, edit with no (or a missing) active group |
/// | `DuplicateIdentifier` | `add_user`/`add_group` with an id that collides case-insensitively |
/// | `EmptyIdentifier` | `add_user`/`add_group` with an empty (or whitespace-only) id |
/// | `InvalidInput` | Malformed action scripts, bad config values, unknown toggled or focused ids, a group named like the users key |
/// | `OperationFailed` | File I/O, JSON or TOML (de)serialization failures in the host layer |
///
/// Unavailable source data never produces an error value: it degrades
/// to empty collections and is only logged.
#[derive(Debug, ThisError)]
pub enum Error {
    /// An edit operation was invoked outside its legal state.
    ///
    /// Raised when:
    /// - `begin_edit` is called with no active group
    /// - `begin_edit` is called while the active group no longer exists
    /// - `toggle_member`, `toggle_all`, `cancel` or `save` run while `Viewing`
    /// - a user or report is focused while `Editing`
    #[error("invalid state transition '{operation}': {reason}")]
    InvalidStateTransition {
        /// The operation that was refused.
        operation: &'static str,
        /// Why it was refused.
        reason: String,
    },

    /// An inserted identifier collides with an existing one.
    ///
    /// Comparison ignores case, so `A@x.com` collides with `a@x.com`.
    #[error("duplicate {kind} identifier: {id}")]
    DuplicateIdentifier {
        /// Which collection was being inserted into.
        kind: models::EntityKind,
        /// The rejected candidate.
        id: String,
    },

    /// An inserted identifier is empty.
    #[error("empty {kind} identifier")]
    EmptyIdentifier {
        /// Which collection was being inserted into.
        kind: models::EntityKind,
    },

    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - An action script is not a JSON array of known actions
    /// - A configuration value cannot be interpreted
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Source or configuration files cannot be read
    /// - Export files cannot be written
    /// - Logging cannot be initialised
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Returns `true` for the identifier rejections raised by insertions.
    #[must_use]
    pub const fn is_identifier_rejection(&self) -> bool {
        matches!(
            self,
            Self::DuplicateIdentifier { .. } | Self::EmptyIdentifier { .. }
        )
    }

    pub(crate) fn invalid_transition(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidStateTransition {
            operation,
            reason: reason.into(),
        }
    }
}

/// Result type alias for access-settings operations.
pub type Result<T> = std::result::Result<T, Error>;
