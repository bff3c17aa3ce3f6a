//! State services.
//!
//! Services turn raw sources into [`Settings`](crate::models::Settings), keep
//! the working copy and the selection consistent, and derive what a renderer
//! or exporter needs.

mod connections;
mod editor;
mod export;
mod normalizer;
mod projection;
mod selection;
mod sources;
mod store;

pub use connections::{ConnectionCache, connections_of};
pub use editor::{AccessEditor, Action, Affordances};
pub use export::{ExportBundle, REPORTS_FILE_NAME, USERS_FILE_NAME, to_original_shape};
pub use normalizer::{MemoizedSettings, Normalizer, REPORT_GROUPS_FIELD, is_truthy};
pub use projection::{
    REPORT_DESCRIPTION_FIELD, REPORT_TITLE_FIELD, project, report_label, sort_by_highlight,
};
pub use selection::SelectionMachine;
pub use sources::{RawSources, SourceState};
pub use store::SettingsStore;
