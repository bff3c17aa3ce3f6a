//! Data models for access settings.
//!
//! This module contains the relational model, the selection state and the
//! display-side types derived from them.

mod ids;
mod selection;
mod settings;
mod view;

pub use ids::{EntityKind, GroupId, ReportId, UserId, same_ignoring_case};
pub use selection::{EditMode, Focus, Member, SelectionState};
pub use settings::{Group, ReportAttributes, Settings};
pub use view::{
    Badge, Connections, ListItem, ListQuery, ListView, Projection, SortDirection, Variant,
    ViewState,
};
