//! Data-loading boundary.
//!
//! The host application owns fetching. It reports each source's outcome as a
//! [`SourceState`]; the core never initiates a load. A source that is still
//! pending, failed, or resolved to something other than an array contributes
//! an empty collection.

use serde_json::Value;
use std::sync::Arc;

/// Outcome of loading one raw JSON document.
#[derive(Debug, Clone, Default)]
pub enum SourceState {
    /// Not yet settled.
    #[default]
    Pending,
    /// Resolved to a JSON value (which may or may not be an array).
    Ready(Arc<Value>),
    /// Failed to load; treated as "no data".
    Failed(String),
}

impl SourceState {
    /// Wraps a resolved value.
    #[must_use]
    pub fn ready(value: Value) -> Self {
        Self::Ready(Arc::new(value))
    }

    /// Wraps a load failure.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }

    /// Converts a fallible load into a state.
    pub fn from_result<E: std::fmt::Display>(result: Result<Value, E>) -> Self {
        match result {
            Ok(value) => Self::ready(value),
            Err(e) => Self::failed(e.to_string()),
        }
    }

    /// Returns `true` once the source is ready or failed.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// The records of this source: the array elements, or nothing.
    #[must_use]
    pub fn records(&self) -> &[Value] {
        match self {
            Self::Ready(value) => match value.as_array() {
                Some(records) => records.as_slice(),
                None => &[],
            },
            Self::Pending | Self::Failed(_) => &[],
        }
    }

    /// Returns `true` if both states refer to the same loaded value.
    ///
    /// Identity, not structural equality: a reload producing an equal document
    /// is still a new input.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Ready(a), Self::Ready(b)) => Arc::ptr_eq(a, b),
            (Self::Pending, Self::Pending) => true,
            (Self::Failed(a), Self::Failed(b)) => a == b,
            _ => false,
        }
    }

    /// Short label for logging.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ready(value) if value.is_array() => "ready",
            Self::Ready(_) => "not_an_array",
            Self::Failed(_) => "failed",
        }
    }
}

/// The two raw documents.
#[derive(Debug, Clone, Default)]
pub struct RawSources {
    /// Users document.
    pub users: SourceState,
    /// Reports document.
    pub reports: SourceState,
}

impl RawSources {
    /// Creates sources from two states.
    #[must_use]
    pub const fn new(users: SourceState, reports: SourceState) -> Self {
        Self { users, reports }
    }

    /// Returns `true` once both sources have settled.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.users.is_settled() && self.reports.is_settled()
    }

    /// Returns `true` if both sides refer to the same loaded values.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        self.users.same_identity(&other.users) && self.reports.same_identity(&other.reports)
    }
}
