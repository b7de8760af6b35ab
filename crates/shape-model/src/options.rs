//! Configuration options for shape dispatch and term translation.

use serde::{Deserialize, Serialize};

/// Marker substituted for unmapped terms under [`UnmappedPolicy::Sentinel`].
pub const DEFAULT_SENTINEL: &str = "unknown";

/// What a multi-shape request does when one shape fails its contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnShapeError {
    /// The first failing shape aborts the whole call.
    #[default]
    Abort,
    /// Failing shapes are recorded as skipped; the rest are kept.
    SkipShape,
}

/// Options for building results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOptions {
    #[serde(default)]
    pub on_shape_error: OnShapeError,
}

impl DispatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Partial-success mode.
    pub fn skip_failing_shapes() -> Self {
        Self {
            on_shape_error: OnShapeError::SkipShape,
        }
    }
}

/// Handling of coded values that have no entry in the taxonomy section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedPolicy {
    /// Leave the value as it is.
    #[default]
    Keep,
    /// Fail with an unmapped-term error.
    Strict,
    /// Replace the value with a marker.
    Sentinel(String),
    /// Replace the value with null.
    Null,
}

impl UnmappedPolicy {
    /// Sentinel policy with the default `"unknown"` marker.
    pub fn sentinel() -> Self {
        Self::Sentinel(DEFAULT_SENTINEL.to_string())
    }
}

/// Options for term translation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateOptions {
    #[serde(default)]
    pub unmapped: UnmappedPolicy,
}

impl TranslateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self {
            unmapped: UnmappedPolicy::Strict,
        }
    }

    #[must_use]
    pub fn with_unmapped(mut self, policy: UnmappedPolicy) -> Self {
        self.unmapped = policy;
        self
    }
}
