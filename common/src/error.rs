//! # Error Taxonomy
//!
//! Three failure classes, matching how far a monitor gets before the failure:
//!
//! * [`ConstructionError`]: the monitor never comes to life. Synchronous,
//!   fatal for that instance.
//! * [`QueryError`]: a single flag query failed. Recovered locally by
//!   reporting `Unknown`; never retried, never propagated.
//! * [`SubscribeError`]: the event source refused the attach. The monitor
//!   stays usable for synchronous polling.

use thiserror::Error;

/// Creating a monitor failed before any state existed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("host name must not be empty")]
    EmptyHostName,

    #[error("target handle could not be created")]
    Resolve(#[from] ResolveError),
}

/// A flag source could not produce a handle for a target.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("target '{target}' is not supported by this flag source")]
    Unsupported { target: String },

    #[error("platform rejected the target: {reason}")]
    Rejected { reason: String },
}

/// A single flag query against the platform failed.
///
/// Transient by definition: the caller reports `Unknown` and moves on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("flag query failed: {reason}")]
pub struct QueryError {
    pub reason: String,
}

impl QueryError {
    pub fn new(reason: impl Into<String>) -> Self {
        QueryError {
            reason: reason.into(),
        }
    }
}

/// Attaching to the platform's flags-changed event stream failed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("could not subscribe to flag changes: {reason}")]
pub struct SubscribeError {
    pub reason: String,
}

impl SubscribeError {
    pub fn new(reason: impl Into<String>) -> Self {
        SubscribeError {
            reason: reason.into(),
        }
    }
}

/// CLI target input could not be understood.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetParseError {
    #[error("target must not be empty")]
    Empty,

    #[error("'{input}' looks like an address but does not parse as one")]
    MalformedAddress { input: String },
}
