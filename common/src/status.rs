//! # Reachability Status
//!
//! The closed status enumeration every consumer of this workspace sees.

use std::fmt;

/// Where a monitored target currently stands.
///
/// `Unknown` is the value before the first flag query and the value after a
/// failed one. Once a query has classified successfully, the status only moves
/// between the three definite variants until another query fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReachabilityStatus {
    /// No classification has happened yet, or the last flag query failed.
    #[default]
    Unknown,
    /// No network path to the target exists.
    NotReachable,
    /// The target is reachable over a local wireless or wired transport.
    ReachableViaWiFi,
    /// The target is reachable over a wide-area cellular transport.
    ReachableViaWwan,
}

impl ReachabilityStatus {
    /// `true` for both reachable variants.
    pub const fn is_reachable(self) -> bool {
        matches!(
            self,
            ReachabilityStatus::ReachableViaWiFi | ReachabilityStatus::ReachableViaWwan
        )
    }
}

impl fmt::Display for ReachabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReachabilityStatus::Unknown => "unknown",
            ReachabilityStatus::NotReachable => "not reachable",
            ReachabilityStatus::ReachableViaWiFi => "reachable (wi-fi)",
            ReachabilityStatus::ReachableViaWwan => "reachable (wwan)",
        };
        write!(f, "{name}")
    }
}
