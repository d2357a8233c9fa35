//! # Flag Classification
//!
//! The single place where transport-vs-state policy lives.
//!
//! [`classify`] reduces a raw flag word to a [`ReachabilityStatus`] plus a
//! "connection required" verdict. It is total and pure, so every flag
//! combination can be enumerated in the tests below without touching a
//! platform. Monitors call nothing else to interpret flags.

use reachr_common::flags::RawFlags;
use reachr_common::status::ReachabilityStatus;

/// The outcome of classifying one flag word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub status: ReachabilityStatus,
    pub connection_required: bool,
}

impl Classification {
    /// What a monitor reports when no classification is possible: before the
    /// first query, and after a failed one. Kept here so that every status
    /// value a monitor can hold originates in this module.
    pub const UNKNOWN: Classification = Classification {
        status: ReachabilityStatus::Unknown,
        connection_required: false,
    };

    pub const NOT_REACHABLE: Classification = Classification {
        status: ReachabilityStatus::NotReachable,
        connection_required: false,
    };

    /// The `(status, connection_required)` pair monitors diff on.
    pub fn pair(self) -> (ReachabilityStatus, bool) {
        (self.status, self.connection_required)
    }
}

/// Classifies a raw flag word for a target.
///
/// `wwan_capable` says whether the evaluated target may legitimately sit
/// behind a cellular transport; local-segment targets never are, and platforms
/// without cellular hardware report it as `false` globally.
///
/// Rules, first match wins:
/// 1. Reachable bit absent → not reachable, no connection needed (there is
///    nothing to connect *to*).
/// 2. A set connection-required bit only counts when the connection is not
///    established automatically. On-traffic and on-demand connections are
///    transparent to the user unless intervention is required on top.
/// 3. WWAN bit on a WWAN-capable target → cellular.
/// 4. Anything else reachable → Wi-Fi. A reachable word always has a residual
///    transport, so `Unknown` never leaves this arm; it enters the state
///    machine only through [`Classification::UNKNOWN`] on failed queries.
pub fn classify(flags: RawFlags, wwan_capable: bool) -> Classification {
    if !flags.contains(RawFlags::REACHABLE) {
        return Classification::NOT_REACHABLE;
    }

    let automatic = flags
        .intersects(RawFlags::CONNECTION_ON_TRAFFIC | RawFlags::CONNECTION_ON_DEMAND)
        && !flags.contains(RawFlags::INTERVENTION_REQUIRED);

    let connection_required = flags.contains(RawFlags::CONNECTION_REQUIRED) && !automatic;

    let status = if wwan_capable && flags.contains(RawFlags::IS_WWAN) {
        ReachabilityStatus::ReachableViaWwan
    } else {
        ReachabilityStatus::ReachableViaWiFi
    };

    Classification {
        status,
        connection_required,
    }
}
