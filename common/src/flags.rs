//! # Raw Connectivity Flags
//!
//! The flag word a platform backend reports for a target.
//!
//! The word is opaque to everything except the classifier: monitors hand it
//! straight to classification and never store it. The bit layout mirrors the
//! classic system-configuration reachability flags so that platform backends
//! can pass their native word through unchanged.

use std::fmt;

/// A raw connectivity flag word for a single target.
///
/// Value type, copied freely. Constructed by a flag source, consumed by the
/// classifier, discarded afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawFlags(u32);

impl RawFlags {
    /// No connectivity information at all.
    pub const EMPTY: RawFlags = RawFlags(0);

    /// The connection to the target is transient (e.g. PPP).
    pub const TRANSIENT_CONNECTION: RawFlags = RawFlags(1 << 0);
    /// A network path to the target currently exists.
    pub const REACHABLE: RawFlags = RawFlags(1 << 1);
    /// Traffic can only flow after a connection is established first.
    pub const CONNECTION_REQUIRED: RawFlags = RawFlags(1 << 2);
    /// The required connection is established automatically on first traffic.
    pub const CONNECTION_ON_TRAFFIC: RawFlags = RawFlags(1 << 3);
    /// Establishing the connection needs user interaction (credentials, dialog).
    pub const INTERVENTION_REQUIRED: RawFlags = RawFlags(1 << 4);
    /// The required connection is established on demand by the system.
    pub const CONNECTION_ON_DEMAND: RawFlags = RawFlags(1 << 5);
    /// The target address belongs to this device.
    pub const IS_LOCAL_ADDRESS: RawFlags = RawFlags(1 << 16);
    /// The target is on a directly attached segment, no router hop needed.
    pub const IS_DIRECT: RawFlags = RawFlags(1 << 17);
    /// The path to the target goes over a wide-area cellular transport.
    pub const IS_WWAN: RawFlags = RawFlags(1 << 18);

    /// Builds a flag word from a raw platform value.
    pub const fn from_bits(bits: u32) -> Self {
        RawFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    pub const fn contains(self, other: RawFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if at least one bit of `other` is set in `self`.
    pub const fn intersects(self, other: RawFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: RawFlags) -> RawFlags {
        RawFlags(self.0 | other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for RawFlags {
    type Output = RawFlags;

    fn bitor(self, rhs: RawFlags) -> RawFlags {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for RawFlags {
    fn bitor_assign(&mut self, rhs: RawFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for RawFlags {
    /// Compact single-line rendering, e.g. `R-d` for reachable + on-demand.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let legend = [
            (RawFlags::TRANSIENT_CONNECTION, 't'),
            (RawFlags::REACHABLE, 'R'),
            (RawFlags::CONNECTION_REQUIRED, 'c'),
            (RawFlags::CONNECTION_ON_TRAFFIC, 'C'),
            (RawFlags::INTERVENTION_REQUIRED, 'i'),
            (RawFlags::CONNECTION_ON_DEMAND, 'D'),
            (RawFlags::IS_LOCAL_ADDRESS, 'l'),
            (RawFlags::IS_DIRECT, 'd'),
            (RawFlags::IS_WWAN, 'W'),
        ];

        for (bit, symbol) in legend {
            if self.contains(bit) {
                write!(f, "{symbol}")?;
            } else {
                write!(f, "-")?;
            }
        }
        Ok(())
    }
}
