//! # Monitor Target Model
//!
//! Defines what a reachability monitor can watch.
//!
//! A target is one of:
//! * A named host (resolution is the platform's business, not ours).
//! * A raw IPv4 endpoint.
//! * The default route ("is there any outbound path at all").
//! * The local wireless segment (no router hop involved).
//!
//! This module also handles parsing targets from CLI input.

use std::net::{Ipv4Addr, SocketAddrV4};
use std::str::FromStr;

use crate::error::{ConstructionError, TargetParseError};

/// Sentinel endpoint for the default-route target: `0.0.0.0`, any interface.
pub const ANY_ROUTE_ADDR: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0);

/// Sentinel endpoint for the local-Wi-Fi target: the IPv4 link-local net,
/// `169.254.0.0`.
pub const LINK_LOCAL_ADDR: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::new(169, 254, 0, 0), 0);

/// A distinct thing a monitor watches. Immutable once a monitor owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A host known by name.
    Host { name: String },
    /// A host known by raw IPv4 endpoint. Copied in at construction so the
    /// monitor's target cannot be mutated out-of-band afterwards.
    Address { endpoint: SocketAddrV4 },
    /// Any outbound route at all ("the internet").
    DefaultRoute,
    /// The local wireless segment only, no routing required.
    LocalWiFi,
}

impl Target {
    /// A named-host target. Fails on an empty (or all-whitespace) name.
    pub fn host(name: impl Into<String>) -> Result<Self, ConstructionError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConstructionError::EmptyHostName);
        }
        Ok(Target::Host { name })
    }

    /// A raw IPv4 endpoint target.
    pub fn address(endpoint: SocketAddrV4) -> Self {
        Target::Address { endpoint }
    }

    /// The default-route ("internet connection") target.
    pub fn default_route() -> Self {
        Target::DefaultRoute
    }

    /// The local-Wi-Fi segment target.
    pub fn local_wifi() -> Self {
        Target::LocalWiFi
    }

    /// The sentinel endpoint a target normalizes to, if it has one.
    ///
    /// Named hosts have no endpoint until the platform resolves them.
    pub fn endpoint(&self) -> Option<SocketAddrV4> {
        match self {
            Target::Host { .. } => None,
            Target::Address { endpoint } => Some(*endpoint),
            Target::DefaultRoute => Some(ANY_ROUTE_ADDR),
            Target::LocalWiFi => Some(LINK_LOCAL_ADDR),
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Host { name } => write!(f, "{name}"),
            Target::Address { endpoint } => write!(f, "{endpoint}"),
            Target::DefaultRoute => write!(f, "internet"),
            Target::LocalWiFi => write!(f, "local-wifi"),
        }
    }
}

impl FromStr for Target {
    type Err = TargetParseError;

    /// Parses CLI input into a `Target`.
    ///
    /// Supported formats:
    /// * **Keywords**: "internet", "any" → default route; "local-wifi",
    ///   "wifi" → local segment (case-insensitive).
    /// * **Address**: IPv4 literal with optional port (e.g. "192.168.1.5",
    ///   "10.0.0.1:443").
    /// * **Host**: anything else non-empty is treated as a host name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(TargetParseError::Empty);
        }

        if let Some(target) = parse_keyword(trimmed) {
            return Ok(target);
        }

        if let Some(target) = parse_endpoint(trimmed) {
            return Ok(target);
        }

        // A bare name with an embedded port separator is almost certainly a
        // mistyped address, not a host name.
        if trimmed.contains(':') {
            return Err(TargetParseError::MalformedAddress {
                input: trimmed.to_string(),
            });
        }

        Ok(Target::Host {
            name: trimmed.to_string(),
        })
    }
}

fn parse_keyword(s: &str) -> Option<Target> {
    match s.to_ascii_lowercase().as_str() {
        "internet" | "any" => Some(Target::DefaultRoute),
        "local-wifi" | "wifi" => Some(Target::LocalWiFi),
        _ => None,
    }
}

fn parse_endpoint(s: &str) -> Option<Target> {
    if let Ok(addr) = s.parse::<Ipv4Addr>() {
        return Some(Target::Address {
            endpoint: SocketAddrV4::new(addr, 0),
        });
    }

    s.parse::<SocketAddrV4>()
        .ok()
        .map(|endpoint| Target::Address { endpoint })
}
