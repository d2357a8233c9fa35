//! # Core Reachability Logic
//!
//! The heart of `reachr`: classification, monitoring, and the boundary trait
//! the platform hides behind.
//!
//! ## Architecture Overview
//! * **[`classify`]**: Pure flag-word → status policy. No state, no IO.
//! * **[`monitor`]**: [`monitor::ReachabilityMonitor`], the stateful
//!   subscribe/notify machine.
//! * **[`source`]**: The [`source::FlagSource`] trait the monitor drives.
//!   Everything platform-specific lives behind it, so the whole state machine
//!   tests against a scripted mock.
//! * **[`system`]**: The real [`source::FlagSource`] backed by the host's
//!   network interfaces.

pub mod classify;
pub mod monitor;
pub mod source;
pub mod system;
