//! # Common Models
//!
//! Pure data types shared by every `reachr` crate.
//!
//! ## Characteristics
//! * **Pure Rust**: No IO, no system calls, no platform knowledge.
//! * **Stability**: The types here are the public vocabulary of the whole
//!   workspace; changes should be rare and deliberate.
//!
//! ## Contents
//! * **[`flags`]**: The raw connectivity flag word reported by a flag source.
//! * **[`status`]**: The reachability status enumeration.
//! * **[`target`]**: What a monitor watches (host, address, internet, local Wi-Fi).
//! * **[`error`]**: The error taxonomy.

pub mod error;
pub mod flags;
pub mod status;
pub mod target;
