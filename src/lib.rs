//! Workspace placeholder crate.
//!
//! This crate exposes shared feature flags that map to the individual
//! workspace crates (`core-service`, `core-cache`, `core-playback`). Host
//! applications can depend on `breath-workspace` and enable the documented
//! features without wiring each crate individually.

#[cfg(any(feature = "desktop-shims", feature = "offline-cache", feature = "playback"))]
pub use core_service::{CoreService, CoreError};

#[cfg(feature = "offline-cache")]
pub use core_cache as cache;

#[cfg(feature = "playback")]
pub use core_playback as playback;
