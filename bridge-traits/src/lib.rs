//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the breathing-session core and the
//! host that embeds it. Each trait represents a capability the core requires
//! but that is implemented differently per platform (browser service worker,
//! desktop, mobile).
//!
//! ## Traits
//!
//! ### Networking & Storage
//! - [`HttpClient`](http::HttpClient) - Network round-trips for the cache layer
//! - [`CacheStorage`](storage::CacheStorage) - Named, versioned response storage
//! - [`SettingsStore`](storage::SettingsStore) - Key-value preferences storage
//!
//! ### Playback
//! - [`MediaTransport`](media::MediaTransport) - The host audio element
//!
//! ### Platform Integration
//! - [`TaskSpawner`](background::TaskSpawner) - Detached background work
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should map platform failures to the closest variant; in particular a
//! request that never produced a response is [`BridgeError::Network`], which
//! the cache layer treats as "offline".
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so handles can be shared across
//! async tasks behind `Arc`.

pub mod background;
pub mod error;
pub mod http;
pub mod media;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use background::{BackgroundTask, TaskSpawner};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use media::{MediaError, MediaTransport, TransportEvent};
pub use storage::{CacheStorage, SettingsStore};
pub use time::{Clock, FixedClock, LogEntry, LogLevel, LoggerSink, SystemClock};
