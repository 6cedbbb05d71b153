//! # Resource Cache
//!
//! Offline response cache for the breathing-session app: versioned shell and
//! audio generations, per-request dispatch, and background priming of full
//! track copies after partial responses.
//!
//! ## Overview
//!
//! The host forwards every intercepted request to
//! [`ResourceCacheManager::handle_fetch`] and either lets it through or answers
//! it with the returned response. Install and activate are driven from the
//! host's worker lifecycle.

pub mod config;
pub mod error;
pub mod events;
pub mod generation;
pub mod manager;
pub mod request;

pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use events::CacheEvent;
pub use generation::{Generation, Namespace};
pub use manager::{
    is_storable, offline_response, ActivationReport, FetchDisposition, InstallReport,
    PrimeOutcome, ResourceCacheManager, OFFLINE_BODY,
};
pub use request::{canonical_url, FetchRequest, RequestClass, RequestMode};
