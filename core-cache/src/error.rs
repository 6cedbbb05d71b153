//! # Cache Error Types
//!
//! Errors surfaced by the lifecycle operations (install, activate). Request
//! interception never returns these: fetch failures are absorbed into a
//! stale hit or the offline placeholder.

use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    /// Cache configuration failed validation.
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),

    /// A URL could not be parsed or resolved against the scope.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A shell asset could not be fetched during install.
    #[error("Failed to fetch shell asset {url}: {reason}")]
    AssetFetch { url: String, reason: String },

    /// A shell asset answered with a status that cannot be cached.
    #[error("Shell asset {url} returned HTTP {status}")]
    AssetStatus { url: String, status: u16 },

    /// The storage bridge failed.
    #[error("Cache storage error: {0}")]
    Storage(#[from] BridgeError),
}

impl CacheError {
    /// Returns `true` when the error came from the network rather than from
    /// configuration or storage.
    pub fn is_network(&self) -> bool {
        match self {
            CacheError::AssetFetch { .. } | CacheError::AssetStatus { .. } => true,
            CacheError::Storage(e) => e.is_network(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
