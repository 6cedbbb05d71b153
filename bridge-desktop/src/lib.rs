//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `CacheStorage` using SQLite, or an in-memory map
//! - `SettingsStore` using a SQLite-backed key-value table, or an in-memory map
//! - `TaskSpawner` using the Tokio runtime
//!
//! The media transport has no desktop default; hosts inject their own.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SqliteCacheStorage};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::try_new()?;
//!     let cache = SqliteCacheStorage::new("data/cache.db".into()).await?;
//!
//!     // Use in core configuration
//!     Ok(())
//! }
//! ```

mod background;
mod cache_storage;
mod http;
mod memory;
mod settings;

pub use background::TokioTaskSpawner;
pub use cache_storage::SqliteCacheStorage;
pub use http::ReqwestHttpClient;
pub use memory::{InMemoryCacheStorage, InMemorySettingsStore};
pub use settings::SqliteSettingsStore;
