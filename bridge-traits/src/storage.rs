//! Storage Abstractions
//!
//! Provides platform-agnostic traits for the versioned response cache and the
//! key-value settings store.

use async_trait::async_trait;

use crate::error::Result;
use crate::http::HttpResponse;

/// Named, versioned response storage.
///
/// Mirrors the browser `CacheStorage` model: the store holds any number of
/// named generations, each mapping a request key (an absolute URL) to a
/// complete response.
///
/// - Web: `caches` global inside a service worker
/// - Desktop: SQLite tables or an in-memory map
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::CacheStorage;
///
/// async fn is_cached(storage: &dyn CacheStorage, url: &str) -> Result<bool> {
///     Ok(storage.lookup("app-audio-v1", url).await?.is_some())
/// }
/// ```
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// List the names of every stored generation.
    async fn generations(&self) -> Result<Vec<String>>;

    /// Create the generation if it does not exist yet.
    async fn open(&self, generation: &str) -> Result<()>;

    /// Delete a generation and all of its entries.
    ///
    /// Returns `true` if the generation existed.
    async fn delete_generation(&self, generation: &str) -> Result<bool>;

    /// Look up an entry inside one generation.
    async fn lookup(&self, generation: &str, key: &str) -> Result<Option<HttpResponse>>;

    /// Store (or replace) an entry, creating the generation if needed.
    async fn store(&self, generation: &str, key: &str, response: HttpResponse) -> Result<()>;

    /// Look up an entry in any generation.
    async fn lookup_any(&self, key: &str) -> Result<Option<HttpResponse>> {
        for generation in self.generations().await? {
            if let Some(response) = self.lookup(&generation, key).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }
}

/// Key-value settings storage trait
///
/// Abstracts platform-specific preferences/settings storage:
/// - iOS: UserDefaults
/// - Android: SharedPreferences / DataStore
/// - Desktop: SQLite-backed key-value table
/// - Web: localStorage
///
/// Values are stored as strings; typed accessors parse on read so that a
/// malformed stored value surfaces as `None` rather than an error.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;

    /// List all setting keys
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Clear all settings
    async fn clear_all(&self) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_string(key).await?.is_some())
    }

    /// Store a boolean value
    async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set_string(key, if value { "true" } else { "false" }).await
    }

    /// Retrieve a boolean value
    async fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        Ok(self
            .get_string(key)
            .await?
            .and_then(|raw| match raw.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            }))
    }

    /// Retrieve a floating-point value
    async fn get_f64(&self, key: &str) -> Result<Option<f64>> {
        Ok(self
            .get_string(key)
            .await?
            .and_then(|raw| raw.trim().parse::<f64>().ok()))
    }
}
