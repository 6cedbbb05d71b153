//! # Core Configuration Module
//!
//! Provides configuration management for the breathing-session core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! holding the deployment scope, the cache namespace/version tokens, and every
//! bridge the core needs. It enforces fail-fast validation so a misconfigured
//! host finds out at startup rather than on its first offline request.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - Network access for the cache layer
//! - `CacheStorage` - Versioned response storage
//! - `SettingsStore` - User preferences
//! - `TaskSpawner` - Detached background work (cache priming)
//!
//! When the `desktop-shims` feature is enabled, desktop-ready defaults for all
//! four are injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .scope_url("https://example.com/breathe/")
//!     .registration_url("https://example.com/breathe/sw.js?v=1.4.2")
//!     .http_client(Arc::new(MyHttpClient))
//!     .cache_storage(Arc::new(MyCacheStorage))
//!     .settings_store(Arc::new(MySettingsStore))
//!     .task_spawner(Arc::new(MySpawner))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{CacheStorage, Clock, HttpClient, SettingsStore, SystemClock, TaskSpawner};
use std::sync::Arc;
use url::Url;

/// Namespace prefix of shell generations.
pub const DEFAULT_SHELL_PREFIX: &str = "iki-bowl-shell-";
/// Namespace prefix of audio generations.
pub const DEFAULT_AUDIO_PREFIX: &str = "iki-bowl-audio-";
/// Shell version used when no build identifier is available.
pub const DEFAULT_SHELL_VERSION: &str = "dev";
/// Audio content-format version. Changes far less often than the shell.
pub const DEFAULT_AUDIO_VERSION: &str = "v1";
/// Path segment identifying audio resources.
pub const DEFAULT_AUDIO_PATH_SEGMENT: &str = "/audio/";

/// Shell assets cached at install time, relative to the scope.
pub const DEFAULT_SHELL_ASSETS: &[&str] = &[
    "",
    "index.html",
    "manifest.webmanifest",
    "favicon.ico",
    "favicon-16x16.png",
    "favicon-32x32.png",
    "apple-touch-icon.png",
    "icons/icon-192.png",
    "icons/icon-512.png",
];

/// Derive the shell version token from a worker registration URL.
///
/// The host registers the worker as `sw.js?v=<build>`; a missing or empty `v`
/// parameter, or an unparsable URL, yields [`DEFAULT_SHELL_VERSION`].
///
/// ```
/// use core_runtime::config::shell_version_from_registration_url;
///
/// assert_eq!(shell_version_from_registration_url("https://a.test/sw.js?v=1.2.0"), "1.2.0");
/// assert_eq!(shell_version_from_registration_url("https://a.test/sw.js"), "dev");
/// ```
pub fn shell_version_from_registration_url(registration_url: &str) -> String {
    Url::parse(registration_url)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())
        })
        .filter(|version| !version.is_empty())
        .unwrap_or_else(|| DEFAULT_SHELL_VERSION.to_string())
}

/// Cache namespace settings: one prefix and one current version per namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceConfig {
    pub shell_prefix: String,
    pub shell_version: String,
    pub audio_prefix: String,
    pub audio_version: String,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            shell_prefix: DEFAULT_SHELL_PREFIX.to_string(),
            shell_version: DEFAULT_SHELL_VERSION.to_string(),
            audio_prefix: DEFAULT_AUDIO_PREFIX.to_string(),
            audio_version: DEFAULT_AUDIO_VERSION.to_string(),
        }
    }
}

/// Core configuration.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Absolute deployment root, always ending in `/`
    pub scope_url: String,

    pub namespaces: NamespaceConfig,

    /// Shell asset paths relative to the scope
    pub shell_assets: Vec<String>,

    /// Path segment that marks a request as audio
    pub audio_path_segment: String,

    /// Buffer size of each component's event bus
    pub event_buffer_size: usize,

    pub http_client: Arc<dyn HttpClient>,

    pub cache_storage: Arc<dyn CacheStorage>,

    pub settings_store: Arc<dyn SettingsStore>,

    pub task_spawner: Arc<dyn TaskSpawner>,

    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("scope_url", &self.scope_url)
            .field("namespaces", &self.namespaces)
            .field("shell_assets", &self.shell_assets)
            .field("audio_path_segment", &self.audio_path_segment)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("http_client", &"HttpClient { ... }")
            .field("cache_storage", &"CacheStorage { ... }")
            .field("settings_store", &"SettingsStore { ... }")
            .field("task_spawner", &"TaskSpawner { ... }")
            .finish()
    }
}

impl CoreConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// - the scope is not an absolute http(s) URL ending in `/`
    /// - a namespace prefix or version is empty
    /// - one namespace prefix is a prefix of the other (activation could not
    ///   tell their generations apart)
    /// - the audio path segment is empty or the event buffer size is zero
    pub fn validate(&self) -> Result<()> {
        let scope = Url::parse(&self.scope_url).map_err(|e| {
            Error::Config(format!("Scope URL '{}' is not absolute: {}", self.scope_url, e))
        })?;

        if !matches!(scope.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Scope URL must use http or https, got '{}'",
                scope.scheme()
            )));
        }

        if !self.scope_url.ends_with('/') {
            return Err(Error::Config(
                "Scope URL must end with '/' so relative assets resolve inside it".to_string(),
            ));
        }

        let ns = &self.namespaces;
        for (name, value) in [
            ("shell prefix", &ns.shell_prefix),
            ("shell version", &ns.shell_version),
            ("audio prefix", &ns.audio_prefix),
            ("audio version", &ns.audio_version),
        ] {
            if value.is_empty() {
                return Err(Error::Config(format!("Cache {} cannot be empty", name)));
            }
        }

        if ns.shell_prefix.starts_with(&ns.audio_prefix)
            || ns.audio_prefix.starts_with(&ns.shell_prefix)
        {
            return Err(Error::Config(format!(
                "Cache prefixes '{}' and '{}' overlap",
                ns.shell_prefix, ns.audio_prefix
            )));
        }

        if self.audio_path_segment.is_empty() {
            return Err(Error::Config("Audio path segment cannot be empty".to_string()));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn missing_error(capability: &str, setter: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: format!(
            "No {} implementation provided. Desktop: enable the 'desktop-shims' feature. \
             Other hosts: inject a platform adapter with .{}().",
            capability, setter
        ),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    let client = bridge_desktop::ReqwestHttpClient::try_new()
        .map_err(|e| Error::DefaultBridge {
            capability: "HttpClient".to_string(),
            reason: e.to_string(),
        })?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(missing_error("HttpClient", "http_client"))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_cache_storage() -> Result<Arc<dyn CacheStorage>> {
    Ok(Arc::new(bridge_desktop::InMemoryCacheStorage::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_cache_storage() -> Result<Arc<dyn CacheStorage>> {
    Err(missing_error("CacheStorage", "cache_storage"))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store() -> Result<Arc<dyn SettingsStore>> {
    Ok(Arc::new(bridge_desktop::InMemorySettingsStore::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store() -> Result<Arc<dyn SettingsStore>> {
    Err(missing_error("SettingsStore", "settings_store"))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_task_spawner() -> Result<Arc<dyn TaskSpawner>> {
    Ok(Arc::new(bridge_desktop::TokioTaskSpawner::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_task_spawner() -> Result<Arc<dyn TaskSpawner>> {
    Err(missing_error("TaskSpawner", "task_spawner"))
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    scope_url: Option<String>,
    namespaces: NamespaceConfig,
    shell_assets: Option<Vec<String>>,
    audio_path_segment: Option<String>,
    event_buffer_size: Option<usize>,
    http_client: Option<Arc<dyn HttpClient>>,
    cache_storage: Option<Arc<dyn CacheStorage>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    task_spawner: Option<Arc<dyn TaskSpawner>>,
    clock: Option<Arc<dyn Clock>>,
}

impl CoreConfigBuilder {
    /// Set the deployment root (required). A missing trailing `/` is added.
    pub fn scope_url(mut self, url: impl Into<String>) -> Self {
        let mut url = url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        self.scope_url = Some(url);
        self
    }

    /// Set the shell version token directly.
    pub fn shell_version(mut self, version: impl Into<String>) -> Self {
        self.namespaces.shell_version = version.into();
        self
    }

    /// Derive the shell version from the worker registration URL's `v` parameter.
    pub fn registration_url(mut self, url: &str) -> Self {
        self.namespaces.shell_version = shell_version_from_registration_url(url);
        self
    }

    pub fn audio_version(mut self, version: impl Into<String>) -> Self {
        self.namespaces.audio_version = version.into();
        self
    }

    pub fn shell_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.namespaces.shell_prefix = prefix.into();
        self
    }

    pub fn audio_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.namespaces.audio_prefix = prefix.into();
        self
    }

    /// Replace the shell asset manifest.
    pub fn shell_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shell_assets = Some(assets.into_iter().map(Into::into).collect());
        self
    }

    pub fn audio_path_segment(mut self, segment: impl Into<String>) -> Self {
        self.audio_path_segment = Some(segment.into());
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn cache_storage(mut self, storage: Arc<dyn CacheStorage>) -> Self {
        self.cache_storage = Some(storage);
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    pub fn task_spawner(mut self, spawner: Arc<dyn TaskSpawner>) -> Self {
        self.task_spawner = Some(spawner);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the scope URL is missing, a required bridge is
    /// missing and no desktop default is available, or validation fails.
    pub fn build(self) -> Result<CoreConfig> {
        let scope_url = self.scope_url.ok_or_else(|| {
            Error::Config("Scope URL is required. Use .scope_url() to set it.".to_string())
        })?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };
        let cache_storage = match self.cache_storage {
            Some(storage) => storage,
            None => provide_default_cache_storage()?,
        };
        let settings_store = match self.settings_store {
            Some(store) => store,
            None => provide_default_settings_store()?,
        };
        let task_spawner = match self.task_spawner {
            Some(spawner) => spawner,
            None => provide_default_task_spawner()?,
        };

        let config = CoreConfig {
            scope_url,
            namespaces: self.namespaces,
            shell_assets: self.shell_assets.unwrap_or_else(|| {
                DEFAULT_SHELL_ASSETS.iter().map(|s| s.to_string()).collect()
            }),
            audio_path_segment: self
                .audio_path_segment
                .unwrap_or_else(|| DEFAULT_AUDIO_PATH_SEGMENT.to_string()),
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or(crate::events::DEFAULT_EVENT_BUFFER_SIZE),
            http_client,
            cache_storage,
            settings_store,
            task_spawner,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        };

        config.validate()?;

        Ok(config)
    }
}
