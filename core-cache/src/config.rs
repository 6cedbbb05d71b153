//! Cache configuration: scope, namespaces and the shell manifest.

use core_runtime::config::{
    CoreConfig, NamespaceConfig, DEFAULT_AUDIO_PATH_SEGMENT, DEFAULT_SHELL_ASSETS,
};
use url::Url;

use crate::error::{CacheError, Result};
use crate::generation::{Generation, Namespace};

/// Configuration for the resource cache manager.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Deployment root. Shell assets and the entry point resolve against it,
    /// and only requests sharing its origin are intercepted.
    pub scope: Url,

    pub namespaces: NamespaceConfig,

    /// Shell asset paths relative to the scope, cached at install
    pub shell_assets: Vec<String>,

    /// Path segment marking a request as audio (default: `/audio/`)
    pub audio_path_segment: String,
}

impl CacheConfig {
    /// Create a configuration with default namespaces and manifest.
    pub fn new(scope_url: &str) -> Result<Self> {
        let scope = Url::parse(scope_url).map_err(|e| CacheError::InvalidUrl {
            url: scope_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            scope,
            namespaces: NamespaceConfig::default(),
            shell_assets: DEFAULT_SHELL_ASSETS.iter().map(|s| s.to_string()).collect(),
            audio_path_segment: DEFAULT_AUDIO_PATH_SEGMENT.to_string(),
        })
    }

    /// Derive the cache configuration from the core configuration.
    pub fn from_core_config(config: &CoreConfig) -> Result<Self> {
        let mut cache_config = Self::new(&config.scope_url)?;
        cache_config.namespaces = config.namespaces.clone();
        cache_config.shell_assets = config.shell_assets.clone();
        cache_config.audio_path_segment = config.audio_path_segment.clone();
        Ok(cache_config)
    }

    pub fn with_shell_version(mut self, version: impl Into<String>) -> Self {
        self.namespaces.shell_version = version.into();
        self
    }

    pub fn with_audio_version(mut self, version: impl Into<String>) -> Self {
        self.namespaces.audio_version = version.into();
        self
    }

    pub fn with_prefixes(mut self, shell: impl Into<String>, audio: impl Into<String>) -> Self {
        self.namespaces.shell_prefix = shell.into();
        self.namespaces.audio_prefix = audio.into();
        self
    }

    pub fn with_shell_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shell_assets = assets.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_audio_path_segment(mut self, segment: impl Into<String>) -> Self {
        self.audio_path_segment = segment.into();
        self
    }

    /// The current generation of a namespace.
    pub fn generation(&self, namespace: Namespace) -> Generation {
        match namespace {
            Namespace::Shell => Generation::new(
                &self.namespaces.shell_prefix,
                &self.namespaces.shell_version,
            ),
            Namespace::Audio => Generation::new(
                &self.namespaces.audio_prefix,
                &self.namespaces.audio_version,
            ),
        }
    }

    /// Resolve a path against the scope.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        self.scope.join(path).map_err(|e| CacheError::InvalidUrl {
            url: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// The navigation entry point (`index.html` under the scope).
    pub fn index_url(&self) -> Result<Url> {
        self.resolve("index.html")
    }

    /// Validate configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !matches!(self.scope.scheme(), "http" | "https") {
            return Err(format!("scope must be http(s), got '{}'", self.scope.scheme()));
        }

        if !self.scope.path().ends_with('/') {
            return Err("scope path must end with '/'".to_string());
        }

        let ns = &self.namespaces;
        if ns.shell_prefix.is_empty() || ns.audio_prefix.is_empty() {
            return Err("namespace prefixes cannot be empty".to_string());
        }

        if ns.shell_version.is_empty() || ns.audio_version.is_empty() {
            return Err("namespace versions cannot be empty".to_string());
        }

        if ns.shell_prefix.starts_with(&ns.audio_prefix)
            || ns.audio_prefix.starts_with(&ns.shell_prefix)
        {
            return Err("namespace prefixes must not overlap".to_string());
        }

        if self.audio_path_segment.is_empty() {
            return Err("audio_path_segment cannot be empty".to_string());
        }

        Ok(())
    }
}
