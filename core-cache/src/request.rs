//! Intercepted requests and their classification.

use bridge_traits::http::{HttpMethod, HttpRequest};
use url::Url;

use crate::config::CacheConfig;

/// How the host issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Address-bar or full-page load
    Navigate,
    #[default]
    Other,
}

/// A request seen by the interception boundary.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub request: HttpRequest,
    pub mode: RequestMode,
}

impl FetchRequest {
    pub fn new(request: HttpRequest, mode: RequestMode) -> Self {
        Self { request, mode }
    }

    /// A plain GET subresource request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpRequest::get(url), RequestMode::Other)
    }

    /// A page navigation.
    pub fn navigate(url: impl Into<String>) -> Self {
        Self::new(HttpRequest::get(url), RequestMode::Navigate)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request = self.request.header(key, value);
        self
    }

    pub fn url(&self) -> &str {
        &self.request.url
    }

    pub fn has_range(&self) -> bool {
        self.request.has_header("range")
    }
}

/// Dispatch class of an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestClass {
    /// Not ours: non-GET, cross-origin or unparsable.
    Passthrough,
    /// A track; `range` is set when the request carried a `Range` header.
    Audio { canonical_url: String, range: bool },
    Navigation,
    /// Any other same-origin asset, keyed by `cache_key`.
    Shell { cache_key: String },
}

/// Absolute URL with query and fragment removed.
///
/// Returns `None` for strings that are not absolute URLs.
pub fn canonical_url(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    parsed.set_query(None);
    parsed.set_fragment(None);
    Some(parsed.into())
}

/// Classify a request against the cache configuration.
pub fn classify(request: &FetchRequest, config: &CacheConfig) -> RequestClass {
    if request.request.method != HttpMethod::Get {
        return RequestClass::Passthrough;
    }

    let Ok(mut url) = Url::parse(request.url()) else {
        return RequestClass::Passthrough;
    };

    if url.origin() != config.scope.origin() {
        return RequestClass::Passthrough;
    }

    if url.path().contains(&config.audio_path_segment) {
        url.set_query(None);
        url.set_fragment(None);
        return RequestClass::Audio {
            canonical_url: url.into(),
            range: request.has_range(),
        };
    }

    if request.mode == RequestMode::Navigate {
        return RequestClass::Navigation;
    }

    url.set_fragment(None);
    RequestClass::Shell {
        cache_key: url.into(),
    }
}
