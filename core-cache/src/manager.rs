//! # Resource Cache Manager
//!
//! Serves the app shell and session tracks from versioned cache generations so
//! the app keeps working offline.
//!
//! - Install populates the shell generation from the manifest, all-or-nothing.
//! - Activate deletes stale generations of both managed namespaces.
//! - Interception dispatches each same-origin GET by class: audio is
//!   cache-first under its canonical URL, range misses trigger detached
//!   priming, navigations are network-first against `index.html`, other
//!   assets are cache-first.
//!
//! Network failures never escape [`ResourceCacheManager::handle_fetch`]; they
//! resolve to a stored copy or to [`offline_response`].

use bridge_traits::{
    background::TaskSpawner,
    http::{HttpClient, HttpRequest, HttpResponse},
    storage::CacheStorage,
};
use core_runtime::events::EventBus;
use core_runtime::logging::strip_url_query;
use futures::future::try_join_all;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::events::CacheEvent;
use crate::generation::{stale_generations, Namespace};
use crate::request::{canonical_url, classify, FetchRequest, RequestClass};

/// Body and status text of the offline placeholder.
pub const OFFLINE_BODY: &str = "Offline";

/// The deterministic response served when neither network nor cache can
/// satisfy a request.
pub fn offline_response() -> HttpResponse {
    HttpResponse::new(503, OFFLINE_BODY)
        .with_status_text(OFFLINE_BODY)
        .with_header("Content-Type", "text/plain")
}

/// Only complete successes are persisted: 2xx and not `206 Partial Content`.
pub fn is_storable(response: &HttpResponse) -> bool {
    response.is_success() && !response.is_partial_content()
}

/// What the host should do with an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDisposition {
    /// Not handled; the host performs its default fetch untouched.
    Passthrough,
    /// Answer the request with this response.
    Respond(HttpResponse),
}

impl FetchDisposition {
    pub fn is_passthrough(&self) -> bool {
        matches!(self, FetchDisposition::Passthrough)
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            FetchDisposition::Respond(response) => Some(response),
            FetchDisposition::Passthrough => None,
        }
    }

    pub fn into_response(self) -> Option<HttpResponse> {
        match self {
            FetchDisposition::Respond(response) => Some(response),
            FetchDisposition::Passthrough => None,
        }
    }
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub generation: String,
    pub assets: usize,
    /// The new worker should take over without waiting for old pages to close.
    pub skip_waiting: bool,
}

/// Result of activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationReport {
    pub deleted: Vec<String>,
    /// Open pages should be claimed immediately, without a reload.
    pub claim_clients: bool,
}

/// Outcome of one priming attempt. Priming never fails outward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimeOutcome {
    /// A full copy was already stored; nothing was fetched.
    AlreadyCached,
    /// Another priming of the same URL is still running.
    InFlight,
    /// The full resource was fetched and stored.
    Stored,
    /// The network answered with a status that is not storable.
    NotStored { status: u16 },
    /// The fetch or the write failed.
    Failed,
}

/// Removes its URL from the in-flight set when dropped.
struct PrimingGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
    url: String,
}

impl PrimingGuard {
    fn acquire(in_flight: &Arc<Mutex<HashSet<String>>>, url: &str) -> Option<Self> {
        if !in_flight.lock().insert(url.to_string()) {
            return None;
        }
        Some(Self {
            in_flight: Arc::clone(in_flight),
            url: url.to_string(),
        })
    }
}

impl Drop for PrimingGuard {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.url);
    }
}

/// Offline cache for the app shell and session audio.
///
/// Cloning yields another handle onto the same storage and priming state.
#[derive(Clone)]
pub struct ResourceCacheManager {
    config: Arc<CacheConfig>,
    http_client: Arc<dyn HttpClient>,
    storage: Arc<dyn CacheStorage>,
    spawner: Arc<dyn TaskSpawner>,
    event_bus: Option<EventBus<CacheEvent>>,
    priming: Arc<Mutex<HashSet<String>>>,
}

impl ResourceCacheManager {
    /// Create a new cache manager.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfig`] if the configuration does not
    /// validate.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use core_cache::{CacheConfig, ResourceCacheManager};
    ///
    /// let config = CacheConfig::new("https://example.com/breathe/")?.with_shell_version("1.4.2");
    /// let manager = ResourceCacheManager::new(config, http_client, storage, spawner)?;
    /// manager.install().await?;
    /// manager.activate().await?;
    /// ```
    pub fn new(
        config: CacheConfig,
        http_client: Arc<dyn HttpClient>,
        storage: Arc<dyn CacheStorage>,
        spawner: Arc<dyn TaskSpawner>,
    ) -> Result<Self> {
        config.validate().map_err(CacheError::InvalidConfig)?;

        Ok(Self {
            config: Arc::new(config),
            http_client,
            storage,
            spawner,
            event_bus: None,
            priming: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    /// Set event bus for lifecycle events.
    pub fn with_event_bus(mut self, event_bus: EventBus<CacheEvent>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Name of the current generation of `namespace`.
    pub fn generation_name(&self, namespace: Namespace) -> String {
        self.config.generation(namespace).name()
    }

    fn emit(&self, event: CacheEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(event);
        }
    }

    /// Fetch every shell asset and store them in the current shell generation.
    ///
    /// Nothing is written unless every asset fetched successfully.
    #[instrument(skip(self))]
    pub async fn install(&self) -> Result<InstallReport> {
        let generation = self.generation_name(Namespace::Shell);
        info!(generation = %generation, "Installing shell generation");

        let urls = self
            .config
            .shell_assets
            .iter()
            .map(|path| self.config.resolve(path))
            .collect::<Result<Vec<_>>>()?;

        let responses =
            match try_join_all(urls.iter().map(|url| self.fetch_asset(url.as_str()))).await {
                Ok(responses) => responses,
                Err(e) if e.is_network() => {
                    info!(error = %e, "Shell install skipped, network unavailable");
                    return Err(e);
                }
                Err(e) => {
                    warn!(error = %e, "Shell install fetch failed");
                    return Err(e);
                }
            };

        let existed = self
            .storage
            .generations()
            .await?
            .iter()
            .any(|name| name == &generation);

        self.storage.open(&generation).await?;
        for (url, response) in urls.iter().zip(responses) {
            if let Err(e) = self.storage.store(&generation, url.as_str(), response).await {
                warn!(error = %e, url = %url, "Shell install write failed, rolling back");
                if !existed {
                    if let Err(rollback) = self.storage.delete_generation(&generation).await {
                        warn!(
                            error = %rollback,
                            generation = %generation,
                            "Rollback of partial shell generation failed"
                        );
                    }
                }
                return Err(e.into());
            }
        }

        info!(generation = %generation, assets = urls.len(), "Shell generation installed");
        self.emit(CacheEvent::Installed {
            generation: generation.clone(),
            assets: urls.len(),
        });

        Ok(InstallReport {
            generation,
            assets: urls.len(),
            skip_waiting: true,
        })
    }

    async fn fetch_asset(&self, url: &str) -> Result<HttpResponse> {
        let response = self
            .http_client
            .execute(HttpRequest::get(url))
            .await
            .map_err(|e| CacheError::AssetFetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !is_storable(&response) {
            return Err(CacheError::AssetStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        Ok(response)
    }

    /// Delete every stored generation superseded by a current one.
    ///
    /// Generations outside the managed namespaces are left alone.
    #[instrument(skip(self))]
    pub async fn activate(&self) -> Result<ActivationReport> {
        let stored = self.storage.generations().await?;
        let current = [
            self.config.generation(Namespace::Shell),
            self.config.generation(Namespace::Audio),
        ];

        let stale: Vec<String> = stale_generations(&stored, &current)
            .into_iter()
            .map(String::from)
            .collect();

        try_join_all(stale.iter().map(|name| self.storage.delete_generation(name))).await?;

        if stale.is_empty() {
            debug!("No stale generations");
        } else {
            info!(deleted = ?stale, "Deleted stale cache generations");
        }
        self.emit(CacheEvent::Activated {
            deleted: stale.clone(),
        });

        Ok(ActivationReport {
            deleted: stale,
            claim_clients: true,
        })
    }

    /// Decide how to answer an intercepted request.
    ///
    /// Never fails: network errors resolve to a stored copy or to the offline
    /// placeholder.
    #[instrument(skip(self, request), fields(url = %strip_url_query(request.url())))]
    pub async fn handle_fetch(&self, request: &FetchRequest) -> FetchDisposition {
        match classify(request, &self.config) {
            RequestClass::Passthrough => FetchDisposition::Passthrough,
            RequestClass::Audio {
                canonical_url,
                range: false,
            } => {
                let generation = self.generation_name(Namespace::Audio);
                FetchDisposition::Respond(
                    self.cache_first(&generation, &request.request, &canonical_url)
                        .await,
                )
            }
            RequestClass::Audio {
                canonical_url,
                range: true,
            } => FetchDisposition::Respond(
                self.audio_range(&request.request, &canonical_url).await,
            ),
            RequestClass::Navigation => FetchDisposition::Respond(self.navigate().await),
            RequestClass::Shell { cache_key } => {
                let generation = self.generation_name(Namespace::Shell);
                FetchDisposition::Respond(
                    self.cache_first(&generation, &request.request, &cache_key)
                        .await,
                )
            }
        }
    }

    async fn cache_first(&self, generation: &str, request: &HttpRequest, key: &str) -> HttpResponse {
        if let Some(cached) = self.lookup(generation, key).await {
            debug!(generation = generation, "Cache hit");
            return cached;
        }

        match self.http_client.execute(request.clone()).await {
            Ok(response) => {
                if is_storable(&response) {
                    self.store(generation, key, response.clone()).await;
                }
                response
            }
            Err(e) => {
                warn!(error = %e, "Network fetch failed");
                self.fallback(generation, key).await
            }
        }
    }

    async fn audio_range(&self, request: &HttpRequest, canonical_url: &str) -> HttpResponse {
        let generation = self.generation_name(Namespace::Audio);

        if let Some(cached) = self.lookup(&generation, canonical_url).await {
            debug!("Serving range request from full cached copy");
            return cached;
        }

        match self.http_client.execute(request.clone()).await {
            Ok(response) => {
                if is_storable(&response) {
                    self.store(&generation, canonical_url, response.clone()).await;
                } else if response.is_partial_content() {
                    self.schedule_prime(canonical_url);
                }
                response
            }
            Err(e) => {
                warn!(error = %e, "Range fetch failed");
                self.fallback(&generation, canonical_url).await
            }
        }
    }

    async fn navigate(&self) -> HttpResponse {
        let generation = self.generation_name(Namespace::Shell);
        let index_url = match self.config.index_url() {
            Ok(url) => url.to_string(),
            Err(e) => {
                warn!(error = %e, "Cannot resolve entry point");
                return offline_response();
            }
        };

        let request = HttpRequest::get(index_url.as_str()).header("Cache-Control", "no-cache");

        match self.http_client.execute(request).await {
            Ok(response) if response.is_success() => {
                if is_storable(&response) {
                    self.store(&generation, &index_url, response.clone()).await;
                }
                response
            }
            Ok(response) => {
                debug!(status = response.status, "Entry point fetch not ok, trying cache");
                self.lookup(&generation, &index_url).await.unwrap_or(response)
            }
            Err(e) => {
                warn!(error = %e, "Navigation fetch failed");
                self.fallback(&generation, &index_url).await
            }
        }
    }

    async fn lookup(&self, generation: &str, key: &str) -> Option<HttpResponse> {
        match self.storage.lookup(generation, key).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, generation = generation, "Cache lookup failed");
                None
            }
        }
    }

    async fn store(&self, generation: &str, key: &str, response: HttpResponse) -> bool {
        match self.storage.store(generation, key, response).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, generation = generation, "Cache write failed");
                false
            }
        }
    }

    async fn fallback(&self, generation: &str, key: &str) -> HttpResponse {
        if let Some(cached) = self.lookup(generation, key).await {
            return cached;
        }

        info!(url = %strip_url_query(key), "Serving offline placeholder");
        self.emit(CacheEvent::ServedOffline {
            url: strip_url_query(key).to_string(),
        });
        offline_response()
    }

    /// Run priming detached from the request that triggered it.
    fn schedule_prime(&self, canonical_url: &str) {
        let Some(guard) = PrimingGuard::acquire(&self.priming, canonical_url) else {
            debug!("Priming already in flight");
            return;
        };

        let manager = self.clone();
        let url = canonical_url.to_string();
        self.spawner.spawn_detached(
            "prime-audio",
            Box::pin(async move {
                let outcome = manager.prime_unguarded(&url).await;
                drop(guard);
                debug!(?outcome, "Priming finished");
            }),
        );
    }

    /// Fetch and store a full copy of a track unless one is already stored.
    ///
    /// Idempotent: a stored copy or a priming already running for the same
    /// canonical URL makes this a no-op.
    #[instrument(skip(self, url), fields(url = %strip_url_query(url)))]
    pub async fn prime_audio(&self, url: &str) -> PrimeOutcome {
        let Some(canonical) = canonical_url(url) else {
            debug!("Cannot prime a relative URL");
            return PrimeOutcome::Failed;
        };

        let Some(_guard) = PrimingGuard::acquire(&self.priming, &canonical) else {
            return PrimeOutcome::InFlight;
        };

        self.prime_unguarded(&canonical).await
    }

    async fn prime_unguarded(&self, canonical_url: &str) -> PrimeOutcome {
        let generation = self.generation_name(Namespace::Audio);

        if self.lookup(&generation, canonical_url).await.is_some() {
            return PrimeOutcome::AlreadyCached;
        }

        match self.http_client.execute(HttpRequest::get(canonical_url)).await {
            Ok(response) if is_storable(&response) => {
                if !self.store(&generation, canonical_url, response).await {
                    return PrimeOutcome::Failed;
                }
                info!(url = canonical_url, "Primed full audio copy");
                self.emit(CacheEvent::Primed {
                    url: canonical_url.to_string(),
                });
                PrimeOutcome::Stored
            }
            Ok(response) => PrimeOutcome::NotStored {
                status: response.status,
            },
            Err(e) => {
                debug!(error = %e, "Priming fetch failed");
                PrimeOutcome::Failed
            }
        }
    }

    /// Whether a full copy of the track is stored in the current audio
    /// generation. One lookup, keyed by the canonical URL.
    pub async fn is_available_offline(&self, url: &str) -> bool {
        let Some(canonical) = canonical_url(url) else {
            return false;
        };
        self.lookup(&self.generation_name(Namespace::Audio), &canonical)
            .await
            .is_some()
    }

    /// Number of primings currently running.
    pub fn priming_in_flight(&self) -> usize {
        self.priming.lock().len()
    }
}
