//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, response
//! cache storage, settings, background tasks, media transport) into the
//! resource cache, the session player and the settings repository. Desktop
//! hosts typically enable the `desktop-shims` feature, which fills missing
//! bridges from `bridge-desktop` and adds [`bootstrap_desktop`].

pub mod error;
pub mod settings;

pub use error::{CoreError, Result};
pub use settings::{AppSettings, SettingsRepository, SettingsUpdate};

use std::sync::Arc;

use bridge_traits::media::MediaTransport;
use core_cache::{CacheConfig, CacheEvent, ResourceCacheManager};
use core_playback::{PlayerEvent, SessionPlayer, TrackSelection};
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, EventStream};
use core_runtime::logging::strip_url_query;
use tracing::{debug, info, instrument};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    config: Arc<CoreConfig>,
    cache: ResourceCacheManager,
    player: Arc<SessionPlayer>,
    settings: SettingsRepository,
    cache_events: EventBus<CacheEvent>,
    player_events: EventBus<PlayerEvent>,
}

impl CoreService {
    /// Build every component from `config`, playing audio through
    /// `transport`.
    pub fn new(config: CoreConfig, transport: Arc<dyn MediaTransport>) -> Result<Self> {
        config.validate()?;

        let cache_events = EventBus::new(config.event_buffer_size);
        let player_events = EventBus::new(config.event_buffer_size);

        let cache = ResourceCacheManager::new(
            CacheConfig::from_core_config(&config)?,
            Arc::clone(&config.http_client),
            Arc::clone(&config.cache_storage),
            Arc::clone(&config.task_spawner),
        )?
        .with_event_bus(cache_events.clone());

        let player = Arc::new(SessionPlayer::new(transport).with_event_bus(player_events.clone()));
        let settings = SettingsRepository::new(
            Arc::clone(&config.settings_store),
            Arc::clone(&config.clock),
        );

        info!(
            scope = %config.scope_url,
            shell = %cache.generation_name(core_cache::Namespace::Shell),
            audio = %cache.generation_name(core_cache::Namespace::Audio),
            "Core service initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            cache,
            player,
            settings,
            cache_events,
            player_events,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResourceCacheManager {
        &self.cache
    }

    pub fn player(&self) -> &Arc<SessionPlayer> {
        &self.player
    }

    pub fn settings(&self) -> &SettingsRepository {
        &self.settings
    }

    /// Absolute URL of the track for `selection`.
    pub fn track_url(&self, selection: &TrackSelection) -> Result<String> {
        Ok(core_playback::track_url(&self.config.scope_url, selection)?)
    }

    /// Whether the track for `selection` can play without the network: a full
    /// copy is in the current audio generation, or the transport already holds
    /// it fully loaded.
    pub async fn is_track_available_offline(&self, selection: &TrackSelection) -> bool {
        let Ok(url) = self.track_url(selection) else {
            return false;
        };
        if self.cache.is_available_offline(&url).await {
            return true;
        }
        self.player.is_track_ready_for(&url)
    }

    /// Load the track for `selection` without starting it.
    pub fn preload(&self, selection: &TrackSelection) -> Result<String> {
        let url = self.track_url(selection)?;
        self.player.preload(&url);
        Ok(url)
    }

    /// Remember `selection`, stamp the last-used time and start playback.
    ///
    /// Settings failures are reported after playback has been started so a
    /// broken store never blocks a session.
    #[instrument(skip(self), fields(track = %selection.filename()))]
    pub async fn start_session(&self, selection: &TrackSelection) -> Result<String> {
        let url = self.track_url(selection)?;
        debug!(url = %strip_url_query(&url), "Starting session");
        self.player.start(&url).await;

        self.settings
            .save_settings(SettingsUpdate::from_selection(selection))
            .await?;
        self.settings.touch_last_used().await?;
        Ok(url)
    }

    pub fn player_events(&self) -> EventStream<PlayerEvent> {
        self.player_events.stream()
    }

    pub fn cache_events(&self) -> EventStream<CacheEvent> {
        self.cache_events.stream()
    }
}

impl std::fmt::Debug for CoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreService")
            .field("config", &self.config)
            .field("player", &self.player)
            .finish_non_exhaustive()
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Keeps settings and cached responses in SQLite files under `data_dir`;
/// every other bridge comes from the `bridge-desktop` defaults.
///
/// ```no_run
/// # #[cfg(feature = "desktop-shims")]
/// # async fn example(transport: std::sync::Arc<dyn bridge_traits::MediaTransport>) -> core_service::Result<()> {
/// let core = core_service::bootstrap_desktop("https://example.com/breathe/", "/tmp/breathe".into(), transport).await?;
/// core.cache().install().await?;
/// # Ok(())
/// # }
/// ```
#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
pub async fn bootstrap_desktop(
    scope_url: &str,
    data_dir: std::path::PathBuf,
    transport: Arc<dyn MediaTransport>,
) -> Result<CoreService> {
    let settings_store =
        bridge_desktop::SqliteSettingsStore::new(data_dir.join("settings.db")).await?;
    let cache_storage = bridge_desktop::SqliteCacheStorage::new(data_dir.join("cache.db")).await?;

    let config = CoreConfig::builder()
        .scope_url(scope_url)
        .settings_store(Arc::new(settings_store))
        .cache_storage(Arc::new(cache_storage))
        .build()?;

    CoreService::new(config, transport)
}
