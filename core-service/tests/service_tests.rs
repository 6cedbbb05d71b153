//! Façade tests: wiring, offline availability and session start.

use async_trait::async_trait;
use bridge_desktop::{InMemoryCacheStorage, InMemorySettingsStore, TokioTaskSpawner};
use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    http::{HttpClient, HttpRequest, HttpResponse},
    media::{MediaError, MediaTransport, TransportEvent},
    storage::{CacheStorage, SettingsStore},
    time::FixedClock,
};
use chrono::{TimeZone, Utc};
use core_cache::CacheEvent;
use core_playback::{
    BreathingMode, PlayerState, SessionDuration, SymmetrySeconds, TrackSelection,
};
use core_runtime::config::CoreConfig;
use core_service::{settings, CoreError, CoreService};
use mockall::mock;
use std::sync::{Arc, Mutex};

const SCOPE: &str = "https://example.com/breathe/";

mock! {
    pub Http {}

    #[async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

#[derive(Default)]
struct RecordingTransport {
    loaded: Mutex<Vec<String>>,
}

#[async_trait]
impl MediaTransport for RecordingTransport {
    fn load(&self, src: &str) {
        self.loaded.lock().unwrap().push(src.to_string());
    }

    async fn play(&self) -> Result<(), MediaError> {
        Ok(())
    }

    fn pause(&self) {}

    fn is_paused(&self) -> bool {
        true
    }

    fn has_ended(&self) -> bool {
        false
    }

    fn current_time(&self) -> f64 {
        0.0
    }

    fn set_current_time(&self, _seconds: f64) {}

    fn duration(&self) -> f64 {
        300.0
    }
}

struct Harness {
    service: CoreService,
    storage: Arc<InMemoryCacheStorage>,
    settings_store: Arc<InMemorySettingsStore>,
    transport: Arc<RecordingTransport>,
}

fn config(http: MockHttp) -> (CoreConfig, Arc<InMemoryCacheStorage>, Arc<InMemorySettingsStore>) {
    let storage = Arc::new(InMemoryCacheStorage::new());
    let settings_store = Arc::new(InMemorySettingsStore::new());
    let config = CoreConfig::builder()
        .scope_url(SCOPE)
        .shell_version("2.0.1")
        .http_client(Arc::new(http))
        .cache_storage(storage.clone())
        .settings_store(settings_store.clone())
        .task_spawner(Arc::new(TokioTaskSpawner::new()))
        .clock(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2025, 1, 12, 6, 0, 0).unwrap(),
        )))
        .build()
        .unwrap();
    (config, storage, settings_store)
}

fn harness(http: MockHttp) -> Harness {
    let (config, storage, settings_store) = config(http);
    let transport = Arc::new(RecordingTransport::default());
    let service = CoreService::new(config, transport.clone()).unwrap();
    Harness {
        service,
        storage,
        settings_store,
        transport,
    }
}

fn selection() -> TrackSelection {
    TrackSelection::new(
        BreathingMode::Equal,
        SymmetrySeconds::new(5).unwrap(),
        SessionDuration::Twenty,
    )
}

#[tokio::test]
async fn test_new_rejects_invalid_config() {
    let (mut config, _, _) = config(MockHttp::new());
    config.scope_url = "ftp://example.com/breathe/".to_string();

    let result = CoreService::new(config, Arc::new(RecordingTransport::default()));

    assert!(matches!(result, Err(CoreError::Runtime(_))));
}

#[tokio::test]
async fn test_cache_uses_configured_generations() {
    let h = harness(MockHttp::new());

    assert_eq!(
        h.service.cache().generation_name(core_cache::Namespace::Shell),
        "iki-bowl-shell-2.0.1"
    );
    assert_eq!(
        h.service.cache().generation_name(core_cache::Namespace::Audio),
        "iki-bowl-audio-v1"
    );
}

#[tokio::test]
async fn test_track_url_resolves_inside_scope() {
    let h = harness(MockHttp::new());

    assert_eq!(
        h.service.track_url(&selection()).unwrap(),
        "https://example.com/breathe/audio/even-55-20m.mp3"
    );
}

#[tokio::test]
async fn test_track_available_offline_from_cache() {
    let h = harness(MockHttp::new());
    let url = h.service.track_url(&selection()).unwrap();
    assert!(!h.service.is_track_available_offline(&selection()).await);

    h.storage
        .store("iki-bowl-audio-v1", &url, HttpResponse::new(200, vec![1u8; 16]))
        .await
        .unwrap();

    assert!(h.service.is_track_available_offline(&selection()).await);
}

#[tokio::test]
async fn test_stale_generation_copy_does_not_count_as_offline() {
    let h = harness(MockHttp::new());
    let url = h.service.track_url(&selection()).unwrap();

    h.storage
        .store("iki-bowl-audio-v0", &url, HttpResponse::new(200, vec![1u8; 16]))
        .await
        .unwrap();

    assert!(!h.service.is_track_available_offline(&selection()).await);
}

#[tokio::test]
async fn test_track_available_offline_when_transport_holds_it() {
    let h = harness(MockHttp::new());
    let url = h.service.preload(&selection()).unwrap();
    h.service
        .player()
        .handle_transport_event(TransportEvent::CanPlay)
        .await;

    assert!(h.service.player().is_track_ready_for(&url));
    assert!(h.service.is_track_available_offline(&selection()).await);
}

#[tokio::test]
async fn test_start_session_plays_and_remembers_selection() {
    let h = harness(MockHttp::new());
    let mut events = h.service.player_events();

    let url = h.service.start_session(&selection()).await.unwrap();

    assert_eq!(h.transport.loaded.lock().unwrap().as_slice(), [url.clone()]);
    assert_eq!(h.service.player().state(), PlayerState::Loading);
    assert!(events
        .drain()
        .iter()
        .any(|e| e.as_state_change().map(|c| c.state) == Some(PlayerState::Loading)));

    let stored = h.service.settings().load().await;
    assert_eq!(stored.selection, selection());
    assert_eq!(stored.last_used_at.as_deref(), Some("2025-01-12T06:00:00.000Z"));
    assert_eq!(
        h.settings_store
            .get_string(settings::KEY_DURATION)
            .await
            .unwrap()
            .as_deref(),
        Some("20")
    );
}

#[tokio::test]
async fn test_install_is_published_on_cache_events() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .returning(|_| Ok(HttpResponse::new(200, "asset")));
    let h = harness(http);
    let mut events = h.service.cache_events();

    let report = h.service.cache().install().await.unwrap();

    assert_eq!(report.generation, "iki-bowl-shell-2.0.1");
    assert_eq!(
        events.drain(),
        vec![CacheEvent::Installed {
            generation: "iki-bowl-shell-2.0.1".to_string(),
            assets: report.assets,
        }]
    );
    assert!(h
        .storage
        .generations()
        .await
        .unwrap()
        .contains(&"iki-bowl-shell-2.0.1".to_string()));
}

#[tokio::test]
async fn test_failed_install_surfaces_as_cache_error() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .returning(|_| Err(BridgeError::Network("unreachable".into())));
    let h = harness(http);

    let result = h.service.cache().install().await.map_err(CoreError::from);

    assert!(matches!(result, Err(CoreError::Cache(e)) if e.is_network()));
}

#[cfg(feature = "desktop-shims")]
#[tokio::test]
async fn test_bootstrap_desktop_persists_settings() {
    let dir = tempfile::tempdir().unwrap();

    {
        let core = core_service::bootstrap_desktop(
            SCOPE,
            dir.path().to_path_buf(),
            Arc::new(RecordingTransport::default()),
        )
        .await
        .unwrap();
        core.settings()
            .save_settings(core_service::SettingsUpdate::new().mode(BreathingMode::Relax478))
            .await
            .unwrap();
    }

    let core = core_service::bootstrap_desktop(
        SCOPE,
        dir.path().to_path_buf(),
        Arc::new(RecordingTransport::default()),
    )
    .await
    .unwrap();
    assert_eq!(
        core.settings().load().await.selection.mode,
        BreathingMode::Relax478
    );
}
