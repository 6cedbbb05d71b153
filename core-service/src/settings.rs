//! # Settings Repository
//!
//! Persists the operator's last track selection and a couple of UI flags in
//! the host [`SettingsStore`].
//!
//! Loading never fails: unknown or out-of-range stored values are normalized
//! to the nearest valid value (or the default), an older single-key mode
//! scheme is migrated once, and the normalized values are written back so the
//! store stays consistent across upgrades.

use std::sync::Arc;

use bridge_traits::{storage::SettingsStore, time::Clock};
use chrono::SecondsFormat;
use core_playback::{BreathingMode, SessionDuration, SymmetrySeconds, TrackSelection};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::Result;

pub const KEY_MODE: &str = "selectedModeType";
pub const KEY_SYMMETRY: &str = "equalSeconds";
pub const KEY_DURATION: &str = "selectedDuration";
pub const KEY_INSTALL_HINT_DISMISSED: &str = "installHintDismissed";
pub const KEY_LAST_USED_AT: &str = "lastUsedAt";

/// Single-key mode scheme replaced by mode plus symmetry.
pub const LEGACY_KEY_MODE: &str = "selectedMode";
/// No longer used; removed on load.
pub const OBSOLETE_KEY_VOLUME: &str = "masterVolume";

/// Normalized settings as seen by the app.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppSettings {
    pub selection: TrackSelection,
    pub install_hint_dismissed: bool,
    /// RFC 3339 timestamp of the last started session.
    pub last_used_at: Option<String>,
}

/// Partial update for [`SettingsRepository::save_settings`]. Only fields that
/// are set are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsUpdate {
    pub mode: Option<BreathingMode>,
    /// Raw seconds, normalized before writing.
    pub symmetry: Option<f64>,
    /// Raw minutes, normalized before writing.
    pub duration: Option<f64>,
    pub install_hint_dismissed: Option<bool>,
    pub last_used_at: Option<String>,
}

impl SettingsUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: BreathingMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn symmetry(mut self, seconds: f64) -> Self {
        self.symmetry = Some(seconds);
        self
    }

    pub fn duration(mut self, minutes: f64) -> Self {
        self.duration = Some(minutes);
        self
    }

    pub fn install_hint_dismissed(mut self, dismissed: bool) -> Self {
        self.install_hint_dismissed = Some(dismissed);
        self
    }

    pub fn last_used_at(mut self, timestamp: impl Into<String>) -> Self {
        self.last_used_at = Some(timestamp.into());
        self
    }

    /// Update that stores every field of `selection`.
    pub fn from_selection(selection: &TrackSelection) -> Self {
        Self::new()
            .mode(selection.mode)
            .symmetry(f64::from(selection.symmetry.get()))
            .duration(f64::from(selection.duration.minutes()))
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Map a value of the legacy mode key onto mode and symmetry.
fn migrate_legacy_mode(legacy: &str) -> Option<(BreathingMode, SymmetrySeconds)> {
    match legacy {
        "even44" => Some((BreathingMode::Equal, SymmetrySeconds::DEFAULT)),
        "box4444" => Some((BreathingMode::Box4444, SymmetrySeconds::DEFAULT)),
        "relax478" => Some((BreathingMode::Relax478, SymmetrySeconds::DEFAULT)),
        _ => None,
    }
}

/// Only the exact canonical names are accepted from storage; the short
/// aliases the parser allows are for host input.
fn stored_mode(raw: &str) -> Option<BreathingMode> {
    BreathingMode::ALL.into_iter().find(|mode| mode.as_str() == raw)
}

/// Reads and writes [`AppSettings`].
#[derive(Clone)]
pub struct SettingsRepository {
    store: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
}

impl SettingsRepository {
    pub fn new(store: Arc<dyn SettingsStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Load normalized settings. Storage failures degrade to defaults.
    #[instrument(skip(self))]
    pub async fn load(&self) -> AppSettings {
        match self.try_load().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Failed to load settings, using defaults");
                AppSettings::default()
            }
        }
    }

    async fn try_load(&self) -> Result<AppSettings> {
        let raw_mode = self.store.get_string(KEY_MODE).await?;
        let mut mode = raw_mode.as_deref().and_then(stored_mode).unwrap_or_default();
        let mut symmetry = self
            .store
            .get_f64(KEY_SYMMETRY)
            .await?
            .map(SymmetrySeconds::normalize)
            .unwrap_or_default();

        if raw_mode.as_deref().map_or(true, str::is_empty) {
            if let Some(legacy) = self.store.get_string(LEGACY_KEY_MODE).await? {
                match migrate_legacy_mode(&legacy) {
                    Some((legacy_mode, legacy_symmetry)) => {
                        debug!(legacy = %legacy, mode = %legacy_mode, "Migrating legacy mode");
                        mode = legacy_mode;
                        symmetry = legacy_symmetry;
                    }
                    None => debug!(legacy = %legacy, "Ignoring unknown legacy mode"),
                }
            }
        }

        let duration = self
            .store
            .get_f64(KEY_DURATION)
            .await?
            .map(SessionDuration::nearest)
            .unwrap_or_default();

        let selection = TrackSelection::new(mode, symmetry, duration);
        self.write_selection(&selection).await?;
        self.store.delete(OBSOLETE_KEY_VOLUME).await?;

        let install_hint_dismissed = self
            .store
            .get_string(KEY_INSTALL_HINT_DISMISSED)
            .await?
            .is_some_and(|raw| raw == "true");
        let last_used_at = self.store.get_string(KEY_LAST_USED_AT).await?;

        Ok(AppSettings {
            selection,
            install_hint_dismissed,
            last_used_at,
        })
    }

    async fn write_selection(&self, selection: &TrackSelection) -> Result<()> {
        self.store.set_string(KEY_MODE, selection.mode.as_str()).await?;
        self.store
            .set_string(KEY_SYMMETRY, &selection.symmetry.get().to_string())
            .await?;
        self.store
            .set_string(KEY_DURATION, &selection.duration.minutes().to_string())
            .await?;
        Ok(())
    }

    /// Write the fields present in `update`.
    #[instrument(skip(self, update))]
    pub async fn save_settings(&self, update: SettingsUpdate) -> Result<()> {
        if let Some(mode) = update.mode {
            self.store.set_string(KEY_MODE, mode.as_str()).await?;
        }
        if let Some(seconds) = update.symmetry {
            let symmetry = SymmetrySeconds::normalize(seconds);
            self.store
                .set_string(KEY_SYMMETRY, &symmetry.get().to_string())
                .await?;
        }
        if let Some(minutes) = update.duration {
            let duration = SessionDuration::nearest(minutes);
            self.store
                .set_string(KEY_DURATION, &duration.minutes().to_string())
                .await?;
        }
        if let Some(dismissed) = update.install_hint_dismissed {
            self.store
                .set_bool(KEY_INSTALL_HINT_DISMISSED, dismissed)
                .await?;
        }
        if let Some(timestamp) = update.last_used_at.as_deref() {
            if !timestamp.is_empty() {
                self.store.set_string(KEY_LAST_USED_AT, timestamp).await?;
            }
        }
        Ok(())
    }

    /// Stamp `lastUsedAt` with the current time and return the stored value.
    pub async fn touch_last_used(&self) -> Result<String> {
        let timestamp = self
            .clock
            .now()
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        self.save_settings(SettingsUpdate::new().last_used_at(timestamp.clone()))
            .await?;
        Ok(timestamp)
    }
}

impl std::fmt::Debug for SettingsRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsRepository").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_desktop::InMemorySettingsStore;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::time::FixedClock;
    use chrono::{TimeZone, Utc};

    fn repository() -> (Arc<InMemorySettingsStore>, SettingsRepository) {
        let store = Arc::new(InMemorySettingsStore::new());
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 7, 30, 0).unwrap()));
        let repository = SettingsRepository::new(store.clone(), clock);
        (store, repository)
    }

    async fn get(store: &InMemorySettingsStore, key: &str) -> Option<String> {
        store.get_string(key).await.unwrap()
    }

    #[tokio::test]
    async fn test_empty_store_loads_defaults_and_persists_them() {
        let (store, repository) = repository();

        let settings = repository.load().await;

        assert_eq!(settings, AppSettings::default());
        assert_eq!(get(&store, KEY_MODE).await.as_deref(), Some("equal"));
        assert_eq!(get(&store, KEY_SYMMETRY).await.as_deref(), Some("4"));
        assert_eq!(get(&store, KEY_DURATION).await.as_deref(), Some("10"));
    }

    #[tokio::test]
    async fn test_out_of_range_values_are_normalized() {
        let (store, repository) = repository();
        store.set_string(KEY_MODE, "wim-hof").await.unwrap();
        store.set_string(KEY_SYMMETRY, "9.6").await.unwrap();
        store.set_string(KEY_DURATION, "14").await.unwrap();

        let settings = repository.load().await;

        assert_eq!(settings.selection.mode, BreathingMode::Equal);
        assert_eq!(settings.selection.symmetry.get(), 7);
        assert_eq!(settings.selection.duration, SessionDuration::Ten);
        assert_eq!(get(&store, KEY_SYMMETRY).await.as_deref(), Some("7"));
        assert_eq!(get(&store, KEY_DURATION).await.as_deref(), Some("10"));
    }

    #[tokio::test]
    async fn test_duration_tie_goes_to_longer() {
        let (store, repository) = repository();
        store.set_string(KEY_DURATION, "15").await.unwrap();

        let settings = repository.load().await;

        assert_eq!(settings.selection.duration, SessionDuration::Twenty);
    }

    #[tokio::test]
    async fn test_non_numeric_values_fall_back_to_defaults() {
        let (store, repository) = repository();
        store.set_string(KEY_SYMMETRY, "six").await.unwrap();
        store.set_string(KEY_DURATION, "").await.unwrap();

        let settings = repository.load().await;

        assert_eq!(settings.selection.symmetry, SymmetrySeconds::DEFAULT);
        assert_eq!(settings.selection.duration, SessionDuration::Ten);
    }

    #[tokio::test]
    async fn test_legacy_mode_is_migrated_once() {
        let (store, repository) = repository();
        store.set_string(LEGACY_KEY_MODE, "relax478").await.unwrap();
        store.set_string(KEY_SYMMETRY, "6").await.unwrap();

        let settings = repository.load().await;

        assert_eq!(settings.selection.mode, BreathingMode::Relax478);
        assert_eq!(settings.selection.symmetry, SymmetrySeconds::DEFAULT);
        assert_eq!(get(&store, KEY_MODE).await.as_deref(), Some("relax478"));

        // The current key now wins over the legacy one.
        repository
            .save_settings(SettingsUpdate::new().mode(BreathingMode::Box4444))
            .await
            .unwrap();
        assert_eq!(repository.load().await.selection.mode, BreathingMode::Box4444);
    }

    #[tokio::test]
    async fn test_empty_mode_still_migrates_legacy_mode() {
        let (store, repository) = repository();
        store.set_string(KEY_MODE, "").await.unwrap();
        store.set_string(LEGACY_KEY_MODE, "box4444").await.unwrap();

        let settings = repository.load().await;

        assert_eq!(settings.selection.mode, BreathingMode::Box4444);
        assert_eq!(get(&store, KEY_MODE).await.as_deref(), Some("box4444"));
    }

    #[tokio::test]
    async fn test_unknown_legacy_mode_is_ignored() {
        let (store, repository) = repository();
        store.set_string(LEGACY_KEY_MODE, "triangle").await.unwrap();
        store.set_string(KEY_SYMMETRY, "5").await.unwrap();

        let settings = repository.load().await;

        assert_eq!(settings.selection.mode, BreathingMode::Equal);
        assert_eq!(settings.selection.symmetry.get(), 5);
    }

    #[tokio::test]
    async fn test_load_removes_obsolete_volume() {
        let (store, repository) = repository();
        store.set_string(OBSOLETE_KEY_VOLUME, "0.8").await.unwrap();

        repository.load().await;

        assert!(!store.has_key(OBSOLETE_KEY_VOLUME).await.unwrap());
    }

    #[tokio::test]
    async fn test_partial_save_only_touches_given_fields() {
        let (_store, repository) = repository();
        repository
            .save_settings(
                SettingsUpdate::from_selection(&TrackSelection::new(
                    BreathingMode::Equal,
                    SymmetrySeconds::new(6).unwrap(),
                    SessionDuration::Twenty,
                ))
                .install_hint_dismissed(true),
            )
            .await
            .unwrap();
        let before = repository.load().await;

        repository
            .save_settings(SettingsUpdate::new().duration(4.0))
            .await
            .unwrap();
        let after = repository.load().await;

        assert_eq!(after.selection.duration, SessionDuration::Five);
        assert_eq!(after.selection.mode, before.selection.mode);
        assert_eq!(after.selection.symmetry.get(), 6);
        assert!(after.install_hint_dismissed);
        assert_eq!(after.last_used_at, before.last_used_at);
    }

    #[tokio::test]
    async fn test_hint_flag_requires_exact_true() {
        let (store, repository) = repository();
        store
            .set_string(KEY_INSTALL_HINT_DISMISSED, "yes")
            .await
            .unwrap();
        assert!(!repository.load().await.install_hint_dismissed);

        store
            .set_string(KEY_INSTALL_HINT_DISMISSED, "true")
            .await
            .unwrap();
        assert!(repository.load().await.install_hint_dismissed);
    }

    #[tokio::test]
    async fn test_touch_last_used_stamps_clock_time() {
        let (_store, repository) = repository();

        let stamped = repository.touch_last_used().await.unwrap();

        assert_eq!(stamped, "2024-03-01T07:30:00.000Z");
        assert_eq!(
            repository.load().await.last_used_at.as_deref(),
            Some("2024-03-01T07:30:00.000Z")
        );
    }

    struct BrokenStore;

    #[async_trait]
    impl SettingsStore for BrokenStore {
        async fn set_string(&self, _key: &str, _value: &str) -> BridgeResult<()> {
            Err(BridgeError::Storage("read-only".into()))
        }

        async fn get_string(&self, _key: &str) -> BridgeResult<Option<String>> {
            Err(BridgeError::Storage("unavailable".into()))
        }

        async fn delete(&self, _key: &str) -> BridgeResult<()> {
            Err(BridgeError::Storage("read-only".into()))
        }

        async fn list_keys(&self) -> BridgeResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn clear_all(&self) -> BridgeResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_storage_failure_degrades_on_load_and_surfaces_on_save() {
        let repository = SettingsRepository::new(
            Arc::new(BrokenStore),
            Arc::new(bridge_traits::time::SystemClock),
        );

        assert_eq!(repository.load().await, AppSettings::default());
        assert!(repository
            .save_settings(SettingsUpdate::new().install_hint_dismissed(true))
            .await
            .is_err());
    }
}
