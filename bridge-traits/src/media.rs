//! Media transport bridge.
//!
//! The host owns the actual audio element (an `HTMLAudioElement`, an
//! AVPlayer, a rodio sink). The core drives it through [`MediaTransport`] and
//! receives its notifications as [`TransportEvent`] values, delivered one at a
//! time by the host.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a play request was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// The platform refused to start audio without a user gesture
    /// (autoplay policy).
    #[error("Playback not allowed by platform policy")]
    NotAllowed,

    #[error("Playback failed: {0}")]
    Failed(String),
}

/// Low-level notifications emitted by the host transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportEvent {
    /// Duration and dimensions are known.
    LoadedMetadata,
    /// Enough data is buffered to begin playing.
    CanPlay,
    /// Playback started or resumed.
    Play,
    /// Playback paused, for any reason.
    Pause,
    /// The resource played to its end.
    Ended,
    /// Periodic position progress.
    TimeUpdate,
    /// Loading or decoding failed.
    Error,
}

impl TransportEvent {
    /// Events that indicate the resource is ready to play.
    pub fn is_ready_signal(&self) -> bool {
        matches!(self, TransportEvent::LoadedMetadata | TransportEvent::CanPlay)
    }
}

/// Single-resource audio transport provided by the host.
///
/// Position and duration are in seconds. `duration` returns a non-finite
/// value (NaN or infinity) while unknown, matching media element semantics.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    /// Replace the current source and begin loading it.
    fn load(&self, src: &str);

    /// Request playback. Resolves once the platform accepted or refused.
    async fn play(&self) -> Result<(), MediaError>;

    /// Request a pause. The host reports it later as [`TransportEvent::Pause`].
    fn pause(&self);

    fn is_paused(&self) -> bool;

    fn has_ended(&self) -> bool;

    fn current_time(&self) -> f64;

    fn set_current_time(&self, seconds: f64);

    fn duration(&self) -> f64;
}
