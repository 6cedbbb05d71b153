//! Notifications published by the session player.

use serde::{Deserialize, Serialize};

use core_runtime::events::{EventSeverity, Severity};

use crate::state::PlayerState;

/// Loading progress of the current track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackStatus {
    pub src: String,
    pub ready: bool,
    pub loading: bool,
    /// Known once the track is ready; `None` while the transport reports a
    /// non-finite duration.
    pub duration_secs: Option<f64>,
    pub error_message: Option<String>,
}

impl TrackStatus {
    pub fn loading(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            ready: false,
            loading: true,
            duration_secs: None,
            error_message: None,
        }
    }

    pub fn ready(src: impl Into<String>, duration_secs: f64) -> Self {
        Self {
            src: src.into(),
            ready: true,
            loading: false,
            duration_secs: duration_secs.is_finite().then_some(duration_secs),
            error_message: None,
        }
    }

    pub fn failed(src: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            ready: false,
            loading: false,
            duration_secs: None,
            error_message: Some(message.into()),
        }
    }
}

/// Position report, safe to poll in any state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeSnapshot {
    pub current_time_secs: f64,
    /// Zero until the duration is known.
    pub duration_secs: f64,
    /// Never negative.
    pub remaining_secs: f64,
}

impl TimeSnapshot {
    /// Build a snapshot from raw transport readings.
    pub fn from_transport(current_time: f64, duration: f64) -> Self {
        let duration_secs = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        let current_time_secs = if current_time.is_finite() { current_time.max(0.0) } else { 0.0 };
        Self {
            current_time_secs,
            duration_secs,
            remaining_secs: (duration_secs - current_time_secs).max(0.0),
        }
    }
}

/// A validated state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub state: PlayerState,
    pub message: Option<String>,
    /// Set on transitions to `Paused`: `true` when something other than the
    /// operator paused playback.
    pub interrupted: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum PlayerEvent {
    TrackStatus(TrackStatus),
    TimeUpdate(TimeSnapshot),
    StateChanged(StateChange),
}

impl PlayerEvent {
    pub fn as_state_change(&self) -> Option<&StateChange> {
        match self {
            PlayerEvent::StateChanged(change) => Some(change),
            _ => None,
        }
    }

    pub fn as_track_status(&self) -> Option<&TrackStatus> {
        match self {
            PlayerEvent::TrackStatus(status) => Some(status),
            _ => None,
        }
    }
}

impl Severity for PlayerEvent {
    fn severity(&self) -> EventSeverity {
        match self {
            PlayerEvent::TimeUpdate(_) => EventSeverity::Debug,
            PlayerEvent::TrackStatus(status) if status.error_message.is_some() => {
                EventSeverity::Error
            }
            PlayerEvent::StateChanged(StateChange {
                state: PlayerState::Error,
                ..
            }) => EventSeverity::Error,
            PlayerEvent::StateChanged(StateChange {
                interrupted: Some(true),
                ..
            }) => EventSeverity::Warning,
            _ => EventSeverity::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_never_negative() {
        let unknown = TimeSnapshot::from_transport(3.0, f64::NAN);
        assert_eq!(unknown.duration_secs, 0.0);
        assert_eq!(unknown.remaining_secs, 0.0);

        let overrun = TimeSnapshot::from_transport(301.0, 300.0);
        assert_eq!(overrun.remaining_secs, 0.0);

        let midway = TimeSnapshot::from_transport(100.0, 300.0);
        assert_eq!(midway.remaining_secs, 200.0);
    }

    #[test]
    fn test_ready_status_drops_unknown_duration() {
        assert_eq!(TrackStatus::ready("a.mp3", f64::INFINITY).duration_secs, None);
        assert_eq!(TrackStatus::ready("a.mp3", 300.0).duration_secs, Some(300.0));
    }

    #[test]
    fn test_interruption_is_a_warning() {
        let event = PlayerEvent::StateChanged(StateChange {
            state: PlayerState::Paused,
            message: None,
            interrupted: Some(true),
        });
        assert_eq!(event.severity(), EventSeverity::Warning);
        assert_eq!(
            PlayerEvent::TimeUpdate(TimeSnapshot::default()).severity(),
            EventSeverity::Debug
        );
    }
}
