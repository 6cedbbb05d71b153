//! # Session Playback
//!
//! Playback state machine for guided breathing sessions.
//!
//! ## Overview
//!
//! This crate handles:
//! - The player lifecycle (`idle`, `loading`, `playing`, `paused`,
//!   `completed`, `error`) and its transition table
//! - Translation of host transport notifications into validated transitions
//! - Track-status, time-update and state-change notifications
//! - Deterministic track addressing from a mode/symmetry/duration selection

pub mod error;
pub mod events;
pub mod player;
pub mod state;
pub mod time;
pub mod track;

pub use error::{PlaybackError, Result};
pub use events::{PlayerEvent, StateChange, TimeSnapshot, TrackStatus};
pub use player::{SessionPlayer, LOAD_ERROR_MESSAGE, PLAY_BLOCKED_MESSAGE, PLAY_FAILED_MESSAGE};
pub use state::PlayerState;
pub use track::{
    expected_track_filenames, resolve_track_filename, track_url, BreathingMode, SessionDuration,
    SymmetrySeconds, TrackSelection,
};
