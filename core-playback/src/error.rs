//! # Playback Error Types
//!
//! Errors for the fallible helpers of this crate. Player commands never
//! return errors: transport failures become the `error` state plus a
//! user-facing message.

use bridge_traits::MediaError;
use thiserror::Error;

/// Errors that can occur around playback.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Track Selection Errors
    // ========================================================================
    /// Breathing mode name is not in the catalogue.
    #[error("Unknown breathing mode: {0}")]
    UnknownMode(String),

    /// Symmetry seconds outside the supported range.
    #[error("Unsupported symmetry: {0} seconds")]
    UnsupportedSymmetry(u8),

    /// Session duration is not one of the catalogue durations.
    #[error("Unsupported session duration: {0} minutes")]
    UnsupportedDuration(u32),

    // ========================================================================
    // Addressing Errors
    // ========================================================================
    /// Track URL could not be resolved against the deployment scope.
    #[error("Invalid track URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// The host transport refused or failed a request.
    #[error("Transport error: {0}")]
    Transport(#[from] MediaError),
}

impl PlaybackError {
    /// Returns true if this error concerns the track selection rather than
    /// the host.
    pub fn is_selection_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::UnknownMode(_)
                | PlaybackError::UnsupportedSymmetry(_)
                | PlaybackError::UnsupportedDuration(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
