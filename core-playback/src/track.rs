//! # Track Catalogue
//!
//! Every session track is addressed by a deterministic filename derived from
//! the breathing mode, the symmetry seconds (equal mode only) and the session
//! duration. Resolution is pure and total over the valid selection domain.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{PlaybackError, Result};

/// Directory under the deployment scope that holds the tracks.
pub const AUDIO_DIRECTORY: &str = "audio/";

/// Breathing pattern of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BreathingMode {
    /// Inhale and exhale of equal length.
    #[default]
    #[serde(rename = "equal")]
    Equal,
    /// Box breathing, four phases of four seconds.
    #[serde(rename = "box4444")]
    Box4444,
    /// 4-7-8 relaxation breathing.
    #[serde(rename = "relax478")]
    Relax478,
}

impl BreathingMode {
    pub const ALL: [BreathingMode; 3] = [
        BreathingMode::Equal,
        BreathingMode::Box4444,
        BreathingMode::Relax478,
    ];

    /// Storage identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            BreathingMode::Equal => "equal",
            BreathingMode::Box4444 => "box4444",
            BreathingMode::Relax478 => "relax478",
        }
    }

    /// Whether the symmetry seconds change the track.
    pub fn uses_symmetry(self) -> bool {
        matches!(self, BreathingMode::Equal)
    }
}

impl fmt::Display for BreathingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BreathingMode {
    type Err = PlaybackError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "equal" => Ok(BreathingMode::Equal),
            "box4444" | "box" => Ok(BreathingMode::Box4444),
            "relax478" | "relax" => Ok(BreathingMode::Relax478),
            other => Err(PlaybackError::UnknownMode(other.to_string())),
        }
    }
}

/// Seconds per inhale/exhale phase in equal mode, always within
/// [`SymmetrySeconds::MIN`]..=[`SymmetrySeconds::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SymmetrySeconds(u8);

impl SymmetrySeconds {
    pub const MIN: u8 = 4;
    pub const MAX: u8 = 7;
    pub const DEFAULT: SymmetrySeconds = SymmetrySeconds(4);

    pub fn new(seconds: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&seconds) {
            Ok(Self(seconds))
        } else {
            Err(PlaybackError::UnsupportedSymmetry(seconds))
        }
    }

    /// Round and clamp any value into range. Non-finite input yields the
    /// default.
    pub fn normalize(value: f64) -> Self {
        if !value.is_finite() {
            return Self::DEFAULT;
        }
        let rounded = value.round().clamp(f64::from(Self::MIN), f64::from(Self::MAX));
        Self(rounded as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = SymmetrySeconds> {
        (Self::MIN..=Self::MAX).map(SymmetrySeconds)
    }
}

impl Default for SymmetrySeconds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for SymmetrySeconds {
    type Error = PlaybackError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SymmetrySeconds> for u8 {
    fn from(value: SymmetrySeconds) -> Self {
        value.0
    }
}

/// Session length in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum SessionDuration {
    Five,
    #[default]
    Ten,
    Twenty,
}

impl SessionDuration {
    pub const ALL: [SessionDuration; 3] = [
        SessionDuration::Five,
        SessionDuration::Ten,
        SessionDuration::Twenty,
    ];

    pub fn minutes(self) -> u32 {
        match self {
            SessionDuration::Five => 5,
            SessionDuration::Ten => 10,
            SessionDuration::Twenty => 20,
        }
    }

    pub fn from_minutes(minutes: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.minutes() == minutes)
            .ok_or(PlaybackError::UnsupportedDuration(minutes))
    }

    /// The catalogue duration closest to `minutes`; ties go to the longer
    /// one. Non-finite input yields the default.
    pub fn nearest(minutes: f64) -> Self {
        if !minutes.is_finite() {
            return Self::default();
        }

        let mut best = Self::ALL[0];
        let mut best_diff = (minutes - f64::from(best.minutes())).abs();
        for candidate in Self::ALL.into_iter().skip(1) {
            let diff = (minutes - f64::from(candidate.minutes())).abs();
            if diff < best_diff || (diff == best_diff && candidate > best) {
                best = candidate;
                best_diff = diff;
            }
        }
        best
    }
}

impl TryFrom<u32> for SessionDuration {
    type Error = PlaybackError;

    fn try_from(value: u32) -> Result<Self> {
        Self::from_minutes(value)
    }
}

impl From<SessionDuration> for u32 {
    fn from(value: SessionDuration) -> Self {
        value.minutes()
    }
}

/// The three parameters that pick a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TrackSelection {
    pub mode: BreathingMode,
    pub symmetry: SymmetrySeconds,
    pub duration: SessionDuration,
}

impl TrackSelection {
    pub fn new(mode: BreathingMode, symmetry: SymmetrySeconds, duration: SessionDuration) -> Self {
        Self {
            mode,
            symmetry,
            duration,
        }
    }

    /// Track filename, e.g. `even-55-20m.mp3` or `box-4444-10m.mp3`.
    pub fn filename(&self) -> String {
        resolve_track_filename(self)
    }

    /// Display label of the breathing pattern.
    pub fn label(&self) -> String {
        match self.mode {
            BreathingMode::Equal => format!("{}-{}", self.symmetry.get(), self.symmetry.get()),
            BreathingMode::Box4444 => "Box 4-4-4-4".to_string(),
            BreathingMode::Relax478 => "4-7-8".to_string(),
        }
    }
}

/// Resolve the filename of a selection.
///
/// ```
/// use core_playback::track::*;
///
/// let box_ten = TrackSelection::new(
///     BreathingMode::Box4444,
///     SymmetrySeconds::default(),
///     SessionDuration::Ten,
/// );
/// assert_eq!(resolve_track_filename(&box_ten), "box-4444-10m.mp3");
/// ```
pub fn resolve_track_filename(selection: &TrackSelection) -> String {
    let minutes = selection.duration.minutes();
    match selection.mode {
        BreathingMode::Equal => {
            let s = selection.symmetry.get();
            format!("even-{}{}-{}m.mp3", s, s, minutes)
        }
        BreathingMode::Box4444 => format!("box-4444-{}m.mp3", minutes),
        BreathingMode::Relax478 => format!("relax-478-{}m.mp3", minutes),
    }
}

/// Absolute URL of a track under the deployment scope.
pub fn track_url(scope: &str, selection: &TrackSelection) -> Result<String> {
    let invalid = |reason: String| PlaybackError::InvalidUrl {
        url: scope.to_string(),
        reason,
    };

    let base = Url::parse(scope).map_err(|e| invalid(e.to_string()))?;
    let url = base
        .join(AUDIO_DIRECTORY)
        .and_then(|dir| dir.join(&selection.filename()))
        .map_err(|e| invalid(e.to_string()))?;
    Ok(url.into())
}

/// Every selection in the catalogue, equal mode once per symmetry value.
pub fn catalogue() -> Vec<TrackSelection> {
    let mut selections = Vec::new();
    for mode in BreathingMode::ALL {
        for duration in SessionDuration::ALL {
            if mode.uses_symmetry() {
                for symmetry in SymmetrySeconds::all() {
                    selections.push(TrackSelection::new(mode, symmetry, duration));
                }
            } else {
                selections.push(TrackSelection::new(mode, SymmetrySeconds::DEFAULT, duration));
            }
        }
    }
    selections
}

/// Filenames a complete deployment must contain, sorted.
pub fn expected_track_filenames() -> Vec<String> {
    let mut names: Vec<String> = catalogue().iter().map(TrackSelection::filename).collect();
    names.sort();
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_resolution() {
        let box_ten = TrackSelection::new(
            "box".parse().unwrap(),
            SymmetrySeconds::default(),
            SessionDuration::Ten,
        );
        assert_eq!(resolve_track_filename(&box_ten), "box-4444-10m.mp3");

        let equal_five = TrackSelection::new(
            BreathingMode::Equal,
            SymmetrySeconds::new(5).unwrap(),
            SessionDuration::Twenty,
        );
        assert_eq!(resolve_track_filename(&equal_five), "even-55-20m.mp3");

        let relax = TrackSelection::new(
            BreathingMode::Relax478,
            SymmetrySeconds::new(7).unwrap(),
            SessionDuration::Five,
        );
        assert_eq!(relax.filename(), "relax-478-5m.mp3");
    }

    #[test]
    fn test_symmetry_ignored_outside_equal_mode() {
        let a = TrackSelection::new(
            BreathingMode::Box4444,
            SymmetrySeconds::new(4).unwrap(),
            SessionDuration::Five,
        );
        let b = TrackSelection {
            symmetry: SymmetrySeconds::new(6).unwrap(),
            ..a
        };
        assert_eq!(a.filename(), b.filename());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("equal".parse::<BreathingMode>().unwrap(), BreathingMode::Equal);
        assert_eq!("relax".parse::<BreathingMode>().unwrap(), BreathingMode::Relax478);
        assert_eq!("box4444".parse::<BreathingMode>().unwrap(), BreathingMode::Box4444);
        assert!(matches!(
            "even44".parse::<BreathingMode>(),
            Err(PlaybackError::UnknownMode(_))
        ));
    }

    #[test]
    fn test_symmetry_normalization() {
        assert_eq!(SymmetrySeconds::normalize(2.0).get(), 4);
        assert_eq!(SymmetrySeconds::normalize(5.4).get(), 5);
        assert_eq!(SymmetrySeconds::normalize(5.5).get(), 6);
        assert_eq!(SymmetrySeconds::normalize(30.0).get(), 7);
        assert_eq!(SymmetrySeconds::normalize(f64::NAN).get(), 4);
        assert!(SymmetrySeconds::new(8).is_err());
    }

    #[test]
    fn test_duration_nearest() {
        assert_eq!(SessionDuration::nearest(0.0), SessionDuration::Five);
        assert_eq!(SessionDuration::nearest(7.0), SessionDuration::Five);
        assert_eq!(SessionDuration::nearest(7.5), SessionDuration::Ten);
        assert_eq!(SessionDuration::nearest(15.0), SessionDuration::Twenty);
        assert_eq!(SessionDuration::nearest(14.0), SessionDuration::Ten);
        assert_eq!(SessionDuration::nearest(90.0), SessionDuration::Twenty);
        assert_eq!(SessionDuration::nearest(f64::INFINITY), SessionDuration::Ten);
    }

    #[test]
    fn test_track_url() {
        let selection = TrackSelection::default();
        assert_eq!(
            track_url("https://example.com/breathe/", &selection).unwrap(),
            "https://example.com/breathe/audio/even-44-10m.mp3"
        );
        assert!(track_url("relative/", &selection).is_err());
    }

    #[test]
    fn test_catalogue_is_complete() {
        let names = expected_track_filenames();
        assert_eq!(names.len(), 18);
        assert!(names.contains(&"even-77-20m.mp3".to_string()));
        assert!(names.contains(&"relax-478-10m.mp3".to_string()));
    }

    #[test]
    fn test_labels() {
        let equal = TrackSelection::new(
            BreathingMode::Equal,
            SymmetrySeconds::new(6).unwrap(),
            SessionDuration::Ten,
        );
        assert_eq!(equal.label(), "6-6");
        assert_eq!(
            TrackSelection {
                mode: BreathingMode::Box4444,
                ..equal
            }
            .label(),
            "Box 4-4-4-4"
        );
    }
}
