//! Player states and the transition table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the session player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    Completed,
    Error,
}

impl PlayerState {
    pub const ALL: [PlayerState; 6] = [
        PlayerState::Idle,
        PlayerState::Loading,
        PlayerState::Playing,
        PlayerState::Paused,
        PlayerState::Completed,
        PlayerState::Error,
    ];

    /// States reachable in one step from `self`.
    pub const fn allowed_transitions(self) -> &'static [PlayerState] {
        use PlayerState::*;
        match self {
            Idle => &[Loading],
            Loading => &[Playing, Error, Idle],
            Playing => &[Paused, Completed, Idle, Error],
            Paused => &[Playing, Idle, Error],
            Completed => &[Idle, Loading],
            Error => &[Idle, Loading],
        }
    }

    pub fn can_transition_to(self, next: PlayerState) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// States from which `stop` forces `Idle`.
    pub fn is_stoppable(self) -> bool {
        !matches!(self, PlayerState::Idle)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayerState::Idle => "idle",
            PlayerState::Loading => "loading",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
            PlayerState::Completed => "completed",
            PlayerState::Error => "error",
        }
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PlayerState::*;

    #[test]
    fn test_transition_table() {
        let expected: [(PlayerState, &[PlayerState]); 6] = [
            (Idle, &[Loading]),
            (Loading, &[Playing, Error, Idle]),
            (Playing, &[Paused, Completed, Idle, Error]),
            (Paused, &[Playing, Idle, Error]),
            (Completed, &[Idle, Loading]),
            (Error, &[Idle, Loading]),
        ];

        for (from, allowed) in expected {
            for to in PlayerState::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&to),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_no_self_transitions() {
        for state in PlayerState::ALL {
            assert!(!state.can_transition_to(state));
        }
    }

    #[test]
    fn test_stoppable_states() {
        assert!(!Idle.is_stoppable());
        for state in [Loading, Playing, Paused, Completed, Error] {
            assert!(state.is_stoppable());
            assert!(state.can_transition_to(Idle));
        }
    }

    #[test]
    fn test_state_names_and_default() {
        assert_eq!(Completed.as_str(), "completed");
        assert_eq!(PlayerState::default(), Idle);
    }
}
