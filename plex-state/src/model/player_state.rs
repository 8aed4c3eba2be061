//! Player state enumeration

use serde::{Deserialize, Serialize};

/// Display state of a player entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerState {
    Playing,
    Paused,
    Buffering,
    /// No session, or a state Plex reports that we do not map
    #[default]
    Idle,
}

impl PlayerState {
    /// Parse the `state` attribute of a session player
    pub fn from_session_state(state: &str) -> Self {
        match state {
            "playing" => PlayerState::Playing,
            "paused" => PlayerState::Paused,
            "buffering" => PlayerState::Buffering,
            _ => PlayerState::Idle,
        }
    }

    /// Whether a position reported in this state is meaningful
    pub fn has_position(&self) -> bool {
        matches!(self, PlayerState::Playing | PlayerState::Paused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_session_state() {
        assert_eq!(PlayerState::from_session_state("playing"), PlayerState::Playing);
        assert_eq!(PlayerState::from_session_state("paused"), PlayerState::Paused);
        assert_eq!(PlayerState::from_session_state("buffering"), PlayerState::Buffering);
        assert_eq!(PlayerState::from_session_state("stopped"), PlayerState::Idle);
        assert_eq!(PlayerState::from_session_state(""), PlayerState::Idle);
    }

    #[test]
    fn test_has_position() {
        assert!(PlayerState::Playing.has_position());
        assert!(PlayerState::Paused.has_position());
        assert!(!PlayerState::Buffering.has_position());
        assert!(!PlayerState::Idle.has_position());
    }

    #[test]
    fn test_default_is_idle() {
        assert_eq!(PlayerState::default(), PlayerState::Idle);
    }
}
