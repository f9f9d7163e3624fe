use serde::{Deserialize, Serialize};
use std::fmt;

/// Room lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Waiting for the second player
    #[default]
    Waiting,
    /// Both seats taken; the game may be running
    Active,
    /// Game over, history retained
    Finished,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RoomStatus {
    /// Convert from database string representation
    #[allow(clippy::should_implement_trait)]
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "waiting" => Some(Self::Waiting),
            "active" => Some(Self::Active),
            "finished" => Some(Self::Finished),
            _ => None,
        }
    }

    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Finished => "finished",
        }
    }

    /// Check if a second player may still take a seat
    #[must_use]
    pub const fn can_join(&self) -> bool {
        matches!(self, Self::Waiting)
    }
}

/// Per-turn phase of a room.
///
/// Rooms move `waiting → event → planning → commit → resolve → review`, and
/// from `review` back to `planning` when the next turn opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoomPhase {
    #[default]
    Waiting,
    Event,
    Planning,
    Commit,
    Resolve,
    Review,
}

impl fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RoomPhase {
    /// Convert from database string representation
    #[allow(clippy::should_implement_trait)]
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "waiting" => Some(Self::Waiting),
            "event" => Some(Self::Event),
            "planning" => Some(Self::Planning),
            "commit" => Some(Self::Commit),
            "resolve" => Some(Self::Resolve),
            "review" => Some(Self::Review),
            _ => None,
        }
    }

    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Event => "event",
            Self::Planning => "planning",
            Self::Commit => "commit",
            Self::Resolve => "resolve",
            Self::Review => "review",
        }
    }

    /// Whether the machine allows moving from `self` to `next`.
    ///
    /// `resolve → commit` is the rollback taken when a resolution fails.
    #[must_use]
    pub const fn can_advance_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Waiting, Self::Event)
                | (Self::Event, Self::Planning)
                | (Self::Planning, Self::Commit)
                | (Self::Commit, Self::Resolve)
                | (Self::Resolve, Self::Review | Self::Commit)
                | (Self::Review, Self::Planning)
        )
    }

    /// Check if planned actions are accepted
    #[must_use]
    pub const fn accepts_submissions(&self) -> bool {
        matches!(self, Self::Planning | Self::Commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_str() {
        assert_eq!(RoomStatus::from_str("waiting"), Some(RoomStatus::Waiting));
        assert_eq!(RoomStatus::from_str("ACTIVE"), Some(RoomStatus::Active));
        assert_eq!(RoomStatus::from_str("finished"), Some(RoomStatus::Finished));
        assert_eq!(RoomStatus::from_str("lobby"), None);
    }

    #[test]
    fn test_status_can_join() {
        assert!(RoomStatus::Waiting.can_join());
        assert!(!RoomStatus::Active.can_join());
        assert!(!RoomStatus::Finished.can_join());
    }

    #[test]
    fn test_phase_round_trips_through_str() {
        for phase in [
            RoomPhase::Waiting,
            RoomPhase::Event,
            RoomPhase::Planning,
            RoomPhase::Commit,
            RoomPhase::Resolve,
            RoomPhase::Review,
        ] {
            assert_eq!(RoomPhase::from_str(phase.as_str()), Some(phase));
        }
    }

    #[test]
    fn test_phase_sequence() {
        assert!(RoomPhase::Waiting.can_advance_to(RoomPhase::Event));
        assert!(RoomPhase::Event.can_advance_to(RoomPhase::Planning));
        assert!(RoomPhase::Planning.can_advance_to(RoomPhase::Commit));
        assert!(RoomPhase::Commit.can_advance_to(RoomPhase::Resolve));
        assert!(RoomPhase::Resolve.can_advance_to(RoomPhase::Review));
        assert!(RoomPhase::Review.can_advance_to(RoomPhase::Planning));
    }

    #[test]
    fn test_phase_rejects_skips() {
        assert!(!RoomPhase::Waiting.can_advance_to(RoomPhase::Planning));
        assert!(!RoomPhase::Planning.can_advance_to(RoomPhase::Resolve));
        assert!(!RoomPhase::Review.can_advance_to(RoomPhase::Commit));
        assert!(!RoomPhase::Commit.can_advance_to(RoomPhase::Commit));
    }

    #[test]
    fn test_accepts_submissions() {
        assert!(RoomPhase::Planning.accepts_submissions());
        assert!(RoomPhase::Commit.accepts_submissions());
        assert!(!RoomPhase::Resolve.accepts_submissions());
        assert!(!RoomPhase::Review.accepts_submissions());
    }

    #[test]
    fn test_default() {
        assert_eq!(RoomStatus::default(), RoomStatus::Waiting);
        assert_eq!(RoomPhase::default(), RoomPhase::Waiting);
    }
}
