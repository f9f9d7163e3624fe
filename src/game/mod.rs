//! Data Architect simulation engine.
//!
//! Pure and deterministic: given the same state, event choice and planned
//! actions, resolution always yields the same next state. All randomness is
//! derived from the room seed.

pub mod engine;
pub mod events;
pub mod map;
pub mod rng;
pub mod scenario;
pub mod types;

pub use engine::{
    available_actions, build_moves, initialize, resolve_turn, validate_submission,
    MAX_ACTIONS_PER_TURN,
};
pub use scenario::Scenario;
pub use types::{ActionInput, ActionType, GameEvent, GameState, Role, TurnResolution};

use thiserror::Error;

/// Rule violations detected while validating or resolving actions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("Unknown action type: {0}")]
    UnknownAction(String),

    #[error("{action} is not a {role} action")]
    WrongRole { action: String, role: Role },

    #[error("{action} is not available right now")]
    Unavailable { action: String },

    #[error("{0} requires a target node")]
    MissingTarget(String),

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("{action} requires parameter '{parameter}'")]
    MissingParameter { action: String, parameter: String },

    #[error("At most {0} actions may be submitted per turn")]
    TooManyActions(usize),

    #[error("Unknown event choice: {0}")]
    UnknownEventChoice(String),

    #[error("The game is already over")]
    GameOver,
}
