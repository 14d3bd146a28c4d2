//! Identifiers, shot outcomes, and the error taxonomy shared across the crate.

use serde::{Deserialize, Serialize};

/// Identifies one connected player for the lifetime of its connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u64);

/// Identifies one session; travels on the wire as the `room_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

/// Result of an accepted shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotOutcome {
    /// Shot struck a ship cell.
    Hit,
    /// Shot landed in open water.
    Miss,
}

/// Why a proposed fleet was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementFault {
    /// A ship extends past the edge of the grid.
    OutOfBounds,
    /// Two ships occupy the same cell.
    Overlap,
    /// Ship lengths do not match the required multiset.
    WrongLengths,
    /// Fewer or more ships than the fleet requires.
    WrongCount,
}

/// Errors returned by game operations. All are recoverable client-input
/// errors; none terminate the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    /// A fleet failed validation, carrying the specific fault.
    InvalidPlacement(PlacementFault),
    /// Shot coordinates outside the grid.
    OutOfBounds,
    /// Cell was already fired upon; board state is unchanged.
    AlreadyShot,
    /// Move submitted by the player not holding the turn.
    NotYourTurn,
    /// Move target rejected by the session (repeat or out-of-range cell).
    InvalidTarget,
    /// No outstanding lobby with that code.
    LobbyNotFound,
    /// Lobby code was already consumed by another joiner.
    LobbyFull,
    /// Player is inside an active session and cannot re-enter matchmaking.
    AlreadyInGame,
}

impl core::fmt::Display for PlacementFault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PlacementFault::OutOfBounds => write!(f, "a ship extends past the edge of the board"),
            PlacementFault::Overlap => write!(f, "two ships overlap"),
            PlacementFault::WrongLengths => {
                write!(f, "ship lengths do not match the standard fleet")
            }
            PlacementFault::WrongCount => write!(f, "a fleet must have exactly five ships"),
        }
    }
}

impl core::fmt::Display for GameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            GameError::InvalidPlacement(fault) => write!(f, "Invalid fleet placement: {}", fault),
            GameError::OutOfBounds => write!(f, "Coordinates are outside the board"),
            GameError::AlreadyShot => write!(f, "That cell was already fired upon"),
            GameError::NotYourTurn => write!(f, "It is not your turn"),
            GameError::InvalidTarget => write!(f, "Invalid target cell"),
            GameError::LobbyNotFound => write!(f, "No lobby exists with that code"),
            GameError::LobbyFull => write!(f, "That lobby is already full"),
            GameError::AlreadyInGame => write!(f, "You are already in a game"),
        }
    }
}

impl std::error::Error for GameError {}
