//! Two-player networked battleship: one authority process that owns all
//! boards, pairs players through a FIFO queue or private lobby codes,
//! resolves moves, and pushes masked per-player views after every state
//! change, plus a terminal client to play it with.

mod board;
pub mod client;
mod common;
mod config;
mod fleet;
mod logging;
mod matchmaker;
pub mod protocol;
pub mod server;
mod session;
pub mod transport;

pub use board::{Board, Cell, Grid};
pub use common::{GameError, PlacementFault, PlayerId, SessionId, ShotOutcome};
pub use config::*;
pub use fleet::{random_fleet, validate_fleet, Orientation, Placement};
pub use logging::init_logging;
pub use matchmaker::{Matchmaker, Pair};
pub use session::{MoveOutcome, Outcome, Phase, PlayerView, Seat, Session};
