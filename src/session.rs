//! The match state machine: two boards, one turn indicator, victory and
//! abandonment detection.

use crate::board::{Board, Grid};
use crate::common::{GameError, PlayerId, SessionId, ShotOutcome};
use crate::fleet::Placement;

/// One of the two sides of a session. Seat `A` is the player who was
/// waiting (queue head or lobby creator); seat `B` completed the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    A,
    B,
}

impl Seat {
    pub fn other(self) -> Seat {
        match self {
            Seat::A => Seat::B,
            Seat::B => Seat::A,
        }
    }

    fn index(self) -> usize {
        match self {
            Seat::A => 0,
            Seat::B => 1,
        }
    }
}

/// How a finished session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `winner` sank the opposing fleet.
    Victory(Seat),
    /// The named seat disconnected mid-game; the other side stands.
    Abandoned(Seat),
}

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for one or both fleets to be placed.
    AwaitingFleets,
    /// Game in progress; `turn` names the seat allowed to move.
    Active { turn: Seat },
    Finished(Outcome),
}

/// Result of an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub shot: ShotOutcome,
    /// Set when this move sank the last ship cell.
    pub winner: Option<Seat>,
}

/// What one participant is allowed to see after a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerView {
    pub my_board: Grid,
    pub opponent_view_board: Grid,
    pub is_my_turn: bool,
}

/// One two-player match. Created by the matchmaker, fed both fleets, then
/// driven exclusively through [`Session::resolve_move`] until finished.
pub struct Session {
    id: SessionId,
    players: [PlayerId; 2],
    names: [String; 2],
    boards: [Option<Board>; 2],
    phase: Phase,
}

impl Session {
    /// Create a session awaiting both fleets. `first` waited in the queue
    /// or lobby; `second` completed the pair.
    pub fn new(id: SessionId, first: (PlayerId, String), second: (PlayerId, String)) -> Self {
        Self {
            id,
            players: [first.0, second.0],
            names: [first.1, second.1],
            boards: [None, None],
            phase: Phase::AwaitingFleets,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Both participants, seat A first.
    pub fn players(&self) -> [PlayerId; 2] {
        self.players
    }

    pub fn player(&self, seat: Seat) -> PlayerId {
        self.players[seat.index()]
    }

    pub fn name(&self, seat: Seat) -> &str {
        &self.names[seat.index()]
    }

    /// Which seat `player` occupies, if a participant at all.
    pub fn seat_of(&self, player: PlayerId) -> Option<Seat> {
        if player == self.players[0] {
            Some(Seat::A)
        } else if player == self.players[1] {
            Some(Seat::B)
        } else {
            None
        }
    }

    /// Validate and install one seat's fleet. Once both fleets are in, the
    /// session becomes active with seat B to move: the player who completed
    /// matchmaking second moves first.
    pub fn place_fleet(&mut self, seat: Seat, placements: &[Placement]) -> Result<(), GameError> {
        let board = Board::place_fleet(placements)?;
        self.boards[seat.index()] = Some(board);
        if self.phase == Phase::AwaitingFleets && self.boards.iter().all(|b| b.is_some()) {
            self.phase = Phase::Active { turn: Seat::B };
        }
        Ok(())
    }

    fn board(&self, seat: Seat) -> &Board {
        self.boards[seat.index()]
            .as_ref()
            .expect("board queried before fleet placement")
    }

    /// Resolve `actor` firing at (`row`, `col`) on the opposing board.
    ///
    /// Validation precedes mutation: a rejected move leaves the session
    /// bit-for-bit unchanged and the turn does not flip, so the actor may
    /// retry. Repeat and out-of-range cells both surface as
    /// `InvalidTarget`; moving in any phase other than one's own active
    /// turn is `NotYourTurn`.
    pub fn resolve_move(
        &mut self,
        actor: Seat,
        row: usize,
        col: usize,
    ) -> Result<MoveOutcome, GameError> {
        match self.phase {
            Phase::Active { turn } if turn == actor => {}
            _ => return Err(GameError::NotYourTurn),
        }
        let target = self.boards[actor.other().index()]
            .as_mut()
            .expect("active session is missing a board");
        let shot = target.apply_shot(row, col).map_err(|e| match e {
            GameError::OutOfBounds | GameError::AlreadyShot => GameError::InvalidTarget,
            other => other,
        })?;
        if target.is_defeated() {
            self.phase = Phase::Finished(Outcome::Victory(actor));
            return Ok(MoveOutcome {
                shot,
                winner: Some(actor),
            });
        }
        self.phase = Phase::Active {
            turn: actor.other(),
        };
        Ok(MoveOutcome { shot, winner: None })
    }

    /// Build `seat`'s view: own board unmasked, opponent's masked, plus the
    /// turn flag. Masking is recomputed here on every call.
    pub fn view(&self, seat: Seat) -> PlayerView {
        PlayerView {
            my_board: self.board(seat).view_for(true),
            opponent_view_board: self.board(seat.other()).view_for(false),
            is_my_turn: matches!(self.phase, Phase::Active { turn } if turn == seat),
        }
    }

    /// The opposing board with nothing hidden; sent only alongside game
    /// over so the client can show the final layout.
    pub fn reveal_opponent(&self, seat: Seat) -> Grid {
        self.board(seat.other()).view_for(true)
    }

    /// Terminal transition for a mid-game disconnect by `leaver`.
    pub fn abandon(&mut self, leaver: Seat) {
        if !self.is_finished() {
            self.phase = Phase::Finished(Outcome::Abandoned(leaver));
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished(_))
    }

    /// The victorious seat, if the game ended by sinking a fleet.
    pub fn winner(&self) -> Option<Seat> {
        match self.phase {
            Phase::Finished(Outcome::Victory(seat)) => Some(seat),
            _ => None,
        }
    }
}
