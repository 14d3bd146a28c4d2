//! The message vocabulary exchanged between clients and the authority.

use serde::{Deserialize, Serialize};

use crate::board::Grid;
use crate::common::SessionId;

/// Messages a client sends to the authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Record a display name.
    RegisterPlayer { username: String },
    /// Enqueue into random matchmaking.
    FindGame { username: String },
    /// Leave the random queue.
    CancelFindGame,
    /// Allocate a private lobby code.
    CreatePrivateLobby,
    /// Attempt pairing via a shared code.
    JoinPrivateLobby { room_code: String, username: String },
    /// Fire at a cell of the opponent's board.
    MakeMove { room_id: SessionId, row: u8, col: u8 },
}

/// Messages the authority sends to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Reset to the menu state.
    MainMenu,
    /// Queued, awaiting an opponent.
    FindingGame { message: String },
    /// Lobby code to share with a friend.
    PrivateLobbyCreated { room_code: String },
    /// Session begins; one participant's `is_my_turn` is true.
    GameStarted {
        room_id: SessionId,
        my_board: Grid,
        opponent_view_board: Grid,
        is_my_turn: bool,
        opponent_name: String,
    },
    /// Post-move sync, sent to both participants after every accepted move.
    UpdateGameState {
        my_board: Grid,
        opponent_view_board: Grid,
        is_my_turn: bool,
        message: String,
    },
    /// Terminal state; `opponent_board` is the full unmasked reveal.
    GameOver {
        winner_name: String,
        opponent_board: Grid,
    },
    /// The other participant dropped; the session is torn down.
    OpponentDisconnected { message: String },
    /// A rejected request (bad code, not your turn, ...).
    Error { message: String },
}
