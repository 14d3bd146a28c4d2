//! Compile-time game constants.

/// Boards are square grids of this many rows and columns.
pub const BOARD_SIZE: usize = 10;

/// Number of ships in a fleet.
pub const FLEET_SIZE: usize = 5;

/// Ship lengths making up the standard fleet. Names are immaterial to the
/// protocol; only the length multiset matters.
pub const FLEET_LENGTHS: [usize; FLEET_SIZE] = [5, 4, 3, 3, 2];

/// Total ship cells per board; a player whose board has this many hits lost.
pub const TOTAL_SHIP_CELLS: usize = 5 + 4 + 3 + 3 + 2;

/// Length of a private lobby code.
pub const LOBBY_CODE_LEN: usize = 5;

/// Characters a lobby code is drawn from. Lookalikes (I, O, 0, 1) are left
/// out since codes get read aloud and retyped.
pub const LOBBY_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
