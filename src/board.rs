//! One player's grid: ship occupancy, shot outcomes, and masked views.

use core::fmt;

use crate::common::{GameError, ShotOutcome};
use crate::config::{BOARD_SIZE, TOTAL_SHIP_CELLS};
use crate::fleet::{validate_fleet, Placement};

/// State of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Water,
    Ship,
    Hit,
    Miss,
}

impl Cell {
    /// Single-character wire marker for this cell.
    pub fn marker(self) -> char {
        match self {
            Cell::Water => '~',
            Cell::Ship => 'S',
            Cell::Hit => 'X',
            Cell::Miss => 'O',
        }
    }
}

/// Board payload shape on the wire: [`BOARD_SIZE`] rows of cell markers.
pub type Grid = Vec<Vec<char>>;

/// One player's board. Built from a validated fleet at session start and
/// mutated only through [`Board::apply_shot`].
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
    ship_cells_standing: usize,
}

impl Board {
    /// Validate `placements` and build the board from them.
    pub fn place_fleet(placements: &[Placement]) -> Result<Self, GameError> {
        validate_fleet(placements)?;
        let mut cells = [[Cell::Water; BOARD_SIZE]; BOARD_SIZE];
        for placement in placements {
            for (r, c) in placement.cells() {
                cells[r][c] = Cell::Ship;
            }
        }
        Ok(Self {
            cells,
            ship_cells_standing: TOTAL_SHIP_CELLS,
        })
    }

    /// Resolve a shot at (`row`, `col`). A repeat shot returns
    /// `Err(AlreadyShot)` and leaves the board untouched.
    pub fn apply_shot(&mut self, row: usize, col: usize) -> Result<ShotOutcome, GameError> {
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return Err(GameError::OutOfBounds);
        }
        match self.cells[row][col] {
            Cell::Hit | Cell::Miss => Err(GameError::AlreadyShot),
            Cell::Ship => {
                self.cells[row][col] = Cell::Hit;
                self.ship_cells_standing -= 1;
                Ok(ShotOutcome::Hit)
            }
            Cell::Water => {
                self.cells[row][col] = Cell::Miss;
                Ok(ShotOutcome::Miss)
            }
        }
    }

    /// `true` once every ship cell has been hit.
    pub fn is_defeated(&self) -> bool {
        self.ship_cells_standing == 0
    }

    /// State of one cell; `None` outside the grid.
    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Render the marker grid. With `owner` false (the opponent's view),
    /// intact ship cells read as water; hits and misses are always shown.
    /// Recomputed on every call; this is the sole information-hiding
    /// mechanism, so the raw grid never leaves the owning side.
    pub fn view_for(&self, owner: bool) -> Grid {
        self.cells
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&cell| match cell {
                        Cell::Ship if !owner => Cell::Water.marker(),
                        other => other.marker(),
                    })
                    .collect()
            })
            .collect()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board {{ standing: {}", self.ship_cells_standing)?;
        for row in self.view_for(true) {
            writeln!(f, "  {}", row.iter().collect::<String>())?;
        }
        write!(f, "}}")
    }
}
