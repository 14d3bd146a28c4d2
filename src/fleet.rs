//! Ship placements: the pure fleet validator and random fleet generation.

use rand::Rng;

use crate::common::{GameError, PlacementFault};
use crate::config::{BOARD_SIZE, FLEET_LENGTHS, FLEET_SIZE};

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// One ship's proposed position: start cell, orientation, length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub row: usize,
    pub col: usize,
    pub orientation: Orientation,
    pub length: usize,
}

impl Placement {
    pub fn new(row: usize, col: usize, orientation: Orientation, length: usize) -> Self {
        Self {
            row,
            col,
            orientation,
            length,
        }
    }

    /// Whether every cell of the ship lies inside the grid.
    pub fn in_bounds(&self) -> bool {
        match self.orientation {
            Orientation::Horizontal => {
                self.row < BOARD_SIZE && self.col + self.length <= BOARD_SIZE
            }
            Orientation::Vertical => {
                self.col < BOARD_SIZE && self.row + self.length <= BOARD_SIZE
            }
        }
    }

    /// Cells covered by the ship, in order from the start cell.
    /// Only meaningful when `in_bounds()` holds.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let (row, col) = (self.row, self.col);
        let orientation = self.orientation;
        (0..self.length).map(move |i| match orientation {
            Orientation::Horizontal => (row, col + i),
            Orientation::Vertical => (row + i, col),
        })
    }
}

/// Check a proposed fleet against the rules: exactly [`FLEET_SIZE`] ships,
/// the [`FLEET_LENGTHS`] multiset, every ship inside the grid, no overlaps.
/// Pure; called once per player at session start.
pub fn validate_fleet(placements: &[Placement]) -> Result<(), GameError> {
    if placements.len() != FLEET_SIZE {
        return Err(GameError::InvalidPlacement(PlacementFault::WrongCount));
    }

    let mut lengths: [usize; FLEET_SIZE] = core::array::from_fn(|i| placements[i].length);
    lengths.sort_unstable();
    let mut required = FLEET_LENGTHS;
    required.sort_unstable();
    if lengths != required {
        return Err(GameError::InvalidPlacement(PlacementFault::WrongLengths));
    }

    let mut occupied = [[false; BOARD_SIZE]; BOARD_SIZE];
    for placement in placements {
        if !placement.in_bounds() {
            return Err(GameError::InvalidPlacement(PlacementFault::OutOfBounds));
        }
        for (r, c) in placement.cells() {
            if occupied[r][c] {
                return Err(GameError::InvalidPlacement(PlacementFault::Overlap));
            }
            occupied[r][c] = true;
        }
    }

    Ok(())
}

// Attempts per ship before the whole layout is restarted.
const PLACEMENT_ATTEMPTS: usize = 100;

/// Generate a random valid fleet, one ship per standard length.
///
/// For each length, a random orientation and start cell are drawn and
/// retried until the ship fits without overlap; if a ship exhausts its
/// attempts the whole layout is discarded and started fresh. The standard
/// fleet always fits on a 10x10 grid, so this terminates quickly in
/// practice.
pub fn random_fleet<R: Rng>(rng: &mut R) -> Vec<Placement> {
    'layout: loop {
        let mut occupied = [[false; BOARD_SIZE]; BOARD_SIZE];
        let mut placements = Vec::with_capacity(FLEET_SIZE);

        for &length in FLEET_LENGTHS.iter() {
            let mut attempts = 0;
            loop {
                attempts += 1;
                if attempts > PLACEMENT_ATTEMPTS {
                    continue 'layout;
                }
                let orientation = if rng.random() {
                    Orientation::Horizontal
                } else {
                    Orientation::Vertical
                };
                let (max_r, max_c) = match orientation {
                    Orientation::Horizontal => (BOARD_SIZE - 1, BOARD_SIZE - length),
                    Orientation::Vertical => (BOARD_SIZE - length, BOARD_SIZE - 1),
                };
                let placement = Placement::new(
                    rng.random_range(0..=max_r),
                    rng.random_range(0..=max_c),
                    orientation,
                    length,
                );
                if placement.cells().all(|(r, c)| !occupied[r][c]) {
                    for (r, c) in placement.cells() {
                        occupied[r][c] = true;
                    }
                    placements.push(placement);
                    break;
                }
            }
        }

        return placements;
    }
}
