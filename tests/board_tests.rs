use broadside::{
    Board, Cell, GameError, Orientation, Placement, ShotOutcome, BOARD_SIZE, TOTAL_SHIP_CELLS,
};

fn sample_fleet() -> Vec<Placement> {
    vec![
        Placement::new(0, 0, Orientation::Horizontal, 5),
        Placement::new(2, 0, Orientation::Horizontal, 4),
        Placement::new(4, 0, Orientation::Horizontal, 3),
        Placement::new(6, 0, Orientation::Horizontal, 3),
        Placement::new(8, 0, Orientation::Horizontal, 2),
    ]
}

#[test]
fn test_place_fleet_builds_expected_cells() {
    let board = Board::place_fleet(&sample_fleet()).unwrap();
    assert_eq!(board.cell(0, 0), Some(Cell::Ship));
    assert_eq!(board.cell(0, 4), Some(Cell::Ship));
    assert_eq!(board.cell(0, 5), Some(Cell::Water));
    assert_eq!(board.cell(8, 1), Some(Cell::Ship));
    assert_eq!(board.cell(9, 9), Some(Cell::Water));
    assert_eq!(board.cell(10, 0), None);
}

#[test]
fn test_apply_shot_hit_and_miss() {
    let mut board = Board::place_fleet(&sample_fleet()).unwrap();
    assert_eq!(board.apply_shot(0, 0).unwrap(), ShotOutcome::Hit);
    assert_eq!(board.cell(0, 0), Some(Cell::Hit));
    assert_eq!(board.apply_shot(9, 9).unwrap(), ShotOutcome::Miss);
    assert_eq!(board.cell(9, 9), Some(Cell::Miss));
}

#[test]
fn test_apply_shot_repeat_is_rejected_without_mutation() {
    let mut board = Board::place_fleet(&sample_fleet()).unwrap();
    board.apply_shot(0, 0).unwrap();
    board.apply_shot(9, 9).unwrap();
    let snapshot = board.clone();

    assert_eq!(board.apply_shot(0, 0).unwrap_err(), GameError::AlreadyShot);
    assert_eq!(board.apply_shot(9, 9).unwrap_err(), GameError::AlreadyShot);
    assert_eq!(board, snapshot);
}

#[test]
fn test_apply_shot_out_of_bounds() {
    let mut board = Board::place_fleet(&sample_fleet()).unwrap();
    assert_eq!(
        board.apply_shot(BOARD_SIZE, 0).unwrap_err(),
        GameError::OutOfBounds
    );
    assert_eq!(
        board.apply_shot(0, BOARD_SIZE).unwrap_err(),
        GameError::OutOfBounds
    );
}

#[test]
fn test_defeat_requires_every_ship_cell_hit() {
    let mut board = Board::place_fleet(&sample_fleet()).unwrap();
    let mut hits = 0;
    for placement in sample_fleet() {
        for (r, c) in placement.cells() {
            assert!(!board.is_defeated());
            assert_eq!(board.apply_shot(r, c).unwrap(), ShotOutcome::Hit);
            hits += 1;
        }
    }
    assert_eq!(hits, TOTAL_SHIP_CELLS);
    assert!(board.is_defeated());
}

#[test]
fn test_owner_view_matches_raw_board() {
    let mut board = Board::place_fleet(&sample_fleet()).unwrap();
    board.apply_shot(0, 0).unwrap();
    board.apply_shot(9, 9).unwrap();

    let view = board.view_for(true);
    assert_eq!(view[0][0], 'X');
    assert_eq!(view[0][1], 'S');
    assert_eq!(view[9][9], 'O');
    assert_eq!(view[5][5], '~');
}

#[test]
fn test_opponent_view_hides_intact_ships() {
    let mut board = Board::place_fleet(&sample_fleet()).unwrap();
    board.apply_shot(0, 0).unwrap();
    board.apply_shot(9, 9).unwrap();

    let view = board.view_for(false);
    // hits and misses are visible, intact ship cells read as water
    assert_eq!(view[0][0], 'X');
    assert_eq!(view[0][1], '~');
    assert_eq!(view[9][9], 'O');
    assert!(view.iter().flatten().all(|&ch| ch != 'S'));
}

#[test]
fn test_mask_is_recomputed_after_later_hits() {
    let mut board = Board::place_fleet(&sample_fleet()).unwrap();
    assert_eq!(board.view_for(false)[2][0], '~');
    board.apply_shot(2, 0).unwrap();
    assert_eq!(board.view_for(false)[2][0], 'X');
}
