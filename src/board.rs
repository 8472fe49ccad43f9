use std::collections::BTreeSet;

use crate::constants::{BOARD_HEIGHT, BOARD_WIDTH};
use crate::rng::Rng;
use crate::types::{Coord, Tile};

pub type MatchSet = BTreeSet<(usize, usize)>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    cells: Vec<Vec<Tile>>,
}

impl Board {
    pub fn generate(rng: &mut Rng) -> Self {
        loop {
            let cells = (0..BOARD_HEIGHT)
                .map(|_| (0..BOARD_WIDTH).map(|_| draw_tile(rng)).collect())
                .collect();
            let board = Self { cells };
            if board.find_matches().is_empty() {
                return board;
            }
        }
    }

    pub fn from_grid(cells: Vec<Vec<Tile>>) -> Self {
        debug_assert_eq!(cells.len(), BOARD_HEIGHT);
        debug_assert!(cells.iter().all(|row| row.len() == BOARD_WIDTH));
        Self { cells }
    }

    pub fn get(&self, row: usize, col: usize) -> Tile {
        self.cells[row][col]
    }

    pub fn to_grid(&self) -> Vec<Vec<Tile>> {
        self.cells.clone()
    }

    pub fn count_tile(&self, tile: Tile) -> u32 {
        self.cells
            .iter()
            .flatten()
            .filter(|&&cell| cell == tile)
            .count() as u32
    }

    pub fn find_matches(&self) -> MatchSet {
        let mut matches = BTreeSet::new();

        for row in 0..BOARD_HEIGHT {
            for col in 0..BOARD_WIDTH - 2 {
                let tile = self.cells[row][col];
                if tile == self.cells[row][col + 1] && tile == self.cells[row][col + 2] {
                    matches.insert((row, col));
                    matches.insert((row, col + 1));
                    matches.insert((row, col + 2));
                }
            }
        }

        for row in 0..BOARD_HEIGHT - 2 {
            for col in 0..BOARD_WIDTH {
                let tile = self.cells[row][col];
                if tile == self.cells[row + 1][col] && tile == self.cells[row + 2][col] {
                    matches.insert((row, col));
                    matches.insert((row + 1, col));
                    matches.insert((row + 2, col));
                }
            }
        }

        matches
    }

    /// Callers validate bounds first (see `is_adjacent_swap`).
    pub fn swap(&mut self, a: Coord, b: Coord) {
        let held = self.cells[a.row as usize][a.col as usize];
        self.cells[a.row as usize][a.col as usize] = self.cells[b.row as usize][b.col as usize];
        self.cells[b.row as usize][b.col as usize] = held;
    }

    /// One removal pass; does not re-scan. The session loops until no
    /// matches remain.
    pub fn resolve(&mut self, matches: &MatchSet, rng: &mut Rng) {
        let mut scratch: Vec<Vec<Option<Tile>>> = self
            .cells
            .iter()
            .map(|row| row.iter().copied().map(Some).collect())
            .collect();
        for &(row, col) in matches {
            scratch[row][col] = None;
        }

        for col in 0..BOARD_WIDTH {
            let survivors: Vec<Tile> = (0..BOARD_HEIGHT)
                .filter_map(|row| scratch[row][col])
                .collect();
            let refill = BOARD_HEIGHT - survivors.len();
            for row in 0..BOARD_HEIGHT {
                self.cells[row][col] = if row < refill {
                    draw_tile(rng)
                } else {
                    survivors[row - refill]
                };
            }
        }
    }
}

pub fn is_adjacent_swap(a: Coord, b: Coord) -> bool {
    in_bounds(a) && in_bounds(b) && (a.row - b.row).abs() + (a.col - b.col).abs() == 1
}

fn in_bounds(coord: Coord) -> bool {
    coord.row >= 0
        && coord.col >= 0
        && (coord.row as usize) < BOARD_HEIGHT
        && (coord.col as usize) < BOARD_WIDTH
}

fn draw_tile(rng: &mut Rng) -> Tile {
    Tile::PALETTE[rng.pick_index(Tile::PALETTE.len())]
}

#[cfg(test)]
mod tests {
    use super::{is_adjacent_swap, Board};
    use crate::constants::{BOARD_HEIGHT, BOARD_WIDTH};
    use crate::rng::Rng;
    use crate::types::{Coord, Tile};

    fn uniform_grid(tile: Tile) -> Vec<Vec<Tile>> {
        vec![vec![tile; BOARD_WIDTH]; BOARD_HEIGHT]
    }

    // checkerboard of two tiles never contains a run of three
    fn quiet_grid() -> Vec<Vec<Tile>> {
        (0..BOARD_HEIGHT)
            .map(|row| {
                (0..BOARD_WIDTH)
                    .map(|col| {
                        if (row + col) % 2 == 0 {
                            Tile::Red
                        } else {
                            Tile::Blue
                        }
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn generated_boards_have_no_matches() {
        for seed in 0..200u32 {
            let mut rng = Rng::new(seed);
            let board = Board::generate(&mut rng);
            assert!(
                board.find_matches().is_empty(),
                "generation left a match: seed={seed}"
            );
        }
    }

    #[test]
    fn find_matches_reports_horizontal_run() {
        let mut grid = quiet_grid();
        grid[3][2] = Tile::Green;
        grid[3][3] = Tile::Green;
        grid[3][4] = Tile::Green;
        let board = Board::from_grid(grid);
        let matches = board.find_matches();
        assert_eq!(matches.len(), 3);
        assert!(matches.contains(&(3, 2)));
        assert!(matches.contains(&(3, 3)));
        assert!(matches.contains(&(3, 4)));
    }

    #[test]
    fn find_matches_reports_vertical_run() {
        let mut grid = quiet_grid();
        grid[1][5] = Tile::Purple;
        grid[2][5] = Tile::Purple;
        grid[3][5] = Tile::Purple;
        let board = Board::from_grid(grid);
        let matches = board.find_matches();
        assert_eq!(matches.len(), 3);
        assert!(matches.contains(&(1, 5)));
        assert!(matches.contains(&(2, 5)));
        assert!(matches.contains(&(3, 5)));
    }

    #[test]
    fn crossing_runs_deduplicate_the_shared_cell() {
        let mut grid = quiet_grid();
        grid[4][2] = Tile::Yellow;
        grid[4][3] = Tile::Yellow;
        grid[4][4] = Tile::Yellow;
        grid[3][3] = Tile::Yellow;
        grid[5][3] = Tile::Yellow;
        let board = Board::from_grid(grid);
        let matches = board.find_matches();
        assert_eq!(matches.len(), 5);
    }

    #[test]
    fn longer_runs_mark_every_member() {
        let mut grid = quiet_grid();
        for col in 1..=4 {
            grid[6][col] = Tile::Green;
        }
        let board = Board::from_grid(grid);
        let matches = board.find_matches();
        assert_eq!(matches.len(), 4);
    }

    #[test]
    fn swap_is_its_own_inverse() {
        let mut rng = Rng::new(11);
        let original = Board::generate(&mut rng);
        let mut board = original.clone();
        let a = Coord::new(2, 2);
        let b = Coord::new(2, 3);
        board.swap(a, b);
        board.swap(a, b);
        assert_eq!(board, original);
    }

    #[test]
    fn adjacency_rejects_self_and_diagonal_and_out_of_bounds() {
        assert!(!is_adjacent_swap(Coord::new(3, 3), Coord::new(3, 3)));
        assert!(!is_adjacent_swap(Coord::new(3, 3), Coord::new(4, 4)));
        assert!(!is_adjacent_swap(Coord::new(3, 3), Coord::new(3, 5)));
        assert!(!is_adjacent_swap(Coord::new(-1, 0), Coord::new(0, 0)));
        assert!(!is_adjacent_swap(Coord::new(0, 7), Coord::new(0, 8)));
    }

    #[test]
    fn adjacency_is_symmetric() {
        let a = Coord::new(5, 2);
        let b = Coord::new(5, 3);
        assert!(is_adjacent_swap(a, b));
        assert!(is_adjacent_swap(b, a));
    }

    #[test]
    fn resolve_keeps_columns_full_and_tiles_in_palette() {
        let mut rng = Rng::new(99);
        let board_src = Board::from_grid(uniform_grid(Tile::Red));
        let matches = board_src.find_matches();
        assert!(!matches.is_empty());

        let mut board = board_src;
        board.resolve(&matches, &mut rng);
        let grid = board.to_grid();
        assert_eq!(grid.len(), BOARD_HEIGHT);
        for row in &grid {
            assert_eq!(row.len(), BOARD_WIDTH);
            for tile in row {
                assert!(Tile::PALETTE.contains(tile));
            }
        }
    }

    #[test]
    fn gravity_preserves_relative_order_of_survivors() {
        let mut grid = quiet_grid();
        grid[5][0] = Tile::Green;
        grid[6][0] = Tile::Green;
        grid[7][0] = Tile::Green;
        let board_src = Board::from_grid(grid.clone());
        let matches = board_src.find_matches();
        assert_eq!(matches.len(), 3);

        let mut board = board_src;
        let mut rng = Rng::new(5);
        board.resolve(&matches, &mut rng);
        for row in 0..5 {
            assert_eq!(board.get(row + 3, 0), grid[row][0]);
        }
    }

    #[test]
    fn resolve_refills_only_matched_columns() {
        let mut grid = quiet_grid();
        grid[2][4] = Tile::Purple;
        grid[3][4] = Tile::Purple;
        grid[4][4] = Tile::Purple;
        let board_src = Board::from_grid(grid.clone());
        let matches = board_src.find_matches();

        let mut board = board_src;
        let mut rng = Rng::new(17);
        board.resolve(&matches, &mut rng);
        for row in 0..BOARD_HEIGHT {
            for col in 0..BOARD_WIDTH {
                if col != 4 {
                    assert_eq!(board.get(row, col), grid[row][col]);
                }
            }
        }
    }
}
