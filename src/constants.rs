pub const BOARD_WIDTH: usize = 8;
pub const BOARD_HEIGHT: usize = 8;

pub const MAX_PLAYERS: usize = 4;
pub const MIN_PLAYERS_TO_START: usize = 2;

pub const POINTS_PER_TILE: i32 = 10;
pub const WIN_SCORE: i32 = 500;
pub const MOVE_LIMIT: u32 = 50;

pub const LEVEL_TARGET: u32 = 20;
pub const LEVEL_MOVE_BUDGET: u32 = 25;
