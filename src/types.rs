use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tile {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
}

impl Tile {
    pub const PALETTE: [Tile; 5] = [
        Tile::Red,
        Tile::Blue,
        Tile::Green,
        Tile::Yellow,
        Tile::Purple,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Coord {
    pub row: i32,
    pub col: i32,
}

impl Coord {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    Multiplayer,
    Endless,
    Level,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SoloMode {
    Endless,
    Level,
}

impl SoloMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "endless" => Some(Self::Endless),
            "level" => Some(Self::Level),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub id: String,
    pub name: String,
    pub score: i32,
    pub position: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ModeProgress {
    Multiplayer {
        #[serde(rename = "moveCount")]
        move_count: u32,
        #[serde(rename = "moveLimit")]
        move_limit: u32,
    },
    Endless {
        #[serde(rename = "bestScore")]
        best_score: i32,
    },
    Level {
        #[serde(rename = "goalTile")]
        goal_tile: Tile,
        target: u32,
        removed: u32,
        #[serde(rename = "movesLeft")]
        moves_left: u32,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum GameOutcome {
    Winner {
        #[serde(rename = "playerId")]
        player_id: String,
    },
    Draw,
    LevelCompleted,
    LevelFailed,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionSnapshot {
    pub room: String,
    pub board: Vec<Vec<Tile>>,
    pub players: Vec<PlayerView>,
    #[serde(rename = "currentPlayer")]
    pub current_player: Option<String>,
    pub active: bool,
    pub progress: ModeProgress,
}

#[derive(Clone, Debug, Serialize)]
pub struct MoveApplied {
    pub snapshot: SessionSnapshot,
    pub matched: Vec<(usize, usize)>,
    #[serde(rename = "pointsAwarded")]
    pub points_awarded: i32,
    pub outcome: Option<GameOutcome>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameError {
    RoomFull,
    SessionNotFound,
    NotYourTurn,
    InvalidMove,
    NoMatch,
}

impl GameError {
    pub fn message(&self) -> &'static str {
        match self {
            GameError::RoomFull => "room is full (max 4 players)",
            GameError::SessionNotFound => "game not found",
            GameError::NotYourTurn => "not your turn",
            GameError::InvalidMove => "invalid move",
            GameError::NoMatch => "swap produces no match",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct LeaderboardEntry {
    pub name: String,
    #[serde(rename = "bestScore")]
    pub best_score: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct LeaderboardResponse {
    #[serde(rename = "generatedAt")]
    pub generated_at_iso: String,
    pub entries: Vec<LeaderboardEntry>,
}
