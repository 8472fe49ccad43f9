use crate::board::{self, Board};
use crate::constants::{
    LEVEL_MOVE_BUDGET, LEVEL_TARGET, MAX_PLAYERS, MIN_PLAYERS_TO_START, MOVE_LIMIT,
    POINTS_PER_TILE, WIN_SCORE,
};
use crate::rng::Rng;
use crate::types::{
    Coord, GameError, GameOutcome, ModeKind, ModeProgress, PlayerView, SessionSnapshot, Tile,
};

#[derive(Clone, Debug)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub score: i32,
    pub position: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Phase {
    Waiting,
    Active,
    Finished(GameOutcome),
}

#[derive(Clone, Debug)]
pub struct LevelProgress {
    pub goal_tile: Tile,
    pub target: u32,
    pub moves_left: u32,
    pub removed: u32,
    pub initial_goal_count: u32,
}

#[derive(Clone, Debug)]
enum Mode {
    Multiplayer { move_count: u32 },
    Endless,
    Level(LevelProgress),
}

#[derive(Clone, Debug)]
pub struct AppliedMove {
    pub matched: Vec<(usize, usize)>,
    pub points: i32,
    pub outcome: Option<GameOutcome>,
}

pub struct GameSession {
    room_key: String,
    players: Vec<Player>,
    board: Board,
    rng: Rng,
    phase: Phase,
    mode: Mode,
    current_turn: Option<String>,
}

impl GameSession {
    pub fn new_multiplayer(room_key: &str, seed: u32) -> Self {
        let mut rng = Rng::new(seed);
        let board = Board::generate(&mut rng);
        Self {
            room_key: room_key.to_string(),
            players: Vec::new(),
            board,
            rng,
            phase: Phase::Waiting,
            mode: Mode::Multiplayer { move_count: 0 },
            current_turn: None,
        }
    }

    pub fn new_endless(room_key: &str, player_id: &str, name: &str, seed: u32) -> Self {
        let mut session = Self::new_single(room_key, player_id, name, seed);
        session.mode = Mode::Endless;
        session
    }

    pub fn new_level(room_key: &str, player_id: &str, name: &str, seed: u32) -> Self {
        let mut session = Self::new_single(room_key, player_id, name, seed);
        session.mode = Mode::Level(session.draw_level_progress());
        session
    }

    fn new_single(room_key: &str, player_id: &str, name: &str, seed: u32) -> Self {
        let mut rng = Rng::new(seed);
        let board = Board::generate(&mut rng);
        Self {
            room_key: room_key.to_string(),
            players: vec![Player {
                id: player_id.to_string(),
                name: name.to_string(),
                score: 0,
                position: 1,
            }],
            board,
            rng,
            phase: Phase::Active,
            mode: Mode::Endless,
            current_turn: Some(player_id.to_string()),
        }
    }

    fn draw_level_progress(&mut self) -> LevelProgress {
        let goal_tile = Tile::PALETTE[self.rng.pick_index(Tile::PALETTE.len())];
        LevelProgress {
            goal_tile,
            target: LEVEL_TARGET,
            moves_left: LEVEL_MOVE_BUDGET,
            removed: 0,
            initial_goal_count: self.board.count_tile(goal_tile),
        }
    }

    pub fn mode_kind(&self) -> ModeKind {
        match self.mode {
            Mode::Multiplayer { .. } => ModeKind::Multiplayer,
            Mode::Endless => ModeKind::Endless,
            Mode::Level(_) => ModeKind::Level,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished(_))
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player_ids(&self) -> Vec<String> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }

    pub fn has_player(&self, id: &str) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    pub fn player_name(&self, id: &str) -> Option<&str> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.as_str())
    }

    pub fn player_score(&self, id: &str) -> Option<i32> {
        self.players.iter().find(|p| p.id == id).map(|p| p.score)
    }

    pub fn current_player(&self) -> Option<&str> {
        self.current_turn.as_deref()
    }

    pub fn add_player(&mut self, id: &str, name: &str) -> Result<usize, GameError> {
        if self.players.len() >= MAX_PLAYERS {
            return Err(GameError::RoomFull);
        }
        let position = self.players.len() + 1;
        self.players.push(Player {
            id: id.to_string(),
            name: name.to_string(),
            score: 0,
            position,
        });
        Ok(position)
    }

    pub fn should_start(&self) -> bool {
        self.phase == Phase::Waiting && self.players.len() >= MIN_PLAYERS_TO_START
    }

    pub fn start(&mut self) {
        self.phase = Phase::Active;
        if let Mode::Multiplayer { move_count } = &mut self.mode {
            *move_count = 0;
        }
        for player in &mut self.players {
            player.score = 0;
        }
        if !self.players.is_empty() {
            let first = self.rng.pick_index(self.players.len());
            self.current_turn = Some(self.players[first].id.clone());
        }
    }

    pub fn restart(&mut self) {
        self.board = Board::generate(&mut self.rng);
        for player in &mut self.players {
            player.score = 0;
        }
        match self.mode {
            Mode::Multiplayer { .. } => {
                self.mode = Mode::Multiplayer { move_count: 0 };
                self.phase = Phase::Active;
                if !self.players.is_empty() {
                    let first = self.rng.pick_index(self.players.len());
                    self.current_turn = Some(self.players[first].id.clone());
                }
            }
            Mode::Endless => {
                self.phase = Phase::Active;
            }
            Mode::Level(_) => {
                self.mode = Mode::Level(self.draw_level_progress());
                self.phase = Phase::Active;
            }
        }
    }

    pub fn remove_player(&mut self, id: &str) -> Option<Player> {
        let index = self.players.iter().position(|p| p.id == id)?;
        if self.current_turn.as_deref() == Some(id) {
            self.current_turn = if self.players.len() > 1 {
                let next = (index + 1) % self.players.len();
                Some(self.players[next].id.clone())
            } else {
                None
            };
        }
        let removed = self.players.remove(index);
        if self.players.is_empty() {
            self.current_turn = None;
        }
        Some(removed)
    }

    pub fn finish_if_lone_multiplayer(&mut self) -> Option<GameOutcome> {
        if !matches!(self.mode, Mode::Multiplayer { .. }) || self.phase != Phase::Active {
            return None;
        }
        if self.players.len() != 1 {
            return None;
        }
        let outcome = GameOutcome::Winner {
            player_id: self.players[0].id.clone(),
        };
        self.phase = Phase::Finished(outcome.clone());
        Some(outcome)
    }

    pub fn apply_move(
        &mut self,
        actor_id: &str,
        from: Coord,
        to: Coord,
    ) -> Result<AppliedMove, GameError> {
        if self.phase != Phase::Active || self.current_turn.as_deref() != Some(actor_id) {
            return Err(GameError::NotYourTurn);
        }
        if !board::is_adjacent_swap(from, to) {
            return Err(GameError::InvalidMove);
        }

        self.board.swap(from, to);
        let initial = self.board.find_matches();
        if initial.is_empty() {
            self.board.swap(from, to);
            return Err(GameError::NoMatch);
        }

        match &mut self.mode {
            Mode::Multiplayer { move_count } => *move_count += 1,
            Mode::Endless => {}
            Mode::Level(progress) => progress.moves_left = progress.moves_left.saturating_sub(1),
        }

        let mut points = 0;
        let mut matches = initial.clone();
        while !matches.is_empty() {
            match &mut self.mode {
                Mode::Multiplayer { .. } | Mode::Endless => {
                    let gained = matches.len() as i32 * POINTS_PER_TILE;
                    points += gained;
                    if let Some(player) = self.players.iter_mut().find(|p| p.id == actor_id) {
                        player.score += gained;
                    }
                }
                Mode::Level(progress) => {
                    // goal tiles counted before this pass removes them
                    let goal_tile = progress.goal_tile;
                    progress.removed += matches
                        .iter()
                        .filter(|&&(row, col)| self.board.get(row, col) == goal_tile)
                        .count() as u32;
                }
            }
            self.board.resolve(&matches, &mut self.rng);
            matches = self.board.find_matches();
        }

        let outcome = self.evaluate_outcome();
        match &outcome {
            Some(outcome) => self.phase = Phase::Finished(outcome.clone()),
            None => {
                if matches!(self.mode, Mode::Multiplayer { .. }) {
                    self.advance_turn();
                }
            }
        }

        Ok(AppliedMove {
            matched: initial.into_iter().collect(),
            points,
            outcome,
        })
    }

    fn evaluate_outcome(&self) -> Option<GameOutcome> {
        match &self.mode {
            Mode::Endless => None,
            Mode::Level(progress) => {
                if progress.removed >= progress.target {
                    Some(GameOutcome::LevelCompleted)
                } else if progress.moves_left == 0 {
                    Some(GameOutcome::LevelFailed)
                } else {
                    None
                }
            }
            Mode::Multiplayer { move_count } => {
                if let Some(player) = self.players.iter().find(|p| p.score >= WIN_SCORE) {
                    return Some(GameOutcome::Winner {
                        player_id: player.id.clone(),
                    });
                }
                if *move_count >= MOVE_LIMIT {
                    let top_score = self.players.iter().map(|p| p.score).max()?;
                    let mut leaders = self.players.iter().filter(|p| p.score == top_score);
                    let first = leaders.next()?;
                    if leaders.next().is_some() {
                        return Some(GameOutcome::Draw);
                    }
                    return Some(GameOutcome::Winner {
                        player_id: first.id.clone(),
                    });
                }
                None
            }
        }
    }

    fn advance_turn(&mut self) {
        let Some(current) = self.current_turn.as_deref() else {
            return;
        };
        if self.players.is_empty() {
            self.current_turn = None;
            return;
        }
        // a stale holder id falls back to the head of the rotation
        let next = match self.players.iter().position(|p| p.id == current) {
            Some(index) => (index + 1) % self.players.len(),
            None => 0,
        };
        self.current_turn = Some(self.players[next].id.clone());
    }

    pub fn snapshot(&self, endless_best: i32) -> SessionSnapshot {
        SessionSnapshot {
            room: self.room_key.clone(),
            board: self.board.to_grid(),
            players: self
                .players
                .iter()
                .map(|p| PlayerView {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    score: p.score,
                    position: p.position,
                })
                .collect(),
            current_player: self.current_turn.clone(),
            active: self.phase == Phase::Active,
            progress: match &self.mode {
                Mode::Multiplayer { move_count } => ModeProgress::Multiplayer {
                    move_count: *move_count,
                    move_limit: MOVE_LIMIT,
                },
                Mode::Endless => ModeProgress::Endless {
                    best_score: endless_best,
                },
                Mode::Level(progress) => ModeProgress::Level {
                    goal_tile: progress.goal_tile,
                    target: progress.target,
                    removed: progress.removed,
                    moves_left: progress.moves_left,
                },
            },
        }
    }
}
