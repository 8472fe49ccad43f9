use std::collections::HashMap;

use crate::constants::{MAX_PLAYERS, MIN_PLAYERS_TO_START};
use crate::ledger::ScoreLedger;
use crate::session::GameSession;
use crate::types::{
    Coord, GameError, GameOutcome, ModeKind, MoveApplied, SessionSnapshot, SoloMode,
};

#[derive(Clone, Debug)]
pub struct JoinOutcome {
    pub room_key: String,
    pub position: usize,
    pub started: bool,
    pub snapshot: SessionSnapshot,
    /// Departure from the room the connection was bound to before this
    /// join; the caller still owes that room its leave events.
    pub left: Option<LeaveOutcome>,
}

#[derive(Clone, Debug)]
pub struct SoloOutcome {
    pub snapshot: SessionSnapshot,
    pub left: Option<LeaveOutcome>,
}

#[derive(Clone, Debug)]
pub struct LeaveOutcome {
    pub room_key: String,
    pub player_name: String,
    pub session_removed: bool,
    pub outcome: Option<GameOutcome>,
    pub snapshot: Option<SessionSnapshot>,
}

#[derive(Default)]
pub struct SessionRegistry {
    rooms: HashMap<String, GameSession>,
    room_by_connection: HashMap<String, String>,
    ledger: ScoreLedger,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_session_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room_of(&self, connection_id: &str) -> Option<&str> {
        self.room_by_connection
            .get(connection_id)
            .map(|key| key.as_str())
    }

    pub fn connection_ids_in_room(&self, room_key: &str) -> Vec<String> {
        self.rooms
            .get(room_key)
            .map(|session| session.player_ids())
            .unwrap_or_default()
    }

    pub fn ledger(&self) -> &ScoreLedger {
        &self.ledger
    }

    /// A connection is in at most one room; joining again leaves the old
    /// room, reported through `JoinOutcome::left`.
    pub fn join_room(
        &mut self,
        room_key: &str,
        name: &str,
        connection_id: &str,
        seed: u32,
    ) -> Result<JoinOutcome, GameError> {
        // validated before the implicit leave so a rejected join mutates
        // nothing, not even the old room binding
        if let Some(session) = self.rooms.get(room_key) {
            if session.mode_kind() != ModeKind::Multiplayer {
                return Err(GameError::RoomFull);
            }
            if session.player_count() >= MAX_PLAYERS && !session.has_player(connection_id) {
                return Err(GameError::RoomFull);
            }
        }

        let left = self.remove_connection(connection_id);

        let session = self
            .rooms
            .entry(room_key.to_string())
            .or_insert_with(|| GameSession::new_multiplayer(room_key, seed));
        let position = session.add_player(connection_id, name)?;
        let started = if session.should_start() {
            session.start();
            true
        } else {
            false
        };
        let snapshot = session.snapshot(0);
        self.room_by_connection
            .insert(connection_id.to_string(), room_key.to_string());

        Ok(JoinOutcome {
            room_key: room_key.to_string(),
            position,
            started,
            snapshot,
            left,
        })
    }

    pub fn start_single_player(
        &mut self,
        name: &str,
        mode: SoloMode,
        connection_id: &str,
        seed: u32,
    ) -> SoloOutcome {
        let left = self.remove_connection(connection_id);

        let room_key = format!("solo_{connection_id}");
        let session = match mode {
            SoloMode::Endless => GameSession::new_endless(&room_key, connection_id, name, seed),
            SoloMode::Level => GameSession::new_level(&room_key, connection_id, name, seed),
        };
        let snapshot = session.snapshot(self.ledger.best(name));
        self.rooms.insert(room_key.clone(), session);
        self.room_by_connection
            .insert(connection_id.to_string(), room_key);
        SoloOutcome { snapshot, left }
    }

    pub fn apply_move(
        &mut self,
        connection_id: &str,
        from: Coord,
        to: Coord,
    ) -> Result<MoveApplied, GameError> {
        let room_key = self
            .room_by_connection
            .get(connection_id)
            .ok_or(GameError::SessionNotFound)?
            .clone();
        let session = self
            .rooms
            .get_mut(&room_key)
            .ok_or(GameError::SessionNotFound)?;

        let applied = session.apply_move(connection_id, from, to)?;

        let endless_best = if session.mode_kind() == ModeKind::Endless {
            let name = session
                .player_name(connection_id)
                .unwrap_or_default()
                .to_string();
            let score = session.player_score(connection_id).unwrap_or(0);
            self.ledger.record(&name, score);
            self.ledger.best(&name)
        } else {
            0
        };

        Ok(MoveApplied {
            snapshot: session.snapshot(endless_best),
            matched: applied.matched,
            points_awarded: applied.points,
            outcome: applied.outcome,
        })
    }

    pub fn remove_connection(&mut self, connection_id: &str) -> Option<LeaveOutcome> {
        let room_key = self.room_by_connection.remove(connection_id)?;
        let session = self.rooms.get_mut(&room_key)?;
        let player_name = session
            .remove_player(connection_id)
            .map(|player| player.name)
            .unwrap_or_default();

        if session.player_count() == 0 {
            self.rooms.remove(&room_key);
            return Some(LeaveOutcome {
                room_key,
                player_name,
                session_removed: true,
                outcome: None,
                snapshot: None,
            });
        }

        let outcome = session.finish_if_lone_multiplayer();
        let snapshot = session.snapshot(0);
        Some(LeaveOutcome {
            room_key,
            player_name,
            session_removed: false,
            outcome,
            snapshot: Some(snapshot),
        })
    }

    /// Multiplayer restart needs the starting quorum again; an ineligible
    /// request is a quiet no-op.
    pub fn restart(&mut self, connection_id: &str) -> Result<Option<SessionSnapshot>, GameError> {
        let room_key = self
            .room_by_connection
            .get(connection_id)
            .ok_or(GameError::SessionNotFound)?
            .clone();
        let session = self
            .rooms
            .get_mut(&room_key)
            .ok_or(GameError::SessionNotFound)?;

        if session.mode_kind() == ModeKind::Multiplayer
            && session.player_count() < MIN_PLAYERS_TO_START
        {
            return Ok(None);
        }
        session.restart();

        let endless_best = if session.mode_kind() == ModeKind::Endless {
            session
                .player_name(connection_id)
                .map(|name| self.ledger.best(name))
                .unwrap_or(0)
        } else {
            0
        };
        Ok(Some(session.snapshot(endless_best)))
    }
}
