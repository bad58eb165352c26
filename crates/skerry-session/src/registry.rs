//! The session registry: concurrent lookup plus a per-session serialization
//! point.
//!
//! Sessions are independent sequential state machines. The registry's map
//! hands out exclusive access to one session at a time, so actions for a
//! session apply strictly in arrival order while distinct sessions proceed
//! in parallel. A set of human participants can have at most one active
//! session.

use crate::session::{GameSession, Participant, SessionError, SessionId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use skerry_core::{Action, Board, EventRecord, GameConfig, GameView};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;
use uuid::Uuid;

pub struct SessionRegistry {
    sessions: DashMap<SessionId, GameSession>,
    /// Sorted human roster -> its active session.
    rosters: DashMap<Vec<Uuid>, SessionId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            rosters: DashMap::new(),
        }
    }

    /// Create a session for the given seats (turn order). Fails if the human
    /// participant set already has an active session.
    pub fn create_session(
        &self,
        participants: Vec<Participant>,
        config: GameConfig,
        board: Board,
    ) -> Result<SessionId, SessionError> {
        if !(2..=4).contains(&participants.len()) {
            return Err(SessionError::InvalidRoster(format!(
                "a session needs 2-4 seats, got {}",
                participants.len()
            )));
        }

        let mut roster: Vec<Uuid> = participants.iter().filter_map(|p| p.human_id()).collect();
        roster.sort();
        if roster.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(SessionError::InvalidRoster(
                "a participant may hold only one seat".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        if !roster.is_empty() {
            match self.rosters.entry(roster) {
                Entry::Occupied(_) => return Err(SessionError::RosterInUse),
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
        }

        let session = GameSession::new(id, participants, config, board);
        let finished = session.is_finished();
        let key = session.roster_key();
        info!(session = %id, "session created");
        self.sessions.insert(id, session);
        if finished {
            self.release_roster(key, id);
        }
        Ok(id)
    }

    /// Mark a participant present; play begins when the last human joins.
    pub fn join_session(&self, id: SessionId, player: Uuid) -> Result<(), SessionError> {
        let mut session = self
            .sessions
            .get_mut(&id)
            .ok_or(SessionError::SessionNotFound)?;
        let result = session.join(player);
        let (finished, key) = (session.is_finished(), session.roster_key());
        drop(session);
        if finished {
            self.release_roster(key, id);
        }
        result
    }

    /// The sole mutation entry point for gameplay.
    pub fn submit_action(
        &self,
        id: SessionId,
        player: Uuid,
        action: Action,
    ) -> Result<(), SessionError> {
        let mut session = self
            .sessions
            .get_mut(&id)
            .ok_or(SessionError::SessionNotFound)?;
        let result = session.submit(player, action);
        let (finished, key) = (session.is_finished(), session.roster_key());
        drop(session);
        if finished {
            self.release_roster(key, id);
        }
        result
    }

    /// A per-player filtered event stream, from the next event onward.
    pub fn subscribe(
        &self,
        id: SessionId,
        player: Uuid,
    ) -> Result<UnboundedReceiver<EventRecord>, SessionError> {
        self.sessions
            .get_mut(&id)
            .ok_or(SessionError::SessionNotFound)?
            .subscribe(player)
    }

    /// A redacted snapshot for one participant.
    pub fn state_view(&self, id: SessionId, player: Uuid) -> Result<GameView, SessionError> {
        self.sessions
            .get(&id)
            .ok_or(SessionError::SessionNotFound)?
            .state_view(player)
    }

    /// Transport hook: a participant's connection came up.
    pub fn on_player_connected(&self, id: SessionId, player: Uuid) -> Result<(), SessionError> {
        self.sessions
            .get_mut(&id)
            .ok_or(SessionError::SessionNotFound)?
            .set_connected(player, true)
    }

    /// Transport hook: a participant's connection dropped. The session
    /// stalls for them; it aborts only when nobody is left.
    pub fn on_player_disconnected(&self, id: SessionId, player: Uuid) -> Result<(), SessionError> {
        let mut session = self
            .sessions
            .get_mut(&id)
            .ok_or(SessionError::SessionNotFound)?;
        let result = session.set_connected(player, false);
        let (finished, key) = (session.is_finished(), session.roster_key());
        drop(session);
        if finished {
            self.release_roster(key, id);
        }
        result
    }

    /// Tear a session down, typically after `GameWon` or `GameAborted`.
    pub fn remove_session(&self, id: SessionId) -> bool {
        match self.sessions.remove(&id) {
            Some((_, session)) => {
                self.release_roster(session.roster_key(), id);
                info!(session = %id, "session removed");
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Free a roster for reuse, but only while it still points at this
    /// session (a rematch may already own the key).
    fn release_roster(&self, key: Vec<Uuid>, id: SessionId) {
        if !key.is_empty() {
            self.rosters.remove_if(&key, |_, owner| *owner == id);
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
