//! One running game session: participants, lifecycle, automated seats, and
//! per-player filtered event delivery.

use serde::{Deserialize, Serialize};
use skerry_core::{
    drive_automated, redact_record, Action, Board, EventRecord, Game, GameConfig, GameView,
    PlayerId, RuleError, Seat, Strategy,
};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub type SessionId = Uuid;

/// Upper bound on automated actions applied per inbound request. A table of
/// automated seats that cannot finish (e.g. on a barren board) is aborted
/// instead of spinning.
const MAX_AUTOMATION_BURST: usize = 10_000;

/// Errors surfaced at the session boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SessionError {
    #[error("session not found")]
    SessionNotFound,

    #[error("session already completed")]
    SessionAlreadyCompleted,

    #[error("the game has not started yet")]
    NotStarted,

    #[error("player is not part of this session")]
    UnknownParticipant,

    #[error("that participant set already has an active session")]
    RosterInUse,

    #[error("invalid roster: {0}")]
    InvalidRoster(String),

    #[error(transparent)]
    Rule(#[from] RuleError),
}

/// A seat request, in turn order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Participant {
    Human { id: Uuid, name: String },
    Automated { name: String },
}

impl Participant {
    pub fn name(&self) -> &str {
        match self {
            Participant::Human { name, .. } | Participant::Automated { name } => name,
        }
    }

    pub fn human_id(&self) -> Option<Uuid> {
        match self {
            Participant::Human { id, .. } => Some(*id),
            Participant::Automated { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Waiting for human participants to join.
    Lobby,
    InPlay,
    /// Won or aborted; kept only until the collaborator tears it down.
    Finished,
}

struct Subscriber {
    seat: PlayerId,
    tx: mpsc::UnboundedSender<EventRecord>,
}

/// A session: one game, its participants, and its subscribers.
///
/// All methods take `&mut self`; the registry's map entry is the
/// serialization point that admits one action at a time.
pub struct GameSession {
    id: SessionId,
    game: Game,
    status: SessionStatus,
    seats: Vec<Participant>,
    human_seats: HashMap<Uuid, PlayerId>,
    joined: HashSet<Uuid>,
    connected: HashMap<Uuid, bool>,
    strategies: HashMap<PlayerId, Strategy>,
    subscribers: Vec<Subscriber>,
    /// Index into the game history up to which events have been fanned out.
    next_delivery: usize,
}

impl GameSession {
    pub fn new(
        id: SessionId,
        participants: Vec<Participant>,
        config: GameConfig,
        board: Board,
    ) -> Self {
        let seats: Vec<Seat> = participants
            .iter()
            .map(|p| match p {
                Participant::Human { name, .. } => Seat::human(name.clone()),
                Participant::Automated { name } => Seat::automated(name.clone()),
            })
            .collect();

        let human_seats: HashMap<Uuid, PlayerId> = participants
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.human_id().map(|id| (id, i as PlayerId)))
            .collect();

        let strategies: HashMap<PlayerId, Strategy> = participants
            .iter()
            .enumerate()
            .filter(|(_, p)| matches!(p, Participant::Automated { .. }))
            .map(|(i, _)| {
                let seat = i as PlayerId;
                let strategy = match config.seed {
                    Some(seed) => Strategy::with_seed(seat, seed.wrapping_add(seat as u64)),
                    None => Strategy::new(seat),
                };
                (seat, strategy)
            })
            .collect();

        let mut session = Self {
            id,
            game: Game::new(config, board, seats),
            status: SessionStatus::Lobby,
            seats: participants,
            human_seats,
            joined: HashSet::new(),
            connected: HashMap::new(),
            strategies,
            subscribers: Vec::new(),
            next_delivery: 0,
        };
        // a table with no human seats needs no joins
        session.start_if_ready();
        session
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status == SessionStatus::Finished
    }

    pub fn participants(&self) -> &[Participant] {
        &self.seats
    }

    /// Sorted human participant ids; the registry's uniqueness key.
    pub fn roster_key(&self) -> Vec<Uuid> {
        let mut key: Vec<Uuid> = self.human_seats.keys().copied().collect();
        key.sort();
        key
    }

    fn seat_of(&self, player: Uuid) -> Result<PlayerId, SessionError> {
        self.human_seats
            .get(&player)
            .copied()
            .ok_or(SessionError::UnknownParticipant)
    }

    /// Record a participant as present. Play begins once every human seat
    /// has joined; joining again later is a no-op reconnect.
    pub fn join(&mut self, player: Uuid) -> Result<(), SessionError> {
        if self.is_finished() {
            return Err(SessionError::SessionAlreadyCompleted);
        }
        let seat = self.seat_of(player)?;
        self.joined.insert(player);
        self.connected.insert(player, true);
        debug!(session = %self.id, seat, "participant joined");
        self.start_if_ready();
        Ok(())
    }

    fn start_if_ready(&mut self) {
        if self.status == SessionStatus::Lobby && self.joined.len() == self.human_seats.len() {
            self.status = SessionStatus::InPlay;
            info!(session = %self.id, seats = self.seats.len(), "session started");
            self.drive_bots();
        }
    }

    /// Apply one action from a human participant (or a collaborator acting
    /// on a disconnected participant's behalf), then let automated seats
    /// catch up and fan the produced events out.
    pub fn submit(&mut self, player: Uuid, action: Action) -> Result<(), SessionError> {
        if self.is_finished() {
            return Err(SessionError::SessionAlreadyCompleted);
        }
        let seat = self.seat_of(player)?;
        if self.status == SessionStatus::Lobby {
            return Err(SessionError::NotStarted);
        }

        match self.game.submit(seat, action) {
            Ok(_) => {
                self.drive_bots();
                Ok(())
            }
            Err(error) => {
                debug!(session = %self.id, seat, %error, "action rejected");
                Err(SessionError::Rule(error))
            }
        }
    }

    /// Run automated seats through the normal pipeline until a human must
    /// act or the game ends, then deliver everything new.
    fn drive_bots(&mut self) {
        match drive_automated(&mut self.game, &mut self.strategies, MAX_AUTOMATION_BURST) {
            Ok(_) => {
                let stalled = !self.game.is_over()
                    && self
                        .game
                        .pending_actors()
                        .iter()
                        .any(|p| self.strategies.contains_key(p));
                if stalled {
                    warn!(session = %self.id, "automated seats stalled, aborting session");
                    self.game.abort();
                }
            }
            Err(error) => {
                warn!(session = %self.id, %error, "automated action rejected, aborting session");
                self.game.abort();
            }
        }
        self.flush_events();
        self.refresh_status();
    }

    fn flush_events(&mut self) {
        let history = self.game.history();
        if self.next_delivery >= history.len() {
            return;
        }
        let fresh: Vec<EventRecord> = history[self.next_delivery..].to_vec();
        self.next_delivery = history.len();

        // a closed receiver drops its subscription
        self.subscribers.retain(|sub| {
            fresh
                .iter()
                .all(|record| sub.tx.send(redact_record(record, sub.seat)).is_ok())
        });
    }

    fn refresh_status(&mut self) {
        if self.game.is_over() && self.status != SessionStatus::Finished {
            self.status = SessionStatus::Finished;
            match self.game.winner() {
                Some(winner) => info!(session = %self.id, winner, "session completed"),
                None => info!(session = %self.id, "session aborted"),
            }
        }
    }

    /// Attach a per-player event stream. Delivery starts with the next
    /// undelivered event; there is no replay of earlier history.
    pub fn subscribe(
        &mut self,
        player: Uuid,
    ) -> Result<mpsc::UnboundedReceiver<EventRecord>, SessionError> {
        let seat = self.seat_of(player)?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(Subscriber { seat, tx });
        Ok(rx)
    }

    /// A redacted snapshot for one participant, for synchronizing from
    /// scratch after (re-)subscribing.
    pub fn state_view(&self, player: Uuid) -> Result<GameView, SessionError> {
        let seat = self.seat_of(player)?;
        Ok(GameView::for_player(&self.game, seat))
    }

    /// Connectivity bookkeeping. A disconnected participant stalls the
    /// session rather than being removed; only when every human participant
    /// is gone does the session abort.
    pub fn set_connected(&mut self, player: Uuid, connected: bool) -> Result<(), SessionError> {
        self.seat_of(player)?;
        self.connected.insert(player, connected);

        if !connected && !self.is_finished() {
            let any_connected = self
                .human_seats
                .keys()
                .any(|id| self.connected.get(id).copied().unwrap_or(false));
            if !any_connected {
                info!(session = %self.id, "all participants disconnected, aborting");
                self.abort();
            }
        }
        Ok(())
    }

    /// Abort the game and notify subscribers.
    pub fn abort(&mut self) {
        self.game.abort();
        self.flush_events();
        self.refresh_status();
    }

    /// The authoritative, unredacted event history.
    pub fn history(&self) -> &[EventRecord] {
        self.game.history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skerry_core::{GameEvent, TurnPhase};

    fn config() -> GameConfig {
        GameConfig {
            seed: Some(7),
            ..GameConfig::default()
        }
    }

    fn two_humans() -> (Vec<Participant>, Uuid, Uuid) {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let participants = vec![
            Participant::Human {
                id: a,
                name: "Ada".to_string(),
            },
            Participant::Human {
                id: b,
                name: "Bea".to_string(),
            },
        ];
        (participants, a, b)
    }

    #[test]
    fn stays_in_lobby_until_everyone_joins() {
        let (participants, a, b) = two_humans();
        let mut session =
            GameSession::new(Uuid::new_v4(), participants, config(), Board::barren());

        assert_eq!(session.status(), SessionStatus::Lobby);
        assert_eq!(
            session.submit(a, Action::RollDice),
            Err(SessionError::NotStarted)
        );

        session.join(a).unwrap();
        assert_eq!(session.status(), SessionStatus::Lobby);
        session.join(b).unwrap();
        assert_eq!(session.status(), SessionStatus::InPlay);

        // joining again is a harmless reconnect
        session.join(a).unwrap();
        assert_eq!(session.status(), SessionStatus::InPlay);
    }

    #[test]
    fn strangers_are_refused() {
        let (participants, a, _) = two_humans();
        let mut session =
            GameSession::new(Uuid::new_v4(), participants, config(), Board::barren());
        session.join(a).unwrap();

        let stranger = Uuid::new_v4();
        assert_eq!(session.join(stranger), Err(SessionError::UnknownParticipant));
        assert_eq!(
            session.submit(stranger, Action::RollDice),
            Err(SessionError::UnknownParticipant)
        );
        assert!(session.subscribe(stranger).is_err());
        assert!(session.state_view(stranger).is_err());
    }

    #[test]
    fn state_view_hides_the_other_hand() {
        let (participants, a, b) = two_humans();
        let mut session =
            GameSession::new(Uuid::new_v4(), participants, config(), Board::barren());
        session.join(a).unwrap();
        session.join(b).unwrap();

        let view = session.state_view(a).unwrap();
        assert!(view.players[0].hand.is_some());
        assert!(view.players[1].hand.is_none());
    }

    #[test]
    fn all_automated_table_finishes_inside_the_constructor() {
        let participants = vec![
            Participant::Automated {
                name: "Bot 0".to_string(),
            },
            Participant::Automated {
                name: "Bot 1".to_string(),
            },
            Participant::Automated {
                name: "Bot 2".to_string(),
            },
        ];
        let config = GameConfig {
            victory_target: 3,
            seed: Some(11),
            ..GameConfig::default()
        };
        let board = Board::standard();
        let session = GameSession::new(Uuid::new_v4(), participants, config, board);

        assert!(session.is_finished());
        let terminal = session.history().last().unwrap();
        assert!(matches!(
            terminal.event,
            GameEvent::GameWon { .. } | GameEvent::GameAborted
        ));
    }

    #[test]
    fn boundary_types_round_trip_through_json() {
        let err = SessionError::Rule(skerry_core::RuleError::OutOfTurn);
        let text = serde_json::to_string(&err).unwrap();
        assert_eq!(serde_json::from_str::<SessionError>(&text).unwrap(), err);

        let participant = Participant::Human {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
        };
        let text = serde_json::to_string(&participant).unwrap();
        assert_eq!(
            serde_json::from_str::<Participant>(&text).unwrap(),
            participant
        );
    }

    #[test]
    fn partial_disconnect_stalls_but_full_disconnect_aborts() {
        let (participants, a, b) = two_humans();
        let mut session =
            GameSession::new(Uuid::new_v4(), participants, config(), Board::barren());
        session.join(a).unwrap();
        session.join(b).unwrap();
        let mut rx = session.subscribe(a).unwrap();

        session.set_connected(b, false).unwrap();
        assert_eq!(session.status(), SessionStatus::InPlay);
        assert!(matches!(
            session.state_view(a).unwrap().phase,
            TurnPhase::Setup { .. }
        ));

        session.set_connected(a, false).unwrap();
        assert!(session.is_finished());

        let mut aborted = false;
        while let Ok(record) = rx.try_recv() {
            if matches!(record.event, GameEvent::GameAborted) {
                aborted = true;
            }
        }
        assert!(aborted, "subscribers must observe the abort");

        assert_eq!(
            session.submit(a, Action::RollDice),
            Err(SessionError::SessionAlreadyCompleted)
        );
    }
}
