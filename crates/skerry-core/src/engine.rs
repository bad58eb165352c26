//! The turn engine: a sequential state machine over one game.
//!
//! `Game` owns the board, the players, the phase, and the event history;
//! nothing outside this module can mutate them except through [`Game::submit`],
//! which validates first and then either applies an action completely or
//! returns an error leaving state untouched.

use crate::actions::{Action, EventRecord, GameEvent};
use crate::board::{Board, Edge, Location};
use crate::player::{Controller, DevelopmentCard, Player, PlayerId};
use crate::resources::{costs, Resource, ResourceClutch};
use crate::rules::{self, ActionFault, RuleError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Bank trades are a flat four-for-one.
pub const BANK_TRADE_RATE: u32 = 4;

/// How the mandatory discard on a roll of seven rounds half the hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropRounding {
    Floor,
    /// Round half to even.
    Nearest,
    Ceiling,
}

impl DropRounding {
    pub fn required(self, hand_total: u32) -> u32 {
        let half = hand_total / 2;
        match self {
            DropRounding::Floor => half,
            DropRounding::Ceiling => (hand_total + 1) / 2,
            DropRounding::Nearest => {
                if hand_total % 2 == 0 || half % 2 == 0 {
                    half
                } else {
                    half + 1
                }
            }
        }
    }
}

/// Game tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Victory points that end the game.
    pub victory_target: u32,
    /// Hands strictly above this size must discard on a seven.
    pub drop_threshold: u32,
    pub drop_rounding: DropRounding,
    /// Seed for dice and the deck shuffle; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            victory_target: 10,
            drop_threshold: 7,
            drop_rounding: DropRounding::Floor,
            seed: None,
        }
    }
}

/// What the setup snake is currently waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupPlacing {
    Settlement,
    Road,
}

/// The phase of the turn protocol. Exactly one is active at any instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Snake-draft placement: forward seat order in round 1, reverse in
    /// round 2.
    Setup { round: u8, placing: SetupPlacing },

    /// The current player must roll.
    AwaitingRoll,

    /// Build, trade, play a card, or end the turn.
    MainAction,

    /// A seven was rolled: every listed player still owes a discard. The
    /// one concurrent phase - drops are accepted from all of them, in
    /// arrival order.
    AwaitingResourceDrop { outstanding: Vec<PlayerId> },

    /// Momentary marker between a turn's last action and the next seat's
    /// roll.
    TurnEnded,

    /// Terminal: somebody won.
    Completed { winner: PlayerId },

    /// Terminal: the session was torn down before a win.
    Aborted,
}

/// A seat at the table, in turn order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub name: String,
    pub controller: Controller,
}

impl Seat {
    pub fn human(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            controller: Controller::Human,
        }
    }

    pub fn automated(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            controller: Controller::Automated,
        }
    }
}

/// One game's authoritative state.
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    board: Board,
    players: Vec<Player>,
    current: PlayerId,
    phase: TurnPhase,
    turn_number: u32,
    last_roll: Option<(u8, u8)>,
    deck: Vec<DevelopmentCard>,
    card_played_this_turn: bool,
    /// The settlement just placed during setup, which the following road
    /// must touch.
    setup_anchor: Option<Location>,
    history: Vec<EventRecord>,
    rng: StdRng,
}

impl Game {
    /// Start a new game. Seat order is turn order; seat 0 opens the setup.
    pub fn new(config: GameConfig, board: Board, seats: Vec<Seat>) -> Self {
        assert!(
            (2..=4).contains(&seats.len()),
            "a game needs 2-4 seats, got {}",
            seats.len()
        );

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let players = seats
            .into_iter()
            .enumerate()
            .map(|(i, seat)| Player::new(i as PlayerId, seat.name, seat.controller))
            .collect();

        let mut deck = DevelopmentCard::standard_deck();
        deck.shuffle(&mut rng);

        Self {
            config,
            board,
            players,
            current: 0,
            phase: TurnPhase::Setup {
                round: 1,
                placing: SetupPlacing::Settlement,
            },
            turn_number: 0,
            last_roll: None,
            deck,
            card_played_this_turn: false,
            setup_anchor: None,
            history: Vec::new(),
            rng,
        }
    }

    // ==================== Accessors ====================

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    #[cfg(test)]
    pub(crate) fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        &mut self.players[id as usize]
    }

    pub fn current_player(&self) -> PlayerId {
        self.current
    }

    pub fn phase(&self) -> &TurnPhase {
        &self.phase
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    pub fn last_roll(&self) -> Option<(u8, u8)> {
        self.last_roll
    }

    pub fn deck_remaining(&self) -> usize {
        self.deck.len()
    }

    pub fn card_played_this_turn(&self) -> bool {
        self.card_played_this_turn
    }

    pub fn setup_anchor(&self) -> Option<Location> {
        self.setup_anchor
    }

    /// The ordered, sequence-numbered event history.
    pub fn history(&self) -> &[EventRecord] {
        &self.history
    }

    pub fn is_over(&self) -> bool {
        matches!(
            self.phase,
            TurnPhase::Completed { .. } | TurnPhase::Aborted
        )
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.phase {
            TurnPhase::Completed { winner } => Some(winner),
            _ => None,
        }
    }

    /// How many cards a flagged player still owes the discard pile.
    pub fn required_drop(&self, player: PlayerId) -> Option<u32> {
        match &self.phase {
            TurnPhase::AwaitingResourceDrop { outstanding } if outstanding.contains(&player) => {
                self.player(player)
                    .map(|p| self.config.drop_rounding.required(p.hand.total()))
            }
            _ => None,
        }
    }

    /// The players the engine is waiting on: the current player in
    /// sequential phases, every outstanding player in the drop phase.
    pub fn pending_actors(&self) -> Vec<PlayerId> {
        match &self.phase {
            TurnPhase::Setup { .. } | TurnPhase::AwaitingRoll | TurnPhase::MainAction => {
                vec![self.current]
            }
            TurnPhase::AwaitingResourceDrop { outstanding } => outstanding.clone(),
            TurnPhase::TurnEnded | TurnPhase::Completed { .. } | TurnPhase::Aborted => Vec::new(),
        }
    }

    // ==================== The mutation entry point ====================

    /// Validate and apply one action, returning the events it produced.
    ///
    /// On error nothing has changed: every fallible step runs before the
    /// first mutation.
    pub fn submit(&mut self, player: PlayerId, action: Action) -> Result<Vec<GameEvent>, RuleError> {
        rules::validate(self, player, &action)?;

        let mut events = Vec::new();
        match action {
            Action::BuildSettlement(location) => {
                self.apply_build_settlement(player, location, &mut events)?
            }
            Action::BuildRoad(edge) => self.apply_build_road(player, edge, &mut events)?,
            Action::BuildCity(location) => self.apply_build_city(player, location, &mut events)?,
            Action::RollDice => {
                let d1 = self.rng.gen_range(1..=6);
                let d2 = self.rng.gen_range(1..=6);
                self.resolve_roll(player, d1, d2, &mut events);
            }
            Action::TradeWithBank { give, receive } => {
                self.apply_bank_trade(player, give, receive, &mut events)?
            }
            Action::BuyDevelopmentCard => self.apply_buy_card(player, &mut events)?,
            Action::PlayRoadBuilding(first, second) => {
                self.apply_road_building(player, first, second, &mut events)?
            }
            Action::PlayYearOfPlenty(first, second) => {
                self.apply_year_of_plenty(player, first, second, &mut events)?
            }
            Action::PlayMonopoly(resource) => {
                self.apply_monopoly(player, resource, &mut events)?
            }
            Action::DropResources(clutch) => self.apply_drop(player, clutch, &mut events)?,
            Action::EndTurn => self.apply_end_turn(player, &mut events),
        }

        Ok(events)
    }

    /// Abort the game, e.g. when every participant has disconnected.
    /// Returns `None` if it was already over.
    pub fn abort(&mut self) -> Option<GameEvent> {
        if self.is_over() {
            return None;
        }
        self.phase = TurnPhase::Aborted;
        let mut events = Vec::new();
        self.emit(&mut events, GameEvent::GameAborted);
        events.pop()
    }

    // ==================== Appliers ====================

    fn emit(&mut self, out: &mut Vec<GameEvent>, event: GameEvent) {
        self.history.push(EventRecord {
            seq: self.history.len() as u64,
            event: event.clone(),
        });
        out.push(event);
    }

    fn apply_build_settlement(
        &mut self,
        player: PlayerId,
        location: Location,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), RuleError> {
        match self.phase.clone() {
            TurnPhase::Setup { round, .. } => {
                self.board.place_settlement(location, player, true)?;
                let seat = &mut self.players[player as usize];
                seat.settlements.insert(location);
                seat.settlement_stock -= 1;
                self.emit(events, GameEvent::SettlementBuilt { player, location });

                // only the second settlement is seeded with its yield
                if round == 2 {
                    let gained = self.board.yield_for(location);
                    let seat = &mut self.players[player as usize];
                    seat.hand = seat.hand + gained;
                    self.emit(
                        events,
                        GameEvent::ResourcesDistributed {
                            player,
                            total: gained.total(),
                            detail: Some(gained),
                        },
                    );
                }

                self.setup_anchor = Some(location);
                self.phase = TurnPhase::Setup {
                    round,
                    placing: SetupPlacing::Road,
                };
                Ok(())
            }
            _ => {
                let new_hand = self.players[player as usize]
                    .hand
                    .checked_sub(costs::SETTLEMENT)
                    .ok_or(RuleError::IllegalAction(ActionFault::InsufficientResources))?;
                self.board.place_settlement(location, player, false)?;

                let seat = &mut self.players[player as usize];
                seat.hand = new_hand;
                seat.settlements.insert(location);
                seat.settlement_stock -= 1;
                self.emit(events, GameEvent::SettlementBuilt { player, location });
                self.check_win(player, events);
                Ok(())
            }
        }
    }

    fn apply_build_road(
        &mut self,
        player: PlayerId,
        edge: Edge,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), RuleError> {
        if matches!(self.phase, TurnPhase::Setup { .. }) {
            self.board.place_road(edge, player, self.setup_anchor)?;
            let seat = &mut self.players[player as usize];
            seat.roads.insert(edge);
            seat.road_stock -= 1;
            self.emit(events, GameEvent::RoadBuilt { player, edge });

            self.setup_anchor = None;
            self.advance_setup();
            Ok(())
        } else {
            let new_hand = self.players[player as usize]
                .hand
                .checked_sub(costs::ROAD)
                .ok_or(RuleError::IllegalAction(ActionFault::InsufficientResources))?;
            self.board.place_road(edge, player, None)?;

            let seat = &mut self.players[player as usize];
            seat.hand = new_hand;
            seat.roads.insert(edge);
            seat.road_stock -= 1;
            self.emit(events, GameEvent::RoadBuilt { player, edge });
            Ok(())
        }
    }

    fn apply_build_city(
        &mut self,
        player: PlayerId,
        location: Location,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), RuleError> {
        let new_hand = self.players[player as usize]
            .hand
            .checked_sub(costs::CITY)
            .ok_or(RuleError::IllegalAction(ActionFault::InsufficientResources))?;
        self.board.upgrade_to_city(location, player)?;

        let seat = &mut self.players[player as usize];
        seat.hand = new_hand;
        seat.settlements.remove(&location);
        seat.cities.insert(location);
        seat.city_stock -= 1;
        // the settlement piece returns to stock
        seat.settlement_stock += 1;
        self.emit(events, GameEvent::CityBuilt { player, location });
        self.check_win(player, events);
        Ok(())
    }

    /// Resolve a dice roll. Split out from `submit` so tests can drive a
    /// known total through the same path.
    pub(crate) fn resolve_roll(
        &mut self,
        player: PlayerId,
        d1: u8,
        d2: u8,
        events: &mut Vec<GameEvent>,
    ) {
        let total = d1 + d2;
        self.last_roll = Some((d1, d2));
        self.emit(
            events,
            GameEvent::DiceRolled {
                player,
                roll: (d1, d2),
                total,
            },
        );

        if total == 7 {
            let outstanding: Vec<PlayerId> = self
                .players
                .iter()
                .filter(|p| p.hand.total() > self.config.drop_threshold)
                .map(|p| p.id)
                .collect();

            if outstanding.is_empty() {
                self.phase = TurnPhase::MainAction;
            } else {
                self.phase = TurnPhase::AwaitingResourceDrop { outstanding };
            }
        } else {
            for (id, gained) in self.board.production_for_roll(total) {
                let seat = &mut self.players[id as usize];
                seat.hand = seat.hand + gained;
                self.emit(
                    events,
                    GameEvent::ResourcesDistributed {
                        player: id,
                        total: gained.total(),
                        detail: Some(gained),
                    },
                );
            }
            self.phase = TurnPhase::MainAction;
        }
    }

    fn apply_drop(
        &mut self,
        player: PlayerId,
        clutch: ResourceClutch,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), RuleError> {
        let new_hand = self.players[player as usize]
            .hand
            .checked_sub(clutch)
            .ok_or(RuleError::IllegalAction(ActionFault::DropExceedsHand))?;
        self.players[player as usize].hand = new_hand;
        self.emit(
            events,
            GameEvent::ResourcesDropped {
                player,
                count: clutch.total(),
                detail: Some(clutch),
            },
        );

        if let TurnPhase::AwaitingResourceDrop { outstanding } = &mut self.phase {
            outstanding.retain(|&p| p != player);
            if outstanding.is_empty() {
                self.phase = TurnPhase::MainAction;
            }
        }
        Ok(())
    }

    fn apply_bank_trade(
        &mut self,
        player: PlayerId,
        give: Resource,
        receive: Resource,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), RuleError> {
        let seat = &mut self.players[player as usize];
        let new_hand = seat
            .hand
            .checked_sub(ResourceClutch::single(give, BANK_TRADE_RATE))
            .ok_or(RuleError::IllegalAction(ActionFault::InsufficientResources))?;
        seat.hand = new_hand + ResourceClutch::single(receive, 1);
        self.emit(
            events,
            GameEvent::BankTradeCompleted {
                player,
                gave: give,
                gave_count: BANK_TRADE_RATE,
                received: receive,
            },
        );
        Ok(())
    }

    fn apply_buy_card(
        &mut self,
        player: PlayerId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), RuleError> {
        let new_hand = self.players[player as usize]
            .hand
            .checked_sub(costs::DEVELOPMENT_CARD)
            .ok_or(RuleError::IllegalAction(ActionFault::InsufficientResources))?;
        let card = self
            .deck
            .pop()
            .ok_or(RuleError::IllegalAction(ActionFault::EmptyDeck))?;

        let seat = &mut self.players[player as usize];
        seat.hand = new_hand;
        seat.cards_bought_this_turn.push(card);
        self.emit(
            events,
            GameEvent::CardPurchased {
                player,
                card: Some(card),
            },
        );
        // a victory-point card counts from the moment of purchase
        self.check_win(player, events);
        Ok(())
    }

    fn apply_road_building(
        &mut self,
        player: PlayerId,
        first: Edge,
        second: Edge,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), RuleError> {
        if !self.players[player as usize].has_playable_card(DevelopmentCard::RoadBuilding) {
            return Err(RuleError::IllegalAction(ActionFault::CardUnavailable));
        }
        self.board.place_road_pair(first, second, player)?;

        let seat = &mut self.players[player as usize];
        seat.take_card(DevelopmentCard::RoadBuilding);
        seat.roads.insert(first);
        seat.roads.insert(second);
        seat.road_stock -= 2;
        self.card_played_this_turn = true;

        self.emit(
            events,
            GameEvent::RoadBuildingPlayed {
                player,
                edges: (first, second),
            },
        );
        Ok(())
    }

    fn apply_year_of_plenty(
        &mut self,
        player: PlayerId,
        first: Resource,
        second: Resource,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), RuleError> {
        let seat = &mut self.players[player as usize];
        if !seat.take_card(DevelopmentCard::YearOfPlenty) {
            return Err(RuleError::IllegalAction(ActionFault::CardUnavailable));
        }
        seat.hand =
            seat.hand + ResourceClutch::single(first, 1) + ResourceClutch::single(second, 1);
        self.card_played_this_turn = true;

        self.emit(
            events,
            GameEvent::YearOfPlentyPlayed {
                player,
                resources: (first, second),
            },
        );
        Ok(())
    }

    fn apply_monopoly(
        &mut self,
        player: PlayerId,
        resource: Resource,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), RuleError> {
        if !self.players[player as usize].take_card(DevelopmentCard::Monopoly) {
            return Err(RuleError::IllegalAction(ActionFault::CardUnavailable));
        }

        let mut collected = 0;
        for other in &mut self.players {
            if other.id != player {
                let (rest, taken) = other.hand.drain(resource);
                other.hand = rest;
                collected += taken;
            }
        }
        let seat = &mut self.players[player as usize];
        seat.hand = seat.hand + ResourceClutch::single(resource, collected);
        self.card_played_this_turn = true;

        self.emit(
            events,
            GameEvent::MonopolyPlayed {
                player,
                resource,
                collected,
            },
        );
        Ok(())
    }

    fn apply_end_turn(&mut self, player: PlayerId, events: &mut Vec<GameEvent>) {
        self.players[player as usize].end_turn();
        self.phase = TurnPhase::TurnEnded;

        let next = (self.current + 1) % self.players.len() as PlayerId;
        self.emit(
            events,
            GameEvent::TurnEnded {
                player,
                next_player: next,
            },
        );
        self.begin_turn(next);
    }

    fn begin_turn(&mut self, seat: PlayerId) {
        debug_assert!(matches!(self.phase, TurnPhase::TurnEnded));
        self.current = seat;
        self.turn_number += 1;
        self.last_roll = None;
        self.card_played_this_turn = false;
        self.phase = TurnPhase::AwaitingRoll;
    }

    /// Move the setup snake along after a road placement.
    fn advance_setup(&mut self) {
        let round = match &self.phase {
            TurnPhase::Setup { round, .. } => *round,
            _ => return,
        };
        let seats = self.players.len() as PlayerId;
        let placed: PlayerId = self
            .players
            .iter()
            .map(|p| p.settlements.len() as PlayerId)
            .sum();

        if placed >= seats * 2 {
            // snake finished back at seat 0; normal turns begin
            self.phase = TurnPhase::AwaitingRoll;
            self.turn_number = 1;
        } else if round == 1 && placed >= seats {
            // the last seat places twice in a row
            self.phase = TurnPhase::Setup {
                round: 2,
                placing: SetupPlacing::Settlement,
            };
        } else if round == 1 {
            self.current += 1;
            self.phase = TurnPhase::Setup {
                round: 1,
                placing: SetupPlacing::Settlement,
            };
        } else {
            self.current -= 1;
            self.phase = TurnPhase::Setup {
                round: 2,
                placing: SetupPlacing::Settlement,
            };
        }
    }

    fn check_win(&mut self, player: PlayerId, events: &mut Vec<GameEvent>) {
        if self.is_over() {
            return;
        }
        let points = self.players[player as usize].victory_points();
        if points >= self.config.victory_target {
            self.phase = TurnPhase::Completed { winner: player };
            self.emit(
                events,
                GameEvent::GameWon {
                    player,
                    victory_points: points,
                },
            );
        }
    }
}
