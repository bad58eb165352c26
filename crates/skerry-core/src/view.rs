//! Per-recipient visibility filtering.
//!
//! The authoritative history stores full events; before an event reaches a
//! given player, [`redact_record`] strips what that player may not see:
//! another player's resource breakdown (totals stay visible) and the
//! identity of a card another player bought. Played cards are public.
//! [`GameView`] is the matching redacted snapshot of the whole game, for a
//! client synchronizing from scratch.

use crate::actions::{EventRecord, GameEvent};
use crate::board::{Building, BuildingKind, Edge, Location};
use crate::engine::{Game, TurnPhase};
use crate::player::{Controller, DevelopmentCard, PlayerId};
use crate::resources::{Resource, ResourceClutch};
use serde::{Deserialize, Serialize};

/// The event as `viewer` is allowed to see it.
pub fn redact_event(event: &GameEvent, viewer: PlayerId) -> GameEvent {
    match event {
        GameEvent::ResourcesDistributed {
            player,
            total,
            detail: Some(_),
        } if *player != viewer => GameEvent::ResourcesDistributed {
            player: *player,
            total: *total,
            detail: None,
        },

        GameEvent::ResourcesDropped {
            player,
            count,
            detail: Some(_),
        } if *player != viewer => GameEvent::ResourcesDropped {
            player: *player,
            count: *count,
            detail: None,
        },

        GameEvent::CardPurchased {
            player,
            card: Some(_),
        } if *player != viewer => GameEvent::CardPurchased {
            player: *player,
            card: None,
        },

        other => other.clone(),
    }
}

pub fn redact_record(record: &EventRecord, viewer: PlayerId) -> EventRecord {
    EventRecord {
        seq: record.seq,
        event: redact_event(&record.event, viewer),
    }
}

/// A redacted snapshot of the game for one viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameView {
    pub phase: TurnPhase,
    pub current_player: PlayerId,
    pub turn_number: u32,
    pub last_roll: Option<(u8, u8)>,
    pub deck_remaining: u32,
    pub players: Vec<PlayerView>,
    pub board: BoardView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub controller: Controller,
    /// Everyone sees how many cards a hand holds.
    pub hand_total: u32,
    /// The breakdown, own seat only.
    pub hand: Option<ResourceClutch>,
    pub card_count: u32,
    /// Card identities, own seat only.
    pub cards: Option<Vec<DevelopmentCard>>,
    pub settlements: Vec<Location>,
    pub cities: Vec<Location>,
    pub roads: Vec<Edge>,
    /// Full tally for the viewer's own seat, the public part for others.
    pub victory_points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardView {
    pub tiles: Vec<TileView>,
    pub settlements: Vec<(Location, PlayerId)>,
    pub cities: Vec<(Location, PlayerId)>,
    pub roads: Vec<(Edge, PlayerId)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileView {
    pub produce: Option<Resource>,
    pub token: Option<u8>,
    pub locations: Vec<Location>,
}

impl GameView {
    pub fn for_player(game: &Game, viewer: PlayerId) -> Self {
        let players = game
            .players()
            .iter()
            .map(|p| {
                let own = p.id == viewer;
                PlayerView {
                    id: p.id,
                    name: p.name.clone(),
                    controller: p.controller,
                    hand_total: p.hand.total(),
                    hand: own.then_some(p.hand),
                    card_count: p.card_count(),
                    cards: own.then(|| {
                        p.cards
                            .iter()
                            .chain(&p.cards_bought_this_turn)
                            .copied()
                            .collect()
                    }),
                    settlements: p.settlements.iter().copied().collect(),
                    cities: p.cities.iter().copied().collect(),
                    roads: p.roads.iter().copied().collect(),
                    victory_points: if own {
                        p.victory_points()
                    } else {
                        p.public_victory_points()
                    },
                }
            })
            .collect();

        let board = game.board();
        let tiles = board
            .tiles()
            .iter()
            .enumerate()
            .map(|(i, tile)| TileView {
                produce: tile.produce,
                token: tile.token,
                locations: board.tile_locations(i).to_vec(),
            })
            .collect();

        let mut settlements = Vec::new();
        let mut cities = Vec::new();
        for (location, Building { owner, kind }) in board.placed_buildings() {
            match kind {
                BuildingKind::Settlement => settlements.push((location, owner)),
                BuildingKind::City => cities.push((location, owner)),
            }
        }

        GameView {
            phase: game.phase().clone(),
            current_player: game.current_player(),
            turn_number: game.turn_number(),
            last_roll: game.last_roll(),
            deck_remaining: game.deck_remaining() as u32,
            players,
            board: BoardView {
                tiles,
                settlements,
                cities,
                roads: board.placed_roads().collect(),
            },
        }
    }
}
