//! Player state: hand, development cards, built infrastructure, and the
//! decision-source flag that distinguishes human from automated seats.

use crate::board::{Edge, Location};
use crate::resources::ResourceClutch;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Seat index within a game; seat order is turn order.
pub type PlayerId = u8;

/// How a seat supplies its next action: a human seat waits for an inbound
/// submission, an automated seat is asked synchronously by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Controller {
    Human,
    Automated,
}

/// Development card kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DevelopmentCard {
    /// Worth one victory point from the moment of purchase.
    VictoryPoint,
    /// Place two roads for free.
    RoadBuilding,
    /// Take any two resources from the bank.
    YearOfPlenty,
    /// Collect every unit of one resource kind from the other players.
    Monopoly,
}

impl DevelopmentCard {
    /// The full deck, unshuffled: 5 victory points and 3 of each effect card.
    pub fn standard_deck() -> Vec<DevelopmentCard> {
        let mut deck = Vec::with_capacity(14);
        deck.extend(std::iter::repeat(DevelopmentCard::VictoryPoint).take(5));
        deck.extend(std::iter::repeat(DevelopmentCard::RoadBuilding).take(3));
        deck.extend(std::iter::repeat(DevelopmentCard::YearOfPlenty).take(3));
        deck.extend(std::iter::repeat(DevelopmentCard::Monopoly).take(3));
        deck
    }

    /// Victory-point cards are never "played"; they just score.
    pub fn is_playable(&self) -> bool {
        !matches!(self, DevelopmentCard::VictoryPoint)
    }
}

/// A single player's state, owned by the game for the session lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub controller: Controller,
    pub hand: ResourceClutch,
    /// Cards available to play.
    pub cards: Vec<DevelopmentCard>,
    /// Cards bought this turn; playable only from the next turn.
    pub cards_bought_this_turn: Vec<DevelopmentCard>,
    pub settlements: BTreeSet<Location>,
    pub cities: BTreeSet<Location>,
    pub roads: BTreeSet<Edge>,
    pub settlement_stock: u32,
    pub city_stock: u32,
    pub road_stock: u32,
}

impl Player {
    pub fn new(id: PlayerId, name: String, controller: Controller) -> Self {
        Self {
            id,
            name,
            controller,
            hand: ResourceClutch::zero(),
            cards: Vec::new(),
            cards_bought_this_turn: Vec::new(),
            settlements: BTreeSet::new(),
            cities: BTreeSet::new(),
            roads: BTreeSet::new(),
            settlement_stock: 5,
            city_stock: 4,
            road_stock: 15,
        }
    }

    /// Victory points derived from infrastructure and cards: one per
    /// settlement, two per city, one per victory-point card (either pile).
    pub fn victory_points(&self) -> u32 {
        self.public_victory_points() + self.victory_card_count()
    }

    /// The part of the tally other players can see.
    pub fn public_victory_points(&self) -> u32 {
        self.settlements.len() as u32 + 2 * self.cities.len() as u32
    }

    fn victory_card_count(&self) -> u32 {
        self.cards
            .iter()
            .chain(&self.cards_bought_this_turn)
            .filter(|c| matches!(c, DevelopmentCard::VictoryPoint))
            .count() as u32
    }

    /// Total development cards held, both piles.
    pub fn card_count(&self) -> u32 {
        (self.cards.len() + self.cards_bought_this_turn.len()) as u32
    }

    pub fn has_playable_card(&self, kind: DevelopmentCard) -> bool {
        kind.is_playable() && self.cards.contains(&kind)
    }

    /// Remove one card of the given kind from the playable pile.
    pub fn take_card(&mut self, kind: DevelopmentCard) -> bool {
        if let Some(pos) = self.cards.iter().position(|c| *c == kind) {
            self.cards.remove(pos);
            true
        } else {
            false
        }
    }

    /// Turn rollover: cards bought this turn become playable.
    pub fn end_turn(&mut self) {
        self.cards.append(&mut self.cards_bought_this_turn);
    }
}
