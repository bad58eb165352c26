//! Player actions and the events they produce.
//!
//! Both are tagged sum types: the validator and engine match over every
//! variant so a new action kind cannot be added without handling it. Events
//! form the authoritative, sequence-numbered history of a game; fields that
//! per-player visibility may hide are `Option`s, stored as `Some` in the
//! history and stripped to `None` for other viewers (see [`crate::view`]).

use crate::board::{Edge, Location};
use crate::player::{DevelopmentCard, PlayerId};
use crate::resources::{Resource, ResourceClutch};
use serde::{Deserialize, Serialize};

/// Everything a player can ask the engine to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Place a settlement: during setup, or paid for in the main action.
    BuildSettlement(Location),
    /// Place a road: during setup (anchored to the settlement just placed),
    /// or paid for in the main action.
    BuildRoad(Edge),
    /// Upgrade an own settlement to a city.
    BuildCity(Location),
    /// Roll the dice to open the turn.
    RollDice,
    /// Give four of one kind to the bank for one of another.
    TradeWithBank { give: Resource, receive: Resource },
    /// Buy the top card of the development deck.
    BuyDevelopmentCard,
    /// Play a road-building card: two free roads, placed together.
    PlayRoadBuilding(Edge, Edge),
    /// Play a year-of-plenty card: take two resources from the bank.
    PlayYearOfPlenty(Resource, Resource),
    /// Play a monopoly card: collect one resource kind from everyone.
    PlayMonopoly(Resource),
    /// Discard after a roll of seven.
    DropResources(ResourceClutch),
    /// End the turn.
    EndTurn,
}

/// An observable state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    DiceRolled {
        player: PlayerId,
        roll: (u8, u8),
        total: u8,
    },

    /// One per player credited, in seat order. `detail` is visible only to
    /// the credited player; everyone always sees the total.
    ResourcesDistributed {
        player: PlayerId,
        total: u32,
        detail: Option<ResourceClutch>,
    },

    SettlementBuilt {
        player: PlayerId,
        location: Location,
    },

    CityBuilt {
        player: PlayerId,
        location: Location,
    },

    RoadBuilt {
        player: PlayerId,
        edge: Edge,
    },

    /// `detail` is visible only to the discarding player.
    ResourcesDropped {
        player: PlayerId,
        count: u32,
        detail: Option<ResourceClutch>,
    },

    /// `card` is visible only to the buyer until played.
    CardPurchased {
        player: PlayerId,
        card: Option<DevelopmentCard>,
    },

    RoadBuildingPlayed {
        player: PlayerId,
        edges: (Edge, Edge),
    },

    YearOfPlentyPlayed {
        player: PlayerId,
        resources: (Resource, Resource),
    },

    MonopolyPlayed {
        player: PlayerId,
        resource: Resource,
        collected: u32,
    },

    BankTradeCompleted {
        player: PlayerId,
        gave: Resource,
        gave_count: u32,
        received: Resource,
    },

    TurnEnded {
        player: PlayerId,
        next_player: PlayerId,
    },

    GameWon {
        player: PlayerId,
        victory_points: u32,
    },

    GameAborted,
}

/// An event with its place in the session history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: u64,
    pub event: GameEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_round_trip_through_json() {
        let actions = vec![
            Action::BuildSettlement(Location(10)),
            Action::BuildRoad(Edge::between(Location(10), Location(11))),
            Action::RollDice,
            Action::TradeWithBank {
                give: Resource::Wool,
                receive: Resource::Ore,
            },
            Action::DropResources(ResourceClutch::new(1, 0, 2, 0, 1)),
            Action::EndTurn,
        ];
        for action in actions {
            let text = serde_json::to_string(&action).unwrap();
            let back: Action = serde_json::from_str(&text).unwrap();
            assert_eq!(back, action);
        }
    }

    #[test]
    fn events_round_trip_through_json() {
        let record = EventRecord {
            seq: 7,
            event: GameEvent::ResourcesDistributed {
                player: 1,
                total: 3,
                detail: Some(ResourceClutch::new(1, 1, 1, 0, 0)),
            },
        };
        let text = serde_json::to_string(&record).unwrap();
        let back: EventRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
    }
}
