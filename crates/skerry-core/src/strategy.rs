//! Decision policy for automated seats.
//!
//! A `Strategy` looks at the same state any client would and produces a legal
//! action for its player; the session layer feeds it through the normal
//! submit pipeline, so automated seats obey exactly the rules humans do.

use crate::actions::{Action, GameEvent};
use crate::board::{Edge, Location};
use crate::engine::{Game, SetupPlacing, TurnPhase};
use crate::player::{DevelopmentCard, PlayerId};
use crate::resources::{costs, Resource, ResourceClutch};
use crate::rules::RuleError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// A seeded policy for one automated seat.
pub struct Strategy {
    player: PlayerId,
    rng: StdRng,
}

impl Strategy {
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(player: PlayerId, seed: u64) -> Self {
        Self {
            player,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// Pick the next action, or `None` when this seat has nothing to do.
    pub fn decide(&mut self, game: &Game) -> Option<Action> {
        if !game.pending_actors().contains(&self.player) {
            return None;
        }

        match game.phase() {
            TurnPhase::Setup {
                placing: SetupPlacing::Settlement,
                ..
            } => self.pick_setup_settlement(game),
            TurnPhase::Setup {
                placing: SetupPlacing::Road,
                ..
            } => self.pick_setup_road(game),
            TurnPhase::AwaitingRoll => Some(Action::RollDice),
            TurnPhase::AwaitingResourceDrop { .. } => self.pick_drop(game),
            TurnPhase::MainAction => Some(self.pick_main(game)),
            TurnPhase::TurnEnded | TurnPhase::Completed { .. } | TurnPhase::Aborted => None,
        }
    }

    fn pick_setup_settlement(&mut self, game: &Game) -> Option<Action> {
        let board = game.board();
        board
            .valid_settlement_spots(self.player, true)
            .into_iter()
            // keep to spots that leave room for the mandatory road
            .filter(|&loc| {
                board
                    .edges_at(loc)
                    .iter()
                    .any(|e| board.road_at(*e).is_none())
            })
            .max_by_key(|&loc| score_location(game, loc))
            .map(Action::BuildSettlement)
    }

    fn pick_setup_road(&mut self, game: &Game) -> Option<Action> {
        let anchor = game.setup_anchor()?;
        let spots = game.board().valid_road_spots(self.player, Some(anchor));
        spots
            .choose(&mut self.rng)
            .copied()
            .map(Action::BuildRoad)
    }

    fn pick_drop(&mut self, game: &Game) -> Option<Action> {
        let required = game.required_drop(self.player)?;
        let mut keep = game.player(self.player)?.hand;
        let mut discard = ResourceClutch::zero();

        // shed whatever we hold the most of
        for _ in 0..required {
            let most = Resource::ALL
                .into_iter()
                .max_by_key(|&kind| keep.count(kind))?;
            if keep.count(most) == 0 {
                break;
            }
            keep = keep.checked_sub(ResourceClutch::single(most, 1))?;
            discard = discard + ResourceClutch::single(most, 1);
        }
        Some(Action::DropResources(discard))
    }

    fn pick_main(&mut self, game: &Game) -> Action {
        let board = game.board();
        let Some(player) = game.player(self.player) else {
            return Action::EndTurn;
        };
        let hand = player.hand;

        if player.city_stock > 0 && hand.contains(costs::CITY) {
            if let Some(&spot) = board.valid_city_spots(self.player).first() {
                return Action::BuildCity(spot);
            }
        }

        if player.settlement_stock > 0 && hand.contains(costs::SETTLEMENT) {
            let best = board
                .valid_settlement_spots(self.player, false)
                .into_iter()
                .max_by_key(|&loc| score_location(game, loc));
            if let Some(spot) = best {
                return Action::BuildSettlement(spot);
            }
        }

        if player.road_stock > 0 && hand.contains(costs::ROAD) && self.rng.gen_bool(0.4) {
            let spots = board.valid_road_spots(self.player, None);
            if let Some(&edge) = spots.choose(&mut self.rng) {
                return Action::BuildRoad(edge);
            }
        }

        if !game.card_played_this_turn() {
            if player.has_playable_card(DevelopmentCard::YearOfPlenty) {
                let mut kinds = Resource::ALL;
                kinds.sort_by_key(|&kind| hand.count(kind));
                return Action::PlayYearOfPlenty(kinds[0], kinds[1]);
            }

            if player.has_playable_card(DevelopmentCard::Monopoly) {
                if let Some(kind) = self.monopoly_target(game) {
                    return Action::PlayMonopoly(kind);
                }
            }

            if player.has_playable_card(DevelopmentCard::RoadBuilding) && player.road_stock >= 2 {
                if let Some((first, second)) = self.find_road_pair(game) {
                    return Action::PlayRoadBuilding(first, second);
                }
            }
        }

        if game.deck_remaining() > 0
            && hand.contains(costs::DEVELOPMENT_CARD)
            && self.rng.gen_bool(0.25)
        {
            return Action::BuyDevelopmentCard;
        }

        Action::EndTurn
    }

    /// The resource kind opponents hold the most of, if they hold any.
    fn monopoly_target(&self, game: &Game) -> Option<Resource> {
        let held = |kind: Resource| -> u32 {
            game.players()
                .iter()
                .filter(|p| p.id != self.player)
                .map(|p| p.hand.count(kind))
                .sum()
        };
        Resource::ALL
            .into_iter()
            .max_by_key(|&kind| held(kind))
            .filter(|&kind| held(kind) > 0)
    }

    /// Two road placements that are legal together.
    fn find_road_pair(&mut self, game: &Game) -> Option<(Edge, Edge)> {
        let board = game.board();
        let firsts = board.valid_road_spots(self.player, None);
        for &first in &firsts {
            let (a, b) = first.endpoints();
            for end in [a, b] {
                for second in board.edges_at(end) {
                    if second != first && board.check_road_pair(first, second, self.player).is_ok()
                    {
                        return Some((first, second));
                    }
                }
            }
            for &second in &firsts {
                if second != first && board.check_road_pair(first, second, self.player).is_ok() {
                    return Some((first, second));
                }
            }
        }
        None
    }
}

/// Dice-odds weight of the tiles around a location.
fn score_location(game: &Game, location: Location) -> u32 {
    game.board()
        .tiles_at(location)
        .iter()
        .map(|tile| match tile.token {
            Some(6) | Some(8) => 5,
            Some(5) | Some(9) => 4,
            Some(4) | Some(10) => 3,
            Some(3) | Some(11) => 2,
            Some(2) | Some(12) => 1,
            _ => 0,
        })
        .sum()
}

/// Run every pending automated seat through the normal pipeline until a
/// human must act, the game ends, or `limit` actions have been applied.
pub fn drive_automated(
    game: &mut Game,
    pilots: &mut HashMap<PlayerId, Strategy>,
    limit: usize,
) -> Result<Vec<GameEvent>, RuleError> {
    let mut events = Vec::new();
    for _ in 0..limit {
        if game.is_over() {
            break;
        }
        let Some(actor) = game
            .pending_actors()
            .into_iter()
            .find(|p| pilots.contains_key(p))
        else {
            break;
        };
        let Some(pilot) = pilots.get_mut(&actor) else {
            break;
        };
        let Some(action) = pilot.decide(game) else {
            break;
        };
        events.extend(game.submit(actor, action)?);
    }
    Ok(events)
}
