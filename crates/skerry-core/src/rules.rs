//! The action validator: a pure decision table over (phase, player, action).
//!
//! Nothing here mutates; the engine calls [`validate`] before applying and
//! the board re-checks geometry on mutation, so a stale or hostile request
//! can never corrupt state. Because it is pure, the validator is also safe
//! to call speculatively (e.g. to probe what a player could do).

use crate::actions::Action;
use crate::board::PlacementError;
use crate::engine::{Game, SetupPlacing, TurnPhase, BANK_TRADE_RATE};
use crate::player::{DevelopmentCard, PlayerId};
use crate::resources::{costs, ResourceClutch};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an action in the right phase was still illegal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ActionFault {
    #[error("not enough resources")]
    InsufficientResources,

    #[error("no pieces of that kind remaining")]
    NoPiecesRemaining,

    #[error("the development deck is empty")]
    EmptyDeck,

    #[error("you do not hold a playable card of that kind")]
    CardUnavailable,

    #[error("a development card was already played this turn")]
    CardAlreadyPlayed,

    #[error("must discard exactly {required} cards, got {offered}")]
    WrongDropCount { required: u32, offered: u32 },

    #[error("cannot discard resources you do not hold")]
    DropExceedsHand,

    #[error("cannot trade a resource for itself")]
    SelfTrade,
}

/// Why an action was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RuleError {
    /// Wrong player, or an action that does not belong to the current phase.
    #[error("out of turn")]
    OutOfTurn,

    #[error("illegal action: {0}")]
    IllegalAction(ActionFault),

    #[error("illegal placement: {0}")]
    IllegalPlacement(#[from] PlacementError),
}

/// Accept or reject `action` from `player` against the current state.
pub fn validate(game: &Game, player: PlayerId, action: &Action) -> Result<(), RuleError> {
    if game.player(player).is_none() {
        return Err(RuleError::OutOfTurn);
    }

    match game.phase() {
        TurnPhase::Completed { .. } | TurnPhase::Aborted | TurnPhase::TurnEnded => {
            Err(RuleError::OutOfTurn)
        }

        TurnPhase::Setup { placing, .. } => {
            require_current(game, player)?;
            validate_setup(game, player, *placing, action)
        }

        TurnPhase::AwaitingRoll => {
            require_current(game, player)?;
            match action {
                Action::RollDice => Ok(()),
                _ => Err(RuleError::OutOfTurn),
            }
        }

        TurnPhase::AwaitingResourceDrop { outstanding } => {
            validate_drop(game, player, outstanding, action)
        }

        TurnPhase::MainAction => {
            require_current(game, player)?;
            validate_main(game, player, action)
        }
    }
}

fn require_current(game: &Game, player: PlayerId) -> Result<(), RuleError> {
    if game.current_player() == player {
        Ok(())
    } else {
        Err(RuleError::OutOfTurn)
    }
}

fn validate_setup(
    game: &Game,
    player: PlayerId,
    placing: SetupPlacing,
    action: &Action,
) -> Result<(), RuleError> {
    match (placing, action) {
        (SetupPlacing::Settlement, Action::BuildSettlement(location)) => {
            game.board().check_settlement(*location, player, true)?;
            Ok(())
        }
        (SetupPlacing::Road, Action::BuildRoad(edge)) => {
            game.board().check_road(*edge, player, game.setup_anchor())?;
            Ok(())
        }
        _ => Err(RuleError::OutOfTurn),
    }
}

fn validate_drop(
    game: &Game,
    player: PlayerId,
    outstanding: &[PlayerId],
    action: &Action,
) -> Result<(), RuleError> {
    // the drop sub-phase is the one concurrent phase: every flagged player
    // may act, each exactly once
    if !outstanding.contains(&player) {
        return Err(RuleError::OutOfTurn);
    }
    let Action::DropResources(clutch) = action else {
        return Err(RuleError::OutOfTurn);
    };

    let required = game.required_drop(player).unwrap_or(0);
    if clutch.total() != required {
        return Err(RuleError::IllegalAction(ActionFault::WrongDropCount {
            required,
            offered: clutch.total(),
        }));
    }
    let hand = game.player(player).map(|p| p.hand).unwrap_or_default();
    if !hand.contains(*clutch) {
        return Err(RuleError::IllegalAction(ActionFault::DropExceedsHand));
    }
    Ok(())
}

fn validate_main(game: &Game, id: PlayerId, action: &Action) -> Result<(), RuleError> {
    let Some(player) = game.player(id) else {
        return Err(RuleError::OutOfTurn);
    };

    match action {
        Action::BuildRoad(edge) => {
            if player.road_stock == 0 {
                return Err(RuleError::IllegalAction(ActionFault::NoPiecesRemaining));
            }
            require_affordable(player.hand, costs::ROAD)?;
            game.board().check_road(*edge, id, None)?;
            Ok(())
        }

        Action::BuildSettlement(location) => {
            if player.settlement_stock == 0 {
                return Err(RuleError::IllegalAction(ActionFault::NoPiecesRemaining));
            }
            require_affordable(player.hand, costs::SETTLEMENT)?;
            game.board().check_settlement(*location, id, false)?;
            Ok(())
        }

        Action::BuildCity(location) => {
            if player.city_stock == 0 {
                return Err(RuleError::IllegalAction(ActionFault::NoPiecesRemaining));
            }
            require_affordable(player.hand, costs::CITY)?;
            game.board().check_city(*location, id)?;
            Ok(())
        }

        Action::BuyDevelopmentCard => {
            if game.deck_remaining() == 0 {
                return Err(RuleError::IllegalAction(ActionFault::EmptyDeck));
            }
            require_affordable(player.hand, costs::DEVELOPMENT_CARD)
        }

        Action::PlayRoadBuilding(first, second) => {
            require_card(game, id, DevelopmentCard::RoadBuilding)?;
            if player.road_stock < 2 {
                return Err(RuleError::IllegalAction(ActionFault::NoPiecesRemaining));
            }
            game.board().check_road_pair(*first, *second, id)?;
            Ok(())
        }

        Action::PlayYearOfPlenty(_, _) => require_card(game, id, DevelopmentCard::YearOfPlenty),

        Action::PlayMonopoly(_) => require_card(game, id, DevelopmentCard::Monopoly),

        Action::TradeWithBank { give, receive } => {
            if give == receive {
                return Err(RuleError::IllegalAction(ActionFault::SelfTrade));
            }
            require_affordable(player.hand, ResourceClutch::single(*give, BANK_TRADE_RATE))
        }

        Action::EndTurn => Ok(()),

        // these belong to other phases
        Action::RollDice | Action::DropResources(_) => Err(RuleError::OutOfTurn),
    }
}

fn require_affordable(hand: ResourceClutch, cost: ResourceClutch) -> Result<(), RuleError> {
    if hand.contains(cost) {
        Ok(())
    } else {
        Err(RuleError::IllegalAction(ActionFault::InsufficientResources))
    }
}

fn require_card(game: &Game, id: PlayerId, kind: DevelopmentCard) -> Result<(), RuleError> {
    if game.card_played_this_turn() {
        return Err(RuleError::IllegalAction(ActionFault::CardAlreadyPlayed));
    }
    let holds = game
        .player(id)
        .map(|p| p.has_playable_card(kind))
        .unwrap_or(false);
    if holds {
        Ok(())
    } else {
        Err(RuleError::IllegalAction(ActionFault::CardUnavailable))
    }
}
