//! Skerry - the session engine for a turn-based island trading game.
//!
//! This crate owns authoritative game state and nothing else: it validates
//! and applies player actions, drives dice-based resource distribution,
//! advances the turn protocol, and records the ordered event history that
//! clients observe to stay synchronized. It performs no I/O; the session
//! layer feeds it actions and forwards its events.
//!
//! # Modules
//!
//! - [`grid`]: hex coordinates and the corner identities behind the board graph
//! - [`board`]: numbered locations/edges, tile layout, occupancy, legality
//! - [`resources`]: resource kinds, the immutable `ResourceClutch`, build costs
//! - [`player`]: per-seat state and development cards
//! - [`actions`]: the action and event sum types
//! - [`rules`]: the pure action validator
//! - [`engine`]: the turn state machine
//! - [`view`]: per-player visibility filtering
//! - [`strategy`]: the decision policy for automated seats

pub mod actions;
pub mod board;
pub mod engine;
pub mod grid;
pub mod player;
pub mod resources;
pub mod rules;
pub mod strategy;
pub mod view;

// Re-export commonly used types
pub use actions::{Action, EventRecord, GameEvent};
pub use board::{Board, Building, BuildingKind, Edge, Location, PlacementError, Tile};
pub use engine::{
    DropRounding, Game, GameConfig, Seat, SetupPlacing, TurnPhase, BANK_TRADE_RATE,
};
pub use grid::{Corner, HexCoord, Pole};
pub use player::{Controller, DevelopmentCard, Player, PlayerId};
pub use resources::{costs, Resource, ResourceClutch};
pub use rules::{ActionFault, RuleError};
pub use strategy::{drive_automated, Strategy};
pub use view::{redact_event, redact_record, BoardView, GameView, PlayerView, TileView};
