//! Session layer for the Skerry game engine.
//!
//! Maps session identifiers to independent game engines, serializes all
//! mutation per session, runs automated seats through the same action
//! pipeline as humans, and delivers each participant a visibility-filtered
//! event stream. Transport, persistence, and reconnection policy live in
//! external collaborators; this crate exposes the boundary they call.

pub mod registry;
pub mod session;

pub use registry::SessionRegistry;
pub use session::{GameSession, Participant, SessionError, SessionId, SessionStatus};
