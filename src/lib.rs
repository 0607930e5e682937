//! Rules engine for a grid-based snake game.
//!
//! [`game::GameEngine`] owns the authoritative state and the tick transition.
//! The remaining modules are the collaborators a session is assembled from:
//! an [`orchestrator::Orchestrator`] for apple and score policy, a
//! [`scheduler::TickScheduler`] for cadence, and [`input::MoveScript`] for
//! scripted direction input.

pub mod config;
pub mod events;
pub mod game;
pub mod input;
pub mod orchestrator;
pub mod scheduler;
pub mod snake;
