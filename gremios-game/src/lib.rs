//! Gremios Game Engine
//!
//! Headless rules engine for the Gremios guild-investment board game.
//! This crate owns the match state, the phase machine, and the AI seats;
//! presentation adapters drive it through commands and observe it through
//! notifications.

pub mod character;
pub mod config;
pub mod constants;
pub mod data;
pub mod deck;
pub mod engine;
pub mod error;
pub mod events;
pub mod guild;
pub mod notify;
pub mod player;
pub mod policy;
pub mod rng;
pub mod state;

// Re-export commonly used types
pub use character::{AbilityEffect, AbilityFlags, AbilityHook, Character, HookPayout, Trigger};
pub use config::{ConfigError, RulesConfig};
pub use data::{EventCard, EventKind, GameCatalog, catalog};
pub use engine::{GameEngine, Halt, Seat};
pub use error::{CommandError, CommandResult};
pub use guild::{Expedition, Guild, GuildNumber, InvestmentSlot};
pub use notify::{GameObserver, LogObserver, Notification, RecordingObserver, RollReason};
pub use player::{Inn, Land, Player, PlayerColor, PlayerId, Treasure, TreasureKind};
pub use policy::{Action, AiPolicy, Difficulty, HeuristicPolicy};
pub use rng::{DiceRoll, derive_stream_seed};
pub use state::{CharacterOffer, GamePhase, GameState, GovernorChoice};
