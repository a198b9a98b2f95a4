//! The Gremios game engine: phase machine, commands, and notifications.
//!
//! Every transition is synchronous. Adapters decide the pacing by calling
//! [`GameEngine::advance`] (one automatic step) or
//! [`GameEngine::run_until_input`] (until a human has to act).

mod commands;
mod phases;
mod setup;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, RulesConfig};
use crate::constants::RNG_TAG_AI;
use crate::data::{GameCatalog, catalog};
use crate::error::{CommandError, CommandResult};
use crate::guild::Guild;
use crate::notify::{GameObserver, Notification};
use crate::player::{Player, PlayerId};
use crate::policy::{AiPolicy, Difficulty, HeuristicPolicy};
use crate::rng::{DiceRoll, RngBundle, derive_stream_seed};
use crate::state::{GamePhase, GameState};

pub use setup::Seat;

/// Upper bound on automatic steps taken by one `run_until_input` call.
const MAX_AUTO_STEPS: usize = 100_000;

/// Why [`GameEngine::run_until_input`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Halt {
    /// A human seat is in its investment phase.
    AwaitingInput,
    GovernorChoice,
    CharacterChoice,
    GameOver,
    StepLimit,
}

pub struct GameEngine {
    state: GameState,
    config: RulesConfig,
    catalog: &'static GameCatalog,
    rng: RngBundle,
    seed: u64,
    ai: Box<dyn AiPolicy>,
    custom_policy: bool,
    observers: Vec<Box<dyn GameObserver>>,
}

impl fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameEngine")
            .field("seed", &self.seed)
            .field("phase", &self.state.phase)
            .field("round", &self.state.round)
            .field("current_player", &self.state.current_player_index)
            .field("ai", &self.ai.name())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl GameEngine {
    /// Engine with the standard rules, seeded for reproducible play.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::build(GameState::default(), RulesConfig::default(), seed)
    }

    /// Engine with custom rules.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure of `config`.
    pub fn with_config(config: RulesConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(GameState::default(), config, seed))
    }

    /// Host an existing state, for example one restored from JSON or prepared
    /// by a test. Random streams restart from `seed`.
    #[must_use]
    pub fn from_state(state: GameState, seed: u64) -> Self {
        Self::build(state, RulesConfig::default(), seed)
    }

    /// Host an existing state under custom rules.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] reported by [`RulesConfig::validate`].
    pub fn from_state_with_config(
        state: GameState,
        config: RulesConfig,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(state, config, seed))
    }

    fn build(state: GameState, config: RulesConfig, seed: u64) -> Self {
        let ai = Box::new(HeuristicPolicy::new(
            state.difficulty,
            derive_stream_seed(seed, RNG_TAG_AI),
        ));
        Self {
            state,
            config,
            catalog: catalog(),
            rng: RngBundle::from_user_seed(seed),
            seed,
            ai,
            custom_policy: false,
            observers: Vec::new(),
        }
    }

    /// Replace the AI strategy used for every AI seat.
    #[must_use]
    pub fn with_policy(mut self, policy: Box<dyn AiPolicy>) -> Self {
        self.ai = policy;
        self.custom_policy = true;
        self
    }

    pub fn subscribe(&mut self, observer: Box<dyn GameObserver>) {
        self.observers.push(observer);
    }

    /// Queue dice results to be used before any random roll.
    pub fn load_dice<I: IntoIterator<Item = DiceRoll>>(&mut self, rolls: I) {
        self.rng.load_dice(rolls);
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn into_state(self) -> GameState {
        self.state
    }

    #[must_use]
    pub const fn config(&self) -> &RulesConfig {
        &self.config
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn policy_name(&self) -> &'static str {
        self.ai.name()
    }

    /// Draw counts of the dice, deck, effects and character streams.
    #[must_use]
    pub const fn rng_draws(&self) -> [u64; 4] {
        self.rng.draw_counts()
    }

    #[must_use]
    pub fn victory_points(&self, player_id: PlayerId) -> u32 {
        self.state.victory_points(player_id, true)
    }

    /// Perform one automatic step of the phase machine.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::AwaitingInput`] when a human decision is
    /// needed, [`CommandError::GameOver`] once the match ended, and
    /// [`CommandError::WrongPhase`] before `initialize`.
    pub fn advance(&mut self) -> CommandResult<()> {
        let before = self.snapshot();
        let result = self.step();
        if result.is_ok() {
            self.publish_changes(before);
        }
        result
    }

    fn step(&mut self) -> CommandResult<()> {
        match self.state.phase {
            GamePhase::Setup => Err(CommandError::WrongPhase),
            GamePhase::CharacterSelection => {
                if self.state.pending_character_offer.is_some() {
                    Err(CommandError::AwaitingInput)
                } else {
                    Err(CommandError::CharactersPending)
                }
            }
            GamePhase::Event => {
                if self.state.pending_governor_choice.is_some() {
                    return Err(CommandError::AwaitingInput);
                }
                self.run_event_phase();
                Ok(())
            }
            GamePhase::Roll => {
                self.run_roll_phase();
                Ok(())
            }
            GamePhase::Collection => {
                self.run_collection_phase();
                Ok(())
            }
            GamePhase::Investment => {
                let is_ai = self.state.current_player().is_some_and(|p| p.is_ai);
                if !is_ai {
                    return Err(CommandError::AwaitingInput);
                }
                self.run_ai_turn();
                Ok(())
            }
            GamePhase::GameOver => Err(CommandError::GameOver),
        }
    }

    /// Step until a human has to act or the match ends.
    pub fn run_until_input(&mut self) -> Halt {
        for _ in 0..MAX_AUTO_STEPS {
            match self.advance() {
                Ok(()) => {}
                Err(CommandError::GameOver) => return Halt::GameOver,
                Err(_) if self.state.pending_governor_choice.is_some() => {
                    return Halt::GovernorChoice;
                }
                Err(_) if self.state.phase == GamePhase::CharacterSelection => {
                    return Halt::CharacterChoice;
                }
                Err(_) => return Halt::AwaitingInput,
            }
        }
        log::warn!("stopped after {MAX_AUTO_STEPS} automatic steps");
        Halt::StepLimit
    }

    /// End the match if some seat reached the victory threshold. Seats are
    /// checked in order, so simultaneous finishers go to the lower seat.
    fn check_victory(&mut self) -> bool {
        if self.state.is_over() {
            return true;
        }
        let Some(winner) = self.state.leader_at(self.config.victory_points_to_win) else {
            return false;
        };
        let victory_points = self.state.victory_points(winner, true);
        self.state.winner = Some(winner);
        self.state.pending_governor_choice = None;
        self.state.pending_character_offer = None;
        self.set_phase(GamePhase::GameOver);
        log::info!(
            "player {winner} wins with {victory_points} VP in round {}",
            self.state.round
        );
        self.notify(&Notification::GameOver {
            winner,
            victory_points,
        });
        true
    }

    fn set_phase(&mut self, phase: GamePhase) {
        self.state.phase = phase;
        self.notify(&Notification::PhaseChanged { phase });
    }

    fn notify(&mut self, notification: &Notification) {
        for observer in &mut self.observers {
            observer.notify(notification);
        }
    }

    /// Guard shared by every investment-phase command.
    fn ensure_turn(&self, player_id: PlayerId) -> CommandResult<()> {
        if self.state.is_over() {
            return Err(CommandError::GameOver);
        }
        self.state.player(player_id)?;
        if self.state.phase != GamePhase::Investment {
            return Err(CommandError::WrongPhase);
        }
        if self.state.current_player_index != player_id {
            return Err(CommandError::NotYourTurn);
        }
        Ok(())
    }

    /// Run `command`, log a rejection, and publish the entities it changed.
    fn observed<T>(
        &mut self,
        name: &str,
        command: impl FnOnce(&mut Self) -> CommandResult<T>,
    ) -> CommandResult<T> {
        let before = self.snapshot();
        let result = command(self);
        match &result {
            Ok(_) => self.publish_changes(before),
            Err(err) => log::debug!("{name} rejected: {err}"),
        }
        result
    }

    fn snapshot(&self) -> Option<Snapshot> {
        (!self.observers.is_empty()).then(|| Snapshot {
            players: self.state.players.clone(),
            guilds: self.state.active_guilds.clone(),
        })
    }

    fn publish_changes(&mut self, before: Option<Snapshot>) {
        let Some(before) = before else {
            return;
        };
        let guilds: Vec<Guild> = self
            .state
            .active_guilds
            .iter()
            .filter(|guild| !before.guilds.contains(guild))
            .cloned()
            .collect();
        let players: Vec<Player> = self
            .state
            .players
            .iter()
            .filter(|player| before.players.get(player.id) != Some(*player))
            .cloned()
            .collect();
        for guild in guilds {
            self.notify(&Notification::GuildUpdated { guild });
        }
        for player in players {
            self.notify(&Notification::PlayerUpdated { player });
        }
    }

    fn refresh_policy(&mut self, difficulty: Difficulty) {
        if !self.custom_policy {
            self.ai = Box::new(HeuristicPolicy::new(
                difficulty,
                derive_stream_seed(self.seed, RNG_TAG_AI),
            ));
        }
    }
}

struct Snapshot {
    players: Vec<Player>,
    guilds: Vec<Guild>,
}
