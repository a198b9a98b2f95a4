use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::GameEngine;
use crate::character::Character;
use crate::constants::CHARACTER_OFFER_SIZE;
use crate::deck::Decks;
use crate::error::{CommandError, CommandResult};
use crate::guild::Guild;
use crate::notify::Notification;
use crate::player::{Player, PlayerId};
use crate::policy::Difficulty;
use crate::state::{CharacterOffer, GamePhase, GameState};

/// Who sits in a seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub name: String,
    pub is_ai: bool,
}

impl Seat {
    #[must_use]
    pub fn human(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_ai: false,
        }
    }

    #[must_use]
    pub fn ai(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_ai: true,
        }
    }
}

impl GameEngine {
    /// Seat one human at seat 0 and AI opponents in the rest, then run AI
    /// character selection and offer the human their choice.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::InvalidPlayerCount`] outside the configured
    /// player range.
    pub fn initialize(&mut self, player_count: usize, difficulty: Difficulty) -> CommandResult<()> {
        let seats: Vec<Seat> = (0..player_count)
            .map(|seat| {
                if seat == 0 {
                    Seat::human("Player 1")
                } else {
                    Seat::ai(format!("AI {}", seat + 1))
                }
            })
            .collect();
        self.initialize_with_seats(&seats, difficulty)
    }

    /// Start a fresh match with an explicit seating. With no human seat the
    /// match starts straight away.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::InvalidPlayerCount`] outside the configured
    /// player range.
    pub fn initialize_with_seats(
        &mut self,
        seats: &[Seat],
        difficulty: Difficulty,
    ) -> CommandResult<()> {
        let count = seats.len();
        if count < self.config.min_players || count > self.config.max_players {
            return Err(CommandError::InvalidPlayerCount);
        }
        self.refresh_policy(difficulty);

        let players = seats
            .iter()
            .enumerate()
            .map(|(id, seat)| {
                Player::new(id, seat.name.clone(), seat.is_ai)
                    .with_holdings(self.config.starting_coins, self.config.starting_lands)
            })
            .collect();
        let mut active_guilds: Vec<Guild> = self
            .config
            .initial_guilds
            .iter()
            .map(|number| Guild::new(*number, self.catalog.guild_name(*number)))
            .collect();
        active_guilds.sort_by_key(|g| g.number);
        let decks = Decks::build(self.catalog, &self.config, count, self.rng.deck());

        self.state = GameState {
            players,
            active_guilds,
            decks,
            difficulty,
            ..GameState::default()
        };
        log::info!(
            "new match: {count} seat(s), {difficulty} AI, seed {}",
            self.seed
        );
        self.set_phase(GamePhase::CharacterSelection);

        let ai_seats: Vec<PlayerId> = self
            .state
            .players
            .iter()
            .filter(|p| p.is_ai)
            .map(|p| p.id)
            .collect();
        for player_id in ai_seats {
            let options = self.draw_character_options();
            if options.is_empty() {
                log::warn!("no character left for player {player_id}");
                continue;
            }
            let pick = self
                .ai
                .select_character(&self.state, player_id, &options)
                .min(options.len() - 1);
            log::debug!("player {player_id} picks {}", options[pick].name);
            self.state.players[player_id].character = Some(options[pick].clone());
        }
        self.offer_next_character();
        Ok(())
    }

    /// Characters currently offered to a human seat.
    #[must_use]
    pub fn character_offer(&self) -> Option<&CharacterOffer> {
        self.state.pending_character_offer.as_ref()
    }

    /// Confirm the human's character choice.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NoPendingChoice`] without an open offer and
    /// [`CommandError::InvalidChoice`] for an out-of-range index.
    pub fn select_character(&mut self, index: usize) -> CommandResult<()> {
        self.observed("select_character", |engine| {
            if engine.state.is_over() {
                return Err(CommandError::GameOver);
            }
            let offer = engine
                .state
                .pending_character_offer
                .as_ref()
                .ok_or(CommandError::NoPendingChoice)?;
            let character = offer
                .options
                .get(index)
                .cloned()
                .ok_or(CommandError::InvalidChoice)?;
            let player_id = offer.player_id;
            engine.state.pending_character_offer = None;
            log::debug!("player {player_id} picks {}", character.name);
            engine.state.player_mut(player_id)?.character = Some(character);
            engine.offer_next_character();
            Ok(())
        })
    }

    /// Leave character selection and begin the first turn.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::WrongPhase`] outside character selection and
    /// [`CommandError::CharactersPending`] while a seat has no character.
    pub fn start_game(&mut self) -> CommandResult<()> {
        if self.state.is_over() {
            return Err(CommandError::GameOver);
        }
        if self.state.phase != GamePhase::CharacterSelection {
            return Err(CommandError::WrongPhase);
        }
        if self.state.players.iter().any(|p| p.character.is_none()) {
            return Err(CommandError::CharactersPending);
        }
        self.begin_play();
        Ok(())
    }

    /// Offer characters to the next human without one, or start the match.
    fn offer_next_character(&mut self) {
        let next_human = self
            .state
            .players
            .iter()
            .find(|p| !p.is_ai && p.character.is_none())
            .map(|p| p.id);
        let Some(player_id) = next_human else {
            self.begin_play();
            return;
        };
        let options = self.draw_character_options();
        if options.is_empty() {
            log::warn!("no character left for player {player_id}");
            self.begin_play();
            return;
        }
        self.state.pending_character_offer = Some(CharacterOffer {
            player_id,
            options: options.clone(),
        });
        self.notify(&Notification::CharacterChoicePending { player_id, options });
    }

    fn unassigned_characters(&self) -> Vec<Character> {
        self.catalog
            .characters
            .iter()
            .filter(|c| {
                !self
                    .state
                    .players
                    .iter()
                    .any(|p| p.character_id() == Some(c.id.as_str()))
            })
            .cloned()
            .collect()
    }

    fn draw_character_options(&mut self) -> Vec<Character> {
        let mut pool = self.unassigned_characters();
        pool.shuffle(self.rng.characters());
        pool.truncate(CHARACTER_OFFER_SIZE);
        pool
    }

    fn begin_play(&mut self) {
        self.state.current_player_index = 0;
        self.state.round = 1;
        self.state.pending_character_offer = None;
        self.set_phase(GamePhase::Event);
        self.notify(&Notification::TurnChanged {
            player_id: 0,
            round: 1,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_count_is_bounded() {
        let mut engine = GameEngine::new(1);
        assert_eq!(
            engine.initialize(1, Difficulty::Normal),
            Err(CommandError::InvalidPlayerCount)
        );
        assert_eq!(
            engine.initialize(6, Difficulty::Normal),
            Err(CommandError::InvalidPlayerCount)
        );
        assert_eq!(engine.state().phase, GamePhase::Setup);
    }

    #[test]
    fn ai_seats_pick_before_the_human_is_offered_two() {
        let mut engine = GameEngine::new(5);
        engine.initialize(4, Difficulty::Normal).unwrap();
        let state = engine.state();
        assert_eq!(state.phase, GamePhase::CharacterSelection);
        assert!(state.players[1..].iter().all(|p| p.character.is_some()));
        assert!(state.players[0].character.is_none());

        let offer = engine.character_offer().unwrap();
        assert_eq!(offer.player_id, 0);
        assert_eq!(offer.options.len(), CHARACTER_OFFER_SIZE);
        let taken: Vec<&str> = state.players.iter().filter_map(Player::character_id).collect();
        assert!(offer.options.iter().all(|c| !taken.contains(&c.id.as_str())));
        assert_eq!(engine.start_game(), Err(CommandError::CharactersPending));

        assert_eq!(engine.select_character(2), Err(CommandError::InvalidChoice));
        engine.select_character(1).unwrap();
        let state = engine.state();
        assert_eq!(state.phase, GamePhase::Event);
        assert_eq!(state.current_player_index, 0);
        assert_eq!(state.round, 1);
        let mut ids: Vec<&str> = state.players.iter().filter_map(Player::character_id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn starting_holdings_follow_the_rules() {
        let mut engine = GameEngine::new(8);
        engine
            .initialize_with_seats(&[Seat::ai("A"), Seat::ai("B")], Difficulty::Easy)
            .unwrap();
        let state = engine.state();
        assert_eq!(state.phase, GamePhase::Event);
        assert!(state.players.iter().all(|p| p.coins == 4 && p.lands.len() == 1));
        let numbers: Vec<_> = state.active_guilds.iter().map(|g| g.number).collect();
        assert_eq!(numbers, vec![6, 8]);
        assert_eq!(state.decks.set_aside_events.len(), 6);
        assert_eq!(engine.start_game(), Err(CommandError::WrongPhase));
    }
}
