//! The aggregate root of a match.

use serde::{Deserialize, Serialize};

use crate::character::Character;
use crate::constants::GUILD_CAPACITY;
use crate::data::EventCard;
use crate::deck::Decks;
use crate::error::{CommandError, CommandResult};
use crate::guild::{Expedition, Guild, GuildNumber};
use crate::player::{Player, PlayerId};
use crate::policy::Difficulty;
use crate::rng::DiceRoll;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    Setup,
    CharacterSelection,
    Event,
    Roll,
    Collection,
    Investment,
    GameOver,
}

/// Two event cards drawn by a Governor, waiting for a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernorChoice {
    pub player_id: PlayerId,
    pub options: [EventCard; 2],
}

/// Characters offered to a human seat during setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterOffer {
    pub player_id: PlayerId,
    pub options: Vec<Character>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub players: Vec<Player>,
    pub current_player_index: PlayerId,
    pub phase: GamePhase,
    pub round: u32,
    /// Founded guilds in ascending number order.
    pub active_guilds: Vec<Guild>,
    pub expedition: Expedition,
    pub decks: Decks,
    /// Temporary events in effect; the count of one id is its tier.
    pub active_temporary_events: Vec<EventCard>,
    pub last_dice_roll: Option<DiceRoll>,
    pub next_roll_bankruptcy: bool,
    pub next_roll_mutiny: bool,
    pub pending_expedition: bool,
    pub pending_governor_choice: Option<GovernorChoice>,
    /// Card handed off by a Governor, applied instead of the next draw.
    pub forced_next_event: Option<EventCard>,
    pub pending_character_offer: Option<CharacterOffer>,
    pub winner: Option<PlayerId>,
    pub difficulty: Difficulty,
    /// Monotonic counter for slot and treasure stamps.
    pub stamp: u64,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            players: Vec::new(),
            current_player_index: 0,
            phase: GamePhase::Setup,
            round: 1,
            active_guilds: Vec::new(),
            expedition: Expedition::default(),
            decks: Decks::default(),
            active_temporary_events: Vec::new(),
            last_dice_roll: None,
            next_roll_bankruptcy: false,
            next_roll_mutiny: false,
            pending_expedition: false,
            pending_governor_choice: None,
            forced_next_event: None,
            pending_character_offer: None,
            winner: None,
            difficulty: Difficulty::Normal,
            stamp: 0,
        }
    }
}

impl GameState {
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    #[must_use]
    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    /// # Errors
    ///
    /// Returns [`CommandError::UnknownPlayer`] for an unseated id.
    pub fn player(&self, id: PlayerId) -> CommandResult<&Player> {
        self.players.get(id).ok_or(CommandError::UnknownPlayer)
    }

    /// # Errors
    ///
    /// Returns [`CommandError::UnknownPlayer`] for an unseated id.
    pub fn player_mut(&mut self, id: PlayerId) -> CommandResult<&mut Player> {
        self.players.get_mut(id).ok_or(CommandError::UnknownPlayer)
    }

    #[must_use]
    pub fn guild(&self, number: GuildNumber) -> Option<&Guild> {
        self.active_guilds.iter().find(|g| g.number == number)
    }

    pub fn guild_mut(&mut self, number: GuildNumber) -> Option<&mut Guild> {
        self.active_guilds.iter_mut().find(|g| g.number == number)
    }

    pub(crate) fn next_stamp(&mut self) -> u64 {
        self.stamp += 1;
        self.stamp
    }

    /// Copies of a temporary event currently in effect.
    #[must_use]
    pub fn temporary_tier(&self, event_id: &str) -> usize {
        self.active_temporary_events
            .iter()
            .filter(|e| e.id == event_id)
            .count()
    }

    #[must_use]
    pub fn led_guild_count(&self, player_id: PlayerId) -> u32 {
        let led = self
            .active_guilds
            .iter()
            .filter(|g| g.max_investor == Some(player_id))
            .count();
        u32::try_from(led).unwrap_or(u32::MAX)
    }

    /// Guild leadership, active inns, treasure points, and the emblem.
    #[must_use]
    pub fn victory_points(&self, player_id: PlayerId, include_treasures: bool) -> u32 {
        self.players.get(player_id).map_or(0, |player| {
            self.led_guild_count(player_id) + player.holding_victory_points(include_treasures)
        })
    }

    /// First seat (in seat order) at or above `threshold`.
    #[must_use]
    pub fn leader_at(&self, threshold: u32) -> Option<PlayerId> {
        self.players
            .iter()
            .map(|p| p.id)
            .find(|id| self.victory_points(*id, true) >= threshold)
    }

    /// Award the Discoverer's Emblem to the strict treasure leader with at
    /// least `min_treasures`; a tied count goes to whoever reached it first.
    pub fn recompute_discoverer_emblem(&mut self, min_treasures: usize) {
        let holder = self
            .players
            .iter()
            .filter(|p| p.treasures.len() >= min_treasures)
            .max_by(|a, b| {
                a.treasures
                    .len()
                    .cmp(&b.treasures.len())
                    .then(b.treasure_count_stamp.cmp(&a.treasure_count_stamp))
            })
            .map(|p| p.id);
        for player in &mut self.players {
            player.has_discoverer_emblem = Some(player.id) == holder;
        }
    }

    /// Rule invariants that must hold between commands.
    #[must_use]
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        for guild in &self.active_guilds {
            if guild.investments.len() > GUILD_CAPACITY {
                violations.push(format!(
                    "guild {} holds {} slots",
                    guild.number,
                    guild.investments.len()
                ));
            }
            match guild.max_investor {
                None if !guild.investments.is_empty() => violations.push(format!(
                    "guild {} has investors but no leader",
                    guild.number
                )),
                Some(leader) if guild.slots_of(leader) == 0 => violations.push(format!(
                    "guild {} led by player {leader} without a slot",
                    guild.number
                )),
                _ => {}
            }
            let blocked = self
                .active_temporary_events
                .iter()
                .any(|e| e.blocks(guild.number));
            if blocked != guild.blocked {
                violations.push(format!("guild {} block flag is stale", guild.number));
            }
        }
        if !self
            .active_guilds
            .windows(2)
            .all(|pair| pair[0].number < pair[1].number)
        {
            violations.push("active guilds out of order".to_string());
        }
        if self.expedition.investments.len() > self.expedition.max_slots {
            violations.push("expedition overfilled".to_string());
        }
        let holders = self
            .players
            .iter()
            .filter(|p| p.has_discoverer_emblem)
            .count();
        if holders > 1 {
            violations.push(format!("{holders} players hold the emblem"));
        }
        for guild_number in self.decks.live_foundations() {
            if self.guild(guild_number).is_some() {
                violations.push(format!(
                    "foundation for founded guild {guild_number} is drawable"
                ));
            }
        }
        if self.is_over() && self.winner.is_none() {
            violations.push("game over without a winner".to_string());
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guild::InvestmentSlot;
    use crate::player::{PlayerColor, Treasure, TreasureKind};

    fn treasure() -> Treasure {
        Treasure {
            id: "spice_jar".into(),
            name: "Jar of Spices".into(),
            kind: TreasureKind::Common,
            coin_value: None,
            vp: Some(1),
        }
    }

    fn state(players: usize) -> GameState {
        GameState {
            players: (0..players)
                .map(|id| Player::new(id, format!("P{id}"), true))
                .collect(),
            ..GameState::default()
        }
    }

    #[test]
    fn emblem_needs_two_treasures_and_goes_to_first_to_reach() {
        let mut s = state(3);
        s.players[0].add_treasure(treasure(), 1);
        s.recompute_discoverer_emblem(2);
        assert!(s.players.iter().all(|p| !p.has_discoverer_emblem));

        s.players[1].add_treasure(treasure(), 2);
        s.players[1].add_treasure(treasure(), 3);
        s.players[0].add_treasure(treasure(), 4);
        s.recompute_discoverer_emblem(2);
        assert!(s.players[1].has_discoverer_emblem);
        assert!(!s.players[0].has_discoverer_emblem);

        s.players[0].add_treasure(treasure(), 5);
        s.recompute_discoverer_emblem(2);
        assert!(s.players[0].has_discoverer_emblem);
        assert!(!s.players[1].has_discoverer_emblem);
    }

    #[test]
    fn victory_points_count_every_source() {
        let mut s = state(2);
        let mut guild = Guild::new(6, "Farmers");
        guild
            .add(InvestmentSlot {
                player_id: 1,
                color: PlayerColor::Blue,
                placed_at: 1,
            })
            .unwrap();
        s.active_guilds.push(guild);
        s.players[1].inns.push(crate::player::Inn::default());
        s.players[1].add_treasure(treasure(), 2);
        s.players[1].has_discoverer_emblem = true;
        assert_eq!(s.victory_points(1, true), 4);
        assert_eq!(s.victory_points(1, false), 3);
        assert_eq!(s.leader_at(4), Some(1));
        assert_eq!(s.leader_at(5), None);
    }

    #[test]
    fn invariants_flag_a_leader_without_slots() {
        let mut s = state(2);
        let mut guild = Guild::new(8, "Tavern");
        guild.max_investor = Some(0);
        s.active_guilds.push(guild);
        assert_eq!(s.invariant_violations().len(), 1);
        s.active_guilds[0].max_investor = None;
        assert!(s.invariant_violations().is_empty());
    }

    #[test]
    fn unknown_players_are_reported() {
        let s = state(2);
        assert_eq!(s.player(5).err(), Some(CommandError::UnknownPlayer));
    }
}
