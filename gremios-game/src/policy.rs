//! Pluggable decision-making for AI seats.

use std::fmt;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::character::Character;
use crate::config::RulesConfig;
use crate::data::{ActionKind, EventCard, EventKind};
use crate::guild::GuildNumber;
use crate::player::{Player, PlayerId, TreasureKind};
use crate::state::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Self; 3] = [Self::Easy, Self::Normal, Self::Hard];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown difficulty '{s}' (expected easy, normal or hard)"))
    }
}

/// One investment-phase command, as issued by a policy or an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    InvestInGuild { guild: GuildNumber },
    InvestInExpedition,
    BuyLand,
    CultivateLand { land: usize },
    BuildInn { land: Option<usize> },
    RepairInn { inn: Option<usize> },
    CauseMutiny { guild: GuildNumber },
    BuyTreasure,
    SellTreasure { treasure: usize },
    ConvertWealth { treasure: usize },
}

/// Strategy consulted by the engine for every AI decision.
pub trait AiPolicy: fmt::Debug {
    fn name(&self) -> &'static str;

    /// Ordered actions for `player_id`'s investment phase. Actions the
    /// engine rejects are skipped.
    fn plan_turn(&mut self, state: &GameState, config: &RulesConfig, player_id: PlayerId)
    -> Vec<Action>;

    /// Index into `options` of the character to keep.
    fn select_character(
        &mut self,
        state: &GameState,
        player_id: PlayerId,
        options: &[Character],
    ) -> usize;

    /// Index of the Governor card to apply; the other is handed on.
    fn choose_event(
        &mut self,
        state: &GameState,
        player_id: PlayerId,
        options: &[EventCard; 2],
    ) -> usize;
}

/// Greedy scoring policy. Easy seats play loosely and at random, Hard seats
/// chase leadership and inns more aggressively.
#[derive(Debug, Clone)]
pub struct HeuristicPolicy {
    difficulty: Difficulty,
    rng: ChaCha20Rng,
}

/// Characters in the order a heuristic seat prefers them.
const CHARACTER_PREFERENCE: [&str; 14] = [
    "banker",
    "governor",
    "master_builder",
    "artisan",
    "archbishop",
    "shopkeeper",
    "peasant",
    "mercenary",
    "merchant",
    "innkeeper",
    "stowaway",
    "pirate",
    "knight",
    "physician",
];

impl HeuristicPolicy {
    #[must_use]
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        Self {
            difficulty,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn guild_score(state: &GameState, player: &Player, number: GuildNumber) -> i32 {
        let Some(guild) = state.guild(number) else {
            return i32::MIN;
        };
        let mine = i32::try_from(guild.slots_of(player.id)).unwrap_or(i32::MAX);
        let leader_slots = guild
            .max_investor
            .filter(|leader| *leader != player.id)
            .map_or(0, |leader| i32::try_from(guild.slots_of(leader)).unwrap_or(0));
        let challenger = guild
            .investments
            .iter()
            .filter(|s| s.player_id != player.id)
            .map(|s| i32::try_from(guild.slots_of(s.player_id)).unwrap_or(0))
            .max()
            .unwrap_or(0);
        let mut score = 0;
        if guild.max_investor == Some(player.id) {
            // Reinforce against a challenger one slot behind.
            score += if challenger + 1 >= mine { 3 } else { 1 };
        } else if mine + 1 > leader_slots {
            score += 5;
        } else if mine + 1 == leader_slots {
            score += 2;
        }
        if guild.blocked {
            score -= 3;
        }
        if player
            .character
            .as_ref()
            .is_some_and(|c| c.first_investment_free(number) && mine == 0)
        {
            score += 4;
        }
        // Seven-adjacent sums come up most often.
        score + 6 - i32::from(number.abs_diff(7))
    }

    fn event_score(state: &GameState, player: &Player, card: &EventCard) -> i32 {
        match &card.kind {
            EventKind::GuildFoundation { .. } => 3,
            EventKind::Action { action } => match action {
                ActionKind::GoodHarvest => i32::try_from(player.cultivated_lands()).unwrap_or(0),
                ActionKind::Prosperity => 2,
                ActionKind::Expedition => {
                    if state.expedition.slots_of(player.id) > 0 {
                        2
                    } else {
                        0
                    }
                }
                ActionKind::TaxCollection => {
                    if player.character.as_ref().is_some_and(|c| c.abilities.collects_taxes) {
                        3
                    } else {
                        -1
                    }
                }
                ActionKind::Invasion => -i32::try_from(player.active_inns()).unwrap_or(0),
                ActionKind::LandExpropriation => -i32::try_from(player.lands.len()).unwrap_or(0),
                ActionKind::BadHarvest | ActionKind::Bankruptcy | ActionKind::Mutiny => -1,
            },
            EventKind::Temporary { .. } => {
                let hurt = state
                    .active_guilds
                    .iter()
                    .filter(|g| g.slots_of(player.id) > 0 && card.blocks(g.number))
                    .count();
                -i32::try_from(hurt).unwrap_or(0)
            }
        }
    }
}

impl AiPolicy for HeuristicPolicy {
    fn name(&self) -> &'static str {
        match self.difficulty {
            Difficulty::Easy => "Heuristic (easy)",
            Difficulty::Normal => "Heuristic (normal)",
            Difficulty::Hard => "Heuristic (hard)",
        }
    }

    fn plan_turn(
        &mut self,
        state: &GameState,
        config: &RulesConfig,
        player_id: PlayerId,
    ) -> Vec<Action> {
        let Some(player) = state.players.get(player_id) else {
            return Vec::new();
        };
        let abilities = player.character.as_ref().map(|c| &c.abilities);
        let mut coins = player.coins;
        let mut plan = Vec::new();

        for (index, treasure) in player.treasures.iter().enumerate().rev() {
            if treasure.kind == TreasureKind::Wealth {
                plan.push(Action::ConvertWealth { treasure: index });
                coins += treasure.coin_value.unwrap_or_default();
            }
        }

        let inn_cost = abilities.and_then(|a| a.inn_cost).unwrap_or(config.inn_cost);
        if self.difficulty == Difficulty::Easy {
            if player.has_destroyed_inn() && coins >= config.repair_cost {
                plan.push(Action::RepairInn { inn: None });
                coins -= config.repair_cost;
            }
            if !player.lands.is_empty() && coins >= inn_cost && self.rng.gen_bool(0.6) {
                plan.push(Action::BuildInn { land: None });
                coins -= inn_cost;
            }
            let open: Vec<GuildNumber> = state
                .active_guilds
                .iter()
                .filter(|g| g.has_room())
                .map(|g| g.number)
                .collect();
            if !open.is_empty() && self.rng.gen_bool(0.7) {
                let guild = open[self.rng.gen_range(0..open.len())];
                plan.push(Action::InvestInGuild { guild });
            } else if state.expedition.has_room() && self.rng.gen_bool(0.3) {
                plan.push(Action::InvestInExpedition);
            }
            if coins >= config.land_cost + config.investment_cost && self.rng.gen_bool(0.3) {
                plan.push(Action::BuyLand);
            }
            return plan;
        }

        if player.has_destroyed_inn()
            && (abilities.is_some_and(|a| a.free_repair_per_turn) || coins >= config.repair_cost)
        {
            plan.push(Action::RepairInn { inn: None });
            if !abilities.is_some_and(|a| a.free_repair_per_turn) {
                coins -= config.repair_cost;
            }
        }
        if !player.lands.is_empty() && coins >= inn_cost {
            plan.push(Action::BuildInn { land: None });
            coins -= inn_cost;
        }

        if abilities.is_some_and(|a| a.can_cause_mutiny) && coins >= config.mutiny_ability_cost {
            let target = state.active_guilds.iter().find(|g| {
                g.slots_of(player_id) > 0
                    && g.max_investor.is_some_and(|leader| {
                        leader != player_id && g.slots_of(leader) > 1
                    })
            });
            if let Some(guild) = target {
                plan.push(Action::CauseMutiny {
                    guild: guild.number,
                });
                coins -= config.mutiny_ability_cost;
            }
        }

        let additional = abilities.is_some_and(|a| a.additional_investment);
        let cap = if additional {
            config.max_investments_per_turn_additional
        } else {
            config.max_investments_per_turn
        };
        let mut ranked: Vec<(i32, GuildNumber)> = state
            .active_guilds
            .iter()
            .filter(|g| g.has_room())
            .map(|g| (Self::guild_score(state, player, g.number), g.number))
            .collect();
        ranked.sort_by(|a, b| b.cmp(a));
        let threshold = if self.difficulty == Difficulty::Hard { 0 } else { 2 };
        let mut invested = 0;
        let mut guild_investments = 0;
        let guild_cap = if additional {
            config.max_guild_investments_per_turn
        } else {
            1
        };
        for (score, guild) in ranked {
            if invested >= cap || guild_investments >= guild_cap || score < threshold {
                break;
            }
            let free = player.character.as_ref().is_some_and(|c| {
                c.first_investment_free(guild) && player.reserve > 0
            }) && state.guild(guild).is_some_and(|g| g.slots_of(player_id) == 0);
            if !free && coins < config.investment_cost {
                continue;
            }
            plan.push(Action::InvestInGuild { guild });
            if !free {
                coins -= config.investment_cost;
            }
            invested += 1;
            guild_investments += 1;
        }

        let free_expedition = abilities.is_some_and(|a| a.free_expedition_investment)
            && state.expedition.is_empty();
        if invested < cap
            && state.expedition.has_room()
            && (free_expedition || coins >= config.investment_cost + 1)
        {
            plan.push(Action::InvestInExpedition);
            if !free_expedition {
                coins -= config.investment_cost;
            }
        }

        if abilities.is_some_and(|a| a.treasure_trade)
            && self.difficulty == Difficulty::Hard
            && coins >= config.artisan_buy_cost
            && !state.decks.treasure_deck.is_empty()
        {
            plan.push(Action::BuyTreasure);
            coins -= config.artisan_buy_cost;
        }

        let free_cultivate = abilities.is_some_and(|a| a.free_cultivate_per_turn);
        let mut free_cultivate_left = free_cultivate;
        for (index, land) in player.lands.iter().enumerate() {
            if land.cultivated {
                continue;
            }
            if free_cultivate_left {
                plan.push(Action::CultivateLand { land: index });
                free_cultivate_left = false;
            } else if coins > config.cultivate_cost + 1 {
                plan.push(Action::CultivateLand { land: index });
                coins -= config.cultivate_cost;
            }
        }

        let land_target = if self.difficulty == Difficulty::Hard { 3 } else { 2 };
        if player.lands.len() < land_target && coins >= config.land_cost + 1 {
            plan.push(Action::BuyLand);
        }
        plan
    }

    fn select_character(
        &mut self,
        _state: &GameState,
        _player_id: PlayerId,
        options: &[Character],
    ) -> usize {
        if options.is_empty() {
            return 0;
        }
        if self.difficulty == Difficulty::Easy {
            return self.rng.gen_range(0..options.len());
        }
        let rank = |c: &Character| {
            CHARACTER_PREFERENCE
                .iter()
                .position(|id| *id == c.id)
                .unwrap_or(CHARACTER_PREFERENCE.len())
        };
        options
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| rank(c))
            .map_or(0, |(index, _)| index)
    }

    fn choose_event(
        &mut self,
        state: &GameState,
        player_id: PlayerId,
        options: &[EventCard; 2],
    ) -> usize {
        if self.difficulty == Difficulty::Easy {
            return usize::from(self.rng.gen_bool(0.5));
        }
        let Some(player) = state.players.get(player_id) else {
            return 0;
        };
        let first = Self::event_score(state, player, &options[0]);
        let second = Self::event_score(state, player, &options[1]);
        usize::from(second > first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog;
    use crate::guild::Guild;

    fn state_with_guilds() -> GameState {
        let mut player = Player::new(0, "AI", true).with_holdings(4, 1);
        player.character = catalog().character("shopkeeper").cloned();
        GameState {
            players: vec![player, Player::new(1, "Other", true).with_holdings(4, 1)],
            active_guilds: vec![Guild::new(6, "Farmers"), Guild::new(8, "Tavern")],
            ..GameState::default()
        }
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("HARD".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("brutal".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::Easy.to_string(), "easy");
    }

    #[test]
    fn normal_policy_invests_in_open_guilds() {
        let state = state_with_guilds();
        let mut policy = HeuristicPolicy::new(Difficulty::Normal, 1);
        let plan = policy.plan_turn(&state, &RulesConfig::default(), 0);
        assert!(matches!(plan.first(), Some(Action::InvestInGuild { .. })));
    }

    #[test]
    fn policy_prefers_ranked_characters() {
        let state = state_with_guilds();
        let options = vec![
            catalog().character("physician").unwrap().clone(),
            catalog().character("banker").unwrap().clone(),
        ];
        let mut policy = HeuristicPolicy::new(Difficulty::Hard, 1);
        assert_eq!(policy.select_character(&state, 0, &options), 1);
    }

    #[test]
    fn governor_avoids_events_that_hurt_its_guilds() {
        let mut state = state_with_guilds();
        state.active_guilds[0]
            .add(crate::guild::InvestmentSlot {
                player_id: 0,
                color: state.players[0].color,
                placed_at: 1,
            })
            .unwrap();
        let drought = catalog().event("drought").unwrap().clone();
        let prosperity = catalog().event("prosperity").unwrap().clone();
        let mut policy = HeuristicPolicy::new(Difficulty::Normal, 1);
        assert_eq!(policy.choose_event(&state, 0, &[drought, prosperity]), 1);
    }

    #[test]
    fn actions_serialize_with_a_tag() {
        let json = serde_json::to_string(&Action::InvestInGuild { guild: 5 }).unwrap();
        assert_eq!(json, r#"{"action":"invest_in_guild","guild":5}"#);
    }
}
