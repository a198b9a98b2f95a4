//! Tunable rule numbers for a Gremios match.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;

use crate::constants::{DIE_FACES, is_guild_number};
use crate::guild::GuildNumber;

/// Errors raised when rule configuration invariants are violated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("player range invalid (min {min} > max {max})")]
    PlayerRange { min: usize, max: usize },
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: u32,
        value: u32,
    },
    #[error("expedition window invalid ({min}..={max})")]
    ExpeditionWindow { min: u8, max: u8 },
    #[error("investment caps inconsistent: base {base}, additional {additional}")]
    InvestmentCaps { base: u32, additional: u32 },
    #[error("reserve share {share} exceeds investment cost {cost}")]
    ReserveShare { share: u32, cost: u32 },
    #[error("guild {0} cannot be part of the initial board")]
    InitialGuild(GuildNumber),
}

/// Every economy and pacing number used by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    pub victory_points_to_win: u32,
    pub min_players: usize,
    pub max_players: usize,
    pub starting_coins: u32,
    pub starting_lands: usize,
    /// Coins granted to the current player in the collection phase.
    pub turn_stipend: u32,
    /// Coins paid for a regular guild or expedition investment.
    pub investment_cost: u32,
    /// Part of the investment cost that is parked in the reserve.
    pub investment_reserve_share: u32,
    pub land_cost: u32,
    pub cultivate_cost: u32,
    pub inn_cost: u32,
    pub repair_cost: u32,
    pub mutiny_ability_cost: u32,
    pub artisan_buy_cost: u32,
    pub artisan_sell_value: u32,
    pub max_investments_per_turn: u32,
    pub max_investments_per_turn_additional: u32,
    pub max_guild_investments_per_turn: u32,
    /// Only relevant for characters allowed to repeat a category.
    pub max_expedition_investments_per_turn: u32,
    pub expedition_success_min: u8,
    pub expedition_success_max: u8,
    pub tax_threshold: u32,
    pub emblem_min_treasures: usize,
    pub initial_guilds: Vec<GuildNumber>,
    /// Event cards removed before the first draw, keyed by player count.
    #[serde(default)]
    pub set_aside_events: BTreeMap<usize, usize>,
}

impl RulesConfig {
    /// Parse a configuration from JSON. Call [`RulesConfig::validate`] before
    /// handing it to an engine.
    ///
    /// # Errors
    ///
    /// Returns an error when the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The rule set shipped with the game.
    ///
    /// # Panics
    ///
    /// Panics when the embedded `rules.json` asset does not parse.
    #[must_use]
    pub fn standard() -> &'static Self {
        static STANDARD: OnceLock<RulesConfig> = OnceLock::new();
        STANDARD.get_or_init(|| {
            Self::from_json(include_str!("../assets/data/rules.json"))
                .expect("valid standard rules config")
        })
    }

    /// Check that the numbers describe a playable game.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_players < 2 || self.min_players > self.max_players {
            return Err(ConfigError::PlayerRange {
                min: self.min_players,
                max: self.max_players,
            });
        }
        for (field, value, min) in [
            ("victory_points_to_win", self.victory_points_to_win, 1),
            ("investment_cost", self.investment_cost, 1),
            ("max_investments_per_turn", self.max_investments_per_turn, 1),
            (
                "max_guild_investments_per_turn",
                self.max_guild_investments_per_turn,
                1,
            ),
        ] {
            if value < min {
                return Err(ConfigError::MinViolation { field, min, value });
            }
        }
        if self.investment_reserve_share > self.investment_cost {
            return Err(ConfigError::ReserveShare {
                share: self.investment_reserve_share,
                cost: self.investment_cost,
            });
        }
        if self.max_investments_per_turn_additional < self.max_investments_per_turn {
            return Err(ConfigError::InvestmentCaps {
                base: self.max_investments_per_turn,
                additional: self.max_investments_per_turn_additional,
            });
        }
        let min_sum = 2;
        let max_sum = DIE_FACES * 2;
        if self.expedition_success_min < min_sum
            || self.expedition_success_max > max_sum
            || self.expedition_success_min > self.expedition_success_max
        {
            return Err(ConfigError::ExpeditionWindow {
                min: self.expedition_success_min,
                max: self.expedition_success_max,
            });
        }
        for (idx, guild) in self.initial_guilds.iter().enumerate() {
            if !is_guild_number(*guild) || self.initial_guilds[..idx].contains(guild) {
                return Err(ConfigError::InitialGuild(*guild));
            }
        }
        Ok(())
    }

    /// Event cards to set aside for `player_count` seats.
    #[must_use]
    pub fn set_aside_for(&self, player_count: usize) -> usize {
        self.set_aside_events
            .get(&player_count)
            .copied()
            .unwrap_or_default()
    }

    /// Inclusive dice-sum window in which an expedition succeeds.
    #[must_use]
    pub const fn expedition_succeeds(&self, sum: u8) -> bool {
        sum >= self.expedition_success_min && sum <= self.expedition_success_max
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self::standard().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_rules_validate() {
        let cfg = RulesConfig::default();
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.victory_points_to_win, 10);
        assert_eq!(cfg.set_aside_for(2), 6);
        assert_eq!(cfg.set_aside_for(9), 0);
    }

    #[test]
    fn expedition_window_is_inclusive() {
        let cfg = RulesConfig::default();
        assert!(!cfg.expedition_succeeds(5));
        assert!(cfg.expedition_succeeds(6));
        assert!(cfg.expedition_succeeds(7));
        assert!(cfg.expedition_succeeds(8));
        assert!(!cfg.expedition_succeeds(9));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = RulesConfig::default();
        cfg.initial_guilds = vec![6, 7];
        assert_eq!(cfg.validate(), Err(ConfigError::InitialGuild(7)));

        let mut cfg = RulesConfig::default();
        cfg.initial_guilds = vec![6, 6];
        assert_eq!(cfg.validate(), Err(ConfigError::InitialGuild(6)));

        let mut cfg = RulesConfig::default();
        cfg.min_players = 4;
        cfg.max_players = 3;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::PlayerRange { min: 4, max: 3 })
        ));

        let mut cfg = RulesConfig::default();
        cfg.expedition_success_min = 9;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ExpeditionWindow { .. })
        ));

        let mut cfg = RulesConfig::default();
        cfg.max_investments_per_turn_additional = 1;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvestmentCaps { .. })
        ));
    }

    #[test]
    fn rules_roundtrip_through_json() {
        let cfg = RulesConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let restored = RulesConfig::from_json(&json).unwrap();
        assert_eq!(restored, cfg);
    }
}
