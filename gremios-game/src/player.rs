//! Per-seat economy: coins, reserve, holdings, and per-turn bookkeeping.

use serde::{Deserialize, Serialize};

use crate::character::Character;
use crate::error::{CommandError, CommandResult};

/// Seat index, stable for the whole match.
pub type PlayerId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerColor {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
}

impl PlayerColor {
    pub const ALL: [Self; 5] = [
        Self::Red,
        Self::Blue,
        Self::Green,
        Self::Yellow,
        Self::Purple,
    ];

    #[must_use]
    pub const fn for_seat(seat: PlayerId) -> Self {
        Self::ALL[seat % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreasureKind {
    /// Cashable for coins, worth no victory points.
    Wealth,
    Common,
    Rare,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasure {
    pub id: String,
    pub name: String,
    pub kind: TreasureKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin_value: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vp: Option<u32>,
}

impl Treasure {
    #[must_use]
    pub fn victory_points(&self) -> u32 {
        match self.kind {
            TreasureKind::Wealth => 0,
            TreasureKind::Common | TreasureKind::Rare => self.vp.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Land {
    pub cultivated: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inn {
    pub destroyed: bool,
}

/// Counters cleared when the player's collection phase runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnFlags {
    pub investments: u32,
    pub guild_investments: u32,
    pub expedition_investments: u32,
    pub invested_in_guild: bool,
    pub invested_in_expedition: bool,
    pub used_free_cultivate: bool,
    pub used_free_repair: bool,
    pub used_mutiny_ability: bool,
    pub used_artisan_treasure_ability: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_ai: bool,
    pub color: PlayerColor,
    pub coins: u32,
    pub reserve: u32,
    pub lands: Vec<Land>,
    pub inns: Vec<Inn>,
    pub treasures: Vec<Treasure>,
    #[serde(default)]
    pub turn: TurnFlags,
    #[serde(default)]
    pub character: Option<Character>,
    #[serde(default)]
    pub has_discoverer_emblem: bool,
    /// Stamp of the last change to the treasure count.
    #[serde(default)]
    pub treasure_count_stamp: u64,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>, is_ai: bool) -> Self {
        Self {
            id,
            name: name.into(),
            is_ai,
            color: PlayerColor::for_seat(id),
            coins: 0,
            reserve: 0,
            lands: Vec::new(),
            inns: Vec::new(),
            treasures: Vec::new(),
            turn: TurnFlags::default(),
            character: None,
            has_discoverer_emblem: false,
            treasure_count_stamp: 0,
        }
    }

    /// Starting purse and uncultivated lands.
    #[must_use]
    pub fn with_holdings(mut self, coins: u32, lands: usize) -> Self {
        self.coins = coins;
        self.lands = vec![Land::default(); lands];
        self
    }

    #[must_use]
    pub fn character_id(&self) -> Option<&str> {
        self.character.as_ref().map(|c| c.id.as_str())
    }

    #[must_use]
    pub fn cultivated_lands(&self) -> u32 {
        count(self.lands.iter().filter(|land| land.cultivated))
    }

    #[must_use]
    pub fn active_inns(&self) -> u32 {
        count(self.inns.iter().filter(|inn| !inn.destroyed))
    }

    #[must_use]
    pub fn has_destroyed_inn(&self) -> bool {
        self.inns.iter().any(|inn| inn.destroyed)
    }

    #[must_use]
    pub fn treasure_victory_points(&self) -> u32 {
        self.treasures.iter().map(Treasure::victory_points).sum()
    }

    /// Victory points that do not depend on the board: inns, treasures, and
    /// the emblem. Guild leadership is added by the game state.
    #[must_use]
    pub fn holding_victory_points(&self, include_treasures: bool) -> u32 {
        let treasures = if include_treasures {
            self.treasure_victory_points()
        } else {
            0
        };
        self.active_inns() + treasures + u32::from(self.has_discoverer_emblem)
    }

    pub fn add_coins(&mut self, amount: u32) {
        self.coins = self.coins.saturating_add(amount);
    }

    /// # Errors
    ///
    /// Returns [`CommandError::InsufficientCoins`] without spending anything.
    pub fn spend_coins(&mut self, amount: u32) -> CommandResult<()> {
        self.coins = self
            .coins
            .checked_sub(amount)
            .ok_or(CommandError::InsufficientCoins)?;
        Ok(())
    }

    /// Remove up to `amount` coins, returning how many were taken.
    pub fn lose_coins(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.coins);
        self.coins -= taken;
        taken
    }

    pub fn add_to_reserve(&mut self, amount: u32) {
        self.reserve = self.reserve.saturating_add(amount);
    }

    /// # Errors
    ///
    /// Returns [`CommandError::InsufficientReserve`] without spending anything.
    pub fn spend_reserve(&mut self, amount: u32) -> CommandResult<()> {
        self.reserve = self
            .reserve
            .checked_sub(amount)
            .ok_or(CommandError::InsufficientReserve)?;
        Ok(())
    }

    /// Move up to `amount` coins from the reserve into the purse.
    pub fn release_reserve(&mut self, amount: u32) -> u32 {
        let moved = amount.min(self.reserve);
        self.reserve -= moved;
        self.coins = self.coins.saturating_add(moved);
        moved
    }

    pub fn add_land(&mut self, cultivated: bool) {
        self.lands.push(Land { cultivated });
    }

    /// Check that `index` names an uncultivated land.
    ///
    /// # Errors
    ///
    /// Returns why the land cannot be cultivated.
    pub fn check_cultivatable(&self, index: usize) -> CommandResult<()> {
        match self.lands.get(index) {
            None => Err(CommandError::InvalidLand),
            Some(land) if land.cultivated => Err(CommandError::AlreadyCultivated),
            Some(_) => Ok(()),
        }
    }

    /// # Errors
    ///
    /// Returns why the land cannot be cultivated.
    pub fn cultivate(&mut self, index: usize) -> CommandResult<()> {
        self.check_cultivatable(index)?;
        self.lands[index].cultivated = true;
        Ok(())
    }

    /// Resolve which land an inn goes on: the requested one, else the first
    /// uncultivated land, else the first land.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NoLand`] or [`CommandError::InvalidLand`].
    pub fn inn_site(&self, requested: Option<usize>) -> CommandResult<usize> {
        if self.lands.is_empty() {
            return Err(CommandError::NoLand);
        }
        match requested {
            Some(index) if index < self.lands.len() => Ok(index),
            Some(_) => Err(CommandError::InvalidLand),
            None => Ok(self
                .lands
                .iter()
                .position(|land| !land.cultivated)
                .unwrap_or(0)),
        }
    }

    /// Turn a land into an inn.
    ///
    /// # Errors
    ///
    /// Returns why no inn can be built on the requested site.
    pub fn build_inn(&mut self, requested: Option<usize>) -> CommandResult<usize> {
        let site = self.inn_site(requested)?;
        self.lands.remove(site);
        self.inns.push(Inn::default());
        Ok(site)
    }

    /// Resolve which inn to repair: the requested one or the first destroyed.
    ///
    /// # Errors
    ///
    /// Returns why no inn can be repaired.
    pub fn repair_site(&self, requested: Option<usize>) -> CommandResult<usize> {
        match requested {
            Some(index) => match self.inns.get(index) {
                None => Err(CommandError::InvalidInn),
                Some(inn) if !inn.destroyed => Err(CommandError::InnNotDestroyed),
                Some(_) => Ok(index),
            },
            None => self
                .inns
                .iter()
                .position(|inn| inn.destroyed)
                .ok_or(CommandError::NoDestroyedInn),
        }
    }

    /// # Errors
    ///
    /// Returns why no inn can be repaired.
    pub fn repair_inn(&mut self, requested: Option<usize>) -> CommandResult<usize> {
        let site = self.repair_site(requested)?;
        self.inns[site].destroyed = false;
        Ok(site)
    }

    /// Destroy the first `amount` active inns. Returns how many fell.
    pub fn destroy_inns(&mut self, amount: u32) -> u32 {
        let mut destroyed = 0;
        for inn in self.inns.iter_mut().filter(|inn| !inn.destroyed) {
            if destroyed == amount {
                break;
            }
            inn.destroyed = true;
            destroyed += 1;
        }
        destroyed
    }

    /// Remove `amount` lands, uncultivated ones first, from the back of the
    /// list. Returns how many were removed.
    pub fn expropriate_lands(&mut self, amount: usize) -> usize {
        let mut removed = 0;
        for wanted_cultivated in [false, true] {
            while removed < amount {
                let Some(index) = self
                    .lands
                    .iter()
                    .rposition(|land| land.cultivated == wanted_cultivated)
                else {
                    break;
                };
                self.lands.remove(index);
                removed += 1;
            }
        }
        removed
    }

    pub fn add_treasure(&mut self, treasure: Treasure, stamp: u64) {
        self.treasures.push(treasure);
        self.treasure_count_stamp = stamp;
    }

    /// # Errors
    ///
    /// Returns [`CommandError::InvalidTreasure`] for an unknown index.
    pub fn remove_treasure(&mut self, index: usize, stamp: u64) -> CommandResult<Treasure> {
        if index >= self.treasures.len() {
            return Err(CommandError::InvalidTreasure);
        }
        self.treasure_count_stamp = stamp;
        Ok(self.treasures.remove(index))
    }

    pub fn reset_turn(&mut self) {
        self.turn = TurnFlags::default();
    }
}

fn count<I: Iterator>(iter: I) -> u32 {
    u32::try_from(iter.count()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new(0, "Ana", false).with_holdings(4, 1)
    }

    #[test]
    fn spending_never_goes_negative() {
        let mut p = player();
        assert_eq!(p.spend_coins(5), Err(CommandError::InsufficientCoins));
        assert_eq!(p.coins, 4);
        assert_eq!(p.spend_reserve(1), Err(CommandError::InsufficientReserve));
        p.spend_coins(4).unwrap();
        assert_eq!(p.coins, 0);
        assert_eq!(p.lose_coins(3), 0);
    }

    #[test]
    fn release_reserve_is_capped() {
        let mut p = player();
        p.add_to_reserve(1);
        assert_eq!(p.release_reserve(3), 1);
        assert_eq!((p.coins, p.reserve), (5, 0));
    }

    #[test]
    fn inns_prefer_uncultivated_land() {
        let mut p = player();
        p.lands = vec![Land { cultivated: true }, Land { cultivated: false }];
        assert_eq!(p.build_inn(None), Ok(1));
        assert_eq!(p.lands, vec![Land { cultivated: true }]);
        assert_eq!(p.active_inns(), 1);
        assert_eq!(p.build_inn(Some(3)), Err(CommandError::InvalidLand));
        assert_eq!(p.build_inn(None), Ok(0));
        assert_eq!(p.build_inn(None), Err(CommandError::NoLand));
    }

    #[test]
    fn invasion_destroys_from_the_front() {
        let mut p = player();
        p.inns = vec![Inn::default(); 3];
        assert_eq!(p.destroy_inns(2), 2);
        assert!(p.inns[0].destroyed && p.inns[1].destroyed && !p.inns[2].destroyed);
        assert_eq!(p.repair_site(Some(2)), Err(CommandError::InnNotDestroyed));
        assert_eq!(p.repair_inn(None), Ok(0));
        assert_eq!(p.active_inns(), 2);
    }

    #[test]
    fn expropriation_takes_uncultivated_first() {
        let mut p = player();
        p.lands = vec![
            Land { cultivated: true },
            Land { cultivated: false },
            Land { cultivated: true },
        ];
        assert_eq!(p.expropriate_lands(2), 2);
        assert_eq!(p.lands, vec![Land { cultivated: true }]);
    }

    #[test]
    fn wealth_treasures_are_worth_no_points() {
        let mut p = player();
        p.add_treasure(
            Treasure {
                id: "coin_chest".into(),
                name: "Coin Chest".into(),
                kind: TreasureKind::Wealth,
                coin_value: Some(3),
                vp: None,
            },
            1,
        );
        p.add_treasure(
            Treasure {
                id: "golden_idol".into(),
                name: "Golden Idol".into(),
                kind: TreasureKind::Rare,
                coin_value: None,
                vp: Some(2),
            },
            2,
        );
        assert_eq!(p.treasure_victory_points(), 2);
        assert_eq!(p.holding_victory_points(false), 0);
        assert_eq!(p.treasure_count_stamp, 2);
    }
}
