//! Guild boards and the expedition track.
//!
//! `Guild` is the only type that rewrites its slot list. Mutiny and
//! bankruptcy build a fresh list and swap it in rather than splicing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::constants::{EXPEDITION_SLOTS, GUILD_CAPACITY};
use crate::error::{CommandError, CommandResult};
use crate::player::{PlayerColor, PlayerId};

/// Dice sum that pays a guild. Never 7.
pub type GuildNumber = u8;

/// One coin placed on a guild or the expedition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentSlot {
    pub player_id: PlayerId,
    pub color: PlayerColor,
    /// Monotonic stamp of the placement, used for first-investor tie-breaks.
    pub placed_at: u64,
}

pub type SlotList = SmallVec<[InvestmentSlot; GUILD_CAPACITY]>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub number: GuildNumber,
    pub name: String,
    pub investments: SlotList,
    pub max_investor: Option<PlayerId>,
    #[serde(default)]
    pub blocked: bool,
}

impl Guild {
    #[must_use]
    pub fn new(number: GuildNumber, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
            investments: SmallVec::new(),
            max_investor: None,
            blocked: false,
        }
    }

    #[must_use]
    pub fn has_room(&self) -> bool {
        self.investments.len() < GUILD_CAPACITY
    }

    /// Number of slots `player_id` holds here.
    #[must_use]
    pub fn slots_of(&self, player_id: PlayerId) -> u32 {
        count_slots(&self.investments, player_id)
    }

    /// Place a slot and refresh leadership.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::GuildFull`] when all four slots are taken.
    pub fn add(&mut self, slot: InvestmentSlot) -> CommandResult<()> {
        if !self.has_room() {
            return Err(CommandError::GuildFull);
        }
        self.investments.push(slot);
        self.recompute_leader();
        Ok(())
    }

    /// Recompute `max_investor`: most slots wins, the incumbent keeps a tie,
    /// otherwise the tied player with the oldest placement wins.
    pub fn recompute_leader(&mut self) {
        let mut counts: BTreeMap<PlayerId, (u32, u64)> = BTreeMap::new();
        for slot in &self.investments {
            let entry = counts.entry(slot.player_id).or_insert((0, slot.placed_at));
            entry.0 += 1;
            entry.1 = entry.1.min(slot.placed_at);
        }
        let Some(best) = counts.values().map(|(count, _)| *count).max() else {
            self.max_investor = None;
            return;
        };
        if let Some(incumbent) = self.max_investor
            && counts.get(&incumbent).is_some_and(|(count, _)| *count == best)
        {
            return;
        }
        self.max_investor = counts
            .iter()
            .filter(|(_, (count, _))| *count == best)
            .min_by_key(|(_, (_, first))| *first)
            .map(|(player_id, _)| *player_id);
    }

    /// Every player with more than one slot loses their most recent one.
    /// Survivors are laid out round-robin by seat. Returns the players that
    /// lost a slot, in seat order.
    pub fn mutiny(&mut self) -> Vec<PlayerId> {
        let mut by_player: BTreeMap<PlayerId, Vec<InvestmentSlot>> = BTreeMap::new();
        for slot in &self.investments {
            by_player.entry(slot.player_id).or_default().push(*slot);
        }
        let mut losers = Vec::new();
        for (player_id, slots) in &mut by_player {
            if slots.len() > 1 {
                slots.pop();
                losers.push(*player_id);
            }
        }
        let depth = by_player.values().map(Vec::len).max().unwrap_or_default();
        let mut relaid = SlotList::new();
        for row in 0..depth {
            for slots in by_player.values() {
                if let Some(slot) = slots.get(row) {
                    relaid.push(*slot);
                }
            }
        }
        self.investments = relaid;
        self.recompute_leader();
        losers
    }

    /// Drop every slot. Returns `(player, slots lost)` in seat order.
    pub fn clear(&mut self) -> Vec<(PlayerId, u32)> {
        let lost = tally(&self.investments);
        self.investments = SlotList::new();
        self.max_investor = None;
        lost
    }

    /// Coins each investor collects when this guild pays out.
    #[must_use]
    pub fn payouts(&self) -> Vec<(PlayerId, u32)> {
        tally(&self.investments)
    }
}

/// The four-slot expedition track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expedition {
    pub investments: SlotList,
    pub max_slots: usize,
}

impl Default for Expedition {
    fn default() -> Self {
        Self {
            investments: SlotList::new(),
            max_slots: EXPEDITION_SLOTS,
        }
    }
}

impl Expedition {
    #[must_use]
    pub fn has_room(&self) -> bool {
        self.investments.len() < self.max_slots
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        !self.has_room()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.investments.is_empty()
    }

    #[must_use]
    pub fn slots_of(&self, player_id: PlayerId) -> u32 {
        count_slots(&self.investments, player_id)
    }

    /// # Errors
    ///
    /// Returns [`CommandError::ExpeditionFull`] when no slot is free.
    pub fn add(&mut self, slot: InvestmentSlot) -> CommandResult<()> {
        if !self.has_room() {
            return Err(CommandError::ExpeditionFull);
        }
        self.investments.push(slot);
        Ok(())
    }

    /// Empty the track, returning the slots in placement order.
    pub fn take(&mut self) -> SlotList {
        std::mem::take(&mut self.investments)
    }
}

fn count_slots(slots: &[InvestmentSlot], player_id: PlayerId) -> u32 {
    let count = slots.iter().filter(|s| s.player_id == player_id).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

fn tally(slots: &[InvestmentSlot]) -> Vec<(PlayerId, u32)> {
    let mut counts: BTreeMap<PlayerId, u32> = BTreeMap::new();
    for slot in slots {
        *counts.entry(slot.player_id).or_default() += 1;
    }
    counts.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(player_id: PlayerId, placed_at: u64) -> InvestmentSlot {
        InvestmentSlot {
            player_id,
            color: PlayerColor::for_seat(player_id),
            placed_at,
        }
    }

    fn owners(guild: &Guild) -> Vec<PlayerId> {
        guild.investments.iter().map(|s| s.player_id).collect()
    }

    #[test]
    fn capacity_is_four() {
        let mut guild = Guild::new(5, "Harbour");
        for stamp in 0..4 {
            guild.add(slot(0, stamp)).unwrap();
        }
        assert_eq!(guild.add(slot(1, 9)), Err(CommandError::GuildFull));
        assert_eq!(guild.investments.len(), 4);
    }

    #[test]
    fn incumbent_keeps_a_tie() {
        let mut guild = Guild::new(6, "Farmers");
        guild.add(slot(1, 0)).unwrap();
        assert_eq!(guild.max_investor, Some(1));
        guild.add(slot(0, 1)).unwrap();
        assert_eq!(guild.max_investor, Some(1));
        guild.add(slot(0, 2)).unwrap();
        assert_eq!(guild.max_investor, Some(0));
        guild.add(slot(1, 3)).unwrap();
        assert_eq!(guild.max_investor, Some(0));
    }

    #[test]
    fn earliest_investor_wins_an_open_tie() {
        let mut guild = Guild::new(9, "Caravan");
        guild.investments.push(slot(2, 5));
        guild.investments.push(slot(1, 3));
        guild.recompute_leader();
        assert_eq!(guild.max_investor, Some(1));
    }

    #[test]
    fn mutiny_removes_most_recent_slot_and_relays() {
        let mut guild = Guild::new(5, "Harbour");
        guild.add(slot(0, 0)).unwrap();
        guild.add(slot(1, 1)).unwrap();
        guild.add(slot(0, 2)).unwrap();
        assert_eq!(guild.max_investor, Some(0));

        let losers = guild.mutiny();
        assert_eq!(losers, vec![0]);
        assert_eq!(owners(&guild), vec![0, 1]);
        assert_eq!(guild.investments[0].placed_at, 0);
        assert_eq!(guild.max_investor, Some(0));
    }

    #[test]
    fn mutiny_interleaves_by_seat() {
        let mut guild = Guild::new(10, "Masons");
        guild.add(slot(2, 0)).unwrap();
        guild.add(slot(2, 1)).unwrap();
        guild.add(slot(2, 2)).unwrap();
        guild.add(slot(0, 3)).unwrap();
        let losers = guild.mutiny();
        assert_eq!(losers, vec![2]);
        assert_eq!(owners(&guild), vec![0, 2, 2]);
        assert_eq!(guild.max_investor, Some(2));
    }

    #[test]
    fn clear_reports_losses_and_resets_leader() {
        let mut guild = Guild::new(4, "Weavers");
        guild.add(slot(1, 0)).unwrap();
        guild.add(slot(0, 1)).unwrap();
        guild.add(slot(1, 2)).unwrap();
        assert_eq!(guild.payouts(), vec![(0, 1), (1, 2)]);
        assert_eq!(guild.clear(), vec![(0, 1), (1, 2)]);
        assert!(guild.investments.is_empty());
        assert_eq!(guild.max_investor, None);
    }

    #[test]
    fn expedition_fills_to_four() {
        let mut expedition = Expedition::default();
        assert!(expedition.is_empty());
        for stamp in 0..4 {
            expedition.add(slot(0, stamp)).unwrap();
        }
        assert!(expedition.is_full());
        assert_eq!(expedition.add(slot(1, 9)), Err(CommandError::ExpeditionFull));
        assert_eq!(expedition.take().len(), 4);
        assert!(expedition.is_empty());
    }
}
