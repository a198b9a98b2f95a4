//! Fixed board geometry and well-known card identifiers for Gremios.
//!
//! Tunable economy numbers live in [`crate::config::RulesConfig`]; the values
//! here describe the physical board and never change between matches.

use crate::guild::GuildNumber;

// Board geometry -----------------------------------------------------------
/// Every guild number that can ever be founded. 7 clears the board instead.
pub const GUILD_NUMBERS: [GuildNumber; 10] = [2, 3, 4, 5, 6, 8, 9, 10, 11, 12];
pub const GUILD_CAPACITY: usize = 4;
pub const EXPEDITION_SLOTS: usize = 4;
pub const CLEARING_SUM: u8 = 7;
pub const DIE_FACES: u8 = 6;

// Temporary events ---------------------------------------------------------
pub const PLAGUE_EVENT_ID: &str = "plague";
pub const TRADE_BLOCKADE_EVENT_ID: &str = "trade_blockade";
/// Copies of one temporary event that trigger a mutiny on its guilds.
pub(crate) const ESCALATION_MUTINY_TIER: usize = 2;
/// Copies of one temporary event that bankrupt its guilds and burn it out.
pub(crate) const ESCALATION_BANKRUPTCY_TIER: usize = 3;

// Character selection -----------------------------------------------------
pub(crate) const CHARACTER_OFFER_SIZE: usize = 2;

// RNG domain tags -----------------------------------------------------------
pub(crate) const RNG_TAG_DICE: &[u8] = b"dice";
pub(crate) const RNG_TAG_DECK: &[u8] = b"deck";
pub(crate) const RNG_TAG_EFFECTS: &[u8] = b"effects";
pub(crate) const RNG_TAG_CHARACTERS: &[u8] = b"characters";
pub(crate) const RNG_TAG_AI: &[u8] = b"ai";

/// Whether `number` names a guild that may exist on the board.
#[must_use]
pub fn is_guild_number(number: GuildNumber) -> bool {
    GUILD_NUMBERS.contains(&number)
}
