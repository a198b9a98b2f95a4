//! Character capability flags and trigger hooks.
//!
//! A character is data, not behaviour: a set of flags consulted by commands
//! plus a list of hooks. Every trigger point in the engine calls
//! [`dispatch_hooks`] once and the hooks that match pay out.

use serde::{Deserialize, Serialize};

use crate::guild::GuildNumber;
use crate::player::{Player, PlayerId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub abilities: AbilityFlags,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hooks: Vec<AbilityHook>,
}

impl Character {
    #[must_use]
    pub fn has_hook(&self, trigger: Trigger) -> bool {
        self.hooks.iter().any(|hook| hook.trigger == trigger)
    }

    /// Whether an investment in `guild` may use the free first slot.
    #[must_use]
    pub fn first_investment_free(&self, guild: GuildNumber) -> bool {
        self.abilities.first_investment_free.contains(&guild)
    }
}

/// Passive capabilities. Absent fields mean the ability does not apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityFlags {
    pub draw_two_events: bool,
    pub additional_investment: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub first_investment_free: Vec<GuildNumber>,
    pub free_expedition_investment: bool,
    pub free_cultivate_per_turn: bool,
    pub free_repair_per_turn: bool,
    pub can_cause_mutiny: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inn_cost: Option<u32>,
    pub trade_blockade_immunity: bool,
    pub collects_taxes: bool,
    pub harvest_bonus: bool,
    pub treasure_trade: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    TurnStart,
    OtherPlayerInvestGuild,
    OtherPlayerBuyLand,
    OtherPlayerBuildInn,
    InnsDestroyedElsewhere,
    PlagueEnd,
    Invasion,
    FailedExpedition,
    SlotLostToMutiny,
    SlotsLostToBankruptcy,
}

/// Which seats a trigger is offered to, relative to the acting player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Audience {
    Actor,
    Others,
    Everyone,
}

impl Trigger {
    const fn audience(self) -> Audience {
        match self {
            Self::TurnStart | Self::SlotLostToMutiny | Self::SlotsLostToBankruptcy => {
                Audience::Actor
            }
            Self::OtherPlayerInvestGuild
            | Self::OtherPlayerBuyLand
            | Self::OtherPlayerBuildInn
            | Self::InnsDestroyedElsewhere => Audience::Others,
            Self::PlagueEnd | Self::Invasion | Self::FailedExpedition => Audience::Everyone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityHook {
    pub trigger: Trigger,
    /// Restricts guild triggers to these guilds when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub guilds: Vec<GuildNumber>,
    pub effect: AbilityEffect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbilityEffect {
    GainCoins { amount: u32 },
    GainReserve { amount: u32 },
    /// Move coins from the owner's reserve into their purse.
    ReleaseReserve { amount: u32 },
    /// Coins scaled by the trigger's unit count (slots, inns, ...).
    CoinsPerUnit { per_unit: u32 },
}

/// What happened at a trigger point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookContext {
    pub actor: Option<PlayerId>,
    pub guild: Option<GuildNumber>,
    pub units: u32,
}

impl HookContext {
    #[must_use]
    pub const fn actor(actor: PlayerId) -> Self {
        Self {
            actor: Some(actor),
            guild: None,
            units: 0,
        }
    }

    #[must_use]
    pub const fn with_guild(mut self, guild: GuildNumber) -> Self {
        self.guild = Some(guild);
        self
    }

    #[must_use]
    pub const fn with_units(mut self, units: u32) -> Self {
        self.units = units;
        self
    }
}

/// A hook that paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookPayout {
    pub player_id: PlayerId,
    pub trigger: Trigger,
    pub coins: u32,
    /// The coins came out of the owner's reserve.
    pub from_reserve: bool,
    /// The coins were added to the reserve instead of the purse.
    pub into_reserve: bool,
}

/// Run every hook registered for `trigger` and apply its effect.
pub(crate) fn dispatch_hooks(
    players: &mut [Player],
    trigger: Trigger,
    ctx: HookContext,
) -> Vec<HookPayout> {
    let audience = trigger.audience();
    let mut payouts = Vec::new();
    for player in players.iter_mut() {
        let listening = match audience {
            Audience::Actor => ctx.actor == Some(player.id),
            Audience::Others => ctx.actor.is_some_and(|actor| actor != player.id),
            Audience::Everyone => true,
        };
        if !listening {
            continue;
        }
        let effects: Vec<AbilityEffect> = player
            .character
            .iter()
            .flat_map(|character| character.hooks.iter())
            .filter(|hook| hook.trigger == trigger)
            .filter(|hook| {
                hook.guilds.is_empty() || ctx.guild.is_some_and(|g| hook.guilds.contains(&g))
            })
            .map(|hook| hook.effect)
            .collect();
        for effect in effects {
            if let Some(payout) = apply_effect(player, trigger, effect, ctx.units) {
                log::debug!(
                    "hook {:?} paid {} coin(s) to player {}",
                    trigger,
                    payout.coins,
                    payout.player_id
                );
                payouts.push(payout);
            }
        }
    }
    payouts
}

fn apply_effect(
    player: &mut Player,
    trigger: Trigger,
    effect: AbilityEffect,
    units: u32,
) -> Option<HookPayout> {
    let mut payout = HookPayout {
        player_id: player.id,
        trigger,
        coins: 0,
        from_reserve: false,
        into_reserve: false,
    };
    match effect {
        AbilityEffect::GainCoins { amount } => {
            player.add_coins(amount);
            payout.coins = amount;
        }
        AbilityEffect::CoinsPerUnit { per_unit } => {
            let amount = per_unit.saturating_mul(units);
            player.add_coins(amount);
            payout.coins = amount;
        }
        AbilityEffect::GainReserve { amount } => {
            player.add_to_reserve(amount);
            payout.coins = amount;
            payout.into_reserve = true;
        }
        AbilityEffect::ReleaseReserve { amount } => {
            payout.coins = player.release_reserve(amount);
            payout.from_reserve = true;
        }
    }
    (payout.coins > 0).then_some(payout)
}
