//! Event card resolution, temporary-event escalation, and guild blocking.

use rand::Rng;

use crate::character::{HookContext, Trigger, dispatch_hooks};
use crate::config::RulesConfig;
use crate::constants::{ESCALATION_BANKRUPTCY_TIER, ESCALATION_MUTINY_TIER, PLAGUE_EVENT_ID};
use crate::data::{ActionKind, EventCard, EventKind, GameCatalog};
use crate::guild::{Guild, GuildNumber, InvestmentSlot};
use crate::rng::RngBundle;
use crate::state::GameState;

/// Applies one event card to the board.
pub struct EventHandler<'a> {
    state: &'a mut GameState,
    config: &'a RulesConfig,
    catalog: &'a GameCatalog,
    rng: &'a mut RngBundle,
}

impl<'a> EventHandler<'a> {
    pub fn new(
        state: &'a mut GameState,
        config: &'a RulesConfig,
        catalog: &'a GameCatalog,
        rng: &'a mut RngBundle,
    ) -> Self {
        Self {
            state,
            config,
            catalog,
            rng,
        }
    }

    /// Apply `card` and describe what happened.
    pub fn handle_event(&mut self, card: &EventCard) -> String {
        let description = match &card.kind {
            EventKind::GuildFoundation { guild } => self.found_guild(*guild),
            EventKind::Action { action } => self.handle_action(*action),
            EventKind::Temporary { .. } => self.handle_temporary(card),
        };
        log::debug!("event {}: {description}", card.id);
        description
    }

    fn found_guild(&mut self, number: GuildNumber) -> String {
        let name = self.catalog.guild_name(number).to_string();
        if self.state.guild(number).is_some() {
            return format!("The {name} already stand on the board.");
        }
        let position = self
            .state
            .active_guilds
            .iter()
            .position(|g| g.number > number)
            .unwrap_or(self.state.active_guilds.len());
        self.state
            .active_guilds
            .insert(position, Guild::new(number, name.clone()));
        update_guild_blocking(self.state);
        let blocked = self.state.guild(number).is_some_and(|g| g.blocked);
        if blocked {
            format!("The {name} (#{number}) are founded, but already blocked.")
        } else {
            format!("The {name} (#{number}) are founded.")
        }
    }

    fn handle_action(&mut self, action: ActionKind) -> String {
        match action {
            ActionKind::GoodHarvest => self.good_harvest(),
            ActionKind::Prosperity => {
                for player in &mut self.state.players {
                    player.add_coins(1);
                }
                let cleared = clear_temporary_events(self.state);
                if cleared {
                    "Prosperity: everyone earns a coin and all temporary events end.".to_string()
                } else {
                    "Prosperity: everyone earns a coin.".to_string()
                }
            }
            ActionKind::Expedition => self.launch_expedition(),
            ActionKind::BadHarvest => self.bad_harvest(),
            ActionKind::Bankruptcy => {
                self.state.next_roll_bankruptcy = true;
                "The guild matching the next roll will go bankrupt.".to_string()
            }
            ActionKind::Mutiny => {
                self.state.next_roll_mutiny = true;
                "The guild matching the next roll will suffer a mutiny.".to_string()
            }
            ActionKind::Invasion => self.invasion(),
            ActionKind::LandExpropriation => {
                let mut total = 0;
                for player in &mut self.state.players {
                    let quota = player.lands.len().div_ceil(2);
                    total += player.expropriate_lands(quota);
                }
                format!("Land expropriation: {total} land(s) confiscated.")
            }
            ActionKind::TaxCollection => self.tax_collection(),
        }
    }

    fn good_harvest(&mut self) -> String {
        let total: u32 = self
            .state
            .players
            .iter()
            .map(crate::player::Player::cultivated_lands)
            .sum();
        let bonus = u32::try_from(self.state.players.len().saturating_sub(1)).unwrap_or(0);
        for player in &mut self.state.players {
            let own = player.cultivated_lands();
            player.add_coins(own);
            let harvest_bonus = player
                .character
                .as_ref()
                .is_some_and(|c| c.abilities.harvest_bonus);
            if harvest_bonus && own > total - own {
                player.add_coins(bonus);
                log::debug!("harvest bonus of {bonus} for player {}", player.id);
            }
        }
        format!("Good harvest: {total} cultivated land(s) pay out.")
    }

    fn launch_expedition(&mut self) -> String {
        let stowaway = self.state.players.iter().find(|p| {
            p.character
                .as_ref()
                .is_some_and(|c| c.abilities.free_expedition_investment)
                && self.state.expedition.slots_of(p.id) == 0
        });
        if let Some((player_id, color)) = stowaway.map(|p| (p.id, p.color))
            && self.state.expedition.has_room()
        {
            let placed_at = self.state.next_stamp();
            let slot = InvestmentSlot {
                player_id,
                color,
                placed_at,
            };
            if self.state.expedition.add(slot).is_ok() {
                log::debug!("player {player_id} stows away on the expedition");
            }
        }
        self.state.pending_expedition = true;
        "The expedition sets sail on the next roll.".to_string()
    }

    fn bad_harvest(&mut self) -> String {
        let mut lost = 0;
        for player in &mut self.state.players {
            let cultivated: Vec<usize> = player
                .lands
                .iter()
                .enumerate()
                .filter(|(_, land)| land.cultivated)
                .map(|(index, _)| index)
                .collect();
            if cultivated.is_empty() {
                continue;
            }
            let pick = cultivated[self.rng.effects().gen_range(0..cultivated.len())];
            player.lands[pick].cultivated = false;
            lost += 1;
        }
        format!("Bad harvest: {lost} land(s) lose their crops.")
    }

    fn invasion(&mut self) -> String {
        let mut total = 0;
        for owner in 0..self.state.players.len() {
            let quota = self.state.players[owner].active_inns().div_ceil(2);
            let destroyed = self.state.players[owner].destroy_inns(quota);
            if destroyed > 0 {
                total += destroyed;
                dispatch_hooks(
                    &mut self.state.players,
                    Trigger::InnsDestroyedElsewhere,
                    HookContext::actor(owner).with_units(destroyed),
                );
            }
        }
        dispatch_hooks(
            &mut self.state.players,
            Trigger::Invasion,
            HookContext::default(),
        );
        format!("Invasion: {total} inn(s) destroyed.")
    }

    fn tax_collection(&mut self) -> String {
        let threshold = self.config.tax_threshold;
        let mut collected = 0;
        for player in &mut self.state.players {
            if player.coins >= threshold {
                collected += player.lose_coins(player.coins.div_ceil(2));
            }
        }
        let collector = self.state.players.iter_mut().find(|p| {
            p.character
                .as_ref()
                .is_some_and(|c| c.abilities.collects_taxes)
        });
        match collector {
            Some(governor) => {
                governor.add_coins(collected);
                format!(
                    "Tax collection: {collected} coin(s) go to {}.",
                    governor.name
                )
            }
            None => format!("Tax collection: {collected} coin(s) collected."),
        }
    }

    fn handle_temporary(&mut self, card: &EventCard) -> String {
        let tier = self.state.temporary_tier(&card.id) + 1;
        let affected = affected_guilds(self.state, card);
        if tier >= ESCALATION_BANKRUPTCY_TIER {
            for number in &affected {
                apply_bankruptcy(self.state, *number);
            }
            let had_plague = self.state.temporary_tier(PLAGUE_EVENT_ID) > 0;
            self.state
                .active_temporary_events
                .retain(|active| active.id != card.id);
            update_guild_blocking(self.state);
            if had_plague && self.state.temporary_tier(PLAGUE_EVENT_ID) == 0 {
                dispatch_hooks(
                    &mut self.state.players,
                    Trigger::PlagueEnd,
                    HookContext::default(),
                );
            }
            return format!(
                "{} strikes a third time: {} guild(s) go bankrupt and it burns out.",
                card.name,
                affected.len()
            );
        }
        self.state.active_temporary_events.push(card.clone());
        update_guild_blocking(self.state);
        if tier == ESCALATION_MUTINY_TIER {
            for number in &affected {
                apply_mutiny(self.state, *number);
            }
            return format!(
                "{} deepens: mutiny in {} guild(s).",
                card.name,
                affected.len()
            );
        }
        format!("{} begins: {}", card.name, card.description)
    }
}

fn affected_guilds(state: &GameState, card: &EventCard) -> Vec<GuildNumber> {
    state
        .active_guilds
        .iter()
        .filter(|g| card.blocks(g.number))
        .map(|g| g.number)
        .collect()
}

/// Recompute every guild's `blocked` flag from the active temporary events.
pub fn update_guild_blocking(state: &mut GameState) {
    let events = &state.active_temporary_events;
    for guild in &mut state.active_guilds {
        guild.blocked = events.iter().any(|event| event.blocks(guild.number));
    }
}

/// End every temporary event. Fires plague-end hooks when the plague was
/// among them. Returns whether anything was cleared.
pub fn clear_temporary_events(state: &mut GameState) -> bool {
    if state.active_temporary_events.is_empty() {
        return false;
    }
    let had_plague = state.temporary_tier(PLAGUE_EVENT_ID) > 0;
    state.active_temporary_events.clear();
    update_guild_blocking(state);
    if had_plague {
        dispatch_hooks(&mut state.players, Trigger::PlagueEnd, HookContext::default());
    }
    true
}

/// Strip the most recent slot from every multi-slot investor in `number`.
/// Returns false when the guild is not on the board.
pub fn apply_mutiny(state: &mut GameState, number: GuildNumber) -> bool {
    let Some(guild) = state.guild_mut(number) else {
        return false;
    };
    let losers = guild.mutiny();
    for loser in losers {
        dispatch_hooks(
            &mut state.players,
            Trigger::SlotLostToMutiny,
            HookContext::actor(loser).with_guild(number).with_units(1),
        );
    }
    true
}

/// Wipe every slot from `number`. Returns false when the guild is not on the
/// board.
pub fn apply_bankruptcy(state: &mut GameState, number: GuildNumber) -> bool {
    let Some(guild) = state.guild_mut(number) else {
        return false;
    };
    let lost = guild.clear();
    for (player_id, slots) in lost {
        dispatch_hooks(
            &mut state.players,
            Trigger::SlotsLostToBankruptcy,
            HookContext::actor(player_id)
                .with_guild(number)
                .with_units(slots),
        );
    }
    true
}
