//! Investment-phase commands. Each one validates everything before its
//! first mutation, so a rejected command leaves the state untouched.

use super::GameEngine;
use crate::character::{AbilityFlags, HookContext, Trigger, dispatch_hooks};
use crate::config::RulesConfig;
use crate::error::{CommandError, CommandResult};
use crate::events::apply_mutiny;
use crate::guild::{GuildNumber, InvestmentSlot};
use crate::player::{Player, PlayerId, TreasureKind};
use crate::policy::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Guild,
    Expedition,
}

/// How an investment is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Payment {
    /// Free slot, backed by one reserve coin.
    Reserve,
    Coins,
}

fn abilities(player: &Player) -> Option<&AbilityFlags> {
    player.character.as_ref().map(|c| &c.abilities)
}

fn check_investment_caps(
    player: &Player,
    config: &RulesConfig,
    category: Category,
) -> CommandResult<()> {
    let additional = abilities(player).is_some_and(|a| a.additional_investment);
    let total_cap = if additional {
        config.max_investments_per_turn_additional
    } else {
        config.max_investments_per_turn
    };
    let turn = &player.turn;
    if turn.investments >= total_cap {
        return Err(CommandError::TurnInvestmentLimit);
    }
    match category {
        Category::Guild => {
            if turn.guild_investments >= config.max_guild_investments_per_turn {
                return Err(CommandError::GuildInvestmentLimit);
            }
            if !additional && turn.invested_in_guild {
                return Err(CommandError::CategoryLimit);
            }
        }
        Category::Expedition => {
            let repeat_blocked = if additional {
                turn.expedition_investments >= config.max_expedition_investments_per_turn
            } else {
                turn.invested_in_expedition
            };
            if repeat_blocked {
                return Err(CommandError::CategoryLimit);
            }
        }
    }
    Ok(())
}

/// A qualifying free slot costs one reserve coin. With an empty reserve the
/// player pays the normal price when they can afford it.
fn investment_payment(player: &Player, config: &RulesConfig, free: bool) -> CommandResult<Payment> {
    if free && player.reserve >= 1 {
        return Ok(Payment::Reserve);
    }
    if player.coins >= config.investment_cost {
        return Ok(Payment::Coins);
    }
    if free {
        Err(CommandError::InsufficientReserve)
    } else {
        Err(CommandError::InsufficientCoins)
    }
}

fn pay_investment(
    player: &mut Player,
    config: &RulesConfig,
    payment: Payment,
    category: Category,
) -> CommandResult<()> {
    match payment {
        Payment::Reserve => player.spend_reserve(1)?,
        Payment::Coins => {
            player.spend_coins(config.investment_cost)?;
            player.add_to_reserve(config.investment_reserve_share);
        }
    }
    let turn = &mut player.turn;
    turn.investments += 1;
    match category {
        Category::Guild => {
            turn.guild_investments += 1;
            turn.invested_in_guild = true;
        }
        Category::Expedition => {
            turn.expedition_investments += 1;
            turn.invested_in_expedition = true;
        }
    }
    Ok(())
}

impl GameEngine {
    /// Place one slot on a founded guild.
    ///
    /// # Errors
    ///
    /// Returns the first failed check: turn, guild, room, per-turn caps,
    /// then funds.
    pub fn invest_in_guild(&mut self, player_id: PlayerId, guild: GuildNumber) -> CommandResult<()> {
        self.observed("invest_in_guild", |engine| {
            engine.ensure_turn(player_id)?;
            let target = engine
                .state
                .guild(guild)
                .ok_or(CommandError::GuildNotFound)?;
            if !target.has_room() {
                return Err(CommandError::GuildFull);
            }
            let player = engine.state.player(player_id)?;
            check_investment_caps(player, &engine.config, Category::Guild)?;
            let free = target.slots_of(player_id) == 0
                && player
                    .character
                    .as_ref()
                    .is_some_and(|c| c.first_investment_free(guild));
            let payment = investment_payment(player, &engine.config, free)?;
            let color = player.color;

            let placed_at = engine.state.next_stamp();
            pay_investment(
                &mut engine.state.players[player_id],
                &engine.config,
                payment,
                Category::Guild,
            )?;
            engine
                .state
                .guild_mut(guild)
                .ok_or(CommandError::GuildNotFound)?
                .add(InvestmentSlot {
                    player_id,
                    color,
                    placed_at,
                })?;
            log::debug!("player {player_id} invests in guild #{guild} ({payment:?})");
            if engine.check_victory() {
                return Ok(());
            }
            dispatch_hooks(
                &mut engine.state.players,
                Trigger::OtherPlayerInvestGuild,
                HookContext::actor(player_id).with_guild(guild),
            );
            Ok(())
        })
    }

    /// Place one slot on the expedition. The fourth slot launches it at once
    /// with a fresh roll.
    ///
    /// # Errors
    ///
    /// Returns the first failed check: turn, room, per-turn caps, then funds.
    pub fn invest_in_expedition(&mut self, player_id: PlayerId) -> CommandResult<()> {
        self.observed("invest_in_expedition", |engine| {
            engine.ensure_turn(player_id)?;
            if !engine.state.expedition.has_room() {
                return Err(CommandError::ExpeditionFull);
            }
            let player = engine.state.player(player_id)?;
            check_investment_caps(player, &engine.config, Category::Expedition)?;
            let free = engine.state.expedition.is_empty()
                && abilities(player).is_some_and(|a| a.free_expedition_investment);
            let payment = investment_payment(player, &engine.config, free)?;
            let color = player.color;

            let placed_at = engine.state.next_stamp();
            pay_investment(
                &mut engine.state.players[player_id],
                &engine.config,
                payment,
                Category::Expedition,
            )?;
            engine.state.expedition.add(InvestmentSlot {
                player_id,
                color,
                placed_at,
            })?;
            log::debug!("player {player_id} joins the expedition ({payment:?})");
            if engine.state.expedition.is_full() {
                engine.resolve_expedition(false);
            }
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Returns [`CommandError::InsufficientCoins`] when the land is
    /// unaffordable.
    pub fn buy_land(&mut self, player_id: PlayerId) -> CommandResult<()> {
        self.observed("buy_land", |engine| {
            engine.ensure_turn(player_id)?;
            let cost = engine.config.land_cost;
            let player = &mut engine.state.players[player_id];
            player.spend_coins(cost)?;
            // Leaves the free cultivate of the turn untouched.
            let cultivate = !player.turn.used_free_cultivate
                && abilities(player).is_some_and(|a| a.free_cultivate_per_turn);
            player.add_land(cultivate);
            log::debug!("player {player_id} buys land (cultivated: {cultivate})");
            dispatch_hooks(
                &mut engine.state.players,
                Trigger::OtherPlayerBuyLand,
                HookContext::actor(player_id),
            );
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Returns why the land cannot be cultivated or
    /// [`CommandError::InsufficientCoins`].
    pub fn cultivate_land(&mut self, player_id: PlayerId, land: usize) -> CommandResult<()> {
        self.observed("cultivate_land", |engine| {
            engine.ensure_turn(player_id)?;
            let cost = engine.config.cultivate_cost;
            let player = &mut engine.state.players[player_id];
            player.check_cultivatable(land)?;
            let free = !player.turn.used_free_cultivate
                && abilities(player).is_some_and(|a| a.free_cultivate_per_turn);
            if free {
                player.turn.used_free_cultivate = true;
            } else {
                player.spend_coins(cost)?;
            }
            player.cultivate(land)
        })
    }

    /// Turn a land into an inn. Without `land`, an uncultivated land is
    /// preferred.
    ///
    /// # Errors
    ///
    /// Returns why no inn can stand there or
    /// [`CommandError::InsufficientCoins`].
    pub fn build_inn(&mut self, player_id: PlayerId, land: Option<usize>) -> CommandResult<()> {
        self.observed("build_inn", |engine| {
            engine.ensure_turn(player_id)?;
            let player = &mut engine.state.players[player_id];
            player.inn_site(land)?;
            let cost = abilities(player)
                .and_then(|a| a.inn_cost)
                .unwrap_or(engine.config.inn_cost);
            player.spend_coins(cost)?;
            let site = player.build_inn(land)?;
            log::debug!("player {player_id} builds an inn on land {site} for {cost}");
            if engine.check_victory() {
                return Ok(());
            }
            dispatch_hooks(
                &mut engine.state.players,
                Trigger::OtherPlayerBuildInn,
                HookContext::actor(player_id),
            );
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Returns why no inn can be repaired or
    /// [`CommandError::InsufficientCoins`].
    pub fn repair_inn(&mut self, player_id: PlayerId, inn: Option<usize>) -> CommandResult<()> {
        self.observed("repair_inn", |engine| {
            engine.ensure_turn(player_id)?;
            let cost = engine.config.repair_cost;
            let player = &mut engine.state.players[player_id];
            player.repair_site(inn)?;
            let free = !player.turn.used_free_repair
                && abilities(player).is_some_and(|a| a.free_repair_per_turn);
            if free {
                player.turn.used_free_repair = true;
            } else {
                player.spend_coins(cost)?;
            }
            player.repair_inn(inn)?;
            engine.check_victory();
            Ok(())
        })
    }

    /// Force a mutiny on a guild the actor holds a slot in.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::AbilityUnavailable`] for characters without
    /// the ability, [`CommandError::AbilityAlreadyUsed`] on a second use in
    /// one turn, and guild or funds failures.
    pub fn cause_mutiny(&mut self, player_id: PlayerId, guild: GuildNumber) -> CommandResult<()> {
        self.observed("cause_mutiny", |engine| {
            engine.ensure_turn(player_id)?;
            let player = engine.state.player(player_id)?;
            if !abilities(player).is_some_and(|a| a.can_cause_mutiny) {
                return Err(CommandError::AbilityUnavailable);
            }
            if player.turn.used_mutiny_ability {
                return Err(CommandError::AbilityAlreadyUsed);
            }
            let target = engine
                .state
                .guild(guild)
                .ok_or(CommandError::GuildNotFound)?;
            if target.slots_of(player_id) == 0 {
                return Err(CommandError::NotInvestedInGuild);
            }

            let player = &mut engine.state.players[player_id];
            player.spend_coins(engine.config.mutiny_ability_cost)?;
            player.turn.used_mutiny_ability = true;
            log::debug!("player {player_id} stirs a mutiny in guild #{guild}");
            apply_mutiny(&mut engine.state, guild);
            engine.check_victory();
            Ok(())
        })
    }

    /// Artisan: buy the top treasure.
    ///
    /// # Errors
    ///
    /// Returns ability, funds, or [`CommandError::TreasureDeckEmpty`]
    /// failures.
    pub fn buy_treasure_artisan(&mut self, player_id: PlayerId) -> CommandResult<()> {
        self.observed("buy_treasure_artisan", |engine| {
            engine.ensure_turn(player_id)?;
            engine.check_artisan(player_id)?;
            if engine.state.decks.treasure_deck.is_empty() {
                return Err(CommandError::TreasureDeckEmpty);
            }
            let cost = engine.config.artisan_buy_cost;
            engine.state.players[player_id].spend_coins(cost)?;
            let treasure = engine
                .state
                .decks
                .draw_treasure()
                .ok_or(CommandError::TreasureDeckEmpty)?;
            let stamp = engine.state.next_stamp();
            let player = &mut engine.state.players[player_id];
            player.turn.used_artisan_treasure_ability = true;
            log::debug!("player {player_id} buys {}", treasure.name);
            if player.is_ai && treasure.kind == TreasureKind::Wealth {
                player.add_coins(treasure.coin_value.unwrap_or_default());
            } else {
                player.add_treasure(treasure, stamp);
            }
            engine.settle_treasures();
            Ok(())
        })
    }

    /// Artisan: sell a treasure back into the deck.
    ///
    /// # Errors
    ///
    /// Returns ability failures or [`CommandError::InvalidTreasure`].
    pub fn sell_treasure_artisan(
        &mut self,
        player_id: PlayerId,
        treasure: usize,
    ) -> CommandResult<()> {
        self.observed("sell_treasure_artisan", |engine| {
            engine.ensure_turn(player_id)?;
            engine.check_artisan(player_id)?;
            if treasure >= engine.state.players[player_id].treasures.len() {
                return Err(CommandError::InvalidTreasure);
            }
            let stamp = engine.state.next_stamp();
            let value = engine.config.artisan_sell_value;
            let player = &mut engine.state.players[player_id];
            let sold = player.remove_treasure(treasure, stamp)?;
            player.add_coins(value);
            player.turn.used_artisan_treasure_ability = true;
            log::debug!("player {player_id} sells {}", sold.name);
            engine.state.decks.return_treasure(sold, engine.rng.deck());
            engine.settle_treasures();
            Ok(())
        })
    }

    /// Cash a Wealth treasure for its coin value. The card leaves play.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::InvalidTreasure`] or
    /// [`CommandError::NotWealthTreasure`].
    pub fn convert_wealth_treasure(
        &mut self,
        player_id: PlayerId,
        treasure: usize,
    ) -> CommandResult<()> {
        self.observed("convert_wealth_treasure", |engine| {
            engine.ensure_turn(player_id)?;
            let held = engine.state.players[player_id]
                .treasures
                .get(treasure)
                .ok_or(CommandError::InvalidTreasure)?;
            if held.kind != TreasureKind::Wealth {
                return Err(CommandError::NotWealthTreasure);
            }
            let stamp = engine.state.next_stamp();
            let player = &mut engine.state.players[player_id];
            let cashed = player.remove_treasure(treasure, stamp)?;
            player.add_coins(cashed.coin_value.unwrap_or_default());
            engine.settle_treasures();
            Ok(())
        })
    }

    /// Route an [`Action`] to its command.
    ///
    /// # Errors
    ///
    /// Returns whatever the routed command returns.
    pub fn execute(&mut self, player_id: PlayerId, action: Action) -> CommandResult<()> {
        match action {
            Action::InvestInGuild { guild } => self.invest_in_guild(player_id, guild),
            Action::InvestInExpedition => self.invest_in_expedition(player_id),
            Action::BuyLand => self.buy_land(player_id),
            Action::CultivateLand { land } => self.cultivate_land(player_id, land),
            Action::BuildInn { land } => self.build_inn(player_id, land),
            Action::RepairInn { inn } => self.repair_inn(player_id, inn),
            Action::CauseMutiny { guild } => self.cause_mutiny(player_id, guild),
            Action::BuyTreasure => self.buy_treasure_artisan(player_id),
            Action::SellTreasure { treasure } => self.sell_treasure_artisan(player_id, treasure),
            Action::ConvertWealth { treasure } => self.convert_wealth_treasure(player_id, treasure),
        }
    }

    fn check_artisan(&self, player_id: PlayerId) -> CommandResult<()> {
        let player = self.state.player(player_id)?;
        if !abilities(player).is_some_and(|a| a.treasure_trade) {
            return Err(CommandError::AbilityUnavailable);
        }
        if player.turn.used_artisan_treasure_ability {
            return Err(CommandError::AbilityAlreadyUsed);
        }
        Ok(())
    }

    fn settle_treasures(&mut self) {
        self.state
            .recompute_discoverer_emblem(self.config.emblem_min_treasures);
        self.check_victory();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog;
    use crate::guild::Guild;
    use crate::player::Treasure;
    use crate::rng::DiceRoll;
    use crate::state::{GamePhase, GameState};

    fn seat(id: PlayerId, character: &str, coins: u32) -> Player {
        let mut player = Player::new(id, format!("P{id}"), false).with_holdings(coins, 1);
        player.character = catalog().character(character).cloned();
        player
    }

    fn engine(players: Vec<Player>, guilds: &[GuildNumber]) -> GameEngine {
        let state = GameState {
            players,
            phase: GamePhase::Investment,
            active_guilds: guilds
                .iter()
                .map(|n| Guild::new(*n, catalog().guild_name(*n)))
                .collect(),
            ..GameState::default()
        };
        GameEngine::from_state(state, 17)
    }

    fn treasure(kind: TreasureKind) -> Treasure {
        Treasure {
            id: "test".into(),
            name: "Test".into(),
            kind,
            coin_value: (kind == TreasureKind::Wealth).then_some(3),
            vp: (kind != TreasureKind::Wealth).then_some(1),
        }
    }

    #[test]
    fn paid_investment_moves_one_coin_to_reserve() {
        let mut engine = engine(vec![seat(0, "knight", 5), seat(1, "knight", 5)], &[6]);
        engine.invest_in_guild(0, 6).unwrap();
        let player = &engine.state().players[0];
        assert_eq!((player.coins, player.reserve), (3, 1));
        let guild = engine.state().guild(6).unwrap();
        assert_eq!(guild.investments.len(), 1);
        assert_eq!(guild.max_investor, Some(0));
    }

    #[test]
    fn guards_reject_without_mutation() {
        let mut engine = engine(vec![seat(0, "knight", 5), seat(1, "knight", 5)], &[6]);
        let before = engine.state().clone();
        assert_eq!(engine.invest_in_guild(1, 6), Err(CommandError::NotYourTurn));
        assert_eq!(engine.invest_in_guild(0, 5), Err(CommandError::GuildNotFound));
        assert_eq!(engine.invest_in_guild(9, 6), Err(CommandError::UnknownPlayer));
        assert_eq!(engine.cause_mutiny(0, 6), Err(CommandError::AbilityUnavailable));
        assert_eq!(engine.repair_inn(0, None), Err(CommandError::NoDestroyedInn));
        assert_eq!(engine.build_inn(0, Some(3)), Err(CommandError::InvalidLand));
        assert_eq!(engine.build_inn(0, None), Err(CommandError::InsufficientCoins));
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn one_investment_per_category_without_banker() {
        let mut engine = engine(vec![seat(0, "knight", 10), seat(1, "knight", 5)], &[6, 8]);
        engine.invest_in_guild(0, 6).unwrap();
        assert_eq!(engine.invest_in_guild(0, 8), Err(CommandError::CategoryLimit));
        engine.invest_in_expedition(0).unwrap();
        assert_eq!(
            engine.invest_in_expedition(0),
            Err(CommandError::TurnInvestmentLimit)
        );
    }

    #[test]
    fn banker_gets_a_third_investment() {
        let mut engine = engine(vec![seat(0, "banker", 10), seat(1, "knight", 5)], &[6, 8]);
        engine.invest_in_guild(0, 6).unwrap();
        engine.invest_in_guild(0, 8).unwrap();
        assert_eq!(
            engine.invest_in_guild(0, 6),
            Err(CommandError::GuildInvestmentLimit)
        );
        engine.invest_in_expedition(0).unwrap();
        assert_eq!(
            engine.invest_in_expedition(0),
            Err(CommandError::TurnInvestmentLimit)
        );
        assert_eq!(engine.state().players[0].coins, 4);
    }

    #[test]
    fn artisan_free_slot_spends_reserve() {
        let mut players = vec![seat(0, "artisan", 0), seat(1, "knight", 5)];
        players[0].reserve = 1;
        let mut engine = engine(players, &[3]);
        engine.invest_in_guild(0, 3).unwrap();
        let player = &engine.state().players[0];
        assert_eq!((player.coins, player.reserve), (0, 0));
    }

    #[test]
    fn artisan_with_empty_reserve_pays_when_able() {
        let mut engine = engine(vec![seat(0, "artisan", 2), seat(1, "knight", 5)], &[11]);
        engine.invest_in_guild(0, 11).unwrap();
        let player = &engine.state().players[0];
        assert_eq!((player.coins, player.reserve), (0, 1));
    }

    #[test]
    fn stowaway_first_expedition_slot_uses_reserve() {
        let mut players = vec![seat(0, "stowaway", 0), seat(1, "knight", 5)];
        players[0].reserve = 2;
        let mut engine = engine(players, &[]);
        engine.invest_in_expedition(0).unwrap();
        assert_eq!(engine.state().players[0].reserve, 1);
        assert_eq!(engine.state().expedition.slots_of(0), 1);
    }

    #[test]
    fn shopkeeper_earns_when_others_invest_in_six() {
        let mut engine = engine(vec![seat(0, "knight", 5), seat(1, "shopkeeper", 0)], &[6]);
        engine.invest_in_guild(0, 6).unwrap();
        assert_eq!(engine.state().players[1].coins, 1);
    }

    #[test]
    fn peasant_land_purchase_keeps_the_free_cultivate() {
        let mut engine = engine(vec![seat(0, "peasant", 6), seat(1, "archbishop", 0)], &[]);
        engine.buy_land(0).unwrap();
        engine.buy_land(0).unwrap();
        let player = &engine.state().players[0];
        assert_eq!(player.lands.len(), 3);
        assert!(player.lands[1].cultivated);
        assert!(player.lands[2].cultivated);
        assert!(!player.turn.used_free_cultivate);
        assert_eq!(player.coins, 2);
        assert_eq!(engine.state().players[1].coins, 2);
        engine.cultivate_land(0, 0).unwrap();
        let player = &engine.state().players[0];
        assert_eq!(player.coins, 2);
        assert!(player.turn.used_free_cultivate);
        assert_eq!(
            engine.cultivate_land(0, 0),
            Err(CommandError::AlreadyCultivated)
        );
    }

    #[test]
    fn peasant_buys_plain_land_after_the_free_cultivate() {
        let mut players = vec![seat(0, "peasant", 3), seat(1, "knight", 0)];
        players[0].add_land(false);
        let mut engine = engine(players, &[]);
        engine.cultivate_land(0, 1).unwrap();
        engine.buy_land(0).unwrap();
        let player = &engine.state().players[0];
        assert_eq!(player.coins, 1);
        assert!(!player.lands[2].cultivated);
    }

    #[test]
    fn inn_prefers_uncultivated_land_and_pays_innkeeper() {
        let mut players = vec![seat(0, "master_builder", 4), seat(1, "innkeeper", 0)];
        players[0].lands[0].cultivated = true;
        players[0].add_land(false);
        let mut engine = engine(players, &[]);
        engine.build_inn(0, None).unwrap();
        let builder = &engine.state().players[0];
        assert_eq!(builder.coins, 0);
        assert_eq!(builder.inns.len(), 1);
        assert_eq!(builder.lands.len(), 1);
        assert!(builder.lands[0].cultivated);
        assert_eq!(engine.state().players[1].coins, 1);
    }

    #[test]
    fn master_builder_repairs_once_for_free() {
        let mut players = vec![seat(0, "master_builder", 1), seat(1, "knight", 0)];
        players[0].inns = vec![crate::player::Inn { destroyed: true }; 3];
        let mut engine = engine(players, &[]);
        engine.repair_inn(0, None).unwrap();
        engine.repair_inn(0, Some(1)).unwrap();
        assert_eq!(engine.state().players[0].coins, 0);
        assert_eq!(
            engine.repair_inn(0, Some(2)),
            Err(CommandError::InsufficientCoins)
        );
        assert_eq!(engine.repair_inn(0, Some(0)), Err(CommandError::InnNotDestroyed));
    }

    #[test]
    fn mercenary_mutiny_needs_a_slot_and_fires_once() {
        let mut engine = engine(vec![seat(0, "mercenary", 10), seat(1, "merchant", 0)], &[5]);
        assert_eq!(engine.cause_mutiny(0, 5), Err(CommandError::NotInvestedInGuild));
        {
            let guild = &mut engine.state.active_guilds[0];
            for (player_id, placed_at) in [(1, 1), (1, 2), (0, 3)] {
                guild
                    .add(InvestmentSlot {
                        player_id,
                        color: crate::player::PlayerColor::for_seat(player_id),
                        placed_at,
                    })
                    .unwrap();
            }
        }
        engine.cause_mutiny(0, 5).unwrap();
        let guild = engine.state().guild(5).unwrap();
        assert_eq!(guild.investments.len(), 2);
        assert_eq!(engine.state().players[1].coins, 1);
        assert_eq!(engine.state().players[0].coins, 9);
        assert_eq!(engine.cause_mutiny(0, 5), Err(CommandError::AbilityAlreadyUsed));
    }

    #[test]
    fn artisan_trade_is_once_per_turn() {
        let mut engine = engine(vec![seat(0, "artisan", 8), seat(1, "knight", 0)], &[]);
        engine.state.decks.treasure_deck = vec![treasure(TreasureKind::Common)];
        engine.buy_treasure_artisan(0).unwrap();
        assert_eq!(engine.state().players[0].treasures.len(), 1);
        assert_eq!(
            engine.sell_treasure_artisan(0, 0),
            Err(CommandError::AbilityAlreadyUsed)
        );

        engine.end_turn().unwrap();
        for _ in 0..3 {
            engine.advance().unwrap();
        }
        assert_eq!(engine.advance(), Err(CommandError::AwaitingInput));
        engine.end_turn().unwrap();
        for _ in 0..3 {
            engine.advance().unwrap();
        }
        assert_eq!(engine.state().phase, GamePhase::Investment);
        assert_eq!(engine.state().current_player_index, 0);

        engine.sell_treasure_artisan(0, 0).unwrap();
        let artisan = &engine.state().players[0];
        assert_eq!(artisan.coins, 9);
        assert!(artisan.treasures.is_empty());
        assert_eq!(engine.state().decks.treasure_deck.len(), 1);
    }

    #[test]
    fn rejected_sell_leaves_state_untouched() {
        let mut engine = engine(vec![seat(0, "artisan", 8), seat(1, "knight", 0)], &[]);
        let before = engine.state().clone();
        assert_eq!(
            engine.sell_treasure_artisan(0, 3),
            Err(CommandError::InvalidTreasure)
        );
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn artisan_buy_fails_on_empty_deck() {
        let mut engine = engine(vec![seat(0, "artisan", 8), seat(1, "knight", 0)], &[]);
        assert_eq!(
            engine.buy_treasure_artisan(0),
            Err(CommandError::TreasureDeckEmpty)
        );
        assert_eq!(engine.state().players[0].coins, 8);
    }

    #[test]
    fn wealth_converts_to_coins() {
        let mut players = vec![seat(0, "knight", 0), seat(1, "knight", 0)];
        players[0].add_treasure(treasure(TreasureKind::Common), 1);
        players[0].add_treasure(treasure(TreasureKind::Wealth), 2);
        let mut engine = engine(players, &[]);
        assert_eq!(
            engine.convert_wealth_treasure(0, 0),
            Err(CommandError::NotWealthTreasure)
        );
        assert_eq!(
            engine.convert_wealth_treasure(0, 5),
            Err(CommandError::InvalidTreasure)
        );
        engine.convert_wealth_treasure(0, 1).unwrap();
        let player = &engine.state().players[0];
        assert_eq!(player.coins, 3);
        assert_eq!(player.treasures.len(), 1);
    }

    #[test]
    fn fourth_expedition_slot_rolls_fresh_dice() {
        let mut engine = engine(vec![seat(0, "knight", 4), seat(1, "knight", 0)], &[]);
        engine.state.last_dice_roll = Some(DiceRoll::new(1, 1));
        engine.state.decks.treasure_deck = vec![treasure(TreasureKind::Common); 4];
        for placed_at in 0..3 {
            engine
                .state
                .expedition
                .add(InvestmentSlot {
                    player_id: 1,
                    color: crate::player::PlayerColor::for_seat(1),
                    placed_at,
                })
                .unwrap();
        }
        engine.load_dice([DiceRoll::new(3, 4)]);
        engine.invest_in_expedition(0).unwrap();
        let state = engine.state();
        assert!(state.expedition.is_empty());
        assert_eq!(state.last_dice_roll, Some(DiceRoll::new(3, 4)));
        assert_eq!(state.players[0].treasures.len(), 1);
        assert_eq!(state.players[1].treasures.len(), 3);
        assert_eq!(state.players[1].reserve, 3);
        assert!(state.players[1].has_discoverer_emblem);
    }

    #[test]
    fn execute_routes_actions() {
        let mut engine = engine(vec![seat(0, "knight", 5), seat(1, "knight", 0)], &[8]);
        engine
            .execute(0, Action::InvestInGuild { guild: 8 })
            .unwrap();
        engine.execute(0, Action::BuyLand).unwrap();
        assert_eq!(engine.state().players[0].lands.len(), 2);
        assert_eq!(
            engine.execute(0, Action::BuyTreasure),
            Err(CommandError::AbilityUnavailable)
        );
    }
}
