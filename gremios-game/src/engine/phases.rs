use super::GameEngine;
use crate::character::{HookContext, Trigger, dispatch_hooks};
use crate::constants::TRADE_BLOCKADE_EVENT_ID;
use crate::data::EventCard;
use crate::error::{CommandError, CommandResult};
use crate::events::{EventHandler, apply_bankruptcy, apply_mutiny, clear_temporary_events};
use crate::guild::GuildNumber;
use crate::notify::{Notification, RollReason};
use crate::player::{PlayerId, TreasureKind};
use crate::rng::DiceRoll;
use crate::state::{GamePhase, GovernorChoice};

impl GameEngine {
    pub(super) fn run_event_phase(&mut self) {
        let player_id = self.state.current_player_index;
        if let Some(card) = self.state.forced_next_event.take() {
            log::debug!("player {player_id} receives the handed-off {}", card.id);
            self.apply_event(player_id, card);
            return;
        }
        let Some(first) = self.draw_event() else {
            log::error!("event deck exhausted, skipping the event phase");
            self.set_phase(GamePhase::Roll);
            return;
        };
        let draws_two = self
            .state
            .players
            .get(player_id)
            .and_then(|p| p.character.as_ref())
            .is_some_and(|c| c.abilities.draw_two_events);
        if !draws_two {
            self.apply_event(player_id, first);
            return;
        }
        let Some(second) = self.state.decks.draw_event_no_reshuffle() else {
            self.apply_event(player_id, first);
            return;
        };
        let options = [first, second];
        let is_ai = self.state.players[player_id].is_ai;
        if is_ai {
            let choice = self.ai.choose_event(&self.state, player_id, &options);
            self.apply_governor_choice(player_id, options, choice);
        } else {
            self.state.pending_governor_choice = Some(GovernorChoice {
                player_id,
                options: options.clone(),
            });
            self.notify(&Notification::GovernorEventChoicePending { player_id, options });
        }
    }

    /// Resolve a human Governor's pending two-card choice.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NoPendingChoice`] when nothing is pending and
    /// [`CommandError::InvalidChoice`] for an index other than 0 or 1.
    pub fn resolve_governor_choice(&mut self, choice_index: usize) -> CommandResult<()> {
        self.observed("resolve_governor_choice", |engine| {
            if engine.state.is_over() {
                return Err(CommandError::GameOver);
            }
            let pending = engine
                .state
                .pending_governor_choice
                .as_ref()
                .ok_or(CommandError::NoPendingChoice)?;
            if choice_index >= pending.options.len() {
                return Err(CommandError::InvalidChoice);
            }
            let Some(GovernorChoice { player_id, options }) =
                engine.state.pending_governor_choice.take()
            else {
                return Err(CommandError::NoPendingChoice);
            };
            engine.apply_governor_choice(player_id, options, choice_index);
            Ok(())
        })
    }

    fn apply_governor_choice(&mut self, player_id: PlayerId, options: [EventCard; 2], choice: usize) {
        let [first, second] = options;
        let (chosen, handed_off) = if choice == 1 {
            (second, first)
        } else {
            (first, second)
        };
        log::debug!(
            "player {player_id} keeps {} and hands off {}",
            chosen.id,
            handed_off.id
        );
        self.state.forced_next_event = Some(handed_off);
        self.apply_event(player_id, chosen);
    }

    fn draw_event(&mut self) -> Option<EventCard> {
        let founded: Vec<GuildNumber> = self.state.active_guilds.iter().map(|g| g.number).collect();
        self.state
            .decks
            .draw_event(|guild| founded.contains(&guild), self.rng.deck())
    }

    fn apply_event(&mut self, player_id: PlayerId, card: EventCard) {
        let description =
            EventHandler::new(&mut self.state, &self.config, self.catalog, &mut self.rng)
                .handle_event(&card);
        self.notify(&Notification::EventDrawn {
            player_id,
            card: card.clone(),
            description,
        });
        self.state.decks.discard_event(card);
        if !self.check_victory() {
            self.set_phase(GamePhase::Roll);
        }
    }

    pub(super) fn run_roll_phase(&mut self) {
        let roll = self.roll(RollReason::Turn);
        let sum = roll.sum();
        if roll.is_clearing() {
            if clear_temporary_events(&mut self.state) {
                log::debug!("a seven clears every temporary event");
            }
        } else {
            self.distribute_guild_coins(sum);
        }
        if self.state.next_roll_bankruptcy {
            self.state.next_roll_bankruptcy = false;
            if !apply_bankruptcy(&mut self.state, sum) {
                log::debug!("bankruptcy finds no guild #{sum}");
            }
        }
        if self.state.next_roll_mutiny {
            self.state.next_roll_mutiny = false;
            if !apply_mutiny(&mut self.state, sum) {
                log::debug!("mutiny finds no guild #{sum}");
            }
        }
        if self.state.pending_expedition {
            self.state.pending_expedition = false;
            self.resolve_expedition(true);
        }
        if !self.check_victory() {
            self.set_phase(GamePhase::Collection);
        }
    }

    fn roll(&mut self, reason: RollReason) -> DiceRoll {
        let roll = self.rng.roll_dice();
        self.state.last_dice_roll = Some(roll);
        log::debug!("rolled {}+{}={}", roll.first, roll.second, roll.sum());
        self.notify(&Notification::DiceRolled { roll, reason });
        roll
    }

    /// Pay each investor of the guild matching `sum` one coin per slot.
    fn distribute_guild_coins(&mut self, sum: GuildNumber) {
        let Some(guild) = self.state.guild(sum) else {
            log::debug!("no guild #{sum} on the board");
            return;
        };
        let payouts = guild.payouts();
        let blocked = guild.blocked;
        let pirate_exempt = blocked && self.blockade_only(sum);
        for (player_id, slots) in payouts {
            let player = &mut self.state.players[player_id];
            let immune = player
                .character
                .as_ref()
                .is_some_and(|c| c.abilities.trade_blockade_immunity);
            if !blocked || (pirate_exempt && immune) {
                player.add_coins(slots);
            }
        }
    }

    /// Whether every event blocking `guild` is a trade blockade that has not
    /// burned out.
    fn blockade_only(&self, guild: GuildNumber) -> bool {
        let mut blockers = self
            .state
            .active_temporary_events
            .iter()
            .filter(|e| e.blocks(guild))
            .peekable();
        blockers.peek().is_some() && blockers.all(|e| e.id == TRADE_BLOCKADE_EVENT_ID)
    }

    /// Settle the expedition, with a fresh roll unless `use_existing_roll`.
    pub(super) fn resolve_expedition(&mut self, use_existing_roll: bool) {
        let roll = match self.state.last_dice_roll {
            Some(roll) if use_existing_roll => roll,
            _ => self.roll(RollReason::Expedition),
        };
        let slots = self.state.expedition.take();
        if slots.is_empty() {
            log::debug!("the expedition sails empty");
            return;
        }
        let success = self.config.expedition_succeeds(roll.sum());
        let investors: Vec<PlayerId> = slots.iter().map(|s| s.player_id).collect();
        if success {
            for player_id in &investors {
                let Some(treasure) = self.state.decks.draw_treasure() else {
                    log::warn!("treasure deck empty, player {player_id} draws nothing");
                    continue;
                };
                let stamp = self.state.next_stamp();
                let player = &mut self.state.players[*player_id];
                if player.is_ai && treasure.kind == TreasureKind::Wealth {
                    player.add_coins(treasure.coin_value.unwrap_or_default());
                } else {
                    player.add_treasure(treasure, stamp);
                }
            }
            self.state
                .recompute_discoverer_emblem(self.config.emblem_min_treasures);
        } else {
            let lost = u32::try_from(slots.len()).unwrap_or(u32::MAX);
            dispatch_hooks(
                &mut self.state.players,
                Trigger::FailedExpedition,
                HookContext::default().with_units(lost),
            );
        }
        for player_id in &investors {
            self.state.players[*player_id].add_to_reserve(1);
        }
        log::debug!(
            "expedition {} on {}",
            if success { "succeeds" } else { "fails" },
            roll.sum()
        );
        self.notify(&Notification::ExpeditionResolved {
            roll,
            success,
            investors,
        });
        self.check_victory();
    }

    pub(super) fn run_collection_phase(&mut self) {
        let player_id = self.state.current_player_index;
        let stipend = self.config.turn_stipend;
        let player = &mut self.state.players[player_id];
        player.reset_turn();
        let income = stipend + player.active_inns();
        player.add_coins(income);
        dispatch_hooks(
            &mut self.state.players,
            Trigger::TurnStart,
            HookContext::actor(player_id),
        );
        self.set_phase(GamePhase::Investment);
    }

    pub(super) fn run_ai_turn(&mut self) {
        let player_id = self.state.current_player_index;
        let plan = self.ai.plan_turn(&self.state, &self.config, player_id);
        for action in plan {
            if self.state.is_over() {
                return;
            }
            if let Err(err) = self.execute(player_id, action) {
                log::debug!("player {player_id} skips {action:?}: {err}");
            }
        }
        if !self.state.is_over() {
            self.finish_turn();
        }
    }

    /// End the current player's turn and hand the table to the next seat.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::GameOver`] after the match ended and
    /// [`CommandError::WrongPhase`] outside the investment phase.
    pub fn end_turn(&mut self) -> CommandResult<()> {
        self.observed("end_turn", |engine| {
            if engine.state.is_over() {
                return Err(CommandError::GameOver);
            }
            if engine.state.phase != GamePhase::Investment {
                return Err(CommandError::WrongPhase);
            }
            engine.finish_turn();
            Ok(())
        })
    }

    fn finish_turn(&mut self) {
        if self.check_victory() {
            return;
        }
        let count = self.state.players.len().max(1);
        let next = (self.state.current_player_index + 1) % count;
        if next == 0 {
            self.state.round += 1;
        }
        self.state.current_player_index = next;
        self.notify(&Notification::TurnChanged {
            player_id: next,
            round: self.state.round,
        });
        self.set_phase(GamePhase::Event);
    }
}
