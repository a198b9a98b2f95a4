//! Event and treasure decks.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::config::RulesConfig;
use crate::data::{EventCard, GameCatalog};
use crate::guild::GuildNumber;
use crate::player::Treasure;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decks {
    /// Draw pile; the next card is the last element.
    pub event_deck: Vec<EventCard>,
    pub event_discard: Vec<EventCard>,
    pub set_aside_events: Vec<EventCard>,
    pub treasure_deck: Vec<Treasure>,
}

impl Decks {
    /// Shuffle fresh decks for a match.
    pub fn build<R: Rng>(
        catalog: &GameCatalog,
        config: &RulesConfig,
        player_count: usize,
        rng: &mut R,
    ) -> Self {
        let (event_deck, set_aside_events) = build_event_deck(
            catalog,
            player_count,
            &config.initial_guilds,
            config.set_aside_for(player_count),
            rng,
        );
        Self {
            event_deck,
            event_discard: Vec::new(),
            set_aside_events,
            treasure_deck: build_treasure_deck(catalog, rng),
        }
    }

    /// Draw the next event, reshuffling the discard pile when the draw pile
    /// runs out. `founded` reports guilds already on the board; their
    /// foundation cards never come back.
    pub fn draw_event<R, F>(&mut self, founded: F, rng: &mut R) -> Option<EventCard>
    where
        R: Rng,
        F: Fn(GuildNumber) -> bool,
    {
        if self.event_deck.is_empty() {
            self.reshuffle(&founded, rng);
        }
        self.event_deck.pop()
    }

    /// Draw without reshuffling; used for a Governor's second card.
    pub fn draw_event_no_reshuffle(&mut self) -> Option<EventCard> {
        self.event_deck.pop()
    }

    /// Put a resolved card on the discard pile. Foundations stay on the board.
    pub fn discard_event(&mut self, card: EventCard) {
        if !card.is_foundation() {
            self.event_discard.push(card);
        }
    }

    fn reshuffle<R, F>(&mut self, founded: &F, rng: &mut R)
    where
        R: Rng,
        F: Fn(GuildNumber) -> bool,
    {
        let mut pile = std::mem::take(&mut self.event_discard);
        if pile.is_empty() {
            log::warn!("event discard empty, returning set-aside cards to the deck");
            pile = std::mem::take(&mut self.set_aside_events);
        }
        pile.retain(|card| card.foundation_guild().is_none_or(|guild| !founded(guild)));
        pile.shuffle(rng);
        log::trace!("reshuffled {} event card(s)", pile.len());
        self.event_deck = pile;
        if self.event_deck.is_empty() {
            log::error!("no event cards left to draw");
        }
    }

    pub fn draw_treasure(&mut self) -> Option<Treasure> {
        self.treasure_deck.pop()
    }

    /// Shuffle a sold treasure back into the deck.
    pub fn return_treasure<R: Rng>(&mut self, treasure: Treasure, rng: &mut R) {
        self.treasure_deck.push(treasure);
        self.treasure_deck.shuffle(rng);
    }

    /// Guild numbers of foundation cards that could still be drawn.
    #[must_use]
    pub fn live_foundations(&self) -> Vec<GuildNumber> {
        self.event_deck
            .iter()
            .chain(&self.event_discard)
            .filter_map(EventCard::foundation_guild)
            .collect()
    }
}

/// Expand the event catalog for `player_count` seats, shuffle it, and set
/// aside `set_aside` non-foundation cards. Returns `(deck, set_aside)`.
pub fn build_event_deck<R: Rng>(
    catalog: &GameCatalog,
    player_count: usize,
    initial_guilds: &[GuildNumber],
    set_aside: usize,
    rng: &mut R,
) -> (Vec<EventCard>, Vec<EventCard>) {
    let mut deck: Vec<EventCard> = catalog
        .events
        .iter()
        .filter(|def| def.min_players <= player_count)
        .filter(|def| {
            def.card
                .foundation_guild()
                .is_none_or(|guild| !initial_guilds.contains(&guild))
        })
        .flat_map(|def| std::iter::repeat_n(def.card.clone(), def.copies))
        .collect();
    deck.shuffle(rng);

    let mut removed = Vec::with_capacity(set_aside);
    while removed.len() < set_aside {
        let Some(index) = deck.iter().rposition(|card| !card.is_foundation()) else {
            break;
        };
        removed.push(deck.remove(index));
    }
    log::debug!(
        "event deck built: {} card(s), {} set aside",
        deck.len(),
        removed.len()
    );
    (deck, removed)
}

pub fn build_treasure_deck<R: Rng>(catalog: &GameCatalog, rng: &mut R) -> Vec<Treasure> {
    let mut deck: Vec<Treasure> = catalog
        .treasures
        .iter()
        .flat_map(|def| std::iter::repeat_n(def.treasure.clone(), def.copies))
        .collect();
    deck.shuffle(rng);
    deck
}
