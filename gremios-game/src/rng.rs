//! Deterministic random streams for dice, decks, and character draws.
//!
//! A match is reproducible from one `u64` seed: each domain gets its own
//! `SmallRng` whose seed is derived from the user seed with HMAC-SHA256, so
//! drawing more from one stream never shifts another.

use std::collections::VecDeque;

use hmac::{Hmac, Mac};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::constants::{
    CLEARING_SUM, DIE_FACES, RNG_TAG_CHARACTERS, RNG_TAG_DECK, RNG_TAG_DICE, RNG_TAG_EFFECTS,
};

/// Result of throwing both dice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiceRoll {
    pub first: u8,
    pub second: u8,
}

impl DiceRoll {
    #[must_use]
    pub const fn new(first: u8, second: u8) -> Self {
        Self { first, second }
    }

    #[must_use]
    pub const fn sum(self) -> u8 {
        self.first + self.second
    }

    /// A seven clears every temporary event instead of paying a guild.
    #[must_use]
    pub const fn is_clearing(self) -> bool {
        self.sum() == CLEARING_SUM
    }
}

/// Independent RNG streams for every random domain in a match.
#[derive(Debug, Clone)]
pub struct RngBundle {
    dice: CountingRng<SmallRng>,
    deck: CountingRng<SmallRng>,
    effects: CountingRng<SmallRng>,
    characters: CountingRng<SmallRng>,
    scripted_dice: VecDeque<DiceRoll>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            dice: CountingRng::new(derive_stream_seed(seed, RNG_TAG_DICE)),
            deck: CountingRng::new(derive_stream_seed(seed, RNG_TAG_DECK)),
            effects: CountingRng::new(derive_stream_seed(seed, RNG_TAG_EFFECTS)),
            characters: CountingRng::new(derive_stream_seed(seed, RNG_TAG_CHARACTERS)),
            scripted_dice: VecDeque::new(),
        }
    }

    /// Queue rolls that are returned before any random roll.
    pub fn load_dice<I: IntoIterator<Item = DiceRoll>>(&mut self, rolls: I) {
        self.scripted_dice.extend(rolls);
    }

    /// Number of scripted rolls still queued.
    #[must_use]
    pub fn scripted_remaining(&self) -> usize {
        self.scripted_dice.len()
    }

    /// Throw two six-sided dice.
    pub fn roll_dice(&mut self) -> DiceRoll {
        if let Some(roll) = self.scripted_dice.pop_front() {
            log::trace!("scripted roll {}+{}", roll.first, roll.second);
            return roll;
        }
        let first = self.dice.gen_range(1..=DIE_FACES);
        let second = self.dice.gen_range(1..=DIE_FACES);
        DiceRoll { first, second }
    }

    /// Stream used for shuffling event and treasure decks.
    pub fn deck(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.deck
    }

    /// Stream used by event effects such as bad harvest.
    pub fn effects(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.effects
    }

    /// Stream used for character offers.
    pub fn characters(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.characters
    }

    /// Draw counts per stream, in the order dice, deck, effects, characters.
    #[must_use]
    pub const fn draw_counts(&self) -> [u64; 4] {
        [
            self.dice.draws(),
            self.deck.draws(),
            self.effects.draws(),
            self.characters.draws(),
        ]
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

/// Derive the seed of one named stream from the match seed.
///
/// # Panics
///
/// Never in practice: HMAC accepts keys of any length and SHA-256 digests are
/// always longer than eight bytes.
#[must_use]
pub fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("digest slice length");
    u64::from_le_bytes(seed_bytes)
}
