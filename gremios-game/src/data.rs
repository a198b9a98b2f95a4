//! Static game content: guild names, event cards, characters, treasures.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::character::Character;
use crate::guild::GuildNumber;
use crate::player::Treasure;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildDef {
    pub number: GuildNumber,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    GoodHarvest,
    Prosperity,
    Expedition,
    BadHarvest,
    Bankruptcy,
    Mutiny,
    Invasion,
    LandExpropriation,
    TaxCollection,
}

/// Guilds a temporary event blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffectedGuilds {
    All,
    Only(Vec<GuildNumber>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    GuildFoundation {
        guild: GuildNumber,
    },
    Action {
        action: ActionKind,
    },
    Temporary {
        affected: AffectedGuilds,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        immune: Vec<GuildNumber>,
    },
}

/// An immutable event card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: EventKind,
}

impl EventCard {
    #[must_use]
    pub fn foundation_guild(&self) -> Option<GuildNumber> {
        match self.kind {
            EventKind::GuildFoundation { guild } => Some(guild),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_foundation(&self) -> bool {
        self.foundation_guild().is_some()
    }

    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        matches!(self.kind, EventKind::Temporary { .. })
    }

    /// Whether this card, while active, blocks `guild`.
    #[must_use]
    pub fn blocks(&self, guild: GuildNumber) -> bool {
        match &self.kind {
            EventKind::Temporary {
                affected: AffectedGuilds::All,
                immune,
            } => !immune.contains(&guild),
            EventKind::Temporary {
                affected: AffectedGuilds::Only(list),
                ..
            } => list.contains(&guild),
            _ => false,
        }
    }
}

/// A card definition with its copy count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDef {
    #[serde(flatten)]
    pub card: EventCard,
    #[serde(default = "default_copies")]
    pub copies: usize,
    /// Left out of the deck below this player count.
    #[serde(default)]
    pub min_players: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasureDef {
    #[serde(flatten)]
    pub treasure: Treasure,
    #[serde(default = "default_copies")]
    pub copies: usize,
}

const fn default_copies() -> usize {
    1
}

/// Every static definition a match draws from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GameCatalog {
    pub guilds: Vec<GuildDef>,
    pub events: Vec<EventDef>,
    pub characters: Vec<Character>,
    pub treasures: Vec<TreasureDef>,
}

impl GameCatalog {
    /// Parse the four catalog documents.
    ///
    /// # Errors
    ///
    /// Returns an error if any document does not match its schema.
    pub fn from_json(
        guilds: &str,
        events: &str,
        characters: &str,
        treasures: &str,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            guilds: serde_json::from_str(guilds)?,
            events: serde_json::from_str(events)?,
            characters: serde_json::from_str(characters)?,
            treasures: serde_json::from_str(treasures)?,
        })
    }

    #[must_use]
    pub fn guild_name(&self, number: GuildNumber) -> &str {
        self.guilds
            .iter()
            .find(|g| g.number == number)
            .map_or("Unknown Guild", |g| g.name.as_str())
    }

    #[must_use]
    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn event(&self, id: &str) -> Option<&EventCard> {
        self.events.iter().map(|def| &def.card).find(|c| c.id == id)
    }
}

/// The catalog embedded in the crate.
///
/// # Panics
///
/// Panics if an embedded asset does not parse.
#[must_use]
pub fn catalog() -> &'static GameCatalog {
    static CATALOG: OnceLock<GameCatalog> = OnceLock::new();
    CATALOG.get_or_init(|| {
        GameCatalog::from_json(
            include_str!("../assets/data/guilds.json"),
            include_str!("../assets/data/events.json"),
            include_str!("../assets/data/characters.json"),
            include_str!("../assets/data/treasures.json"),
        )
        .expect("valid embedded game catalog")
    })
}
