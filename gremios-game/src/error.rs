//! Reason codes returned when the engine refuses a command.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a command was rejected. The engine state is untouched whenever one of
/// these is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandError {
    #[error("the game is over")]
    GameOver,
    #[error("command not allowed in the current phase")]
    WrongPhase,
    #[error("it is not this player's turn")]
    NotYourTurn,
    #[error("no such player")]
    UnknownPlayer,
    #[error("player count outside the supported range")]
    InvalidPlayerCount,
    #[error("waiting for a human decision")]
    AwaitingInput,
    #[error("characters are still being chosen")]
    CharactersPending,
    #[error("no such guild on the board")]
    GuildNotFound,
    #[error("the guild has no free slot")]
    GuildFull,
    #[error("the expedition has no free slot")]
    ExpeditionFull,
    #[error("not enough coins")]
    InsufficientCoins,
    #[error("not enough coins in the reserve")]
    InsufficientReserve,
    #[error("no investments left this turn")]
    TurnInvestmentLimit,
    #[error("no guild investments left this turn")]
    GuildInvestmentLimit,
    #[error("already invested in this category this turn")]
    CategoryLimit,
    #[error("the player owns no land")]
    NoLand,
    #[error("no such land")]
    InvalidLand,
    #[error("the land is already cultivated")]
    AlreadyCultivated,
    #[error("no such inn")]
    InvalidInn,
    #[error("the player has no destroyed inn")]
    NoDestroyedInn,
    #[error("the inn is not destroyed")]
    InnNotDestroyed,
    #[error("the character lacks this ability")]
    AbilityUnavailable,
    #[error("the ability was already used this turn")]
    AbilityAlreadyUsed,
    #[error("the player holds no slot in this guild")]
    NotInvestedInGuild,
    #[error("the treasure deck is empty")]
    TreasureDeckEmpty,
    #[error("no such treasure")]
    InvalidTreasure,
    #[error("the treasure cannot be converted to coins")]
    NotWealthTreasure,
    #[error("no decision is pending")]
    NoPendingChoice,
    #[error("choice index out of range")]
    InvalidChoice,
}

/// Result of an engine command.
pub type CommandResult<T> = Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_serialize_as_snake_case() {
        let json = serde_json::to_string(&CommandError::InsufficientReserve).unwrap();
        assert_eq!(json, "\"insufficient_reserve\"");
        let restored: CommandError = serde_json::from_str("\"guild_full\"").unwrap();
        assert_eq!(restored, CommandError::GuildFull);
    }
}
