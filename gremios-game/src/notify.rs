//! State-change notifications for presentation adapters and loggers.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::character::Character;
use crate::data::EventCard;
use crate::guild::{Guild, GuildNumber};
use crate::player::{Player, PlayerId};
use crate::rng::DiceRoll;
use crate::state::GamePhase;

/// Why the dice were thrown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollReason {
    Turn,
    Expedition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    PhaseChanged {
        phase: GamePhase,
    },
    TurnChanged {
        player_id: PlayerId,
        round: u32,
    },
    EventDrawn {
        player_id: PlayerId,
        card: EventCard,
        description: String,
    },
    DiceRolled {
        roll: DiceRoll,
        reason: RollReason,
    },
    GuildUpdated {
        guild: Guild,
    },
    PlayerUpdated {
        player: Player,
    },
    ExpeditionResolved {
        roll: DiceRoll,
        success: bool,
        investors: Vec<PlayerId>,
    },
    GovernorEventChoicePending {
        player_id: PlayerId,
        options: [EventCard; 2],
    },
    CharacterChoicePending {
        player_id: PlayerId,
        options: Vec<Character>,
    },
    GameOver {
        winner: PlayerId,
        victory_points: u32,
    },
}

impl Notification {
    /// Guild number touched by this notification, if any.
    #[must_use]
    pub const fn guild(&self) -> Option<GuildNumber> {
        match self {
            Self::GuildUpdated { guild } => Some(guild.number),
            _ => None,
        }
    }
}

/// Receives engine notifications. Handlers must not call back into the
/// engine.
pub trait GameObserver {
    fn notify(&mut self, notification: &Notification);
}

impl<T: GameObserver> GameObserver for Rc<RefCell<T>> {
    fn notify(&mut self, notification: &Notification) {
        self.borrow_mut().notify(notification);
    }
}

/// Observer that keeps every notification, useful for replays and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    pub notifications: Vec<Notification>,
}

impl GameObserver for RecordingObserver {
    fn notify(&mut self, notification: &Notification) {
        self.notifications.push(notification.clone());
    }
}

/// Observer that writes each notification to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl GameObserver for LogObserver {
    fn notify(&mut self, notification: &Notification) {
        match notification {
            Notification::EventDrawn { description, .. } => log::info!("{description}"),
            Notification::GameOver {
                winner,
                victory_points,
            } => log::info!("player {winner} wins with {victory_points} VP"),
            other => log::debug!("{other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifications_are_tagged() {
        let json = serde_json::to_string(&Notification::PhaseChanged {
            phase: GamePhase::Roll,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"phase_changed","phase":"roll"}"#);
    }

    #[test]
    fn recorder_keeps_order() {
        let mut recorder = RecordingObserver::default();
        recorder.notify(&Notification::TurnChanged {
            player_id: 1,
            round: 2,
        });
        recorder.notify(&Notification::GuildUpdated {
            guild: Guild::new(5, "Harbour"),
        });
        assert_eq!(recorder.notifications.len(), 2);
        assert_eq!(recorder.notifications[1].guild(), Some(5));
    }
}
