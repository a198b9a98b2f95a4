use gremios_game::{GamePhase, GameState, RulesConfig};

/// Whether the phase machine may move from `from` to `to` in one step.
#[must_use]
pub const fn legal_transition(from: GamePhase, to: GamePhase) -> bool {
    use GamePhase::{CharacterSelection, Collection, Event, GameOver, Investment, Roll, Setup};
    matches!(
        (from, to),
        (Setup, CharacterSelection)
            | (CharacterSelection, Event)
            | (Event, Event | Roll | GameOver)
            | (Roll, Collection | GameOver)
            | (Collection, Investment)
            | (Investment, Investment | Event | GameOver)
            | (GameOver, GameOver)
    )
}

/// Every rule violation visible in `state` after a step from `previous`.
#[must_use]
pub fn check_step(previous: GamePhase, state: &GameState, config: &RulesConfig) -> Vec<String> {
    let mut violations = state.invariant_violations();

    if !legal_transition(previous, state.phase) {
        violations.push(format!(
            "illegal phase change {previous:?} -> {:?}",
            state.phase
        ));
    }

    if state.is_over() {
        if state.pending_governor_choice.is_some() {
            violations.push("governor choice pending after game over".to_string());
        }
        if state.pending_character_offer.is_some() {
            violations.push("character offer pending after game over".to_string());
        }
        if let Some(winner) = state.winner {
            let points = state.victory_points(winner, true);
            if points < config.victory_points_to_win {
                violations.push(format!("winner {winner} holds only {points} VP"));
            }
        }
    } else if let Some(leader) = state.leader_at(config.victory_points_to_win) {
        violations.push(format!("player {leader} reached the threshold but play goes on"));
    }

    if state.current_player_index >= state.players.len() {
        violations.push(format!(
            "current seat {} out of range",
            state.current_player_index
        ));
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use gremios_game::{Guild, Inn, Player};

    #[test]
    fn phase_edges_follow_the_turn_order() {
        assert!(legal_transition(GamePhase::Event, GamePhase::Roll));
        assert!(legal_transition(GamePhase::Investment, GamePhase::Event));
        assert!(!legal_transition(GamePhase::Roll, GamePhase::Investment));
        assert!(!legal_transition(GamePhase::GameOver, GamePhase::Event));
    }

    #[test]
    fn unclaimed_victory_is_flagged() {
        let mut leader = Player::new(0, "Leader", true);
        leader.inns = vec![Inn::default(); 10];
        let state = GameState {
            players: vec![leader, Player::new(1, "Other", true)],
            active_guilds: vec![Guild::new(6, "Farmers")],
            phase: GamePhase::Investment,
            ..GameState::default()
        };
        let violations = check_step(GamePhase::Collection, &state, &RulesConfig::default());
        assert_eq!(violations.len(), 1, "{violations:?}");
        assert!(violations[0].contains("threshold"));
    }
}
