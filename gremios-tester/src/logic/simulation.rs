use std::time::{Duration, Instant};

use gremios_game::{CommandError, Difficulty, GameEngine, GamePhase, PlayerId, Seat};

use crate::logic::invariants::check_step;

/// Violations kept per match before the rest are only counted.
const MAX_RECORDED_VIOLATIONS: usize = 20;

/// Configuration for one headless match.
#[derive(Debug, Clone, Copy)]
pub struct MatchConfig {
    pub seed: u64,
    pub players: usize,
    pub difficulty: Difficulty,
    pub max_steps: usize,
}

impl MatchConfig {
    #[must_use]
    pub const fn new(seed: u64, players: usize, difficulty: Difficulty) -> Self {
        Self {
            seed,
            players,
            difficulty,
            max_steps: 100_000,
        }
    }

    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// What happened in one match.
#[derive(Debug, Clone)]
pub struct MatchSummary {
    pub seed: u64,
    pub finished: bool,
    pub winner: Option<PlayerId>,
    pub winner_character: Option<String>,
    pub rounds: u32,
    pub steps: usize,
    pub victory_points: Vec<u32>,
    pub violations: Vec<String>,
    pub total_violations: usize,
    pub duration: Duration,
}

impl MatchSummary {
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.finished && self.total_violations == 0
    }
}

/// Play one all-AI match through single engine steps, checking the rules
/// after every step.
#[must_use]
pub fn run_match(config: MatchConfig) -> MatchSummary {
    let start = Instant::now();
    let seats: Vec<Seat> = (0..config.players)
        .map(|seat| Seat::ai(format!("AI {}", seat + 1)))
        .collect();
    let mut engine = GameEngine::new(config.seed);
    let mut violations = Vec::new();
    let mut total_violations = 0;
    let mut record = |found: Vec<String>, step: usize| {
        total_violations += found.len();
        for violation in found {
            if violations.len() < MAX_RECORDED_VIOLATIONS {
                violations.push(format!("step {step}: {violation}"));
            }
        }
    };

    if let Err(err) = engine.initialize_with_seats(&seats, config.difficulty) {
        record(vec![format!("setup rejected: {err}")], 0);
    }

    let mut steps = 0;
    while steps < config.max_steps {
        let previous = engine.state().phase;
        match engine.advance() {
            Ok(()) => {}
            Err(CommandError::GameOver) => break,
            Err(err) => {
                record(vec![format!("engine halted in {previous:?}: {err}")], steps);
                break;
            }
        }
        steps += 1;
        record(check_step(previous, engine.state(), engine.config()), steps);
    }

    let state = engine.state();
    let finished = state.phase == GamePhase::GameOver;
    if !finished {
        log::warn!(
            "seed {}: no winner after {steps} steps (round {})",
            config.seed,
            state.round
        );
    }
    let winner_character = state
        .winner
        .and_then(|winner| state.players.get(winner))
        .and_then(|p| p.character.as_ref())
        .map(|c| c.name.clone());

    MatchSummary {
        seed: config.seed,
        finished,
        winner: state.winner,
        winner_character,
        rounds: state.round,
        steps,
        victory_points: state
            .players
            .iter()
            .map(|p| engine.victory_points(p.id))
            .collect(),
        violations,
        total_violations,
        duration: start.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_match_reaches_a_winner() {
        let summary = run_match(MatchConfig::new(1337, 3, Difficulty::Normal));
        assert!(summary.passed(), "{:?}", summary.violations);
        let winner = summary.winner.unwrap();
        assert!(summary.victory_points[winner] >= 10);
        assert!(summary.winner_character.is_some());
    }

    #[test]
    fn step_budget_stops_long_matches() {
        let summary = run_match(MatchConfig::new(5, 4, Difficulty::Easy).with_max_steps(3));
        assert_eq!(summary.steps, 3);
        assert!(!summary.finished);
        assert!(!summary.passed());
    }

    #[test]
    fn invalid_seat_count_is_reported() {
        let summary = run_match(MatchConfig::new(5, 9, Difficulty::Easy));
        assert!(!summary.passed());
        assert!(summary.violations[0].contains("setup rejected"));
    }
}
