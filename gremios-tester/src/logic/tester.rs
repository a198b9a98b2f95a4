use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use gremios_game::Difficulty;

use crate::logic::simulation::{MatchConfig, MatchSummary, run_match};

/// Aggregated outcome of every iteration played from one seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedResult {
    pub seed: u64,
    pub players: usize,
    pub difficulty: Difficulty,
    pub passed: bool,
    pub iterations_run: usize,
    pub finished_matches: usize,
    pub failures: Vec<String>,
    /// Wins per seat index.
    pub wins_by_seat: Vec<usize>,
    pub wins_by_character: BTreeMap<String, usize>,
    pub average_rounds: f64,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct MatchTester {
    players: usize,
    difficulty: Difficulty,
    max_steps: usize,
    verbose: bool,
}

impl MatchTester {
    pub const fn new(
        players: usize,
        difficulty: Difficulty,
        max_steps: usize,
        verbose: bool,
    ) -> Self {
        Self {
            players,
            difficulty,
            max_steps,
            verbose,
        }
    }

    pub fn run_seeds(&self, seeds: &[u64], iterations: usize) -> Vec<SeedResult> {
        seeds
            .iter()
            .map(|&seed| {
                if self.verbose {
                    println!(
                        "🎲 Seed {} ({} seats, {} AI)",
                        seed.to_string().bright_white(),
                        self.players,
                        self.difficulty
                    );
                }
                self.run_seed(seed, iterations)
            })
            .collect()
    }

    pub fn run_seed(&self, seed: u64, iterations: usize) -> SeedResult {
        let mut failures = Vec::new();
        let mut wins_by_seat = vec![0; self.players];
        let mut wins_by_character = BTreeMap::new();
        let mut performance_data = Vec::new();
        let mut finished_matches = 0;
        let mut total_rounds = 0_u64;

        for i in 0..iterations {
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let config = MatchConfig::new(iteration_seed, self.players, self.difficulty)
                .with_max_steps(self.max_steps);
            let summary = run_match(config);
            performance_data.push(summary.duration);

            if summary.finished {
                finished_matches += 1;
                total_rounds += u64::from(summary.rounds);
            }
            if let Some(winner) = summary.winner
                && let Some(slot) = wins_by_seat.get_mut(winner)
            {
                *slot += 1;
            }
            if let Some(name) = &summary.winner_character {
                *wins_by_character.entry(name.clone()).or_insert(0) += 1;
            }

            if summary.passed() {
                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{} passed ({:?}) rounds:{} winner:{}",
                        i + 1,
                        iterations,
                        summary.duration,
                        summary.rounds,
                        winner_label(&summary)
                    );
                }
            } else {
                let failure = describe_failure(i + 1, &summary);
                if self.verbose {
                    println!("  ❌ {}", failure.red());
                }
                failures.push(failure);
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };
        #[allow(clippy::cast_precision_loss)]
        let average_rounds = if finished_matches == 0 {
            0.0
        } else {
            total_rounds as f64 / finished_matches as f64
        };

        SeedResult {
            seed,
            players: self.players,
            difficulty: self.difficulty,
            passed: failures.is_empty(),
            iterations_run: iterations,
            finished_matches,
            failures,
            wins_by_seat,
            wins_by_character,
            average_rounds,
            average_duration,
            performance_data,
        }
    }
}

fn winner_label(summary: &MatchSummary) -> String {
    match (summary.winner, &summary.winner_character) {
        (Some(seat), Some(name)) => format!("seat {seat} ({name})"),
        (Some(seat), None) => format!("seat {seat}"),
        (None, _) => "none".to_string(),
    }
}

fn describe_failure(iteration: usize, summary: &MatchSummary) -> String {
    let status = if summary.finished { "ended" } else { "halted" };
    let mut message = format!(
        "Iteration {iteration} (seed {}, steps {}, round {}, status {status}, VP {:?})",
        summary.seed, summary.steps, summary.rounds, summary.victory_points
    );
    if summary.total_violations > 0 {
        message.push_str(&format!(
            ": {} violation(s): {}",
            summary.total_violations,
            summary.violations.join(" | ")
        ));
    }
    message
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_results_count_wins() {
        let tester = MatchTester::new(3, Difficulty::Hard, 100_000, false);
        let result = tester.run_seed(21, 2);
        assert!(result.passed, "{:?}", result.failures);
        assert_eq!(result.iterations_run, 2);
        assert_eq!(result.finished_matches, 2);
        assert_eq!(result.wins_by_seat.iter().sum::<usize>(), 2);
        assert_eq!(result.wins_by_character.values().sum::<usize>(), 2);
        assert!(result.average_rounds >= 1.0);
    }

    #[test]
    fn results_serialize_durations_as_millis() {
        let result = SeedResult {
            seed: 1,
            players: 2,
            difficulty: Difficulty::Easy,
            passed: true,
            iterations_run: 1,
            finished_matches: 1,
            failures: Vec::new(),
            wins_by_seat: vec![1, 0],
            wins_by_character: BTreeMap::new(),
            average_rounds: 12.0,
            average_duration: Duration::from_millis(7),
            performance_data: vec![Duration::from_millis(7)],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 7);
        assert_eq!(json["difficulty"], "easy");
    }
}
