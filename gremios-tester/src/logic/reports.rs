use anyhow::Result;
use colored::Colorize;
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

use super::SeedResult;

struct Totals {
    seeds: usize,
    passed: usize,
    matches: usize,
    finished: usize,
}

fn totals(results: &[SeedResult]) -> Totals {
    Totals {
        seeds: results.len(),
        passed: results.iter().filter(|r| r.passed).count(),
        matches: results.iter().map(|r| r.iterations_run).sum(),
        finished: results.iter().map(|r| r.finished_matches).sum(),
    }
}

fn success_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let rate = (passed as f64 / total as f64) * 100.0;
    rate
}

fn wins_by_character(results: &[SeedResult]) -> BTreeMap<&str, usize> {
    let mut wins = BTreeMap::new();
    for result in results {
        for (name, count) in &result.wins_by_character {
            *wins.entry(name.as_str()).or_insert(0) += count;
        }
    }
    wins
}

fn wins_by_seat(results: &[SeedResult]) -> Vec<usize> {
    let seats = results.iter().map(|r| r.wins_by_seat.len()).max().unwrap_or(0);
    let mut wins = vec![0; seats];
    for result in results {
        for (seat, count) in result.wins_by_seat.iter().enumerate() {
            wins[seat] += count;
        }
    }
    wins
}

pub fn generate_console_report<W: Write>(
    writer: &mut W,
    results: &[SeedResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Match Results Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "========================".cyan())?;

    let totals = totals(results);
    writeln!(writer, "Seeds: {}", totals.seeds)?;
    writeln!(writer, "Passed: {}", totals.passed.to_string().green())?;
    writeln!(
        writer,
        "Failed: {}",
        (totals.seeds - totals.passed).to_string().red()
    )?;
    writeln!(
        writer,
        "Matches finished: {}/{} ({:.1}%)",
        totals.finished,
        totals.matches,
        success_rate(totals.finished, totals.matches)
    )?;
    writeln!(writer, "Total time: {total_duration:?}")?;
    writeln!(writer)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            writer,
            "{} seed {} ({} seats, {})",
            status,
            result.seed.to_string().bold(),
            result.players,
            result.difficulty
        )?;
        writeln!(
            writer,
            "   Matches: {}/{} finished, avg {:.1} rounds",
            result.finished_matches, result.iterations_run, result.average_rounds
        )?;
        writeln!(writer, "   Average time: {:?}", result.average_duration)?;
        if !result.failures.is_empty() {
            writeln!(writer, "   Failures:")?;
            for failure in &result.failures {
                writeln!(writer, "     • {}", failure.red())?;
            }
        }
        writeln!(writer)?;
    }

    if !results.is_empty() {
        writeln!(writer, "{}", "🏆 Win Distribution".bright_yellow().bold())?;
        writeln!(writer, "{}", "===================".yellow())?;
        for (seat, wins) in wins_by_seat(results).iter().enumerate() {
            writeln!(writer, "Seat {seat}: {wins}")?;
        }
        for (name, wins) in wins_by_character(results) {
            writeln!(writer, "{name}: {wins}")?;
        }
    }
    Ok(())
}

pub fn generate_json_report<W: Write>(writer: &mut W, results: &[SeedResult]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, results)?;
    writeln!(writer)?;
    Ok(())
}

pub fn generate_markdown_report<W: Write>(writer: &mut W, results: &[SeedResult]) -> Result<()> {
    writeln!(writer, "# Gremios Match Results\n")?;

    let totals = totals(results);
    writeln!(writer, "## Summary\n")?;
    writeln!(writer, "- **Seeds**: {}", totals.seeds)?;
    writeln!(writer, "- **Passed**: {}", totals.passed)?;
    writeln!(writer, "- **Failed**: {}", totals.seeds - totals.passed)?;
    writeln!(
        writer,
        "- **Finished matches**: {}/{} ({:.1}%)\n",
        totals.finished,
        totals.matches,
        success_rate(totals.finished, totals.matches)
    )?;

    writeln!(writer, "## Seeds\n")?;
    writeln!(writer, "| Seed | Seats | AI | Finished | Avg rounds | Avg time |")?;
    writeln!(writer, "|---|---|---|---|---|---|")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(
            writer,
            "| {status} {} | {} | {} | {}/{} | {:.1} | {:?} |",
            result.seed,
            result.players,
            result.difficulty,
            result.finished_matches,
            result.iterations_run,
            result.average_rounds,
            result.average_duration
        )?;
    }

    let failing: Vec<&SeedResult> = results.iter().filter(|r| !r.passed).collect();
    if !failing.is_empty() {
        writeln!(writer, "\n## Failures\n")?;
        for result in failing {
            writeln!(writer, "### Seed {}\n", result.seed)?;
            for failure in &result.failures {
                writeln!(writer, "- {failure}")?;
            }
        }
    }

    let characters = wins_by_character(results);
    if !characters.is_empty() {
        writeln!(writer, "\n## Wins by character\n")?;
        for (name, wins) in characters {
            writeln!(writer, "- **{name}**: {wins}")?;
        }
    }
    Ok(())
}
