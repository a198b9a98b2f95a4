mod logic;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use gremios_game::Difficulty;
use logic::{MatchTester, SeedResult, resolve_seed_inputs, split_csv};

#[derive(Debug, Parser)]
#[command(name = "gremios-tester", version = "0.1.0")]
#[command(about = "Automated QA harness for the Gremios rule engine - seeded headless AI matches")]
struct Args {
    /// Seeds to run (comma-separated integers or ranges such as 10..20)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Seats at the table, all played by the AI
    #[arg(long, default_value_t = 4)]
    #[arg(value_parser = clap::value_parser!(u8).range(2..=5))]
    players: u8,

    /// Matches played per seed; iteration i uses seed + i
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// AI difficulty (easy, normal, hard, comma-separated, or all)
    #[arg(long, default_value = "normal")]
    difficulty: String,

    /// Engine steps allowed per match before it counts as stalled
    #[arg(long, default_value_t = 100_000)]
    max_steps: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let difficulties = resolve_difficulties(&args.difficulty)?;
    if args.report == "console" {
        announce_banner();
    }

    let start_time = Instant::now();
    let mut results: Vec<SeedResult> = Vec::new();
    for difficulty in difficulties {
        if args.verbose {
            println!(
                "{}",
                format!("🧠 {difficulty} AI, {} seats", args.players)
                    .bright_yellow()
                    .bold()
            );
        }
        let tester = MatchTester::new(
            usize::from(args.players),
            difficulty,
            args.max_steps,
            args.verbose,
        );
        results.extend(tester.run_seeds(&seeds, args.iterations));
    }
    log::info!(
        "played {} seed(s) in {:?}",
        results.len(),
        start_time.elapsed()
    );

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn announce_banner() {
    println!("{}", "🎲 Gremios Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn resolve_difficulties(raw: &str) -> Result<Vec<Difficulty>> {
    let tokens = split_csv(raw);
    if tokens.iter().any(|t| t.eq_ignore_ascii_case("all")) {
        return Ok(Difficulty::ALL.to_vec());
    }
    let mut difficulties = Vec::new();
    for token in tokens {
        let difficulty = token
            .parse::<Difficulty>()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("invalid --difficulty value '{raw}'"))?;
        if !difficulties.contains(&difficulty) {
            difficulties.push(difficulty);
        }
    }
    if difficulties.is_empty() {
        bail!("--difficulty needs at least one value");
    }
    Ok(difficulties)
}

fn write_reports(args: &Args, results: &[SeedResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, results)?,
        "markdown" => logic::reports::generate_markdown_report(&mut output_target, results)?,
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No matches played.")?;
            } else {
                logic::reports::generate_console_report(&mut output_target, results, duration)?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
