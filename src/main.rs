//! grid-severity - score power-grid anomalies with fuzzy inference.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use grid_severity::config::{Config, LOG_ENV};
use grid_severity::grid::GridModel;
use grid_severity::severity::{Assessment, Assessor, Reading, SeverityBands};

#[derive(Parser)]
#[command(name = "grid-severity")]
#[command(version)]
#[command(about = "Score power-grid anomalies with Mamdani fuzzy inference", long_about = None)]
struct Cli {
    /// Config file (defaults to ./grid-severity.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Severity band preset, overriding the configured bands
    #[arg(long, global = true, value_enum)]
    bands: Option<BandsPreset>,

    /// Print assessments as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum BandsPreset {
    /// Moderate from 30, High from 60
    Service,
    /// Moderate from 30, High from 70
    Console,
}

#[derive(Subcommand)]
enum Command {
    /// Assess a single reading
    Assess {
        /// Voltage deviation, 0 to 20
        #[arg(long)]
        voltage: f64,
        /// Frequency variation, 0 to 2
        #[arg(long)]
        frequency: f64,
        /// Load imbalance, 0 to 100
        #[arg(long)]
        load: f64,
    },
    /// Prompt for a reading on stdin
    Interactive,
    /// Assess `voltage,frequency,load` lines from a file, or stdin with `-`
    Batch {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    init_tracing(&config.log_filter);

    match cli.bands {
        Some(BandsPreset::Service) => config.bands = SeverityBands::SERVICE,
        Some(BandsPreset::Console) => config.bands = SeverityBands::CONSOLE,
        None => {},
    }

    let model = GridModel::with_operators(config.operators).context("building grid model")?;
    let assessor = Assessor::new(model, config.bands, config.fallback)?;

    debug!(bands = ?config.bands, fallback = ?config.fallback, "assessor ready");

    match cli.command {
        Command::Assess {
            voltage,
            frequency,
            load,
        } => {
            let assessment = assessor.assess(&Reading::new(voltage, frequency, load))?;

            print_assessment(&assessment, cli.json)?;
        },
        Command::Interactive => {
            let reading = prompt_reading()?;
            let assessment = assessor.assess(&reading)?;

            print_assessment(&assessment, cli.json)?;
        },
        Command::Batch { input } => run_batch(&assessor, &input, cli.json)?,
    }

    Ok(())
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn print_assessment(assessment: &Assessment, json: bool) -> Result<()> {
    let mut stdout = io::stdout().lock();

    if json {
        writeln!(stdout, "{}", serde_json::to_string(assessment)?)?;
        return Ok(());
    }

    match assessment.severity_score {
        Some(score) => writeln!(stdout, "Severity Score: {score:.2}")?,
        None => writeln!(stdout, "Severity Score: n/a (no rule fired)")?,
    }
    writeln!(stdout, "Severity Level: {}", assessment.severity_level)?;
    writeln!(stdout, "Suggested Action: {}", assessment.suggested_action)?;

    Ok(())
}

fn prompt_reading() -> Result<Reading> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut ask = |prompt: &str, range: RangeInclusive<f64>| -> Result<f64> {
        loop {
            print!("{prompt}");
            io::stdout().flush()?;

            let Some(line) = lines.next() else {
                bail!("stdin closed before a reading was entered");
            };

            match line?.trim().parse() {
                Ok(value) if range.contains(&value) => return Ok(value),
                _ => println!("Invalid input! Please enter numerical values within the specified ranges."),
            }
        }
    };

    let voltage = ask("Enter Voltage (0 to 20): ", Reading::VOLTAGE_RANGE)?;
    let frequency = ask("Enter Frequency (0 to 2): ", Reading::FREQUENCY_RANGE)?;
    let load = ask("Enter Load (0 to 100): ", Reading::LOAD_RANGE)?;

    Ok(Reading::new(voltage, frequency, load))
}

fn parse_line(line: &str) -> Result<Reading> {
    let fields = line
        .split(',')
        .map(|field| field.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("`{line}` is not numeric"))?;

    match fields[..] {
        [voltage, frequency, load] => Ok(Reading::new(voltage, frequency, load)),
        _ => bail!("expected `voltage,frequency,load`, got `{line}`"),
    }
}

fn run_batch(assessor: &Assessor, input: &Path, json: bool) -> Result<()> {
    let reader: Box<dyn BufRead> = if input.as_os_str() == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;

        Box::new(BufReader::new(file))
    };

    let mut lines = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading line {}", i + 1))?;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        lines.push((i + 1, trimmed.to_owned()));
    }

    // The engine is read-only, so readings are scored in parallel and
    // reported in input order
    let results: Vec<_> = lines
        .par_iter()
        .map(|(line_no, line)| {
            let assessment = parse_line(line).and_then(|reading| assessor.assess(&reading).map_err(Into::into));

            (*line_no, assessment)
        })
        .collect();

    let mut failures = 0;

    for (line_no, result) in results {
        match result {
            Ok(assessment) if json => println!("{}", serde_json::to_string(&assessment)?),
            Ok(assessment) => println!(
                "line {line_no}: {} ({}) -> {}",
                assessment
                    .severity_score
                    .map_or_else(|| "n/a".to_owned(), |score| format!("{score:.2}")),
                assessment.severity_level,
                assessment.suggested_action
            ),
            Err(e) => {
                failures += 1;
                eprintln!("line {line_no}: {e:#}");
            },
        }
    }

    info!(total = lines.len(), failures, "batch finished");

    if failures > 0 {
        bail!("{failures} of {} readings could not be assessed", lines.len());
    }

    Ok(())
}
